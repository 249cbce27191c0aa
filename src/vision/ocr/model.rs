// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition result types shared with the annotation exporter

use std::str::FromStr;

/// Bounding box for detected text, as produced by the detector
///
/// Coordinates stay fractional until export, where they are truncated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Integer `[x, y, width, height]`, truncated toward zero
    ///
    /// Non-finite coordinates saturate (NaN becomes 0); the exporter rejects
    /// such boxes before calling this.
    pub fn truncated(&self) -> [i64; 4] {
        [
            self.x.trunc() as i64,
            self.y.trunc() as i64,
            self.width.trunc() as i64,
            self.height.trunc() as i64,
        ]
    }
}

impl From<(f64, f64, f64, f64)> for BoundingBox {
    fn from((x, y, width, height): (f64, f64, f64, f64)) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Parses `x,y,width,height`
impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid bounding box coordinate: {:?}", part))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(format!("Bounding box coordinate must be finite, got {}", bad));
        }

        match values.as_slice() {
            [x, y, width, height] => Ok(Self::new(*x, *y, *width, *height)),
            _ => Err(format!(
                "Bounding box needs 4 values (x,y,width,height), got {}",
                values.len()
            )),
        }
    }
}

/// A recognized text region with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    /// Recognized text content
    pub text: String,
    /// Bounding box location
    pub bounding_box: BoundingBox,
}
