// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Annotation record written per processed image

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape type of every exported annotation
pub const ANNOTATION_TYPE_RECTANGLE: &str = "rectangle";
/// Category placeholder, kept as the literal string downstream tools expect
pub const IMAGE_CATEGORY_NONE: &str = "None";
/// `image.create.time` layout
pub const CREATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub images: Vec<ImageMeta>,
    pub annotations: Vec<AnnotationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// First `-` segment of the file name
    #[serde(rename = "image.make.code")]
    pub make_code: String,
    /// Second `-` segment of the file name
    #[serde(rename = "image.make.year")]
    pub make_year: String,
    #[serde(rename = "image.category")]
    pub category: String,
    #[serde(rename = "image.width")]
    pub width: u32,
    #[serde(rename = "image.height")]
    pub height: u32,
    #[serde(rename = "image.file.name")]
    pub file_name: String,
    #[serde(rename = "image.create.time")]
    pub create_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub id: AnnotationId,
    #[serde(rename = "annotation.type")]
    pub kind: String,
    #[serde(rename = "annotation.text")]
    pub text: String,
    /// `[x, y, width, height]` in pixels
    #[serde(rename = "annotation.bbox")]
    pub bbox: [i64; 4],
}

/// Annotation id as it appears in the JSON document
///
/// Legacy output mixes an integer first id with string ids afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationId {
    Number(u64),
    Text(String),
}

/// How annotation ids are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `0`, then `"2"`, `"3"`, ... (position + 1 as a string)
    #[default]
    Legacy,
    /// `0`, `1`, `2`, ...
    ZeroBased,
    /// `1`, `2`, `3`, ...
    OneBased,
}

impl IdScheme {
    /// Id of the annotation at `position` (0-based)
    pub fn id_for(&self, position: usize) -> AnnotationId {
        let position = position as u64;
        match self {
            IdScheme::Legacy if position == 0 => AnnotationId::Number(0),
            IdScheme::Legacy => AnnotationId::Text((position + 1).to_string()),
            IdScheme::ZeroBased => AnnotationId::Number(position),
            IdScheme::OneBased => AnnotationId::Number(position + 1),
        }
    }
}

impl fmt::Display for IdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdScheme::Legacy => "legacy",
            IdScheme::ZeroBased => "zero_based",
            IdScheme::OneBased => "one_based",
        };
        f.write_str(name)
    }
}

impl FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "legacy" => Ok(IdScheme::Legacy),
            "zero_based" => Ok(IdScheme::ZeroBased),
            "one_based" => Ok(IdScheme::OneBased),
            other => Err(format!("Unknown id scheme: {}", other)),
        }
    }
}

impl AnnotationEntry {
    pub fn rectangle(id: AnnotationId, text: String, bbox: [i64; 4]) -> Self {
        Self {
            id,
            kind: ANNOTATION_TYPE_RECTANGLE.to_string(),
            text,
            bbox,
        }
    }
}
