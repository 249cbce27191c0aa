// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image probing for annotation export
//!
//! Only the image header is read; pixel data is never decoded.

use image::{ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Custom error types for image probing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read image header: {0}")]
    DecodeFailed(String),
}

/// Image information extracted from the header
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
}

/// Read width, height and format of an image file
///
/// The file handle lives only for the duration of this call.
///
/// # Errors
/// * `ImageError::NotFound` - the path does not exist
/// * `ImageError::UnsupportedFormat` - the content is not a known image format
/// * `ImageError::DecodeFailed` - the header could not be parsed
pub fn read_image_info<P: AsRef<Path>>(path: P) -> Result<ImageInfo, ImageError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ImageError::NotFound(path.to_path_buf()));
    }

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| ImageError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let format = reader
        .format()
        .ok_or_else(|| ImageError::UnsupportedFormat(path.to_path_buf()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    Ok(ImageInfo {
        width,
        height,
        format,
    })
}
