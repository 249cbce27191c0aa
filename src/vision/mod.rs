// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision helpers around a pre-trained attention OCR model
//!
//! This module provides:
//! - Label/index conversion for the attention decoder
//! - Header-only image probing for annotation export

pub mod image_utils;
pub mod ocr;

pub use image_utils::{read_image_info, ImageError, ImageInfo};
