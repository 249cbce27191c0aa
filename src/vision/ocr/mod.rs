// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Attention OCR glue
//!
//! Components:
//! - `label_codec` - Text label <-> decoder index conversion
//! - `model` - Recognized text regions and their bounding boxes

pub mod label_codec;
pub mod model;

pub use label_codec::{
    AttnLabelCodec, CodecError, Device, IndexBatch, DEFAULT_BATCH_MAX_LENGTH, END_TOKEN, GO_TOKEN,
};
pub use model::{BoundingBox, TextRegion};
