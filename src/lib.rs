// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod results;
pub mod vision;

pub use config::{AttnOcrConfig, CodecConfig, ExportConfig};
pub use results::{AnnotationExporter, AnnotationRecord, ExportError, IdScheme};
pub use vision::ocr::{AttnLabelCodec, BoundingBox, CodecError, Device, IndexBatch};
