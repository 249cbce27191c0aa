// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition result export

pub mod annotation;
pub mod exporter;

pub use annotation::{AnnotationEntry, AnnotationId, AnnotationRecord, IdScheme, ImageMeta};
pub use exporter::{parse_filename_codes, AnnotationExporter, ExportError, FilenameCodes};
