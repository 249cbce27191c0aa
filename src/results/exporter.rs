// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON annotation export for recognized text regions
//!
//! One file per image: `<output_dir>/<image stem>.json`, pretty-printed
//! with 4-space indentation and non-ASCII text written as-is.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use thiserror::Error;
use tracing::{debug, info};

use super::annotation::{
    AnnotationEntry, AnnotationRecord, ImageMeta, CREATE_TIME_FORMAT, IMAGE_CATEGORY_NONE,
};
use crate::config::ExportConfig;
use crate::vision::image_utils::{read_image_info, ImageError};
use crate::vision::ocr::model::{BoundingBox, TextRegion};

const JSON_INDENT: &[u8] = b"    ";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Image file name {0:?} does not follow the <code>-<year>-... convention")]
    MalformedFilename(String),

    #[error("Got {texts} recognized texts but {boxes} bounding boxes")]
    PairingMismatch { texts: usize, boxes: usize },

    #[error("No recognized text regions to export")]
    NoRegions,

    #[error("Bounding box {position} has a non-finite coordinate: {bbox:?}")]
    InvalidBoundingBox { position: usize, bbox: BoundingBox },

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize annotation record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Metadata codes encoded in an image file name (`<code>-<year>-...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCodes {
    pub make_code: String,
    pub make_year: String,
}

/// Split a file name on `-` and take the first two segments
///
/// The year segment is taken verbatim, so `A-2020.jpg` yields `2020.jpg`.
pub fn parse_filename_codes(file_name: &str) -> Result<FilenameCodes, ExportError> {
    let mut segments = file_name.split('-');
    match (segments.next(), segments.next()) {
        (Some(code), Some(year)) => Ok(FilenameCodes {
            make_code: code.to_string(),
            make_year: year.to_string(),
        }),
        _ => Err(ExportError::MalformedFilename(file_name.to_string())),
    }
}

/// Writes one annotation JSON document per image
#[derive(Debug, Clone)]
pub struct AnnotationExporter {
    config: ExportConfig,
}

impl AnnotationExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Destination for an image's annotation file
    pub fn output_path<P: AsRef<Path>>(&self, image_path: P) -> Result<PathBuf, ExportError> {
        let image_path = image_path.as_ref();
        let stem = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ExportError::MalformedFilename(image_path.display().to_string()))?;
        Ok(self.config.output_dir.join(format!("{}.json", stem)))
    }

    /// Build and write the annotation file for one image
    ///
    /// Returns the path of the written file. The output directory is not
    /// created; an existing file with the same name is replaced.
    pub fn export<P, S>(
        &self,
        image_path: P,
        texts: &[S],
        boxes: &[BoundingBox],
    ) -> Result<PathBuf, ExportError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let image_path = image_path.as_ref();
        let record = self.build_record(image_path, texts, boxes, Local::now())?;
        let output_path = self.output_path(image_path)?;

        self.write_record(&record, &output_path)?;

        info!(
            "Annotation JSON saved to {} ({} regions)",
            output_path.display(),
            record.annotations.len()
        );
        Ok(output_path)
    }

    /// Same as [`export`](Self::export) for regions already paired by the caller
    pub fn export_regions<P: AsRef<Path>>(
        &self,
        image_path: P,
        regions: &[TextRegion],
    ) -> Result<PathBuf, ExportError> {
        let texts: Vec<&str> = regions.iter().map(|r| r.text.as_str()).collect();
        let boxes: Vec<BoundingBox> = regions.iter().map(|r| r.bounding_box).collect();
        self.export(image_path, &texts, &boxes)
    }

    /// Assemble the record without touching the output directory
    pub fn build_record<P, S>(
        &self,
        image_path: P,
        texts: &[S],
        boxes: &[BoundingBox],
        created_at: DateTime<Local>,
    ) -> Result<AnnotationRecord, ExportError>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let image_path = image_path.as_ref();

        if texts.len() != boxes.len() {
            return Err(ExportError::PairingMismatch {
                texts: texts.len(),
                boxes: boxes.len(),
            });
        }
        if texts.is_empty() {
            return Err(ExportError::NoRegions);
        }
        if let Some(position) = boxes.iter().position(|b| !b.is_finite()) {
            return Err(ExportError::InvalidBoundingBox {
                position,
                bbox: boxes[position],
            });
        }

        let file_name = image_path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ExportError::MalformedFilename(image_path.display().to_string()))?;
        let codes = parse_filename_codes(file_name)?;

        let info = read_image_info(image_path)?;
        debug!(
            "Exporting {} regions for {} ({}x{})",
            texts.len(),
            file_name,
            info.width,
            info.height
        );

        let annotations = texts
            .iter()
            .zip(boxes)
            .enumerate()
            .map(|(position, (text, bbox))| {
                AnnotationEntry::rectangle(
                    self.config.id_scheme.id_for(position),
                    text.as_ref().to_string(),
                    bbox.truncated(),
                )
            })
            .collect();

        Ok(AnnotationRecord {
            images: vec![ImageMeta {
                make_code: codes.make_code,
                make_year: codes.make_year,
                category: IMAGE_CATEGORY_NONE.to_string(),
                width: info.width,
                height: info.height,
                file_name: file_name.to_string(),
                create_time: created_at.format(CREATE_TIME_FORMAT).to_string(),
            }],
            annotations,
        })
    }

    /// Serialize `record` to `path`
    pub fn write_record(&self, record: &AnnotationRecord, path: &Path) -> Result<(), ExportError> {
        let json = to_pretty_json(record)?;

        if !self.config.atomic_writes {
            fs::write(path, &json)?;
            return Ok(());
        }

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Same permissions a plain fs::write would get (0o666 minus umask)
        let mut builder = Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut temp = builder.tempfile_in(dir)?;
        temp.write_all(&json)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Default for AnnotationExporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

/// 4-space indented JSON; serde_json leaves non-ASCII characters unescaped
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));
    value.serialize(&mut serializer)?;
    Ok(buffer)
}
