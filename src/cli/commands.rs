// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use ndarray::{Array1, Array2};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use crate::config::{AttnOcrConfig, CodecConfig};
use crate::results::AnnotationExporter;
use crate::vision::ocr::{AttnLabelCodec, BoundingBox};

/// Arguments for the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Labels to encode
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Longest label in the batch (defaults to the configured value)
    #[arg(long)]
    pub max_length: Option<usize>,
}

/// Arguments for the decode command
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Comma-separated index row, repeat for each sample
    #[arg(long = "row", required = true)]
    pub rows: Vec<IndexRow>,

    /// Cut each row at the first end token
    #[arg(long)]
    pub trim: bool,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Source image, named <code>-<year>-...
    #[arg(long)]
    pub image: PathBuf,

    /// Recognized text, repeat once per region
    #[arg(long = "text", required = true)]
    pub texts: Vec<String>,

    /// Bounding box as x,y,width,height, paired with --text by position
    #[arg(long = "bbox", required = true)]
    pub boxes: Vec<BoundingBox>,

    /// Override the configured output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// One decoder index row given on the command line (`0,2,3,1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow(pub Vec<i64>);

impl FromStr for IndexRow {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid index: {:?}", part))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(IndexRow)
    }
}

/// Build the codec described by the configuration
pub fn build_codec(config: &CodecConfig) -> Result<AttnLabelCodec> {
    match &config.dict_path {
        Some(path) => AttnLabelCodec::from_dict_file(path, config.device)
            .with_context(|| format!("Failed to load alphabet from {}", path.display())),
        None => Ok(AttnLabelCodec::with_device(&config.alphabet, config.device)),
    }
}

/// Stack decode rows into a grid; all rows must share one width
pub fn rows_to_grid(rows: &[IndexRow]) -> Result<Array2<i64>> {
    let width = rows.first().map(|row| row.0.len()).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|row| row.0.len() != width) {
        return Err(anyhow!(
            "Row {} has {} indices, expected {}",
            bad,
            rows[bad].0.len(),
            width
        ));
    }

    let flat: Vec<i64> = rows.iter().flat_map(|row| row.0.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), width), flat).context("Failed to build index grid")
}

/// Encode labels and print one `label<TAB>indices` line per row plus the lengths
///
/// Returns the printed lines.
pub fn encode(config: &AttnOcrConfig, args: EncodeArgs) -> Result<Vec<String>> {
    let codec = build_codec(&config.codec)?;
    let max_length = args.max_length.unwrap_or(config.codec.max_length);

    let batch = codec.encode(&args.texts, max_length)?;
    debug!("Encoded batch on {}", batch.device);

    let mut lines = Vec::with_capacity(args.texts.len() + 1);
    for (row, text) in batch.indices.rows().into_iter().zip(&args.texts) {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        lines.push(format!("{}\t{}", text, values.join(",")));
    }
    let lengths: Vec<String> = batch.lengths.iter().map(|v| v.to_string()).collect();
    lines.push(format!("lengths\t{}", lengths.join(",")));

    for line in &lines {
        println!("{}", line);
    }
    Ok(lines)
}

/// Decode index rows and print one string per row
pub fn decode(config: &AttnOcrConfig, args: DecodeArgs) -> Result<Vec<String>> {
    let codec = build_codec(&config.codec)?;
    let grid = rows_to_grid(&args.rows)?;

    // No decoder output here, so every row is trusted up to its full width
    let lengths = Array1::from_elem(grid.nrows(), grid.ncols() as i32);

    let texts = if args.trim {
        codec.decode_until_end(&grid, &lengths)?
    } else {
        codec.decode(&grid, &lengths)?
    };
    for text in &texts {
        println!("{}", text);
    }
    Ok(texts)
}

/// Write the annotation JSON and return its path
pub fn export(config: &AttnOcrConfig, args: ExportArgs) -> Result<PathBuf> {
    let mut export_config = config.export.clone();
    if let Some(dir) = args.output_dir {
        export_config.output_dir = dir;
    }

    let exporter = AnnotationExporter::new(export_config);
    let path = exporter
        .export(&args.image, &args.texts, &args.boxes)
        .with_context(|| format!("Failed to export annotations for {}", args.image.display()))?;

    println!("✅ json saved: {}", path.display());
    Ok(path)
}
