// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the label codec and the annotation exporter
//!
//! Values come from defaults, an optional TOML file and `ATTN_OCR_*`
//! environment variables, applied in that order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::results::annotation::IdScheme;
use crate::vision::ocr::label_codec::{Device, DEFAULT_BATCH_MAX_LENGTH};

/// Digits followed by lowercase latin letters
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
pub const DEFAULT_OUTPUT_DIR: &str = "./json";

/// Label codec settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Recognizable characters, in index order
    pub alphabet: String,
    /// Optional dictionary file (one character per line), overrides `alphabet`
    pub dict_path: Option<PathBuf>,
    /// Longest label per batch, excluding the end token
    pub max_length: usize,
    /// Placement tag for encoded batches
    pub device: Device,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.to_string(),
            dict_path: None,
            max_length: DEFAULT_BATCH_MAX_LENGTH,
            device: Device::Cpu,
        }
    }
}

/// Annotation export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `<image stem>.json`; must already exist
    pub output_dir: PathBuf,
    pub id_scheme: IdScheme,
    /// Write through a temp file and rename into place
    pub atomic_writes: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            id_scheme: IdScheme::Legacy,
            atomic_writes: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttnOcrConfig {
    pub codec: CodecConfig,
    pub export: ExportConfig,
}

impl AttnOcrConfig {
    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `ATTN_OCR_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Override fields from `ATTN_OCR_*` keys resolved through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(alphabet) = lookup("ATTN_OCR_ALPHABET") {
            self.codec.alphabet = alphabet;
        }
        if let Some(path) = lookup("ATTN_OCR_DICT_PATH") {
            self.codec.dict_path = Some(PathBuf::from(path));
        }
        if let Some(val) = lookup("ATTN_OCR_MAX_LENGTH") {
            self.codec.max_length = val
                .parse()
                .with_context(|| format!("Invalid ATTN_OCR_MAX_LENGTH: {}", val))?;
        }
        if let Some(val) = lookup("ATTN_OCR_DEVICE") {
            self.codec.device = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid ATTN_OCR_DEVICE: {}", e))?;
        }
        if let Some(dir) = lookup("ATTN_OCR_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(dir);
        }
        if let Some(val) = lookup("ATTN_OCR_ID_SCHEME") {
            self.export.id_scheme = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid ATTN_OCR_ID_SCHEME: {}", e))?;
        }
        if let Some(val) = lookup("ATTN_OCR_ATOMIC_WRITES") {
            self.export.atomic_writes = val.to_lowercase() == "true" || val == "1";
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.codec.alphabet.is_empty() && self.codec.dict_path.is_none() {
            return Err("alphabet must not be empty".to_string());
        }
        if self.codec.max_length == 0 {
            return Err("max_length must be at least 1".to_string());
        }
        if self.export.output_dir.as_os_str().is_empty() {
            return Err("output_dir must not be empty".to_string());
        }
        Ok(())
    }
}
