// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AttnOcrConfig;

/// Attention OCR label and annotation tools
#[derive(Parser, Debug)]
#[command(name = "attn-ocr")]
#[command(version)]
#[command(about = "Label encoding and annotation export for attention OCR", long_about = None)]
pub struct Cli {
    /// TOML configuration file (can also be set via ATTN_OCR_CONFIG env var)
    #[arg(long, global = true, env = "ATTN_OCR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode labels into decoder index rows
    Encode(commands::EncodeArgs),

    /// Decode index rows back into text
    Decode(commands::DecodeArgs),

    /// Write the annotation JSON for one image
    Export(commands::ExportArgs),
}

/// Resolve configuration: file (if given) or defaults, then environment
pub fn load_config(path: Option<&PathBuf>) -> Result<AttnOcrConfig> {
    let mut config = match path {
        Some(path) => AttnOcrConfig::from_file(path)?,
        None => AttnOcrConfig::default(),
    };
    config.apply_env()?;
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Encode(args) => commands::encode(&config, args).map(|_| ()),
        Commands::Decode(args) => commands::decode(&config, args).map(|_| ()),
        Commands::Export(args) => commands::export(&config, args).map(|_| ()),
    }
}
