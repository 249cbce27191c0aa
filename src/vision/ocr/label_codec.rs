// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Label <-> index conversion for the attention recognition decoder
//!
//! The attention decoder consumes a fixed-width grid per batch:
//! column 0 holds the `[GO]` token, the label characters follow, then the
//! `[s]` end token, and the rest of the row is padded with 0 (same value as
//! `[GO]`). The companion length vector counts characters plus `[s]`.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Start token of the attention decoder (index 0, also the pad value)
pub const GO_TOKEN: &str = "[GO]";
/// End-of-sentence token (index 1)
pub const END_TOKEN: &str = "[s]";

pub const GO_INDEX: i64 = 0;
pub const END_INDEX: i64 = 1;

/// Longest label expected in a batch, excluding `[s]`
pub const DEFAULT_BATCH_MAX_LENGTH: usize = 25;

/// Errors raised by the label codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Character {character:?} in label {label:?} is not in the alphabet")]
    UnknownCharacter { character: char, label: String },

    #[error("Label {label:?} has {length} characters (max: {max_length})")]
    LabelTooLong {
        label: String,
        length: usize,
        max_length: usize,
    },

    #[error("Index {index} at row {row}, column {column} is outside the alphabet")]
    IndexOutOfRange { row: usize, column: usize, index: i64 },

    #[error("Length vector has {lengths} entries for {rows} rows")]
    LengthMismatch { rows: usize, lengths: usize },

    #[error("Failed to read alphabet dictionary {path}: {source}")]
    Dictionary {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where an encoded batch is expected to live
///
/// The codec itself only produces host arrays; the tag is carried along so
/// the orchestrator can place the batch next to its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            _ => match lower.strip_prefix("cuda:") {
                Some(ordinal) => ordinal
                    .parse()
                    .map(Device::Cuda)
                    .map_err(|_| format!("Invalid CUDA ordinal: {}", ordinal)),
                None => Err(format!("Unknown device: {}", s)),
            },
        }
    }
}

impl TryFrom<String> for Device {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// Encoded batch ready for the attention decoder
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBatch {
    /// `[batch_size, max_length + 2]` grid of token indices
    pub indices: Array2<i64>,
    /// Characters + 1 (for `[s]`) per row
    pub lengths: Array1<i32>,
    /// Placement requested by the codec configuration
    pub device: Device,
}

impl IndexBatch {
    pub fn batch_size(&self) -> usize {
        self.indices.nrows()
    }

    /// Row width, i.e. `max_length + 2`
    pub fn width(&self) -> usize {
        self.indices.ncols()
    }
}

/// Converts between text labels and attention decoder indices
#[derive(Debug, Clone)]
pub struct AttnLabelCodec {
    /// Index -> token table (`[GO]`, `[s]`, then the alphabet)
    tokens: Vec<String>,
    /// Character -> index lookup for encoding
    dict: HashMap<char, i64>,
    device: Device,
}

impl AttnLabelCodec {
    /// Build a codec for the given alphabet on the CPU
    pub fn new(alphabet: &str) -> Self {
        Self::with_device(alphabet, Device::Cpu)
    }

    /// Build a codec whose batches are tagged for `device`
    ///
    /// Duplicate characters keep the last assigned index.
    pub fn with_device(alphabet: &str, device: Device) -> Self {
        let mut tokens = vec![GO_TOKEN.to_string(), END_TOKEN.to_string()];
        let mut dict = HashMap::new();

        for ch in alphabet.chars() {
            let index = tokens.len() as i64;
            if dict.insert(ch, index).is_some() {
                warn!("Duplicate alphabet character {:?} remapped to {}", ch, index);
            }
            tokens.push(ch.to_string());
        }

        debug!(
            "Attention label codec built with {} classes on {}",
            tokens.len(),
            device
        );

        Self {
            tokens,
            dict,
            device,
        }
    }

    /// Load the alphabet from a dictionary file (one character per line)
    pub fn from_dict_file<P: AsRef<Path>>(path: P, device: Device) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let to_error = |source| CodecError::Dictionary {
            path: path.display().to_string(),
            source,
        };

        let file = File::open(path).map_err(to_error)?;
        let mut alphabet = String::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(to_error)?;
            if let Some(ch) = line.chars().next() {
                alphabet.push(ch);
            }
        }

        info!(
            "Loaded alphabet with {} characters from {}",
            alphabet.chars().count(),
            path.display()
        );
        Ok(Self::with_device(&alphabet, device))
    }

    /// Number of output classes, control tokens included
    pub fn num_classes(&self) -> usize {
        self.tokens.len()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Token text for an index, if it exists
    pub fn token(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
    }

    pub fn index_of(&self, ch: char) -> Option<i64> {
        self.dict.get(&ch).copied()
    }

    /// Convert text labels into decoder input
    ///
    /// Returns a `[batch, max_length + 2]` grid where column 0 is `[GO]` and
    /// each label is followed by `[s]`, plus the per-row decoder lengths.
    pub fn encode<S: AsRef<str>>(
        &self,
        texts: &[S],
        max_length: usize,
    ) -> Result<IndexBatch, CodecError> {
        let width = max_length + 2;
        let mut indices = Array2::<i64>::zeros((texts.len(), width));
        let mut lengths = Vec::with_capacity(texts.len());

        for (row, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let mut encoded = text
                .chars()
                .map(|ch| {
                    self.index_of(ch).ok_or_else(|| CodecError::UnknownCharacter {
                        character: ch,
                        label: text.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            encoded.push(END_INDEX);

            // [GO] occupies column 0, so [s] must land at column max_length + 1 at the latest
            if encoded.len() > max_length + 1 {
                return Err(CodecError::LabelTooLong {
                    label: text.to_string(),
                    length: encoded.len() - 1,
                    max_length,
                });
            }

            for (offset, index) in encoded.iter().enumerate() {
                indices[[row, offset + 1]] = *index;
            }
            lengths.push(encoded.len() as i32);
        }

        debug!("Encoded {} labels into {:?}", texts.len(), indices.dim());

        Ok(IndexBatch {
            indices,
            lengths: Array1::from(lengths),
            device: self.device,
        })
    }

    /// Convert an index grid back to text, row by row
    ///
    /// Every column is decoded, so `[GO]` and `[s]` appear literally in the
    /// output. Use [`decode_until_end`](Self::decode_until_end) to cut at `[s]`.
    pub fn decode(
        &self,
        indices: &Array2<i64>,
        lengths: &Array1<i32>,
    ) -> Result<Vec<String>, CodecError> {
        self.check_lengths(indices, lengths)?;

        indices
            .rows()
            .into_iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(|(column, &index)| self.lookup(row, column, index))
                    .collect::<Result<String, _>>()
            })
            .collect()
    }

    /// Decode and keep only the label: skip `[GO]`, stop at the first `[s]`,
    /// and never read past the row's length entry
    pub fn decode_until_end(
        &self,
        indices: &Array2<i64>,
        lengths: &Array1<i32>,
    ) -> Result<Vec<String>, CodecError> {
        self.check_lengths(indices, lengths)?;

        let mut texts = Vec::with_capacity(indices.nrows());
        for (row, values) in indices.rows().into_iter().enumerate() {
            let limit = (lengths[row].max(0) as usize).min(values.len().saturating_sub(1));
            let mut text = String::new();
            for column in 1..=limit {
                let index = values[column];
                if index == END_INDEX {
                    break;
                }
                text.push_str(self.lookup(row, column, index)?);
            }
            texts.push(text);
        }
        Ok(texts)
    }

    fn check_lengths(
        &self,
        indices: &Array2<i64>,
        lengths: &Array1<i32>,
    ) -> Result<(), CodecError> {
        if indices.nrows() != lengths.len() {
            return Err(CodecError::LengthMismatch {
                rows: indices.nrows(),
                lengths: lengths.len(),
            });
        }
        Ok(())
    }

    fn lookup(&self, row: usize, column: usize, index: i64) -> Result<&str, CodecError> {
        self.token(index)
            .ok_or(CodecError::IndexOutOfRange { row, column, index })
    }
}
