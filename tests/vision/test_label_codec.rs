// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Attention label codec tests
//!
//! Covers the grid layout handed to the decoder, the length vector,
//! unknown-character failures and recovering labels from decoded rows.

use attn_ocr_tools::vision::ocr::{
    AttnLabelCodec, CodecError, Device, DEFAULT_BATCH_MAX_LENGTH, END_TOKEN, GO_TOKEN,
};

const ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

#[cfg(test)]
mod label_codec_tests {
    use super::*;

    // =============================================================================
    // Encoding
    // =============================================================================

    /// Alphabet "abc", "ab" -> [0, 2, 3, 1, 0, ...], length 3
    #[test]
    fn test_encode_reference_row() {
        let codec = AttnLabelCodec::new("abc");
        let batch = codec.encode(&["ab"], 25).unwrap();

        assert_eq!(batch.indices.shape(), &[1, 27]);
        let row = batch.indices.row(0).to_vec();
        assert_eq!(&row[..4], &[0, 2, 3, 1]);
        assert!(row[4..].iter().all(|&v| v == 0));
        assert_eq!(batch.lengths.to_vec(), vec![3]);
    }

    #[test]
    fn test_lengths_count_end_token() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let labels = ["a", "hello", "", "0123456789"];
        let batch = codec.encode(&labels, DEFAULT_BATCH_MAX_LENGTH).unwrap();

        let expected: Vec<i32> = labels.iter().map(|l| l.chars().count() as i32 + 1).collect();
        assert_eq!(batch.lengths.to_vec(), expected);
    }

    #[test]
    fn test_first_column_is_go_for_every_row() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let batch = codec
            .encode(&["abc", "z", "42", "thequickbrownfox"], DEFAULT_BATCH_MAX_LENGTH)
            .unwrap();

        assert!(batch.indices.column(0).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_end_token_follows_label() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let labels = ["abc", "z", "42"];
        let batch = codec.encode(&labels, 10).unwrap();

        for (row, label) in labels.iter().enumerate() {
            let end_column = label.chars().count() + 1;
            assert_eq!(batch.indices[[row, end_column]], 1);
        }
    }

    #[test]
    fn test_unknown_character_produces_no_batch() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let result = codec.encode(&["valid", "Upper"], DEFAULT_BATCH_MAX_LENGTH);

        match result {
            Err(CodecError::UnknownCharacter { character, label }) => {
                assert_eq!(character, 'U');
                assert_eq!(label, "Upper");
            }
            other => panic!("expected UnknownCharacter, got {:?}", other),
        }
    }

    #[test]
    fn test_device_tag_follows_codec() {
        let codec = AttnLabelCodec::with_device(ALPHABET, Device::Cuda(0));
        assert_eq!(codec.device(), Device::Cuda(0));

        let batch = codec.encode(&["a"], 5).unwrap();
        assert_eq!(batch.device, Device::Cuda(0));
    }

    // =============================================================================
    // Decoding
    // =============================================================================

    #[test]
    fn test_decode_covers_full_row() {
        let codec = AttnLabelCodec::new("abc");
        let batch = codec.encode(&["ca"], 3).unwrap();
        let decoded = codec.decode(&batch.indices, &batch.lengths).unwrap();

        let expected = format!("{go}ca{end}{go}", go = GO_TOKEN, end = END_TOKEN);
        assert_eq!(decoded, vec![expected]);
    }

    #[test]
    fn test_decode_then_truncate_recovers_labels() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let labels = vec!["hello", "world", "", "r2d2", "abcdefghijklmnopqrstuvwxy"];
        let batch = codec.encode(&labels, DEFAULT_BATCH_MAX_LENGTH).unwrap();

        // Caller-side truncation of the raw decode
        let raw = codec.decode(&batch.indices, &batch.lengths).unwrap();
        let truncated: Vec<String> = raw
            .iter()
            .map(|text| {
                let body = text.strip_prefix(GO_TOKEN).unwrap_or(text);
                body.split(END_TOKEN).next().unwrap_or("").to_string()
            })
            .collect();
        assert_eq!(truncated, labels);

        let trimmed = codec
            .decode_until_end(&batch.indices, &batch.lengths)
            .unwrap();
        assert_eq!(trimmed, labels);
    }

    #[test]
    fn test_decode_preserves_row_order() {
        let codec = AttnLabelCodec::new(ALPHABET);
        let labels = ["z", "y", "x"];
        let batch = codec.encode(&labels, 2).unwrap();

        let decoded = codec
            .decode_until_end(&batch.indices, &batch.lengths)
            .unwrap();
        assert_eq!(decoded, labels);
    }

    #[test]
    fn test_shared_codec_across_threads() {
        let codec = std::sync::Arc::new(AttnLabelCodec::new(ALPHABET));

        let handles: Vec<_> = ["abc", "xyz", "123"]
            .into_iter()
            .map(|label| {
                let codec = codec.clone();
                std::thread::spawn(move || {
                    let batch = codec.encode(&[label], 5).unwrap();
                    codec
                        .decode_until_end(&batch.indices, &batch.lengths)
                        .unwrap()
                        .remove(0)
                })
            })
            .collect();

        let decoded: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(decoded, vec!["abc", "xyz", "123"]);
    }
}
