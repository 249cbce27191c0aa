// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Annotation export tests
//!
//! Exercises the full export path against real image files written to a
//! temporary directory: metadata derived from the file name, truncated
//! boxes, id numbering and the failure cases that must not leave a file.

use attn_ocr_tools::config::ExportConfig;
use attn_ocr_tools::results::{AnnotationExporter, ExportError, IdScheme};
use attn_ocr_tools::vision::ocr::BoundingBox;
use image::{Rgb, RgbImage};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

fn exporter(output_dir: &Path, id_scheme: IdScheme) -> AnnotationExporter {
    AnnotationExporter::new(ExportConfig {
        output_dir: output_dir.to_path_buf(),
        id_scheme,
        atomic_writes: true,
    })
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[cfg(test)]
mod annotation_export_tests {
    use super::*;

    /// Reference case: CODE1-2020-0001.jpg, 100x50, one region
    #[test]
    fn test_export_reference_image() {
        let images = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let image = create_image(images.path(), "CODE1-2020-0001.jpg", 100, 50);

        let path = exporter(output.path(), IdScheme::Legacy)
            .export(&image, &["hello"], &[BoundingBox::new(1.9, 2.1, 3.9, 4.1)])
            .unwrap();
        assert_eq!(path, output.path().join("CODE1-2020-0001.json"));

        let json = read_json(&path);
        let meta = &json["images"][0];
        assert_eq!(meta["image.make.code"], "CODE1");
        assert_eq!(meta["image.make.year"], "2020");
        assert_eq!(meta["image.category"], "None");
        assert_eq!(meta["image.width"], 100);
        assert_eq!(meta["image.height"], 50);
        assert_eq!(meta["image.file.name"], "CODE1-2020-0001.jpg");

        let annotations = json["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0]["id"], 0);
        assert_eq!(annotations[0]["annotation.type"], "rectangle");
        assert_eq!(annotations[0]["annotation.text"], "hello");
        assert_eq!(annotations[0]["annotation.bbox"], serde_json::json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_create_time_format() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "X-1999-a.png", 4, 4);

        let path = exporter(dir.path(), IdScheme::Legacy)
            .export(&image, &["t"], &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)])
            .unwrap();

        let json = read_json(&path);
        let created = json["images"][0]["image.create.time"].as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").is_ok());
        assert_eq!(created.len(), 19);
    }

    #[test]
    fn test_legacy_ids_mix_number_and_string() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "CODE1-2020-0002.png", 10, 10);
        let boxes = vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0); 3];

        let path = exporter(dir.path(), IdScheme::Legacy)
            .export(&image, &["a", "b", "c"], &boxes)
            .unwrap();

        let json = read_json(&path);
        let ids: Vec<&Value> = json["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| &a["id"])
            .collect();
        assert_eq!(ids[0], &Value::from(0));
        assert_eq!(ids[1], &Value::from("2"));
        assert_eq!(ids[2], &Value::from("3"));
    }

    #[test]
    fn test_one_based_ids() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "CODE1-2020-0003.png", 10, 10);
        let boxes = vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0); 2];

        let path = exporter(dir.path(), IdScheme::OneBased)
            .export(&image, &["a", "b"], &boxes)
            .unwrap();

        let json = read_json(&path);
        assert_eq!(json["annotations"][0]["id"], 1);
        assert_eq!(json["annotations"][1]["id"], 2);
    }

    #[test]
    fn test_pairing_mismatch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "CODE1-2020-0004.png", 10, 10);

        let err = exporter(dir.path(), IdScheme::Legacy)
            .export(&image, &["a", "b"], &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)])
            .unwrap_err();

        assert!(matches!(err, ExportError::PairingMismatch { texts: 2, boxes: 1 }));
        assert!(!dir.path().join("CODE1-2020-0004.json").exists());
    }

    #[test]
    fn test_filename_without_delimiter_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "scan0001.png", 10, 10);

        let err = exporter(dir.path(), IdScheme::Legacy)
            .export(&image, &["a"], &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)])
            .unwrap_err();

        assert!(matches!(err, ExportError::MalformedFilename(_)));
        assert!(!dir.path().join("scan0001.json").exists());
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "CODE1-2020-0005.png", 10, 10);
        let exporter = exporter(dir.path(), IdScheme::Legacy);
        let bbox = [BoundingBox::new(0.0, 0.0, 1.0, 1.0)];

        exporter.export(&image, &["first"], &bbox).unwrap();
        let path = exporter.export(&image, &["second"], &bbox).unwrap();

        let json = read_json(&path);
        assert_eq!(json["annotations"][0]["annotation.text"], "second");

        // No temp files left behind
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(true, |ext| ext != "json" && ext != "png"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_non_ascii_text_is_not_escaped() {
        let dir = TempDir::new().unwrap();
        let image = create_image(dir.path(), "서울-2022-001.png", 10, 10);

        let path = exporter(dir.path(), IdScheme::Legacy)
            .export(&image, &["12가3456"], &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"image.make.code\": \"서울\""));
        assert!(content.contains("12가3456"));
        assert!(!content.contains("\\u"));
    }
}
