//! Synthetic letter images shared by the integration tests
//!
//! Three 8x8 classes whose edges point in different directions, so their HOG
//! descriptors land in different orientation bins:
//! class 1 vertical edges, class 2 horizontal edges, class 3 diagonal edges.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

pub const SIDE: usize = 8;
pub const PER_CLASS: usize = 5;

/// One CSV row: 1-indexed label followed by 0..=255 pixels
fn row(label: usize, on: impl Fn(usize, usize) -> bool) -> String {
    let mut fields = vec![label.to_string()];
    for r in 0..SIDE {
        for c in 0..SIDE {
            fields.push(if on(r, c) { "255" } else { "0" }.to_string());
        }
    }
    fields.join(",")
}

/// CSV content with `PER_CLASS` shifted edges per class
pub fn letters_csv() -> String {
    let mut lines = Vec::new();
    for k in 2..2 + PER_CLASS {
        lines.push(row(1, |_, c| c >= k));
        lines.push(row(2, |r, _| r >= k));
        lines.push(row(3, |r, c| r + c >= k + 3));
    }
    lines.join("\n") + "\n"
}

pub fn write_letters_csv(path: &Path) {
    let mut file = std::fs::File::create(path).expect("Failed to create data file");
    file.write_all(letters_csv().as_bytes())
        .expect("Failed to write data file");
}

/// Configuration matching the synthetic images: 4 of 5 samples per class
pub fn small_config_json() -> &'static str {
    r#"{
        "samples_per_class": 4,
        "num_classes": 3,
        "image_side": 8,
        "seed": 11,
        "descriptor": {
            "orientations": 9,
            "pixels_per_cell": [4, 4],
            "cells_per_block": [2, 2]
        }
    }"#
}
