//! Side/position inference from audio file names
//!
//! Archives carry no metadata about which side or track a WAV belongs to;
//! the only hint is the file name. Inference is best-effort and never fails:
//!
//! ```text
//! Name             | Side | Position
//! -----------------|------|---------
//! A1.wav           | A    | 1
//! b 12 - Song.wav  | B    | 12
//! Side A.wav       | A    | -
//! side_b.wav       | B    | -
//! c.wav            | C    | -
//! random.wav       | -    | -
//! ```
//!
//! Underscores and hyphens count as spaces. A position must be a positive
//! number that fits in a `u32`; "A0.wav" infers nothing at all.

use crate::model::Side;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    /// Leading letter immediately followed by digits (spaces allowed between)
    static ref TRACK_PATTERN: Regex = Regex::new(r"^\s*([A-Za-z])\s*([0-9]+)").unwrap();

    /// Optional "side" label, then exactly one letter
    static ref SIDE_PATTERN: Regex = Regex::new(r"(?i)^\s*(?:side)?\s*([a-z])\s*$").unwrap();
}

pub fn infer_side_position(filename: &str) -> (Option<Side>, Option<u32>) {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let base = stem.replace(['_', '-'], " ");
    let base = base.trim();

    if let Some(caps) = TRACK_PATTERN.captures(base) {
        let side = first_char(&caps[1]).and_then(Side::new);
        return match caps[2].parse::<u32>() {
            Ok(position) if position >= 1 => (side, Some(position)),
            _ => (None, None),
        };
    }

    if let Some(caps) = SIDE_PATTERN.captures(base) {
        return (first_char(&caps[1]).and_then(Side::new), None);
    }

    (None, None)
}

fn first_char(s: &str) -> Option<char> {
    s.chars().next()
}
