//! Report generation for reconciliation results
//!
//! This module writes everything a run leaves on disk:
//!
//! - **JSON**: tracklist, inventory, matched records and per-side comparison
//!   for each pair, plus the batch summary
//! - **CSV**: per-pair side summary and the batch index (CRLF line endings,
//!   for the spreadsheet users downstream)
//! - **Text**: fixed-width batch table, also printed at the end of a run
//!
//! # Layout
//!
//! ```text
//! <out>/<RUN_tag>/
//!   <pair_id>/
//!     tracklist.json
//!     matched_tracks.json
//!     events.jsonl
//!     wav/wav_analysis.json
//!     compare/compare.json
//!     compare/summary.csv
//!   _batch/
//!     summary.json
//!     summary.csv
//!     summary.txt
//! ```

pub mod csv;
pub mod json;
pub mod table;

use crate::audit::AuditLog;
use crate::error::ReportError;
use crate::model::{BatchSummary, ComparisonResult, MatchedRecord, ReferenceTracklist};
use crate::reconcile::Inventory;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Write one pair's comparison, picking the format from the extension
pub fn generate<P: AsRef<Path>>(path: P, result: &ComparisonResult) -> Result<(), ReportError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = BufWriter::new(File::create(path)?);

    match ext.as_str() {
        "json" => json::write(&mut file, result),
        "txt" => table::write_sides(&mut file, result).map_err(ReportError::from),
        _ => csv::write_sides(&mut file, result),
    }
}

/// One line of the batch index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRow {
    pub pair_id: String,
    pub sides_total: usize,
    pub ok: usize,
    pub warn: usize,
    pub fail: usize,
    pub worst_delta: i64,
}

impl BatchRow {
    pub fn from_result(result: &ComparisonResult) -> Self {
        let counts = result.counts();
        Self {
            pair_id: result.pair_id.clone(),
            sides_total: counts.sides_total,
            ok: counts.ok,
            warn: counts.warn,
            fail: counts.fail,
            worst_delta: result.worst_delta(),
        }
    }
}

/// Directories for one pair's output
#[derive(Debug, Clone)]
pub struct PairDirs {
    pub base: PathBuf,
    pub wav: PathBuf,
    pub compare: PathBuf,
}

impl PairDirs {
    pub fn create(run_dir: &Path, pair_id: &str) -> Result<Self, ReportError> {
        let base = run_dir.join(pair_id);
        let dirs = Self {
            wav: base.join("wav"),
            compare: base.join("compare"),
            base,
        };
        fs::create_dir_all(&dirs.wav)?;
        fs::create_dir_all(&dirs.compare)?;
        Ok(dirs)
    }
}

pub fn save_tracklist(dirs: &PairDirs, tracklist: &ReferenceTracklist) -> Result<(), ReportError> {
    json::write_file(&dirs.base.join("tracklist.json"), tracklist)
}

pub fn save_inventory(dirs: &PairDirs, inventory: &Inventory) -> Result<(), ReportError> {
    json::write_file(&dirs.wav.join("wav_analysis.json"), inventory)
}

pub fn save_matched(dirs: &PairDirs, matched: &[MatchedRecord]) -> Result<(), ReportError> {
    json::write_file(&dirs.base.join("matched_tracks.json"), matched)
}

pub fn save_comparison(dirs: &PairDirs, result: &ComparisonResult) -> Result<(), ReportError> {
    generate(dirs.compare.join("compare.json"), result)?;
    generate(dirs.compare.join("summary.csv"), result)
}

pub fn save_events(dirs: &PairDirs, audit: &AuditLog, run_tag: &str, pair_id: &str) -> Result<(), ReportError> {
    let mut file = BufWriter::new(File::create(dirs.base.join("events.jsonl"))?);
    audit.write_jsonl(&mut file, run_tag, Some(pair_id))?;
    Ok(())
}

/// Write the `_batch` files and return the rendered table
pub fn write_batch_files(batch_dir: &Path, rows: &[BatchRow], summary: &BatchSummary) -> Result<String, ReportError> {
    fs::create_dir_all(batch_dir)?;
    json::write_file(&batch_dir.join("summary.json"), summary)?;

    let mut csv_file = BufWriter::new(File::create(batch_dir.join("summary.csv"))?);
    csv::write_batch(&mut csv_file, rows, summary)?;

    let rendered = table::render_batch(rows, summary);
    fs::write(batch_dir.join("summary.txt"), rendered.replace('\n', "\r\n"))?;
    Ok(rendered)
}
