//! Discovery and pairing of tracklist documents with audio deliveries
//!
//! Both sides of a pair carry the same numeric catalogue id somewhere in
//! their file names (`cue_123456.json` ↔ `123456_master.zip`). A file whose
//! stem yields anything other than exactly one id of the configured length
//! is reported as ambiguous and left unpaired.

use crate::audit::{AuditSink, Severity};
use crate::error::ConfigError;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["json"];
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "wav"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingItem {
    pub pair_id: String,
    pub document: PathBuf,
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairingResult {
    pub pairs: Vec<PairingItem>,
    pub unmatched_documents: Vec<PathBuf>,
    pub unmatched_archives: Vec<PathBuf>,
}

/// Matches every run of `min..=max` digits in a file stem
#[derive(Debug, Clone)]
pub struct IdPattern {
    regex: Regex,
}

impl IdPattern {
    pub fn new(min_digits: usize, max_digits: usize) -> Result<Self, ConfigError> {
        if min_digits == 0 || min_digits > max_digits {
            return Err(ConfigError::IdDigits {
                min: min_digits,
                max: max_digits,
            });
        }
        let regex = Regex::new(&format!("[0-9]{{{},{}}}", min_digits, max_digits)).map_err(|source| {
            ConfigError::IdPattern {
                min: min_digits,
                max: max_digits,
                source,
            }
        })?;
        Ok(Self { regex })
    }

    pub fn extract_ids(&self, stem: &str) -> Vec<String> {
        self.regex.find_iter(stem).map(|m| m.as_str().to_string()).collect()
    }
}

pub fn discover_and_pair(
    document_dir: &Path,
    archive_dir: &Path,
    ids: &IdPattern,
    sink: &mut dyn AuditSink,
) -> PairingResult {
    let documents = collect_files(document_dir, DOCUMENT_EXTENSIONS);
    let archives = collect_files(archive_dir, ARCHIVE_EXTENSIONS);

    let document_map = index_by_id(&documents, ids, "document", sink);
    let archive_map = index_by_id(&archives, ids, "archive", sink);

    let pairs: Vec<PairingItem> = document_map
        .iter()
        .filter_map(|(id, docs)| {
            docs.first().map(|document| PairingItem {
                pair_id: id.clone(),
                document: document.clone(),
                archive: archive_map.get(id).and_then(|a| a.first()).cloned(),
            })
        })
        .collect();

    let unmatched_documents = documents
        .iter()
        .filter(|d| !pairs.iter().any(|p| &p.document == *d))
        .cloned()
        .collect();
    let unmatched_archives = archives
        .iter()
        .filter(|a| !pairs.iter().any(|p| p.archive.as_ref() == Some(*a)))
        .cloned()
        .collect();

    let result = PairingResult {
        pairs,
        unmatched_documents,
        unmatched_archives,
    };
    sink.record(
        "file_matching_finish",
        Severity::Info,
        json!({
            "pairs_found": result.pairs.len(),
            "unmatched_documents": result.unmatched_documents,
            "unmatched_archives": result.unmatched_archives,
        }),
    );
    result
}

fn collect_files(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn index_by_id(
    files: &[PathBuf],
    ids: &IdPattern,
    kind: &str,
    sink: &mut dyn AuditSink,
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut map: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let mut found = ids.extract_ids(stem);
        if found.len() == 1 {
            if let Some(id) = found.pop() {
                map.entry(id).or_default().push(file.clone());
            }
        } else {
            sink.record(
                "ambiguous_pair",
                Severity::Warn,
                json!({"kind": kind, "path": file.display().to_string(), "candidates": found}),
            );
        }
    }
    map
}
