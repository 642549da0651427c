//! Reference tracklist sources
//!
//! The tracklist printed on a release's cue sheet arrives as a recognition
//! document shaped like:
//!
//! ```json
//! {"sides": {"A": [{"title": "Song", "side": "A", "position": 1, "duration_formatted": "03:45"}]}}
//! ```
//!
//! Each track carries either `duration_sec` or `duration_formatted` (`MM:SS`).
//! The document is validated here, at the boundary, so the reconciliation
//! engine only ever sees well-formed [`ReferenceTracklist`]s. Anything
//! malformed is a hard [`TracklistError`]; nothing is silently defaulted.

use crate::error::{DurationParseError, TracklistError};
use crate::model::{ReferenceTrack, ReferenceTracklist, Side};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Parse `MM:SS` into seconds. Both fields must be integers in 0-59.
pub fn parse_mmss(s: &str) -> Result<u32, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let (mm, ss) = match s.split_once(':') {
        Some((mm, ss)) if !mm.is_empty() && !ss.is_empty() && !ss.contains(':') => (mm, ss),
        _ => return Err(DurationParseError::Format(s.to_string())),
    };

    let field = |part: &str| -> Result<u32, DurationParseError> {
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DurationParseError::NotNumeric(s.to_string()));
        }
        part.parse::<u32>()
            .map_err(|_| DurationParseError::OutOfRange(s.to_string()))
    };

    let minutes = field(mm)?;
    let seconds = field(ss)?;
    if minutes > 59 || seconds > 59 {
        return Err(DurationParseError::OutOfRange(s.to_string()));
    }
    Ok(minutes * 60 + seconds)
}

/// Produces the reference tracklist for one document
pub trait TracklistSource: Send + Sync {
    fn fetch(&self, document: &Path) -> Result<ReferenceTracklist, TracklistError>;

    fn name(&self) -> &'static str;
}

/// Reads recognition output documents from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTracklistSource;

impl TracklistSource for JsonTracklistSource {
    fn fetch(&self, document: &Path) -> Result<ReferenceTracklist, TracklistError> {
        let text = std::fs::read_to_string(document).map_err(|source| TracklistError::Io {
            path: document.to_path_buf(),
            source,
        })?;
        parse_document(&text)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Fixed tracklist for dry runs without recognition output
#[derive(Debug, Clone, Copy, Default)]
pub struct StubTracklistSource;

const STUB_DOCUMENT: &str = r#"{"sides": {
    "A": [{"title": "Stub Song 1", "side": "A", "position": 1, "duration_formatted": "04:12"},
          {"title": "Stub Song 2", "side": "A", "position": 2, "duration_formatted": "03:48"}],
    "B": [{"title": "Stub Song 3", "side": "B", "position": 1, "duration_formatted": "05:00"}]
}}"#;

impl TracklistSource for StubTracklistSource {
    fn fetch(&self, _document: &Path) -> Result<ReferenceTracklist, TracklistError> {
        parse_document(STUB_DOCUMENT)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[derive(Deserialize)]
struct RawDocument {
    sides: BTreeMap<String, Vec<RawTrack>>,
}

#[derive(Deserialize)]
struct RawTrack {
    title: String,
    #[serde(default)]
    side: Option<String>,
    position: i64,
    #[serde(default)]
    duration_sec: Option<i64>,
    #[serde(default)]
    duration_formatted: Option<String>,
}

/// Validate a recognition document. Sides listed with no tracks are dropped.
pub fn parse_document(text: &str) -> Result<ReferenceTracklist, TracklistError> {
    let raw: RawDocument = serde_json::from_str(text)?;

    let mut tracklist = ReferenceTracklist::new();
    for (key, tracks) in raw.sides {
        let listed: Side = key.parse()?;
        for raw_track in tracks {
            tracklist.push(validate_track(listed, raw_track)?);
        }
    }
    Ok(tracklist)
}

fn validate_track(listed: Side, raw: RawTrack) -> Result<ReferenceTrack, TracklistError> {
    if let Some(declared) = raw.side.as_deref() {
        let declared_side: Side = declared.parse()?;
        if declared_side != listed {
            return Err(TracklistError::SideMismatch {
                title: raw.title,
                declared: declared.to_string(),
                listed: listed.to_string(),
            });
        }
    }

    let position = u32::try_from(raw.position)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| TracklistError::InvalidPosition {
            title: raw.title.clone(),
            side: listed.to_string(),
            position: raw.position,
        })?;

    let duration_sec = match (raw.duration_sec, raw.duration_formatted.as_deref()) {
        (Some(secs), _) => u32::try_from(secs).map_err(|_| TracklistError::NegativeDuration {
            title: raw.title.clone(),
            side: listed.to_string(),
            duration: secs,
        })?,
        (None, Some(formatted)) => parse_mmss(formatted).map_err(|source| TracklistError::Duration {
            title: raw.title.clone(),
            side: listed.to_string(),
            source,
        })?,
        (None, None) => {
            return Err(TracklistError::MissingDuration {
                title: raw.title,
                side: listed.to_string(),
            })
        }
    };

    Ok(ReferenceTrack {
        title: raw.title,
        side: listed,
        position,
        duration_sec,
    })
}
