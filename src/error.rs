use std::io;
use std::path::PathBuf;
use std::result;
use thiserror::Error;

use crate::model::InvalidSide;

/// A duration string was not `MM:SS` with both fields in 0-59
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid duration {0:?}: expected MM:SS with exactly one colon")]
    Format(String),

    #[error("invalid duration {0:?}: minutes and seconds must be numeric")]
    NotNumeric(String),

    #[error("duration {0:?} out of range: minutes and seconds must be 0-59")]
    OutOfRange(String),
}

/// The tracklist document could not be turned into a valid tracklist
#[derive(Error, Debug)]
pub enum TracklistError {
    #[error("failed to read tracklist document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("tracklist document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidSide(#[from] InvalidSide),

    #[error("track {title:?} declares side {declared} but is listed under side {listed}")]
    SideMismatch {
        title: String,
        declared: String,
        listed: String,
    },

    #[error("track {title:?} on side {side} has position {position}, expected >= 1")]
    InvalidPosition { title: String, side: String, position: i64 },

    #[error("track {title:?} on side {side} has no duration")]
    MissingDuration { title: String, side: String },

    #[error("track {title:?} on side {side} has negative duration {duration}")]
    NegativeDuration { title: String, side: String, duration: i64 },

    #[error("track {title:?} on side {side}: {source}")]
    Duration {
        title: String,
        side: String,
        #[source]
        source: DurationParseError,
    },
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("archive not found: {0}")]
    NotFound(PathBuf),

    #[error("not a usable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unreadable audio container: {0}")]
    Container(#[from] symphonia::core::errors::Error),

    #[error("audio stream has no default track")]
    NoTrack,

    #[error("unsupported audio source: {0}")]
    Unsupported(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid id digit range {min}..={max}")]
    IdDigits { min: usize, max: usize },

    #[error("id digit range {min}..={max} does not give a usable pattern: {source}")]
    IdPattern {
        min: usize,
        max: usize,
        #[source]
        source: regex::Error,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum CueCheckError {
    #[error(transparent)]
    Tracklist(#[from] TracklistError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, CueCheckError>;
