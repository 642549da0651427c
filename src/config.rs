//! Run configuration
//!
//! Defaults cover a normal batch run. An optional TOML file can replace any
//! of them, and command-line flags win over both:
//!
//! ```toml
//! tolerance_warn = 2
//! tolerance_fail = 5
//! id_min_digits = 6
//! out_root = "reports"
//! ```

use crate::error::ConfigError;
use crate::pairing::IdPattern;
use crate::reconcile::Tolerance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tolerance_warn: u32,
    pub tolerance_fail: u32,
    pub id_min_digits: usize,
    pub id_max_digits: usize,
    pub out_root: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Use the built-in stub tracklist instead of reading documents
    pub use_stub: bool,
    /// Parallel pair workers (default: number of CPUs)
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance_warn: 3,
            tolerance_fail: 6,
            id_min_digits: 4,
            id_max_digits: 8,
            out_root: PathBuf::from("_debug_outputs"),
            log_file: None,
            use_stub: false,
            jobs: None,
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tolerance_warn: Option<u32>,
    pub tolerance_fail: Option<u32>,
    pub id_min_digits: Option<usize>,
    pub id_max_digits: Option<usize>,
    pub out_root: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub use_stub: bool,
    pub jobs: Option<usize>,
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the optional file, then CLI overrides
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, o: ConfigOverrides) -> Self {
        if let Some(v) = o.tolerance_warn {
            self.tolerance_warn = v;
        }
        if let Some(v) = o.tolerance_fail {
            self.tolerance_fail = v;
        }
        if let Some(v) = o.id_min_digits {
            self.id_min_digits = v;
        }
        if let Some(v) = o.id_max_digits {
            self.id_max_digits = v;
        }
        if let Some(v) = o.out_root {
            self.out_root = v;
        }
        if o.log_file.is_some() {
            self.log_file = o.log_file;
        }
        if o.jobs.is_some() {
            self.jobs = o.jobs;
        }
        self.use_stub |= o.use_stub;
        self
    }

    /// Only the id digit range can make a run meaningless. Inverted
    /// tolerances are accepted and handled by the comparator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.id_pattern().map(|_| ())
    }

    pub fn id_pattern(&self) -> Result<IdPattern, ConfigError> {
        IdPattern::new(self.id_min_digits, self.id_max_digits)
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.tolerance_warn, self.tolerance_fail)
    }
}
