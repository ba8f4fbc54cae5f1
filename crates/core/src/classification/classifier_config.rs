use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::domain::aggregator::Aggregator;
use crate::classification::domain::category::CategoryRange;
use crate::classification::domain::identity::FileStemIdentity;
use crate::shared::constants::{DEFAULT_VOTE_THRESHOLD, UNKNOWN_CATEGORY};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Category ranges and voting parameters, loaded from JSON.
///
/// ```json
/// {
///   "categories": [{ "label": "104", "lower": 120, "upper": 145 }],
///   "vote_threshold": 0.3,
///   "max_distance": null
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub categories: Vec<CategoryRange>,
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold: f64,
    /// Matches farther than this count as unmatched. Off by default.
    #[serde(default)]
    pub max_distance: Option<f64>,
}

fn default_vote_threshold() -> f64 {
    DEFAULT_VOTE_THRESHOLD
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryRange::new("104", 120, 145),
                CategoryRange::new("106", 167, 189),
                CategoryRange::new("108", 207, 237),
            ],
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
            max_distance: None,
        }
    }
}

impl ClassifierConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Format {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one category range is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for c in &self.categories {
            if c.label.trim().is_empty() {
                return Err(ConfigError::Invalid("category label is empty".into()));
            }
            if c.label == UNKNOWN_CATEGORY {
                return Err(ConfigError::Invalid(format!(
                    "category label '{UNKNOWN_CATEGORY}' is reserved"
                )));
            }
            if c.label.contains(['/', '\\']) || c.label == "." || c.label == ".." {
                return Err(ConfigError::Invalid(format!(
                    "category label '{}' is not a valid directory name",
                    c.label
                )));
            }
            if !seen.insert(c.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "category label '{}' appears more than once",
                    c.label
                )));
            }
            if c.lower >= c.upper {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' range ({}, {}) is empty",
                    c.label, c.lower, c.upper
                )));
            }
        }

        if !(0.0..1.0).contains(&self.vote_threshold) {
            return Err(ConfigError::Invalid(format!(
                "vote threshold must be in [0, 1), got {}",
                self.vote_threshold
            )));
        }
        if let Some(d) = self.max_distance {
            if !(0.0..=2.0).contains(&d) {
                return Err(ConfigError::Invalid(format!(
                    "max distance must be in [0, 2], got {d}"
                )));
            }
        }
        Ok(())
    }

    /// Aggregator using file-stem identity tokens.
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(
            self.categories.clone(),
            self.vote_threshold,
            Box::new(FileStemIdentity),
        )
    }
}
