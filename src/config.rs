//! Runtime configuration
//!
//! Design constants (thresholds, weights, keyword tables) are not
//! configurable; see the crate root and `core::categorizer`. This covers the
//! glue around the core: where files go and how folders are ingested.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;
use crate::types::DominantBasis;

/// Application configuration, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for datasets and reports
    pub output_dir: PathBuf,
    /// File name of the analysis report inside `output_dir`
    pub report_file: String,
    /// What `dominant_confidence_area` reflects in the consolidated dataset
    pub dominant_basis: DominantBasis,
    /// Extensions of raw response files picked up by folder ingest
    pub blob_extensions: Vec<String>,
    /// Files per batch; an intermediate dataset is written after each
    pub batch_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("transcribed_data"),
            report_file: "confidence_analysis_report.json".to_string(),
            dominant_basis: DominantBasis::ConfidenceType,
            blob_extensions: vec!["txt".to_string(), "md".to_string(), "json".to_string()],
            batch_size: 10,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the ingest loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1"));
        }
        if self.blob_extensions.is_empty() {
            return Err(ConfigError::Invalid("blob_extensions must not be empty"));
        }
        Ok(())
    }

    /// Whether a file should be ingested, by extension (case-insensitive)
    pub fn accepts_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.blob_extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Full path of the analysis report
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

// =============================================================================
// TESTS
// =============================================================================
