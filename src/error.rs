//! Error types
//!
//! Parsing and aggregation never fail outright: grammar and entry errors are
//! recovered inside the extractor and only surface in logs.

use std::path::PathBuf;
use thiserror::Error;

/// A grammar triggered but could not produce entries
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("no JSON array found in response")]
    NoJsonPayload,

    #[error("JSON payload is neither an array nor an object")]
    UnexpectedJsonShape,
}

/// Why a raw entry was dropped before insertion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("missing date")]
    MissingDate,

    #[error("missing text")]
    MissingText,

    #[error("missing category")]
    MissingCategory,

    #[error("missing confidence type")]
    MissingConfidenceType,

    #[error("unrecognized confidence type '{0}'")]
    UnknownConfidenceType(String),

    #[error("power level '{0}' is not an integer between 1 and 10")]
    InvalidPowerLevel(String),
}

/// Errors from reading or writing datasets and reports
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset file {0} does not exist")]
    MissingDataset(PathBuf),
}

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Invalid(&'static str),
}

/// Errors from the analysis engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("dataset has no dated entries with a power level")]
    NoRatedEntries,
}
