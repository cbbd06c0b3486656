//! Persistence for datasets and reports
//!
//! Datasets are stored as the bare date → bucket mapping, pretty-printed
//! UTF-8 JSON. Loading re-derives every bucket's daily fields.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{info, warn};
use crate::error::StorageError;
use crate::types::{AnalysisReport, ConsolidatedDataset, DateBucket, DominantBasis};

/// Write the dataset, creating parent directories as needed
pub fn save_dataset(dataset: &ConsolidatedDataset, path: impl AsRef<Path>) -> Result<(), StorageError> {
    write_json(dataset, path.as_ref())?;
    info!(path = %path.as_ref().display(), dates = dataset.len(), "dataset saved");
    Ok(())
}

/// Read a dataset written by [`save_dataset`] or by older tooling
///
/// Stored averages and dominant areas are ignored and recomputed under
/// `basis`. Entries that would not pass extraction (blank text or category,
/// power level outside 1-10) are dropped, as are buckets left empty.
pub fn load_dataset(path: impl AsRef<Path>, basis: DominantBasis) -> Result<ConsolidatedDataset, StorageError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let buckets: BTreeMap<String, DateBucket> = serde_json::from_str(&json)?;
    let dataset = ConsolidatedDataset::from_buckets(buckets, basis);
    if dataset.rejected_entries() > 0 {
        warn!(path = %path.display(), rejected = dataset.rejected_entries(), "invalid entries skipped on load");
    }
    Ok(dataset)
}

/// Dataset to continue from
///
/// A missing file is an error when `must_exist` is set; otherwise it yields
/// an empty dataset, and the first save creates the file.
pub fn open_dataset(path: impl AsRef<Path>, basis: DominantBasis, must_exist: bool) -> Result<ConsolidatedDataset, StorageError> {
    let path = path.as_ref();
    if path.exists() {
        return load_dataset(path, basis);
    }
    if must_exist {
        return Err(StorageError::MissingDataset(path.to_path_buf()));
    }
    info!(path = %path.display(), "dataset file not found, starting empty");
    Ok(ConsolidatedDataset::new(basis))
}

/// Write the analysis report
pub fn save_report(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<(), StorageError> {
    write_json(report, path.as_ref())?;
    info!(path = %path.as_ref().display(), "analysis report saved");
    Ok(())
}

/// `YYYYMMDD_HHMMSS` stamp shared by every file of one run
pub fn run_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `transcriptions_<stamp>.json`, or `transcriptions_<stamp>_batch_<n>.json`
/// for an intermediate save
pub fn transcription_path(dir: impl AsRef<Path>, stamp: &str, batch: Option<usize>) -> PathBuf {
    let name = match batch {
        Some(n) => format!("transcriptions_{}_batch_{}.json", stamp, n),
        None => format!("transcriptions_{}.json", stamp),
    };
    dir.as_ref().join(name)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }
    fs::write(path, json).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// =============================================================================
// TESTS
// =============================================================================
