//! Per-source envelope and ingest summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::DateMap;

/// Result of handling one blob (one photographed page)
///
/// `success` describes the model call, not the parse: a successful call whose
/// text yields nothing has `success = true` and an empty `parsed_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    /// File name or other identifier, diagnostics only
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub raw_response: String,
    /// Grammar that produced `parsed_data`, if any fired
    pub grammar: Option<String>,
    /// Raw entries dropped as malformed
    pub dropped_entries: usize,
    pub parsed_data: DateMap,
}

impl SourceOutcome {
    /// Envelope for a failed model call
    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: Utc::now(),
            success: false,
            error: Some(error.into()),
            raw_response: String::new(),
            grammar: None,
            dropped_entries: 0,
            parsed_data: DateMap::new(),
        }
    }

    /// Entries across all parsed dates
    pub fn entry_count(&self) -> usize {
        self.parsed_data.values().map(|b| b.len()).sum()
    }
}

/// Running totals over an ingest run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Successful sources that yielded no entries
    pub empty: usize,
    pub entries_added: usize,
    pub dates_created: usize,
}
