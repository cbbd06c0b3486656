//! Cross-Source Merger: folds per-blob results into one dataset
//!
//! Sources are handled one at a time; the ingestor owns the dataset, so all
//! merges go through `&mut self`.

use chrono::Utc;
use tracing::{info, warn};
use crate::core::extractor::EntryExtractor;
use crate::types::{ConsolidatedDataset, DominantBasis, IngestSummary, MergeStats, SourceOutcome};

/// Parses blobs and merges them into a consolidated dataset
#[derive(Debug)]
pub struct Ingestor {
    extractor: EntryExtractor,
    dataset: ConsolidatedDataset,
    summary: IngestSummary,
}

impl Ingestor {
    /// Start from an empty dataset
    pub fn new(extractor: EntryExtractor, basis: DominantBasis) -> Self {
        Self::with_dataset(extractor, ConsolidatedDataset::new(basis))
    }

    /// Continue an existing dataset
    pub fn with_dataset(extractor: EntryExtractor, dataset: ConsolidatedDataset) -> Self {
        Self {
            extractor,
            dataset,
            summary: IngestSummary::default(),
        }
    }

    /// Parse one model response into its envelope, without merging
    ///
    /// `response` is the external model call's result: its text, or the
    /// error it failed with.
    pub fn transcribe(&self, source: &str, response: Result<String, String>) -> SourceOutcome {
        transcribe(&self.extractor, source, response)
    }

    /// Parse and merge one model response
    pub fn ingest(&mut self, source: &str, response: Result<String, String>) -> SourceOutcome {
        let outcome = self.transcribe(source, response);
        self.absorb(&outcome);
        outcome
    }

    /// Merge an already-parsed envelope; failed envelopes only count
    pub fn absorb(&mut self, outcome: &SourceOutcome) -> MergeStats {
        self.summary.processed += 1;
        if !outcome.success {
            self.summary.failed += 1;
            warn!(
                source = %outcome.source,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "source failed"
            );
            return MergeStats::default();
        }

        self.summary.successful += 1;
        if outcome.parsed_data.is_empty() {
            self.summary.empty += 1;
        }

        let stats = self.dataset.merge(&outcome.parsed_data);
        self.summary.entries_added += stats.entries_added;
        self.summary.dates_created += stats.dates_created;
        info!(
            source = %outcome.source,
            entries = stats.entries_added,
            dates = stats.dates_touched.len(),
            "merged source"
        );
        stats
    }

    pub fn dataset(&self) -> &ConsolidatedDataset {
        &self.dataset
    }

    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }

    pub fn extractor(&self) -> &EntryExtractor {
        &self.extractor
    }

    pub fn into_dataset(self) -> ConsolidatedDataset {
        self.dataset
    }
}

/// Build the envelope for one model response
pub fn transcribe(extractor: &EntryExtractor, source: &str, response: Result<String, String>) -> SourceOutcome {
    let text = match response {
        Ok(text) => text,
        Err(error) => return SourceOutcome::failure(source, error),
    };

    let parsed = extractor.extract(&text);
    if parsed.is_empty() {
        info!(source, grammar = parsed.grammar.unwrap_or("none"), "no entries found");
    }

    SourceOutcome {
        source: source.to_string(),
        timestamp: Utc::now(),
        success: true,
        error: None,
        raw_response: text,
        grammar: parsed.grammar.map(String::from),
        dropped_entries: parsed.dropped,
        parsed_data: parsed.dates,
    }
}

// =============================================================================
// TESTS
// =============================================================================
