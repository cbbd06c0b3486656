//! Entry Extractor: one raw response → date-keyed buckets
//!
//! Grammars are tried in priority order and the first one that triggers and
//! extracts wins; a JSON decode failure falls through to the next grammar.
//! Every raw entry then passes one insertion point that normalizes the date,
//! validates the fields and files the entry under its date. Per-blob buckets
//! report the dominant *category*.

use tracing::{debug, warn};
use crate::{POWER_LEVEL_MIN, POWER_LEVEL_MAX};
use crate::core::date_normalizer::{is_iso_date, DateNormalizer};
use crate::core::grammar::{Grammar, JsonGrammar, LabeledGrammar, LegacyGrammar};
use crate::error::DropReason;
use crate::types::{Category, ConfidenceType, DateBucket, DateMap, DominantBasis, Entry, RawEntry};

/// Dominant-area rule for buckets built from a single blob
pub const BLOB_DOMINANT_BASIS: DominantBasis = DominantBasis::Category;

/// What one blob produced
#[derive(Debug, Clone, Default)]
pub struct ParsedTranscription {
    /// Grammar that produced the entries; `None` if nothing triggered
    pub grammar: Option<&'static str>,
    pub dates: DateMap,
    /// Raw entries dropped at insertion
    pub dropped: usize,
}

impl ParsedTranscription {
    pub fn entry_count(&self) -> usize {
        self.dates.values().map(DateBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// The grammar cascade plus the insertion point
pub struct EntryExtractor {
    grammars: Vec<Box<dyn Grammar>>,
    normalizer: DateNormalizer,
}

impl std::fmt::Debug for EntryExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryExtractor")
            .field("grammars", &self.grammar_names())
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

impl Default for EntryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryExtractor {
    /// Standard cascade (JSON → labeled → legacy), current year
    pub fn new() -> Self {
        Self::with_normalizer(DateNormalizer::new())
    }

    /// Standard cascade with a given date normalizer
    pub fn with_normalizer(normalizer: DateNormalizer) -> Self {
        Self {
            grammars: vec![
                Box::new(JsonGrammar),
                Box::new(LabeledGrammar),
                Box::new(LegacyGrammar::new()),
            ],
            normalizer,
        }
    }

    /// Names of the grammars, in the order they are tried
    pub fn grammar_names(&self) -> Vec<&'static str> {
        self.grammars.iter().map(|g| g.name()).collect()
    }

    pub fn normalizer(&self) -> DateNormalizer {
        self.normalizer
    }

    /// Parse one blob
    ///
    /// Never fails: a blob nothing can read yields an empty mapping.
    pub fn extract(&self, blob: &str) -> ParsedTranscription {
        for grammar in &self.grammars {
            if !grammar.triggers(blob) {
                continue;
            }
            match grammar.extract(blob) {
                Ok(raws) => {
                    debug!(grammar = grammar.name(), raw_entries = raws.len(), "grammar matched");
                    return self.build(grammar.name(), raws);
                }
                Err(error) => {
                    warn!(grammar = grammar.name(), %error, "grammar failed, trying next");
                }
            }
        }
        ParsedTranscription::default()
    }

    fn build(&self, grammar: &'static str, raws: Vec<RawEntry>) -> ParsedTranscription {
        let mut parsed = ParsedTranscription {
            grammar: Some(grammar),
            ..Default::default()
        };
        for raw in raws {
            if let Err(reason) = self.insert(&mut parsed.dates, raw) {
                debug!(grammar, %reason, "dropping entry");
                parsed.dropped += 1;
            }
        }
        parsed
    }

    /// The single insertion point: normalize, validate, file under the date
    ///
    /// Returns the date key the entry went to. A bucket only comes into
    /// existence together with its first valid entry.
    pub fn insert(&self, dates: &mut DateMap, raw: RawEntry) -> Result<String, DropReason> {
        let (date, entry) = self.validate(raw)?;
        match dates.get_mut(&date) {
            Some(bucket) => bucket.push(entry, BLOB_DOMINANT_BASIS),
            None => {
                dates.insert(date.clone(), DateBucket::new(entry, BLOB_DOMINANT_BASIS));
            }
        }
        Ok(date)
    }

    /// Turn a raw entry into a date key and a complete entry
    pub fn validate(&self, raw: RawEntry) -> Result<(String, Entry), DropReason> {
        let date = non_empty(raw.date).ok_or(DropReason::MissingDate)?;
        let text = non_empty(raw.text).ok_or(DropReason::MissingText)?;
        let category = non_empty(raw.category).ok_or(DropReason::MissingCategory)?;
        let kind = non_empty(raw.confidence_type).ok_or(DropReason::MissingConfidenceType)?;

        let confidence_type = ConfidenceType::from_label(&kind)
            .ok_or(DropReason::UnknownConfidenceType(kind))?;
        let power_level = match non_empty(raw.power_level) {
            Some(value) => Some(parse_power_level(&value)?),
            None => None,
        };

        let key = self.normalizer.normalize(&date);
        if !is_iso_date(&key) {
            warn!(date = %key, "unparseable date, keeping entry under raw key");
        }

        Ok((key, Entry::new(text, Category::from_label(&category), confidence_type, power_level)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Integer 1-10; integral floats such as "7.0" are accepted
fn parse_power_level(value: &str) -> Result<u8, DropReason> {
    let invalid = || DropReason::InvalidPowerLevel(value.to_string());
    let level = match value.parse::<i64>() {
        Ok(level) => level,
        Err(_) => {
            let float = value.parse::<f64>().map_err(|_| invalid())?;
            if float.fract() != 0.0 {
                return Err(invalid());
            }
            float as i64
        }
    };
    if level < i64::from(POWER_LEVEL_MIN) || level > i64::from(POWER_LEVEL_MAX) {
        return Err(invalid());
    }
    Ok(level as u8)
}

// =============================================================================
// TESTS
// =============================================================================
