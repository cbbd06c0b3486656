//! Grammars: the textual shapes a transcription response may take
//!
//! Each grammar says whether a blob looks like its shape and, if so, pulls
//! raw entries out of it. The extractor tries them most-structured first.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;
use crate::core::categorizer::HeuristicCategorizer;
use crate::core::date_normalizer::find_date_expression;
use crate::error::GrammarError;
use crate::types::RawEntry;

lazy_static! {
    /// ```json ... ``` fence (tag optional), body captured
    static ref RE_JSON_FENCE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap();

    /// `**FIELD:** value` on its own line
    static ref RE_LABELED_LINE: Regex = Regex::new(
        r"^\*\*(DATE|ENTRY|CATEGORY|TYPE|POWER_LEVEL|POWER):\*\*\s*(.*)$"
    ).unwrap();

    /// `**TEXT 3:**` section header of the legacy format
    static ref RE_TEXT_SECTION: Regex = Regex::new(r"\*\*TEXT \d+:\*\*").unwrap();

    /// Leading circled number ①-④ and the space after it
    static ref RE_CIRCLED: Regex = Regex::new(r"^[①②③④]\s*").unwrap();
}

/// Line prefixes the legacy format uses for headings and commentary
const LEGACY_NOISE_PREFIXES: [&str; 4] = ["**", "CONTEXT:", "CONFIDENCE:", "A collection"];

/// One candidate shape for a transcription response
pub trait Grammar: Send + Sync {
    /// Short name for logs and envelopes
    fn name(&self) -> &'static str;

    /// Does the blob look like this grammar?
    fn triggers(&self, blob: &str) -> bool;

    /// Pull raw entries out of a triggering blob
    ///
    /// An error means the blob should be offered to the next grammar.
    fn extract(&self, blob: &str) -> Result<Vec<RawEntry>, GrammarError>;
}

// =============================================================================
// JSON ARRAY
// =============================================================================

const DATE_KEYS: [&str; 2] = ["DATE", "date"];
const TEXT_KEYS: [&str; 3] = ["ENTRY", "text", "entry"];
const CATEGORY_KEYS: [&str; 2] = ["CATEGORY", "category"];
const TYPE_KEYS: [&str; 3] = ["TYPE", "confidence_type", "type"];
const POWER_KEYS: [&str; 4] = ["POWER_LEVEL", "power_level", "POWER", "power"];

/// A JSON array of entry objects, fenced or bare
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonGrammar;

impl Grammar for JsonGrammar {
    fn name(&self) -> &'static str {
        "json"
    }

    fn triggers(&self, blob: &str) -> bool {
        RE_JSON_FENCE.is_match(blob)
            || (blob.contains("\"DATE\"") && blob.contains("\"ENTRY\""))
            || (blob.contains("\"date\"") && blob.contains("\"text\""))
    }

    fn extract(&self, blob: &str) -> Result<Vec<RawEntry>, GrammarError> {
        let body = RE_JSON_FENCE
            .captures(blob)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(blob)
            .trim();

        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(first_error) => {
                // prose around a bare array
                let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) else {
                    return Err(if body.contains('{') {
                        GrammarError::InvalidJson(first_error)
                    } else {
                        GrammarError::NoJsonPayload
                    });
                };
                if end <= start {
                    return Err(GrammarError::NoJsonPayload);
                }
                serde_json::from_str::<Value>(&body[start..=end])?
            }
        };

        let objects = match value {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            _ => return Err(GrammarError::UnexpectedJsonShape),
        };

        let mut raws = Vec::with_capacity(objects.len());
        for (index, item) in objects.into_iter().enumerate() {
            match item {
                Value::Object(map) => raws.push(raw_from_object(&map)),
                other => debug!(index, kind = json_kind(&other), "skipping non-object JSON item"),
            }
        }
        Ok(raws)
    }
}

fn raw_from_object(map: &Map<String, Value>) -> RawEntry {
    RawEntry {
        date: field(map, &DATE_KEYS),
        text: field(map, &TEXT_KEYS),
        category: field(map, &CATEGORY_KEYS),
        confidence_type: field(map, &TYPE_KEYS),
        power_level: field(map, &POWER_KEYS),
    }
}

/// First alias present with a string or number value, as text
fn field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// LABELED BLOCKS
// =============================================================================

/// `**DATE:**` / `**ENTRY:**` / `**CATEGORY:**` / `**TYPE:**` line blocks
///
/// A new DATE line closes the block before it. Lines that are not markers
/// are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabeledGrammar;

impl Grammar for LabeledGrammar {
    fn name(&self) -> &'static str {
        "labeled"
    }

    fn triggers(&self, blob: &str) -> bool {
        blob.contains("**DATE:**") && blob.contains("**ENTRY:**")
    }

    fn extract(&self, blob: &str) -> Result<Vec<RawEntry>, GrammarError> {
        let mut raws = Vec::new();
        let mut current = RawEntry::default();

        for line in blob.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some(caps) = RE_LABELED_LINE.captures(line) else {
                continue;
            };
            let value = caps[2].trim().to_string();

            match &caps[1] {
                "DATE" => {
                    let finished = std::mem::take(&mut current);
                    if finished.date.is_some() {
                        raws.push(finished);
                    }
                    current.date = Some(value);
                }
                "ENTRY" => current.text = Some(value),
                "CATEGORY" => current.category = Some(value),
                "TYPE" => current.confidence_type = Some(value),
                _ => current.power_level = Some(value),
            }
        }

        if current.date.is_some() {
            raws.push(current);
        }
        Ok(raws)
    }
}

// =============================================================================
// LEGACY FREE TEXT
// =============================================================================

/// `**TEXT N:**` sections: a date line, then one fragment per line
///
/// Carries no labels, so every fragment is categorized heuristically. Always
/// triggers; it is the last resort.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyGrammar {
    categorizer: HeuristicCategorizer,
}

impl LegacyGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragments of one section body (the lines after the date line)
    fn fragments<'a>(&self, lines: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut fragments = Vec::new();
        for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
            if RE_CIRCLED.is_match(line) {
                let content = RE_CIRCLED.replace(line, "");
                let content = content.trim();
                if !content.is_empty() {
                    fragments.push(content.to_string());
                }
            } else if !LEGACY_NOISE_PREFIXES.iter().any(|p| line.starts_with(p)) {
                fragments.push(line.to_string());
            }
        }
        fragments
    }
}

impl Grammar for LegacyGrammar {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn triggers(&self, _blob: &str) -> bool {
        true
    }

    fn extract(&self, blob: &str) -> Result<Vec<RawEntry>, GrammarError> {
        let mut raws = Vec::new();

        // text before the first marker is preamble
        for section in RE_TEXT_SECTION.split(blob).skip(1) {
            let mut lines = section.trim().lines();
            let Some(date_line) = lines.next() else {
                continue;
            };
            let Some(date) = find_date_expression(date_line) else {
                debug!(line = date_line.trim(), "legacy section without a date, skipped");
                continue;
            };

            for text in self.fragments(lines) {
                let (category, confidence_type) = self.categorizer.classify(&text);
                raws.push(RawEntry {
                    date: Some(date.to_string()),
                    text: Some(text),
                    category: Some(category.as_str().to_string()),
                    confidence_type: Some(confidence_type.as_str().to_string()),
                    power_level: None,
                });
            }
        }
        Ok(raws)
    }
}

// =============================================================================
// TESTS
// =============================================================================
