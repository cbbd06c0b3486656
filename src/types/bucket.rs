//! Date buckets and the consolidated dataset
//!
//! Derived daily fields are never authoritative: every mutation recomputes
//! them from the entry list.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;
use crate::types::Entry;

/// Which entry field `dominant_confidence_area` is the mode of
///
/// Per-blob parsing reports the dominant category; the consolidated dataset
/// defaults to the dominant confidence type. Callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantBasis {
    Category,
    ConfidenceType,
}

/// All entries for one canonical date key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateBucket {
    entries: Vec<Entry>,
    /// Mean power level, one decimal; absent when no entry has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    daily_confidence_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dominant_confidence_area: Option<String>,
}

impl DateBucket {
    /// Create a bucket from its first entry
    pub fn new(first: Entry, basis: DominantBasis) -> Self {
        Self::from_entries(vec![first], basis)
    }

    /// Create a bucket from a list of entries, deriving the daily fields
    pub fn from_entries(entries: Vec<Entry>, basis: DominantBasis) -> Self {
        let mut bucket = Self {
            entries,
            daily_confidence_average: None,
            dominant_confidence_area: None,
        };
        bucket.recompute(basis);
        bucket
    }

    /// Append one entry
    pub fn push(&mut self, entry: Entry, basis: DominantBasis) {
        self.entries.push(entry);
        self.recompute(basis);
    }

    /// Append entries in source order
    pub fn extend<I: IntoIterator<Item = Entry>>(&mut self, entries: I, basis: DominantBasis) {
        self.entries.extend(entries);
        self.recompute(basis);
    }

    /// Re-derive the daily average and the dominant area
    pub fn recompute(&mut self, basis: DominantBasis) {
        self.daily_confidence_average = daily_average(&self.entries);
        self.dominant_confidence_area = match basis {
            DominantBasis::Category => mode(self.entries.iter().map(|e| e.category.as_str())),
            DominantBasis::ConfidenceType => mode(self.entries.iter().map(|e| e.confidence_type.as_str())),
        }
        .map(String::from);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn daily_confidence_average(&self) -> Option<f64> {
        self.daily_confidence_average
    }

    pub fn dominant_confidence_area(&self) -> Option<&str> {
        self.dominant_confidence_area.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mean power level over entries that have one, rounded to one decimal
fn daily_average(entries: &[Entry]) -> Option<f64> {
    let levels: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.power_level)
        .map(f64::from)
        .collect();
    if levels.is_empty() {
        return None;
    }
    let mean = levels.iter().sum::<f64>() / levels.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Most frequent value; ties go to the value seen first
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&'a str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Date-keyed buckets produced from a single blob
pub type DateMap = BTreeMap<String, DateBucket>;

/// What one merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub entries_added: usize,
    pub dates_touched: Vec<String>,
    pub dates_created: usize,
}

/// Every bucket from every source, one per date key
///
/// Serializes as the bare date → bucket mapping. Mutation goes through
/// `&mut self`, so a shared dataset needs one writer at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedDataset {
    buckets: BTreeMap<String, DateBucket>,
    basis: DominantBasis,
    rejected: usize,
}

impl Default for ConsolidatedDataset {
    fn default() -> Self {
        Self::new(DominantBasis::ConfidenceType)
    }
}

impl ConsolidatedDataset {
    /// Create an empty dataset
    pub fn new(basis: DominantBasis) -> Self {
        Self {
            buckets: BTreeMap::new(),
            basis,
            rejected: 0,
        }
    }

    /// Adopt existing buckets, re-deriving their daily fields under `basis`
    ///
    /// Entries with a [`defect`](Entry::defect) are dropped and counted in
    /// [`rejected_entries`](Self::rejected_entries); buckets left empty are
    /// discarded.
    pub fn from_buckets(buckets: BTreeMap<String, DateBucket>, basis: DominantBasis) -> Self {
        let mut rejected = 0;
        let buckets: BTreeMap<String, DateBucket> = buckets
            .into_iter()
            .filter_map(|(date, mut bucket)| {
                let before = bucket.entries.len();
                bucket.entries.retain(|entry| match entry.defect() {
                    Some(reason) => {
                        warn!(date = %date, reason, "dropping stored entry");
                        false
                    }
                    None => true,
                });
                rejected += before - bucket.entries.len();
                if bucket.is_empty() {
                    return None;
                }
                bucket.recompute(basis);
                Some((date, bucket))
            })
            .collect();

        if rejected > 0 {
            warn!(rejected, "stored entries failed validation");
        }
        Self { buckets, basis, rejected }
    }

    /// Entries dropped by [`from_buckets`](Self::from_buckets)
    pub fn rejected_entries(&self) -> usize {
        self.rejected
    }

    /// Append entries to a date, creating the bucket if needed
    ///
    /// Returns true when a new bucket was created. No-op for an empty slice.
    pub fn merge_entries(&mut self, date: &str, entries: &[Entry]) -> bool {
        if entries.is_empty() {
            return false;
        }
        match self.buckets.get_mut(date) {
            Some(bucket) => {
                bucket.extend(entries.iter().cloned(), self.basis);
                false
            }
            None => {
                let bucket = DateBucket::from_entries(entries.to_vec(), self.basis);
                self.buckets.insert(date.to_string(), bucket);
                true
            }
        }
    }

    /// Merge every bucket of another mapping
    ///
    /// Entries are concatenated in source order; there is no deduplication,
    /// so merging the same source twice doubles its entries.
    pub fn merge(&mut self, other: &DateMap) -> MergeStats {
        let mut stats = MergeStats::default();
        for (date, bucket) in other {
            if bucket.is_empty() {
                continue;
            }
            if self.merge_entries(date, bucket.entries()) {
                stats.dates_created += 1;
            }
            stats.entries_added += bucket.len();
            stats.dates_touched.push(date.clone());
        }
        stats
    }

    /// Merge another consolidated dataset
    pub fn merge_dataset(&mut self, other: &ConsolidatedDataset) -> MergeStats {
        self.merge(&other.buckets)
    }

    pub fn get(&self, date: &str) -> Option<&DateBucket> {
        self.buckets.get(date)
    }

    /// Buckets in date-key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DateBucket)> {
        self.buckets.iter()
    }

    pub fn buckets(&self) -> &BTreeMap<String, DateBucket> {
        &self.buckets
    }

    pub fn basis(&self) -> DominantBasis {
        self.basis
    }

    /// Number of date keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Entries across all dates
    pub fn total_entries(&self) -> usize {
        self.buckets.values().map(DateBucket::len).sum()
    }
}

impl Serialize for ConsolidatedDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.buckets.serialize(serializer)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ConfidenceType};

    fn entry(category: Category, kind: ConfidenceType, power: Option<u8>) -> Entry {
        Entry::new("note", category, kind, power)
    }

    #[test]
    fn test_average_rounded_to_one_decimal() {
        let bucket = DateBucket::from_entries(
            vec![
                entry(Category::SelfImage, ConfidenceType::Personal, Some(7)),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(8)),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(8)),
            ],
            DominantBasis::Category,
        );
        assert_eq!(bucket.daily_confidence_average(), Some(7.7));
    }

    #[test]
    fn test_average_ignores_unrated_entries() {
        let bucket = DateBucket::from_entries(
            vec![
                entry(Category::SelfImage, ConfidenceType::Personal, None),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(6)),
            ],
            DominantBasis::Category,
        );
        assert_eq!(bucket.daily_confidence_average(), Some(6.0));

        let unrated = DateBucket::new(
            entry(Category::SelfImage, ConfidenceType::Personal, None),
            DominantBasis::Category,
        );
        assert_eq!(unrated.daily_confidence_average(), None);
    }

    #[test]
    fn test_dominant_tie_first_seen_wins() {
        let bucket = DateBucket::from_entries(
            vec![
                entry(Category::CreativeWork, ConfidenceType::Professional, Some(5)),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(5)),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(5)),
                entry(Category::CreativeWork, ConfidenceType::Professional, Some(5)),
            ],
            DominantBasis::Category,
        );
        assert_eq!(bucket.dominant_confidence_area(), Some("creative_work"));
    }

    #[test]
    fn test_dominant_by_confidence_type() {
        let bucket = DateBucket::from_entries(
            vec![
                entry(Category::TechnicalSkills, ConfidenceType::Professional, Some(5)),
                entry(Category::SelfImage, ConfidenceType::Personal, Some(5)),
                entry(Category::SocialInteractions, ConfidenceType::Personal, Some(5)),
            ],
            DominantBasis::ConfidenceType,
        );
        assert_eq!(bucket.dominant_confidence_area(), Some("personal"));
    }

    #[test]
    fn test_push_recomputes() {
        let mut bucket = DateBucket::new(
            entry(Category::SelfImage, ConfidenceType::Personal, Some(4)),
            DominantBasis::Category,
        );
        bucket.push(entry(Category::CareerDevelopment, ConfidenceType::Professional, Some(9)), DominantBasis::Category);
        bucket.push(entry(Category::CareerDevelopment, ConfidenceType::Professional, Some(8)), DominantBasis::Category);

        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.daily_confidence_average(), Some(7.0));
        assert_eq!(bucket.dominant_confidence_area(), Some("career_development"));
    }

    #[test]
    fn test_merge_concatenates_and_recomputes() {
        let mut dataset = ConsolidatedDataset::new(DominantBasis::ConfidenceType);
        let mut first = DateMap::new();
        first.insert(
            "2026-06-07".to_string(),
            DateBucket::new(entry(Category::SelfImage, ConfidenceType::Personal, Some(6)), DominantBasis::Category),
        );
        let mut second = DateMap::new();
        second.insert(
            "2026-06-07".to_string(),
            DateBucket::from_entries(
                vec![
                    entry(Category::TechnicalSkills, ConfidenceType::Professional, Some(9)),
                    entry(Category::TechnicalSkills, ConfidenceType::Professional, Some(9)),
                ],
                DominantBasis::Category,
            ),
        );

        let stats = dataset.merge(&first);
        assert_eq!(stats.dates_created, 1);
        let stats = dataset.merge(&second);
        assert_eq!(stats.dates_created, 0);
        assert_eq!(stats.entries_added, 2);

        let bucket = dataset.get("2026-06-07").unwrap();
        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.entries()[0].category, Category::SelfImage);
        assert_eq!(bucket.daily_confidence_average(), Some(8.0));
        assert_eq!(bucket.dominant_confidence_area(), Some("professional"));
    }

    #[test]
    fn test_merge_empty_entries_creates_nothing() {
        let mut dataset = ConsolidatedDataset::default();
        assert!(!dataset.merge_entries("2026-01-01", &[]));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_from_buckets_drops_empty_and_rederives() {
        let mut buckets = BTreeMap::new();
        buckets.insert("2026-01-01".to_string(), DateBucket::from_entries(vec![], DominantBasis::Category));
        buckets.insert(
            "2026-01-02".to_string(),
            DateBucket::new(entry(Category::SelfImage, ConfidenceType::Personal, Some(3)), DominantBasis::Category),
        );

        let dataset = ConsolidatedDataset::from_buckets(buckets, DominantBasis::ConfidenceType);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.get("2026-01-02").unwrap().dominant_confidence_area(), Some("personal"));
    }

    #[test]
    fn test_from_buckets_drops_defective_entries() {
        let mut buckets = BTreeMap::new();
        buckets.insert(
            "2026-01-03".to_string(),
            DateBucket::from_entries(
                vec![
                    Entry::new("", Category::SelfImage, ConfidenceType::Personal, Some(6)),
                    entry(Category::SelfImage, ConfidenceType::Personal, Some(14)),
                    entry(Category::TechnicalSkills, ConfidenceType::Professional, Some(6)),
                ],
                DominantBasis::Category,
            ),
        );
        buckets.insert(
            "2026-01-04".to_string(),
            DateBucket::new(entry(Category::SelfImage, ConfidenceType::Personal, Some(0)), DominantBasis::Category),
        );

        let dataset = ConsolidatedDataset::from_buckets(buckets, DominantBasis::ConfidenceType);
        assert_eq!(dataset.rejected_entries(), 3);
        assert_eq!(dataset.len(), 1);
        let bucket = dataset.get("2026-01-03").unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.daily_confidence_average(), Some(6.0));
        assert_eq!(bucket.dominant_confidence_area(), Some("professional"));
    }

    #[test]
    fn test_serializes_as_bare_mapping() {
        let mut dataset = ConsolidatedDataset::new(DominantBasis::Category);
        dataset.merge_entries("2026-06-07", &[entry(Category::SelfImage, ConfidenceType::Personal, Some(7))]);

        let json = serde_json::to_value(&dataset).unwrap();
        let day = &json["2026-06-07"];
        assert_eq!(day["entries"][0]["power_level"], 7);
        assert_eq!(day["daily_confidence_average"], 7.0);
        assert_eq!(day["dominant_confidence_area"], "self_image");
    }
}
