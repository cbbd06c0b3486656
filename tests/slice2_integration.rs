//! Integration tests for Slice 2
//!
//! Tests cross-source merging and dataset persistence

use confidence_tracker::core::{load_dataset, save_dataset, DateNormalizer, EntryExtractor, Ingestor};
use confidence_tracker::types::{ConsolidatedDataset, DateMap, DominantBasis};
use pretty_assertions::assert_eq;

const PAGE_1: &str = r#"[
    {"DATE": "June 7", "ENTRY": "Demoed the dashboard", "CATEGORY": "professional_presentation", "TYPE": "professional", "POWER_LEVEL": 9},
    {"DATE": "June 8", "ENTRY": "Skipped lunch", "CATEGORY": "physical_wellness", "TYPE": "personal", "POWER_LEVEL": 4}
]"#;

const PAGE_2: &str = "**DATE:** June 7\n**ENTRY:** Honest talk with my sister\n**CATEGORY:** social_interactions\n**TYPE:** personal\n**POWER:** 7";

const PAGE_3: &str = "**TEXT 1:**\nJune 9\n① Learned a new habit\n② Fixed the pipeline bug";

fn extractor() -> EntryExtractor {
    EntryExtractor::with_normalizer(DateNormalizer::with_year(2026))
}

fn parse(blob: &str) -> DateMap {
    extractor().extract(blob).dates
}

/// Merge order changes entry order, never entry count
#[test]
fn test_merge_count_is_order_independent() {
    let pages = [parse(PAGE_1), parse(PAGE_2), parse(PAGE_3)];
    let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];

    let totals: Vec<(usize, usize)> = orders
        .iter()
        .map(|order| {
            let mut dataset = ConsolidatedDataset::default();
            for &i in order {
                dataset.merge(&pages[i]);
            }
            (dataset.len(), dataset.total_entries())
        })
        .collect();

    assert_eq!(totals, vec![(3, 5); 3]);
}

/// Merged buckets are recomputed from the full entry list
#[test]
fn test_merge_recomputes_daily_fields() {
    let mut ingestor = Ingestor::new(extractor(), DominantBasis::ConfidenceType);
    ingestor.ingest("page_1.jpg", Ok(PAGE_1.to_string()));
    ingestor.ingest("page_2.jpg", Ok(PAGE_2.to_string()));

    let june7 = ingestor.dataset().get("2026-06-07").unwrap();
    let texts: Vec<&str> = june7.entries().iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Demoed the dashboard", "Honest talk with my sister"]);
    assert_eq!(june7.daily_confidence_average(), Some(8.0));
    assert_eq!(june7.dominant_confidence_area(), Some("professional"));
}

/// Category is the configurable alternative for the consolidated dataset
#[test]
fn test_category_basis() {
    let mut ingestor = Ingestor::new(extractor(), DominantBasis::Category);
    ingestor.ingest("page_1.jpg", Ok(PAGE_1.to_string()));
    let june8 = ingestor.dataset().get("2026-06-08").unwrap();
    assert_eq!(june8.dominant_confidence_area(), Some("physical_wellness"));
}

/// Failed calls and empty pages never abort the run
#[test]
fn test_mixed_run_summary() {
    let mut ingestor = Ingestor::new(extractor(), DominantBasis::ConfidenceType);
    ingestor.ingest("page_1.jpg", Ok(PAGE_1.to_string()));
    ingestor.ingest("page_2.jpg", Err("rate limited".to_string()));
    ingestor.ingest("page_3.jpg", Ok("Too blurry to read.".to_string()));
    ingestor.ingest("page_4.jpg", Ok(PAGE_3.to_string()));

    let summary = ingestor.summary();
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.entries_added, 4);
    assert_eq!(summary.dates_created, 3);
}

/// Save → load keeps entries and re-derives the daily fields
#[test]
fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcriptions.json");

    let mut ingestor = Ingestor::new(extractor(), DominantBasis::ConfidenceType);
    for page in [PAGE_1, PAGE_2, PAGE_3] {
        ingestor.ingest("page", Ok(page.to_string()));
    }
    let dataset = ingestor.into_dataset();

    save_dataset(&dataset, &path).unwrap();
    let loaded = load_dataset(&path, DominantBasis::ConfidenceType).unwrap();
    assert_eq!(loaded, dataset);

    // same entries under the other rule
    let by_category = load_dataset(&path, DominantBasis::Category).unwrap();
    assert_eq!(by_category.total_entries(), dataset.total_entries());
    assert_eq!(
        by_category.get("2026-06-07").unwrap().dominant_confidence_area(),
        Some("professional_presentation")
    );
}

/// A continued run appends to the loaded dataset
#[test]
fn test_continue_from_saved_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let mut first = Ingestor::new(extractor(), DominantBasis::ConfidenceType);
    first.ingest("page_1.jpg", Ok(PAGE_1.to_string()));
    save_dataset(first.dataset(), &path).unwrap();

    let loaded = load_dataset(&path, DominantBasis::ConfidenceType).unwrap();
    let mut second = Ingestor::with_dataset(extractor(), loaded);
    let outcome = second.transcribe("page_2.jpg", Ok(PAGE_2.to_string()));
    let stats = second.absorb(&outcome);

    assert_eq!(stats.dates_created, 0);
    assert_eq!(stats.dates_touched, vec!["2026-06-07".to_string()]);
    assert_eq!(second.dataset().get("2026-06-07").unwrap().len(), 2);
}
