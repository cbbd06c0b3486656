//! Integration tests for Slice 3
//!
//! Tests the analysis path: consolidated dataset → Analyzer → report

use chrono::NaiveDate;
use confidence_tracker::core::{
    find_streaks, load_dataset, priority_score, save_report, Analyzer, DateNormalizer,
    EntryExtractor, Ingestor,
};
use confidence_tracker::error::AnalysisError;
use confidence_tracker::types::{ConsolidatedDataset, DominantBasis, TrendDirection};
use serde_json::Value;

/// Two weeks of pages; 2026-06-01 is a Monday
const WEEK_1: &str = r#"[
    {"DATE": "June 1", "ENTRY": "Presented the quarterly roadmap", "CATEGORY": "professional_presentation", "TYPE": "professional", "POWER_LEVEL": 8},
    {"DATE": "June 2", "ENTRY": "Presented the roadmap again", "CATEGORY": "professional_presentation", "TYPE": "professional", "POWER_LEVEL": 9},
    {"DATE": "June 3", "ENTRY": "Skipped the gym", "CATEGORY": "physical_wellness", "TYPE": "personal", "POWER_LEVEL": 3},
    {"DATE": "June 4", "ENTRY": "Cooked for friends", "CATEGORY": "social_interactions", "TYPE": "personal", "POWER_LEVEL": 8}
]"#;

const WEEK_2: &str = r#"[
    {"DATE": "June 8", "ENTRY": "Debugged the payment pipeline", "CATEGORY": "technical_skills", "TYPE": "professional", "POWER_LEVEL": 6},
    {"DATE": "June 9", "ENTRY": "Missed the workout again", "CATEGORY": "physical_wellness", "TYPE": "personal", "POWER_LEVEL": 4},
    {"DATE": "June 10", "ENTRY": "Quiet evening", "CATEGORY": "self_image", "TYPE": "personal"}
]"#;

fn dataset() -> ConsolidatedDataset {
    let extractor = EntryExtractor::with_normalizer(DateNormalizer::with_year(2026));
    let mut ingestor = Ingestor::new(extractor, DominantBasis::ConfidenceType);
    ingestor.ingest("week_1.jpg", Ok(WEEK_1.to_string()));
    ingestor.ingest("week_2.jpg", Ok(WEEK_2.to_string()));
    ingestor.into_dataset()
}

fn means(values: &[f64]) -> Vec<(NaiveDate, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (NaiveDate::from_ymd_opt(2026, 6, i as u32 + 1).unwrap(), v))
        .collect()
}

#[test]
fn test_streak_examples() {
    let split = find_streaks(&means(&[8.0, 7.6, 5.0, 8.1, 8.2]));
    let longest: Vec<f64> = split.longest_high_streak.iter().map(|d| d.avg_power).collect();
    assert_eq!(longest, vec![8.0, 7.6]);

    let whole = find_streaks(&means(&[8.0, 8.5, 8.2]));
    assert_eq!(whole.longest_high_streak.len(), 3);
}

/// Gaps between tracked dates do not break a streak
#[test]
fn test_streak_ignores_calendar_gaps() {
    let daily = vec![
        (NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), 8.0),
        (NaiveDate::from_ymd_opt(2026, 6, 5).unwrap(), 9.0),
    ];
    assert_eq!(find_streaks(&daily).longest_high_streak.len(), 2);
}

#[test]
fn test_priority_example() {
    assert!(priority_score(3.0, 0.8, 2) > priority_score(8.0, 0.1, 50));
}

#[test]
fn test_full_report() {
    let report = Analyzer::new(&dataset()).unwrap().report();

    let overall = &report.summary_statistics.overall;
    assert_eq!(overall.total_entries, 6);
    assert_eq!(overall.date_range, "2026-06-01 to 2026-06-09");
    assert_eq!(overall.avg_power_level, 6.33);
    assert_eq!(report.metadata.excluded_entries, 1);
    assert_eq!(report.metadata.total_days_tracked, 6);
    assert_eq!(report.metadata.data_completeness, 66.7);

    // Mon 8, Tue 9, Wed 3, Thu 8 | Mon 6, Tue 4
    assert_eq!(report.temporal_patterns.weekly_trend.declining_weeks, 1);
    let streaks = &report.temporal_patterns.streaks;
    assert_eq!(streaks.longest_high_streak.len(), 2);
    assert_eq!(streaks.total_high_streak_days, 2);
    assert_eq!(streaks.low_confidence_days, 2);

    let top = &report.improvement_areas[0];
    assert_eq!(top.category, "physical_wellness");
    assert_eq!(top.low_score_ratio, 1.0);
    // June 3 → 3, June 9 → 4: the recent entry beats the mean by more than 10%
    assert_eq!(top.recent_trend, TrendDirection::Improving);

    assert!(report.recommendations[0].contains("trending downward"));
    assert!(report.recommendations[1].contains("'physical_wellness'"));
    assert!(report.recommendations.iter().any(|r| r.contains("Thursdays")));
    assert!(report.recommendations.iter().any(|r| r.contains("Wednesdays")));

    let keywords: Vec<&str> = report
        .text_insights
        .high_confidence_keywords
        .iter()
        .map(|k| k.word.as_str())
        .collect();
    assert_eq!(keywords[..2], ["presented", "roadmap"]);
}

#[test]
fn test_report_saved_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("confidence_analysis_report.json");

    let report = Analyzer::new(&dataset()).unwrap().report();
    save_report(&report, &path).unwrap();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for key in [
        "generated_at", "summary_statistics", "temporal_patterns", "improvement_areas",
        "category_correlations", "text_insights", "recommendations", "metadata",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["improvement_areas"][0]["recent_trend"], "improving");
    assert_eq!(json["temporal_patterns"]["by_day_of_week"][0]["day"], "Monday");
}

/// The analyzer reads a dataset written by earlier tooling
#[test]
fn test_analyze_persisted_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final.json");
    std::fs::write(&path, r#"{
        "2026-06-07": {
            "entries": [{"text": "Calm", "category": "self_image", "confidence_type": "personal", "power_level": 7}],
            "daily_confidence_average": 7.0,
            "dominant_confidence_area": "personal"
        }
    }"#).unwrap();

    let dataset = load_dataset(&path, DominantBasis::ConfidenceType).unwrap();
    let stats = Analyzer::new(&dataset).unwrap().summary_statistics();
    assert_eq!(stats.overall.total_entries, 1);
    assert_eq!(stats.overall.std_power_level, None);
}

/// Hand-edited entries outside the power range never reach the statistics
#[test]
fn test_analyze_skips_invalid_stored_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.json");
    std::fs::write(&path, r#"{
        "2026-06-07": {
            "entries": [
                {"text": "", "category": "", "confidence_type": "personal", "power_level": 14},
                {"text": "ok", "category": "self_image", "confidence_type": "personal", "power_level": 0},
                {"text": "Steady", "category": "self_image", "confidence_type": "personal", "power_level": 6}
            ]
        }
    }"#).unwrap();

    let dataset = load_dataset(&path, DominantBasis::ConfidenceType).unwrap();
    assert_eq!(dataset.rejected_entries(), 2);

    let analyzer = Analyzer::new(&dataset).unwrap();
    assert_eq!(analyzer.summary_statistics().overall.avg_power_level, 6.0);
    let areas = analyzer.improvement_areas();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].category, "self_image");
    assert!(areas[0].priority_score >= 0.0);
}

#[test]
fn test_unrated_dataset_is_rejected() {
    let extractor = EntryExtractor::with_normalizer(DateNormalizer::with_year(2026));
    let mut ingestor = Ingestor::new(extractor, DominantBasis::ConfidenceType);
    ingestor.ingest("legacy.jpg", Ok("**TEXT 1:**\nJune 7\n① Feel great today".to_string()));

    let err = Analyzer::new(ingestor.dataset()).unwrap_err();
    assert_eq!(err, AnalysisError::NoRatedEntries);
}
