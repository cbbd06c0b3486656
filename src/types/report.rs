//! Analysis report structures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Full analysis of a consolidated dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub summary_statistics: SummaryStatistics,
    pub temporal_patterns: TemporalPatterns,
    /// Highest priority first
    pub improvement_areas: Vec<ImprovementArea>,
    pub category_correlations: CorrelationMatrix,
    pub text_insights: TextInsights,
    pub recommendations: Vec<String>,
    pub metadata: ReportMetadata,
}

// =============================================================================
// SUMMARY
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub overall: OverallStats,
    pub by_type: TypeBreakdown,
    /// In order of first appearance
    pub by_category: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_entries: usize,
    /// "<first> to <last>"
    pub date_range: String,
    pub avg_power_level: f64,
    /// Sample standard deviation; absent for a single entry
    pub std_power_level: Option<f64>,
    pub median_power_level: f64,
    /// Smallest of the most frequent levels
    pub mode_power_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub personal: TypeStats,
    pub professional: TypeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    pub count: usize,
    /// Absent when `count` is zero
    pub avg_power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub avg_power: f64,
    /// Share of all entries, one decimal
    pub percentage: f64,
}

// =============================================================================
// TEMPORAL
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalPatterns {
    /// Monday first; only days that occur
    pub by_day_of_week: Vec<DayOfWeekStats>,
    pub weekly_trend: WeeklyTrend,
    pub streaks: StreakReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekStats {
    pub day: String,
    pub avg_power: f64,
    pub count: usize,
}

/// Weeks whose mean strictly beat / fell below the previous week's
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    pub improving_weeks: usize,
    pub declining_weeks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMean {
    pub date: NaiveDate,
    pub avg_power: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakReport {
    pub longest_high_streak: Vec<DailyMean>,
    pub total_high_streak_days: usize,
    pub low_confidence_days: usize,
}

// =============================================================================
// IMPROVEMENT PRIORITY
// =============================================================================

/// Recent-vs-overall direction of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementArea {
    pub category: String,
    pub avg_power: f64,
    pub frequency: usize,
    pub low_score_ratio: f64,
    pub recent_trend: TrendDirection,
    /// Higher means more in need of attention
    pub priority_score: f64,
}

// =============================================================================
// CO-OCCURRENCE & TEXT
// =============================================================================

/// Pearson correlation of per-date category counts
///
/// `values[i][j]` pairs `categories[i]` with `categories[j]`; `None` where a
/// column has no variance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub categories: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Look up a pair by label
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.categories.iter().position(|c| c == a)?;
        let j = self.categories.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInsights {
    pub high_confidence_keywords: Vec<KeywordCount>,
    /// Characters, one decimal
    pub average_entry_length: f64,
    pub longest_entry: String,
    pub shortest_entry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub total_days_tracked: usize,
    /// Tracked days as a percentage of the covered span, one decimal
    pub data_completeness: f64,
    /// Entries left out of the analysis (no power level or odd date key)
    pub excluded_entries: usize,
}
