//! Confidence Tracker: diary transcriptions in, confidence dataset and analysis out
//!
//! Pipeline: raw model text → EntryExtractor (grammar cascade + heuristic
//! categorizer) → per-date buckets → ConsolidatedDataset → Analyzer

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// POWER LEVELS
// =============================================================================

/// Lowest power level a diary entry can carry
pub const POWER_LEVEL_MIN: u8 = 1;

/// Highest power level a diary entry can carry
pub const POWER_LEVEL_MAX: u8 = 10;

// =============================================================================
// STREAKS
// =============================================================================

/// Daily mean at or above this is a "high" day
pub const HIGH_STREAK_THRESHOLD: f64 = 7.5;

/// Daily mean at or below this is a low confidence day
pub const LOW_DAY_THRESHOLD: f64 = 5.5;

/// Shortest run of high days that counts as a streak
pub const MIN_STREAK_LENGTH: usize = 2;

// =============================================================================
// IMPROVEMENT PRIORITY
// =============================================================================

/// Entries at or below this power level count as low scores
pub const LOW_SCORE_CUTOFF: u8 = 5;

/// Weight of (10 - avg_power)
pub const PRIORITY_WEIGHT_POWER: f64 = 0.4;

/// Weight of (10 * low_score_ratio)
pub const PRIORITY_WEIGHT_LOW_RATIO: f64 = 0.3;

/// Weight of 10 / (frequency + 1)
pub const PRIORITY_WEIGHT_RARITY: f64 = 0.3;

/// Date quantile that splits "recent" entries from the rest
pub const RECENT_QUANTILE: f64 = 0.7;

/// Recent mean above overall * ratio → improving
pub const TREND_IMPROVING_RATIO: f64 = 1.1;

/// Recent mean below overall * ratio → declining
pub const TREND_DECLINING_RATIO: f64 = 0.9;

// =============================================================================
// TEXT INSIGHTS & RECOMMENDATIONS
// =============================================================================

/// Entries at or above this power level feed the keyword insights
pub const HIGH_CONFIDENCE_CUTOFF: u8 = 8;

/// Tokens this long or shorter are ignored
pub const MAX_IGNORED_TOKEN_LEN: usize = 3;

/// Number of keywords reported
pub const TOP_KEYWORD_COUNT: usize = 10;

/// One confidence type counts as neglected below this share of the other
pub const TYPE_IMBALANCE_RATIO: f64 = 0.5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
