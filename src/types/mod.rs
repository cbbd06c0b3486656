//! Core types for Confidence Tracker

mod entry;
mod bucket;
mod outcome;
mod report;

pub use entry::{Category, ConfidenceType, Entry, RawEntry};
pub use bucket::{DateBucket, DateMap, DominantBasis, MergeStats, ConsolidatedDataset};
pub use outcome::{SourceOutcome, IngestSummary};
pub use report::{
    AnalysisReport, SummaryStatistics, OverallStats, TypeBreakdown, TypeStats, CategoryStats,
    TemporalPatterns, DayOfWeekStats, WeeklyTrend, DailyMean, StreakReport,
    TrendDirection, ImprovementArea, CorrelationMatrix, KeywordCount, TextInsights, ReportMetadata,
};
