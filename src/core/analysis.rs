//! Analysis Engine: longitudinal statistics over a consolidated dataset
//!
//! The dataset is flattened into one row per rated entry. Entries without a
//! power level, or filed under a key that is not a calendar date, are left
//! out and counted in the report metadata.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use lazy_static::lazy_static;
use tracing::debug;
use crate::{
    HIGH_STREAK_THRESHOLD, LOW_DAY_THRESHOLD, MIN_STREAK_LENGTH, LOW_SCORE_CUTOFF,
    PRIORITY_WEIGHT_POWER, PRIORITY_WEIGHT_LOW_RATIO, PRIORITY_WEIGHT_RARITY,
    RECENT_QUANTILE, TREND_IMPROVING_RATIO, TREND_DECLINING_RATIO,
    HIGH_CONFIDENCE_CUTOFF, MAX_IGNORED_TOKEN_LEN, TOP_KEYWORD_COUNT, TYPE_IMBALANCE_RATIO,
};
use crate::error::AnalysisError;
use crate::types::{
    AnalysisReport, CategoryStats, ConfidenceType, ConsolidatedDataset, CorrelationMatrix,
    DailyMean, DayOfWeekStats, ImprovementArea, KeywordCount, OverallStats, ReportMetadata,
    StreakReport, SummaryStatistics, TemporalPatterns, TextInsights, TrendDirection,
    TypeBreakdown, TypeStats, WeeklyTrend,
};

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "and", "to", "of", "in", "a", "my", "i", "with", "for", "on", "at", "about",
    ]
    .into_iter()
    .collect();
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu,
    Weekday::Fri, Weekday::Sat, Weekday::Sun,
];

/// One rated entry with its date decorations
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub text: String,
    pub category: String,
    pub confidence_type: ConfidenceType,
    pub power_level: u8,
    pub daily_average: Option<f64>,
    pub dominant_area: Option<String>,
    pub day_of_week: Weekday,
    /// ISO year and week number
    pub week: (i32, u32),
    pub month: u32,
}

impl Observation {
    fn power(&self) -> f64 {
        f64::from(self.power_level)
    }
}

/// Computes every section of the analysis report
#[derive(Debug, Clone)]
pub struct Analyzer {
    rows: Vec<Observation>,
    excluded: usize,
}

impl Analyzer {
    /// Flatten the dataset; fails when nothing is left to analyze
    pub fn new(dataset: &ConsolidatedDataset) -> Result<Self, AnalysisError> {
        let mut rows = Vec::new();
        for (key, bucket) in dataset.iter() {
            let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
                debug!(date = %key, entries = bucket.len(), "skipping non-calendar date key");
                continue;
            };
            let iso = date.iso_week();
            for entry in bucket.entries() {
                let Some(power_level) = entry.power_level else {
                    continue;
                };
                rows.push(Observation {
                    date,
                    text: entry.text.clone(),
                    category: entry.category.to_string(),
                    confidence_type: entry.confidence_type,
                    power_level,
                    daily_average: bucket.daily_confidence_average(),
                    dominant_area: bucket.dominant_confidence_area().map(String::from),
                    day_of_week: date.weekday(),
                    week: (iso.year(), iso.week()),
                    month: date.month(),
                });
            }
        }

        if rows.is_empty() {
            return Err(AnalysisError::NoRatedEntries);
        }
        let excluded = dataset.total_entries() - rows.len();
        Ok(Self { rows, excluded })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Entries left out of the row table
    pub fn excluded_entries(&self) -> usize {
        self.excluded
    }

    // =========================================================================
    // SUMMARY
    // =========================================================================

    pub fn summary_statistics(&self) -> SummaryStatistics {
        let levels: Vec<f64> = self.rows.iter().map(Observation::power).collect();
        let total = self.rows.len();

        let overall = OverallStats {
            total_entries: total,
            date_range: self.date_range(),
            avg_power_level: round2(mean(&levels).unwrap_or(0.0)),
            std_power_level: sample_std(&levels).map(round2),
            median_power_level: median(&levels).unwrap_or(0.0),
            mode_power_level: self.mode_power_level(),
        };

        let by_type = TypeBreakdown {
            personal: self.type_stats(ConfidenceType::Personal),
            professional: self.type_stats(ConfidenceType::Professional),
        };

        let by_category = self
            .by_category()
            .into_iter()
            .map(|(category, rows)| CategoryStats {
                category: category.to_string(),
                count: rows.len(),
                avg_power: round2(mean_power(&rows)),
                percentage: round1(rows.len() as f64 / total as f64 * 100.0),
            })
            .collect();

        SummaryStatistics { overall, by_type, by_category }
    }

    fn date_range(&self) -> String {
        let (first, last) = self.span();
        format!("{} to {}", first, last)
    }

    fn span(&self) -> (NaiveDate, NaiveDate) {
        // rows are never empty
        let first = self.rows.iter().map(|r| r.date).min().unwrap_or_default();
        let last = self.rows.iter().map(|r| r.date).max().unwrap_or_default();
        (first, last)
    }

    /// Smallest of the most frequent power levels
    fn mode_power_level(&self) -> u8 {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.power_level).or_default() += 1;
        }
        let top = counts.values().copied().max().unwrap_or(0);
        counts
            .into_iter()
            .find(|(_, count)| *count == top)
            .map(|(level, _)| level)
            .unwrap_or_default()
    }

    fn type_stats(&self, kind: ConfidenceType) -> TypeStats {
        let levels: Vec<f64> = self
            .rows
            .iter()
            .filter(|r| r.confidence_type == kind)
            .map(Observation::power)
            .collect();
        TypeStats {
            count: levels.len(),
            avg_power: mean(&levels).map(round2),
        }
    }

    /// Rows grouped by category, in order of first appearance
    fn by_category(&self) -> Vec<(&str, Vec<&Observation>)> {
        let mut groups: Vec<(&str, Vec<&Observation>)> = Vec::new();
        for row in &self.rows {
            match groups.iter_mut().find(|(c, _)| *c == row.category) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((row.category.as_str(), vec![row])),
            }
        }
        groups
    }

    // =========================================================================
    // TEMPORAL
    // =========================================================================

    pub fn temporal_patterns(&self) -> TemporalPatterns {
        TemporalPatterns {
            by_day_of_week: self.day_of_week_stats(),
            weekly_trend: weekly_trend(&self.weekly_means()),
            streaks: self.streaks(),
        }
    }

    pub fn day_of_week_stats(&self) -> Vec<DayOfWeekStats> {
        self.day_of_week_means()
            .into_iter()
            .map(|(day, avg, count)| DayOfWeekStats {
                day: day_name(day).to_string(),
                avg_power: round2(avg),
                count,
            })
            .collect()
    }

    /// Monday first, only days that occur
    fn day_of_week_means(&self) -> Vec<(Weekday, f64, usize)> {
        WEEK.iter()
            .filter_map(|&day| {
                let levels: Vec<f64> = self
                    .rows
                    .iter()
                    .filter(|r| r.day_of_week == day)
                    .map(Observation::power)
                    .collect();
                mean(&levels).map(|avg| (day, avg, levels.len()))
            })
            .collect()
    }

    /// Mean power level per ISO week, chronological
    pub fn weekly_means(&self) -> Vec<f64> {
        let mut weeks: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
        for row in &self.rows {
            weeks.entry(row.week).or_default().push(row.power());
        }
        weeks.values().filter_map(|levels| mean(levels)).collect()
    }

    /// Mean power level per calendar date, chronological
    pub fn daily_means(&self) -> Vec<(NaiveDate, f64)> {
        let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for row in &self.rows {
            days.entry(row.date).or_default().push(row.power());
        }
        days.into_iter()
            .filter_map(|(date, levels)| mean(&levels).map(|avg| (date, avg)))
            .collect()
    }

    pub fn streaks(&self) -> StreakReport {
        find_streaks(&self.daily_means())
    }

    // =========================================================================
    // IMPROVEMENT PRIORITY
    // =========================================================================

    /// Categories ranked by priority score, highest first
    pub fn improvement_areas(&self) -> Vec<ImprovementArea> {
        let mut areas: Vec<ImprovementArea> = self
            .by_category()
            .into_iter()
            .map(|(category, rows)| {
                let frequency = rows.len();
                let avg_power = mean_power(&rows);
                let low = rows.iter().filter(|r| r.power_level <= LOW_SCORE_CUTOFF).count();
                let low_score_ratio = low as f64 / frequency as f64;
                ImprovementArea {
                    category: category.to_string(),
                    avg_power,
                    frequency,
                    low_score_ratio,
                    recent_trend: recent_trend(&rows),
                    priority_score: priority_score(avg_power, low_score_ratio, frequency),
                }
            })
            .collect();
        // stable: equal scores keep first-appearance order
        areas.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        areas
    }

    // =========================================================================
    // CO-OCCURRENCE
    // =========================================================================

    /// Correlation of per-date category counts; categories sorted by label
    pub fn category_correlations(&self) -> CorrelationMatrix {
        let categories: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut per_date: BTreeMap<NaiveDate, HashMap<&str, usize>> = BTreeMap::new();
        for row in &self.rows {
            *per_date.entry(row.date).or_default().entry(row.category.as_str()).or_default() += 1;
        }

        let columns: Vec<Vec<f64>> = categories
            .iter()
            .map(|category| {
                per_date
                    .values()
                    .map(|counts| counts.get(category.as_str()).copied().unwrap_or(0) as f64)
                    .collect()
            })
            .collect();

        let values = columns
            .iter()
            .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
            .collect();

        CorrelationMatrix { categories, values }
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    pub fn text_insights(&self) -> TextInsights {
        let mut counts: Vec<KeywordCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let high = self.rows.iter().filter(|r| r.power_level >= HIGH_CONFIDENCE_CUTOFF);
        for row in high {
            for token in row.text.to_lowercase().split_whitespace() {
                let token = token.trim_matches(|c: char| !c.is_alphanumeric());
                if token.chars().count() <= MAX_IGNORED_TOKEN_LEN || STOP_WORDS.contains(token) {
                    continue;
                }
                match index.get(token) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(token.to_string(), counts.len());
                        counts.push(KeywordCount { word: token.to_string(), count: 1 });
                    }
                }
            }
        }
        // stable: ties keep first-seen order
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(TOP_KEYWORD_COUNT);

        let lengths: Vec<usize> = self.rows.iter().map(|r| r.text.chars().count()).collect();
        let total: usize = lengths.iter().sum();

        let mut longest = 0;
        let mut shortest = 0;
        for (i, &len) in lengths.iter().enumerate() {
            if len > lengths[longest] {
                longest = i;
            }
            if len < lengths[shortest] {
                shortest = i;
            }
        }

        TextInsights {
            high_confidence_keywords: counts,
            average_entry_length: round1(total as f64 / lengths.len() as f64),
            longest_entry: self.rows[longest].text.clone(),
            shortest_entry: self.rows[shortest].text.clone(),
        }
    }

    // =========================================================================
    // RECOMMENDATIONS
    // =========================================================================

    pub fn recommendations(&self) -> Vec<String> {
        self.recommend(&self.weekly_means(), &self.improvement_areas())
    }

    fn recommend(&self, weekly: &[f64], areas: &[ImprovementArea]) -> Vec<String> {
        let mut out = Vec::new();

        if let (Some(first), Some(last)) = (weekly.first(), weekly.last()) {
            if weekly.len() > 1 && last < first {
                out.push(
                    "Your confidence has been trending downward. Consider revisiting activities from your peak confidence days."
                        .to_string(),
                );
            }
        }

        if let Some(top) = areas.first() {
            out.push(format!(
                "Focus on improving '{}' - it has the highest priority for growth.",
                top.category
            ));
        }

        let personal = self.count_type(ConfidenceType::Personal) as f64;
        let professional = self.count_type(ConfidenceType::Professional) as f64;
        if personal < professional * TYPE_IMBALANCE_RATIO {
            out.push(
                "You're focusing heavily on professional confidence. Consider balancing with more personal development activities."
                    .to_string(),
            );
        } else if professional < personal * TYPE_IMBALANCE_RATIO {
            out.push(
                "Your personal confidence is strong! Consider applying this energy to professional challenges."
                    .to_string(),
            );
        }

        let days = self.day_of_week_means();
        let best = days.iter().fold(None::<&(Weekday, f64, usize)>, |best, d| match best {
            Some(b) if b.1 >= d.1 => Some(b),
            _ => Some(d),
        });
        let worst = days.iter().fold(None::<&(Weekday, f64, usize)>, |worst, d| match worst {
            Some(w) if w.1 <= d.1 => Some(w),
            _ => Some(d),
        });
        if let (Some(best), Some(worst)) = (best, worst) {
            out.push(format!(
                "You tend to feel most confident on {}s. Schedule important activities then.",
                day_name(best.0)
            ));
            out.push(format!(
                "Be mindful of {}s when confidence tends to dip. Plan supportive activities.",
                day_name(worst.0)
            ));
        }

        out
    }

    fn count_type(&self, kind: ConfidenceType) -> usize {
        self.rows.iter().filter(|r| r.confidence_type == kind).count()
    }

    // =========================================================================
    // REPORT
    // =========================================================================

    pub fn metadata(&self) -> ReportMetadata {
        let distinct: BTreeSet<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        let (first, last) = self.span();
        let span_days = (last - first).num_days() + 1;
        ReportMetadata {
            total_days_tracked: distinct.len(),
            data_completeness: round1(distinct.len() as f64 / span_days as f64 * 100.0),
            excluded_entries: self.excluded,
        }
    }

    /// Every section at once
    pub fn report(&self) -> AnalysisReport {
        let weekly = self.weekly_means();
        let improvement_areas = self.improvement_areas();
        let recommendations = self.recommend(&weekly, &improvement_areas);

        AnalysisReport {
            generated_at: Utc::now(),
            summary_statistics: self.summary_statistics(),
            temporal_patterns: TemporalPatterns {
                by_day_of_week: self.day_of_week_stats(),
                weekly_trend: weekly_trend(&weekly),
                streaks: self.streaks(),
            },
            improvement_areas,
            category_correlations: self.category_correlations(),
            text_insights: self.text_insights(),
            recommendations,
            metadata: self.metadata(),
        }
    }
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// High streaks over chronologically sorted daily means
///
/// A streak is a maximal run of adjacent days at or above the high
/// threshold, at least two days long. Gaps between dates do not break a run.
/// On equal length the earliest streak is reported.
pub fn find_streaks(daily: &[(NaiveDate, f64)]) -> StreakReport {
    let mut runs: Vec<&[(NaiveDate, f64)]> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, (_, avg)) in daily.iter().enumerate() {
        if *avg >= HIGH_STREAK_THRESHOLD {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            if i - s >= MIN_STREAK_LENGTH {
                runs.push(&daily[s..i]);
            }
        }
    }
    if let Some(s) = start {
        if daily.len() - s >= MIN_STREAK_LENGTH {
            runs.push(&daily[s..]);
        }
    }

    let longest = runs.iter().fold(None::<&[(NaiveDate, f64)]>, |best, run| match best {
        Some(b) if b.len() >= run.len() => Some(b),
        _ => Some(*run),
    });

    StreakReport {
        longest_high_streak: longest
            .unwrap_or_default()
            .iter()
            .map(|&(date, avg_power)| DailyMean { date, avg_power })
            .collect(),
        total_high_streak_days: runs.iter().map(|r| r.len()).sum(),
        low_confidence_days: daily.iter().filter(|(_, avg)| *avg <= LOW_DAY_THRESHOLD).count(),
    }
}

/// Higher means more in need of attention
pub fn priority_score(avg_power: f64, low_score_ratio: f64, frequency: usize) -> f64 {
    PRIORITY_WEIGHT_POWER * (10.0 - avg_power)
        + PRIORITY_WEIGHT_LOW_RATIO * (10.0 * low_score_ratio)
        + PRIORITY_WEIGHT_RARITY * (10.0 / (frequency as f64 + 1.0))
}

/// Compare a recent mean against the overall mean
pub fn classify_trend(recent: f64, overall: f64) -> TrendDirection {
    if recent > overall * TREND_IMPROVING_RATIO {
        TrendDirection::Improving
    } else if recent < overall * TREND_DECLINING_RATIO {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Trend of one category: entries dated at or after the 70th date
/// percentile against all of them
fn recent_trend(rows: &[&Observation]) -> TrendDirection {
    if rows.len() < 2 {
        return TrendDirection::InsufficientData;
    }
    let days: Vec<f64> = rows.iter().map(|r| f64::from(r.date.num_days_from_ce())).collect();
    let Some(cutoff) = quantile(&days, RECENT_QUANTILE) else {
        return TrendDirection::InsufficientData;
    };
    let recent: Vec<&Observation> = rows
        .iter()
        .zip(&days)
        .filter(|(_, day)| **day >= cutoff)
        .map(|(row, _)| *row)
        .collect();
    classify_trend(mean_power(&recent), mean_power(rows))
}

fn weekly_trend(weekly: &[f64]) -> WeeklyTrend {
    WeeklyTrend {
        improving_weeks: weekly.windows(2).filter(|w| w[1] > w[0]).count(),
        declining_weeks: weekly.windows(2).filter(|w| w[1] < w[0]).count(),
    }
}

/// Pearson correlation; `None` for fewer than two points or zero variance
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Linear-interpolation quantile, `q` in [0, 1]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn mean_power(rows: &[&Observation]) -> f64 {
    let levels: Vec<f64> = rows.iter().map(|r| r.power()).collect();
    mean(&levels).unwrap_or(0.0)
}

/// Sample standard deviation (n - 1)
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// TESTS
// =============================================================================
