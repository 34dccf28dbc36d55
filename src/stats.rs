//! Derived statistics over loaded entries.
//!
//! Everything here is a pure function of the entries handed in; nothing reads
//! or writes storage. Entries are expected in ascending date order, which is
//! what stores return.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::entry::{ChecklistDay, Entry, ImmersionMinutes};
use crate::error::{Error, Result};

/// Sum of the selected field; 0 for no entries
pub fn total_value<F>(entries: &[Entry<F>], select: impl Fn(&F) -> f64) -> f64 {
    entries.iter().map(|entry| select(&entry.fields)).sum()
}

/// Share of `target` reached, capped at 100; 0 when `target <= 0`
pub fn progress_percentage(total: f64, target: f64) -> f64 {
    if target <= 0.0 || !target.is_finite() {
        return 0.0;
    }
    (total / target * 100.0).clamp(0.0, 100.0)
}

/// Mean of the selected field; 0 for no entries
pub fn average_daily<F>(entries: &[Entry<F>], select: impl Fn(&F) -> f64) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    total_value(entries, select) / entries.len() as f64
}

/// Median of the selected field; 0 for no entries
pub fn median<F>(entries: &[Entry<F>], select: impl Fn(&F) -> f64) -> f64 {
    let mut values: Vec<f64> = entries.iter().map(|entry| select(&entry.fields)).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Mean of the selected field over the last `window` entries
pub fn recent_average<F>(entries: &[Entry<F>], select: impl Fn(&F) -> f64, window: usize) -> f64 {
    let start = entries.len().saturating_sub(window);
    average_daily(&entries[start..], select)
}

/// Percentage of entries satisfying `predicate`; 0 for no entries
pub fn completion_rate<F>(entries: &[Entry<F>], predicate: impl Fn(&F) -> bool) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let hits = entries.iter().filter(|entry| predicate(&entry.fields)).count();
    hits as f64 / entries.len() as f64 * 100.0
}

/// Dates whose entry satisfies `predicate`
pub fn qualifying_dates<F>(entries: &[Entry<F>], predicate: impl Fn(&F) -> bool) -> BTreeSet<NaiveDate> {
    entries
        .iter()
        .filter(|entry| predicate(&entry.fields))
        .map(|entry| entry.date)
        .collect()
}

/// Consecutive qualifying days ending at `today`; 0 if `today` itself does
/// not qualify
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while dates.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive qualifying days anywhere in history
pub fn longest_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0,
    };

    let mut longest = 0;
    let mut run = 0;
    for day in first.iter_days().take_while(|day| *day <= last) {
        if dates.contains(&day) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Which extreme [`most_extreme`] looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

/// Entry with the largest or smallest selected value.
///
/// Ties go to the earliest date.
pub fn most_extreme<F>(
    entries: &[Entry<F>],
    select: impl Fn(&F) -> f64,
    mode: Extreme,
) -> Option<&Entry<F>> {
    let mut best: Option<(&Entry<F>, f64)> = None;
    for entry in entries {
        let value = select(&entry.fields);
        let better = match best {
            None => true,
            Some((current, current_value)) => {
                let strictly = match mode {
                    Extreme::Max => value > current_value,
                    Extreme::Min => value < current_value,
                };
                strictly || (value == current_value && entry.date < current.date)
            }
        };
        if better {
            best = Some((entry, value));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Projected date the target is reached at the current daily average.
///
/// `None` when the average is not positive or the target is already met.
pub fn estimated_completion(
    total: f64,
    target: f64,
    daily_average: f64,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if daily_average <= 0.0 || !daily_average.is_finite() || total >= target {
        return None;
    }
    let days_remaining = ((target - total) / daily_average).floor();
    if days_remaining > i64::from(i32::MAX) as f64 {
        return None;
    }
    today.checked_add_signed(Duration::days(days_remaining as i64))
}

/// Entries within `[start, end]`; either bound may be open
pub fn filter_by_date_range<F: Clone>(
    entries: &[Entry<F>],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Entry<F>> {
    entries
        .iter()
        .filter(|entry| start.map_or(true, |start| entry.date >= start))
        .filter(|entry| end.map_or(true, |end| entry.date <= end))
        .cloned()
        .collect()
}

/// Common date range presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateRange {
    #[serde(rename = "last-7")]
    Last7,
    #[serde(rename = "last-30")]
    Last30,
    #[serde(rename = "last-90")]
    Last90,
    ThisYear,
    All,
}

impl DateRange {
    /// First date included by the preset, `None` for all time
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateRange::Last7 => today.checked_sub_signed(Duration::days(7)),
            DateRange::Last30 => today.checked_sub_signed(Duration::days(30)),
            DateRange::Last90 => today.checked_sub_signed(Duration::days(90)),
            DateRange::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            DateRange::All => None,
        }
    }

    pub fn apply<F: Clone>(&self, entries: &[Entry<F>], today: NaiveDate) -> Vec<Entry<F>> {
        filter_by_date_range(entries, self.start(today), None)
    }
}

impl std::str::FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-7" | "7d" => Ok(DateRange::Last7),
            "last-30" | "30d" => Ok(DateRange::Last30),
            "last-90" | "90d" => Ok(DateRange::Last90),
            "this-year" | "year" => Ok(DateRange::ThisYear),
            "all" => Ok(DateRange::All),
            _ => Err(Error::InvalidArgument(format!(
                "invalid range '{}': must be last-7, last-30, last-90, this-year, or all",
                s
            ))),
        }
    }
}

/// Check an hours + minutes study time and return total minutes
pub fn validate_study_time(hours: u32, minutes: u32) -> Result<u32> {
    if hours > 24 {
        return Err(Error::Validation("hours cannot exceed 24".to_string()));
    }
    if minutes >= 60 {
        return Err(Error::Validation("minutes must be less than 60".to_string()));
    }
    let total = hours * 60 + minutes;
    if total == 0 {
        return Err(Error::Validation("study time must be greater than zero".to_string()));
    }
    if total > 24 * 60 {
        return Err(Error::Validation("study time cannot exceed 24 hours".to_string()));
    }
    Ok(total)
}

/// Motivation tier for a progress percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Beginning,
    GreatStart,
    Momentum,
    Halfway,
    FinalStretch,
    AlmostThere,
    Achieved,
}

impl Milestone {
    pub fn for_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 100.0 => Milestone::Achieved,
            p if p >= 90.0 => Milestone::AlmostThere,
            p if p >= 75.0 => Milestone::FinalStretch,
            p if p >= 50.0 => Milestone::Halfway,
            p if p >= 25.0 => Milestone::Momentum,
            p if p >= 10.0 => Milestone::GreatStart,
            _ => Milestone::Beginning,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Milestone::Achieved => "Goal achieved!",
            Milestone::AlmostThere => "Almost there, just a little more to reach the goal.",
            Milestone::FinalStretch => "Great progress, you're in the final stretch.",
            Milestone::Halfway => "Halfway there, keep it up.",
            Milestone::Momentum => "Good momentum, the foundation is building.",
            Milestone::GreatStart => "Great start, every session counts.",
            Milestone::Beginning => "The first step is always the hardest.",
        }
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Best or worst single day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// Aggregate view of one numeric stream against a target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub total: f64,
    pub target: f64,
    pub days_logged: usize,
    pub average_daily: f64,
    pub median: f64,
    pub progress_percentage: f64,
    pub milestone: Milestone,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_day: Option<DayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_day: Option<DayValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<NaiveDate>,
}

impl MetricSummary {
    /// Summarize `entries`; a day counts toward streaks when its value is at
    /// least `streak_threshold`
    pub fn compute<F>(
        entries: &[Entry<F>],
        select: impl Fn(&F) -> f64,
        target: f64,
        streak_threshold: f64,
        today: NaiveDate,
    ) -> Self {
        let total = total_value(entries, &select);
        let average = average_daily(entries, &select);
        let progress = progress_percentage(total, target);
        let dates = qualifying_dates(entries, |fields| select(fields) >= streak_threshold);
        let day_value = |entry: &Entry<F>| DayValue {
            date: entry.date,
            value: select(&entry.fields),
        };

        Self {
            total,
            target,
            days_logged: entries.len(),
            average_daily: average,
            median: median(entries, &select),
            progress_percentage: progress,
            milestone: Milestone::for_percentage(progress),
            current_streak: current_streak(&dates, today),
            longest_streak: longest_streak(&dates),
            best_day: most_extreme(entries, &select, Extreme::Max).map(day_value),
            worst_day: most_extreme(entries, &select, Extreme::Min).map(day_value),
            estimated_completion: estimated_completion(total, target, average, today),
        }
    }

    /// Immersion minutes against a minute goal
    pub fn immersion(
        entries: &[Entry<ImmersionMinutes>],
        goal_minutes: f64,
        min_minutes: u32,
        today: NaiveDate,
    ) -> Self {
        Self::compute(
            entries,
            |fields| f64::from(fields.minutes),
            goal_minutes,
            f64::from(min_minutes.max(1)),
            today,
        )
    }
}

/// Aggregate view of the daily checklist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistSummary {
    pub total_days: usize,
    pub shadowing_rate: f64,
    pub vocabulary_rate: f64,
    pub reading_rate: f64,
    pub average_tasks_per_day: f64,
    pub recent_average: f64,
    pub perfect_days: usize,
    pub current_perfect_streak: u32,
    pub longest_perfect_streak: u32,
}

impl ChecklistSummary {
    pub fn compute(entries: &[Entry<ChecklistDay>], recent_window: usize, today: NaiveDate) -> Self {
        let completed = |fields: &ChecklistDay| f64::from(fields.total_completed());
        let perfect = qualifying_dates(entries, ChecklistDay::is_perfect);

        Self {
            total_days: entries.len(),
            shadowing_rate: completion_rate(entries, |fields| fields.shadowing),
            vocabulary_rate: completion_rate(entries, |fields| fields.vocabulary),
            reading_rate: completion_rate(entries, |fields| fields.reading),
            average_tasks_per_day: average_daily(entries, completed),
            recent_average: recent_average(entries, completed, recent_window),
            perfect_days: perfect.len(),
            current_perfect_streak: current_streak(&perfect, today),
            longest_perfect_streak: longest_streak(&perfect),
        }
    }
}
