//! Reduction of the 3-hour forecast list to per-day rows.

use crate::model::{ForecastEntry, ForecastSet};

/// Rule selecting the slot that represents a day in summary views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryMatcher {
    /// Matches entries whose `time_of_day_text` contains the substring.
    TimeOfDay(String),
}

impl BoundaryMatcher {
    pub fn time_of_day(marker: impl Into<String>) -> Self {
        BoundaryMatcher::TimeOfDay(marker.into())
    }

    pub fn midday() -> Self {
        Self::time_of_day("12:00:00")
    }

    pub fn midnight() -> Self {
        Self::time_of_day("00:00:00")
    }

    pub fn matches(&self, entry: &ForecastEntry) -> bool {
        match self {
            BoundaryMatcher::TimeOfDay(marker) => entry.time_of_day_text.contains(marker.as_str()),
        }
    }
}

impl Default for BoundaryMatcher {
    fn default() -> Self {
        Self::midday()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionPolicy {
    /// Only boundary entries survive.
    #[default]
    DailySummary,
    /// Non-boundary entries are kept as detail rows.
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Boundary,
    Detail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub kind: RowKind,
    pub entry: ForecastEntry,
}

impl ForecastRow {
    pub fn is_boundary(&self) -> bool {
        self.kind == RowKind::Boundary
    }
}

/// Classifies every entry against `matcher`, keeping input order.
pub fn reduce(set: &ForecastSet, matcher: &BoundaryMatcher, policy: ReductionPolicy) -> Vec<ForecastRow> {
    set.entries()
        .iter()
        .filter_map(|entry| {
            let kind = if matcher.matches(entry) { RowKind::Boundary } else { RowKind::Detail };

            match (kind, policy) {
                (RowKind::Detail, ReductionPolicy::DailySummary) => None,
                _ => Some(ForecastRow { kind, entry: entry.clone() }),
            }
        })
        .collect()
}

/// One representative entry per day.
pub fn reduce_to_daily(set: &ForecastSet, matcher: &BoundaryMatcher) -> Vec<ForecastEntry> {
    reduce(set, matcher, ReductionPolicy::DailySummary)
        .into_iter()
        .map(|row| row.entry)
        .collect()
}
