//! Period-over-period deltas for drop and city statistics.
//!
//! Count metrics are compared by percent change. Metrics already expressed
//! as a percentage also carry `point_change`, the absolute difference in
//! percentage points, which is what the dashboard shows for them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::numeric::{finite_or_zero, pct, round2, rounded_opt};
use crate::metrics::period::DateWindow;
use crate::models::{MatchDrop, MatchDropStats, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    Count,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Relative change from `previous` to `current`, in percent.
///
/// A zero baseline has no defined relative change: growth from zero reports
/// `100`, and zero-to-zero (or a drop below zero) reports `None`.
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return (current > 0.0).then_some(100.0);
    }
    let change = (current - previous) * 100.0 / previous;
    change.is_finite().then_some(change)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDelta {
    pub current: f64,
    pub previous: f64,
    pub diff: f64,
    #[serde(serialize_with = "rounded_opt")]
    pub pct_change: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub point_change: Option<f64>,
    pub unit: MetricUnit,
    pub invert_trend: bool,
    pub trend: Trend,
    pub is_better: bool,
}

impl MetricDelta {
    fn new(current: f64, previous: f64, unit: MetricUnit) -> Self {
        let current = finite_or_zero(current);
        let previous = finite_or_zero(previous);
        let diff = current - previous;
        let trend = if diff > 0.0 {
            Trend::Up
        } else if diff < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        };
        Self {
            current,
            previous,
            diff,
            pct_change: pct_change(current, previous),
            point_change: (unit == MetricUnit::Percent).then_some(diff),
            unit,
            invert_trend: false,
            trend,
            is_better: trend == Trend::Up,
        }
    }

    pub fn count(current: i64, previous: i64) -> Self {
        Self::new(current as f64, previous as f64, MetricUnit::Count)
    }

    pub fn percent(current: f64, previous: f64) -> Self {
        Self::new(round2(current), round2(previous), MetricUnit::Percent)
    }

    /// Mark a metric where going down is the favorable direction.
    pub fn inverted(mut self) -> Self {
        self.invert_trend = true;
        self.is_better = self.trend == Trend::Down;
        self
    }

    /// The change a card should show: points for percentages, percent
    /// change for counts.
    pub fn display_change(&self) -> Option<f64> {
        match self.unit {
            MetricUnit::Percent => self.point_change,
            MetricUnit::Count => self.pct_change,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DropStatsComparison {
    pub participants: MetricDelta,
    pub participants_men: MetricDelta,
    pub participants_women: MetricDelta,
    pub participants_nonbinary: MetricDelta,
    pub requests_sent: MetricDelta,
    pub requests_accepted: MetricDelta,
    pub rejections: MetricDelta,
    pub matches: MetricDelta,
    pub conversations: MetricDelta,
    pub unmatches: MetricDelta,
    pub match_rate: MetricDelta,
    pub acceptance_rate: MetricDelta,
    pub unmatch_rate: MetricDelta,
}

fn match_rate(s: &MatchDropStats) -> f64 {
    pct(s.matches, s.participants)
}

fn acceptance_rate(s: &MatchDropStats) -> f64 {
    pct(s.requests_accepted, s.requests_sent)
}

fn unmatch_rate(s: &MatchDropStats) -> f64 {
    pct(s.unmatches, s.matches)
}

pub fn compare_drop_stats(current: &MatchDropStats, previous: &MatchDropStats) -> DropStatsComparison {
    let count = |f: fn(&MatchDropStats) -> i64| MetricDelta::count(f(current), f(previous));
    let percent = |f: fn(&MatchDropStats) -> f64| MetricDelta::percent(f(current), f(previous));

    DropStatsComparison {
        participants: count(|s| s.participants),
        participants_men: count(|s| s.participants_men),
        participants_women: count(|s| s.participants_women),
        participants_nonbinary: count(|s| s.participants_nonbinary),
        requests_sent: count(|s| s.requests_sent),
        requests_accepted: count(|s| s.requests_accepted),
        rejections: count(|s| s.requests_rejected).inverted(),
        matches: count(|s| s.matches),
        conversations: count(|s| s.conversations),
        unmatches: count(|s| s.unmatches).inverted(),
        match_rate: percent(match_rate),
        acceptance_rate: percent(acceptance_rate),
        unmatch_rate: percent(unmatch_rate).inverted(),
    }
}

/// The latest drop in the same city that started before `current`.
pub fn previous_drop<'a>(drops: &'a [MatchDrop], current: &MatchDrop) -> Option<&'a MatchDrop> {
    drops
        .iter()
        .filter(|d| d.id != current.id && d.city_id == current.city_id && d.starts_at < current.starts_at)
        .max_by_key(|d| (d.starts_at, d.id))
}

#[derive(Debug, Clone, Serialize)]
pub struct DropRef {
    pub id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
}

impl From<&MatchDrop> for DropRef {
    fn from(d: &MatchDrop) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            starts_at: d.starts_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DropComparisonReport {
    pub drop: DropRef,
    pub previous: DropRef,
    pub comparison: DropStatsComparison,
}

// --- Cities ---

/// Waitlist activity for one city inside one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CitySnapshot {
    pub waitlist_signups: i64,
    pub completed_profiles: i64,
}

impl CitySnapshot {
    pub fn from_profiles(profiles: &[Profile], city_id: Uuid, window: &DateWindow) -> Self {
        let in_city = profiles
            .iter()
            .filter(|p| p.waitlist_city_id == Some(city_id) && window.contains(p.created_at));
        let (signups, completed) = in_city.fold((0, 0), |(n, c), p| (n + 1, c + i64::from(p.completed)));
        Self {
            waitlist_signups: signups,
            completed_profiles: completed,
        }
    }

    pub fn completion_rate(&self) -> f64 {
        pct(self.completed_profiles, self.waitlist_signups)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CityStatsComparison {
    pub waitlist_signups: MetricDelta,
    pub completed_profiles: MetricDelta,
    pub completion_rate: MetricDelta,
}

pub fn compare_city_snapshots(current: &CitySnapshot, previous: &CitySnapshot) -> CityStatsComparison {
    CityStatsComparison {
        waitlist_signups: MetricDelta::count(current.waitlist_signups, previous.waitlist_signups),
        completed_profiles: MetricDelta::count(current.completed_profiles, previous.completed_profiles),
        completion_rate: MetricDelta::percent(current.completion_rate(), previous.completion_rate()),
    }
}
