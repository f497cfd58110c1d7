//! Weekly signup cohorts with D1/D7/D30/D90 activity.
//!
//! A member counts as retained at horizon `h` when `last_seen_at` is at least
//! `h` days after their own signup. A horizon is only reported once every
//! member of the cohort has had `h` days to get there; until then it is `null`.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::metrics::numeric::{pct, rounded_opt};
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    /// Monday of the signup week.
    pub cohort_start: NaiveDate,
    pub cohort_size: i64,
    #[serde(serialize_with = "rounded_opt")]
    pub d1: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d7: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d30: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d90: Option<f64>,
}

impl CohortRow {
    pub fn horizon(&self, days: i64) -> Option<f64> {
        match days {
            1 => self.d1,
            7 => self.d7,
            30 => self.d30,
            90 => self.d90,
            _ => None,
        }
    }
}

/// Size-weighted average over cohorts whose horizon is observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RetentionAverages {
    #[serde(serialize_with = "rounded_opt")]
    pub d1: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d7: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d30: Option<f64>,
    #[serde(serialize_with = "rounded_opt")]
    pub d90: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetentionReport {
    pub cohorts: Vec<CohortRow>,
    pub average: RetentionAverages,
}

pub fn week_start(ts: DateTime<Utc>) -> NaiveDate {
    let date = ts.date_naive();
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn retained(user: &User, days: i64) -> bool {
    user.last_seen_at
        .is_some_and(|seen| seen >= user.created_at + Duration::days(days))
}

fn cohort_row(cohort_start: NaiveDate, members: &[&User], now: DateTime<Utc>) -> CohortRow {
    let size = members.len() as i64;
    let latest_signup = members.iter().map(|u| u.created_at).max();

    let at = |days: i64| -> Option<f64> {
        let latest = latest_signup?;
        if now < latest + Duration::days(days) {
            return None;
        }
        let kept = members.iter().filter(|u| retained(u, days)).count() as i64;
        Some(pct(kept, size))
    };

    CohortRow {
        cohort_start,
        cohort_size: size,
        d1: at(1),
        d7: at(7),
        d30: at(30),
        d90: at(90),
    }
}

/// Build cohorts most-recent-first, keeping at most `limit` of them.
pub fn build_cohorts(users: &[User], now: DateTime<Utc>, limit: usize) -> Vec<CohortRow> {
    let mut groups: BTreeMap<NaiveDate, Vec<&User>> = BTreeMap::new();
    for user in users.iter().filter(|u| u.created_at <= now) {
        groups.entry(week_start(user.created_at)).or_default().push(user);
    }

    groups
        .iter()
        .rev()
        .take(limit)
        .map(|(start, members)| cohort_row(*start, members, now))
        .collect()
}

fn weighted_average(cohorts: &[CohortRow], days: i64) -> Option<f64> {
    let (weighted, size) = cohorts
        .iter()
        .filter_map(|c| c.horizon(days).map(|v| (v * c.cohort_size as f64, c.cohort_size)))
        .fold((0.0, 0i64), |(w, n), (v, s)| (w + v, n + s));
    (size > 0).then(|| weighted / size as f64)
}

pub fn report(users: &[User], now: DateTime<Utc>, limit: usize) -> RetentionReport {
    let cohorts = build_cohorts(users, now, limit);
    let average = RetentionAverages {
        d1: weighted_average(&cohorts, 1),
        d7: weighted_average(&cohorts, 7),
        d30: weighted_average(&cohorts, 30),
        d90: weighted_average(&cohorts, 90),
    };

    tracing::debug!(cohorts = cohorts.len(), d7 = ?average.d7, "retention cohorts computed");

    RetentionReport { cohorts, average }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn user(created: DateTime<Utc>, seen_after_days: Option<i64>) -> User {
        User {
            id: Uuid::new_v4(),
            created_at: created,
            last_seen_at: seen_after_days.map(|d| created + Duration::days(d)),
        }
    }

    #[test]
    fn week_starts_on_monday() {
        // 2026-03-12 is a Thursday
        assert_eq!(week_start(at(2026, 3, 12)), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(week_start(at(2026, 3, 9)), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(week_start(at(2026, 3, 15)), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }

    #[test]
    fn percentages_per_horizon() {
        let signup = at(2025, 1, 6);
        let users = vec![
            user(signup, Some(100)),
            user(signup, Some(8)),
            user(signup, Some(1)),
            user(signup, None),
        ];
        let rows = build_cohorts(&users, at(2026, 1, 1), 8);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.cohort_size, 4);
        assert_eq!(row.d1, Some(75.0));
        assert_eq!(row.d7, Some(50.0));
        assert_eq!(row.d30, Some(25.0));
        assert_eq!(row.d90, Some(25.0));
    }

    #[test]
    fn unobservable_horizons_are_null() {
        let now = at(2026, 3, 12);
        let users = vec![user(now - Duration::days(10), Some(9))];
        let row = &build_cohorts(&users, now, 8)[0];
        assert!(row.d1.is_some());
        assert!(row.d7.is_some());
        assert_eq!(row.d30, None);
        assert_eq!(row.d90, None);

        let json = serde_json::to_value(row).unwrap();
        assert!(json["d30"].is_null());
    }

    #[test]
    fn horizon_waits_for_latest_member() {
        let now = at(2026, 3, 16);
        // Monday and Sunday signups in the same week
        let users = vec![
            user(at(2026, 3, 9), Some(3)),
            user(at(2026, 3, 15), None),
        ];
        let row = &build_cohorts(&users, now, 8)[0];
        assert_eq!(row.cohort_size, 2);
        assert_eq!(row.d1, Some(50.0));
        assert_eq!(row.d7, None);
    }

    #[test]
    fn horizon_is_observable_from_the_exact_instant() {
        let signup = at(2026, 3, 10);
        let users = vec![user(signup, Some(7))];

        let row = &build_cohorts(&users, signup + Duration::days(7), 8)[0];
        assert_eq!(row.d7, Some(100.0));
        assert_eq!(row.d30, None);

        let early = signup + Duration::days(7) - Duration::seconds(1);
        let row = &build_cohorts(&users, early, 8)[0];
        assert_eq!(row.d1, Some(100.0));
        assert_eq!(row.d7, None);
    }

    #[test]
    fn cohorts_are_most_recent_first_and_limited() {
        let now = at(2026, 6, 1);
        let users: Vec<User> = (0..12)
            .map(|w| user(at(2026, 1, 5) + Duration::weeks(w), Some(2)))
            .collect();
        let rows = build_cohorts(&users, now, 8);
        assert_eq!(rows.len(), 8);
        assert!(rows.windows(2).all(|w| w[0].cohort_start > w[1].cohort_start));
        assert_eq!(rows[0].cohort_start, week_start(at(2026, 1, 5) + Duration::weeks(11)));
    }

    #[test]
    fn average_weights_by_cohort_size_and_skips_null() {
        let now = at(2026, 3, 20);
        let users = vec![
            // old cohort, 2 members, both retained at d1
            user(at(2026, 1, 5), Some(2)),
            user(at(2026, 1, 5), Some(2)),
            // recent cohort, 1 member, not retained at d1
            user(at(2026, 3, 16), None),
        ];
        let r = report(&users, now, 8);
        assert_eq!(r.average.d1.map(|v| (v * 100.0).round() / 100.0), Some(66.67));
        // d7 only observable for the old cohort
        assert_eq!(r.average.d7, Some(0.0));
        assert_eq!(r.average.d90, None);
    }
}
