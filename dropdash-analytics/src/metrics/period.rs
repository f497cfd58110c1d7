//! Period tokens and the date windows they resolve to.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Look-back period accepted by every time-windowed calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1")]
    Day,
    #[serde(rename = "7")]
    Week,
    #[serde(rename = "30")]
    Month,
    #[serde(rename = "90")]
    Quarter,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Parse a period token. Unknown or missing tokens resolve to [`Period::All`].
    pub fn parse(token: Option<&str>) -> Self {
        match token.map(|t| t.trim().to_lowercase()).as_deref() {
            Some("1") => Period::Day,
            Some("7") => Period::Week,
            Some("30") => Period::Month,
            Some("90") => Period::Quarter,
            _ => Period::All,
        }
    }

    pub fn days(self) -> Option<i64> {
        match self {
            Period::Day => Some(1),
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Quarter => Some(90),
            Period::All => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "1",
            Period::Week => "7",
            Period::Month => "30",
            Period::Quarter => "90",
            Period::All => "all",
        }
    }

    /// Lower bound on `created_at` for this period, `None` for all time.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|d| now - Duration::days(d))
    }

    pub fn window(self, now: DateTime<Utc>) -> DateWindow {
        DateWindow {
            since: self.since(now),
            until: None,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open `[since, until)` filter predicate handed to the data store.
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.since.map_or(true, |s| ts >= s) && self.until.map_or(true, |u| ts < u)
    }

    /// The window of equal length that ends where this one starts.
    ///
    /// Only defined when the window has a lower bound; an open-ended upper
    /// bound is taken to be `now`.
    pub fn previous(&self, now: DateTime<Utc>) -> Option<Self> {
        let since = self.since?;
        let until = self.until.unwrap_or(now);
        let length = until - since;
        Some(Self::between(since - length, since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_known_tokens() {
        assert_eq!(Period::parse(Some("1")), Period::Day);
        assert_eq!(Period::parse(Some("7")), Period::Week);
        assert_eq!(Period::parse(Some(" 30 ")), Period::Month);
        assert_eq!(Period::parse(Some("90")), Period::Quarter);
        assert_eq!(Period::parse(Some("ALL")), Period::All);
    }

    #[test]
    fn unknown_or_missing_token_is_all_time() {
        assert_eq!(Period::parse(None), Period::All);
        assert_eq!(Period::parse(Some("14")), Period::All);
        assert_eq!(Period::parse(Some("last week")), Period::All);
        assert_eq!(Period::All.since(now()), None);
    }

    #[test]
    fn since_subtracts_whole_days() {
        let since = Period::Week.since(now()).unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap());
    }

    #[test]
    fn window_contains_is_half_open() {
        let since = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let w = DateWindow::between(since, until);
        assert!(w.contains(since));
        assert!(!w.contains(until));
        assert!(DateWindow::unbounded().contains(since));
    }

    #[test]
    fn previous_window_has_equal_length() {
        let w = Period::Month.window(now());
        let prev = w.previous(now()).unwrap();
        assert_eq!(prev.until, w.since);
        assert_eq!(prev.until.unwrap() - prev.since.unwrap(), Duration::days(30));
        assert!(Period::All.window(now()).previous(now()).is_none());
    }

    #[test]
    fn serializes_as_token() {
        assert_eq!(serde_json::to_string(&Period::Quarter).unwrap(), "\"90\"");
        assert_eq!(serde_json::to_string(&Period::All).unwrap(), "\"all\"");
    }
}
