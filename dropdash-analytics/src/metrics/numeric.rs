//! Numeric helpers shared by the calculators.
//!
//! Every ratio goes through [`pct`] so a zero denominator yields `0` instead
//! of `NaN`/`Infinity`. Averages are kept as `Option<f64>` until the response
//! is serialized; [`zero_if_none`] does the final coercion.

use serde::Serializer;

/// `numerator / denominator × 100`, or `0` when the denominator is zero.
pub fn pct(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    finite_or_zero((numerator as f64 * 100.0) / denominator as f64)
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0u64), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Median, `None` for an empty input.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn round2(value: f64) -> f64 {
    finite_or_zero((value * 100.0).round() / 100.0)
}

/// Four decimals, for rates small enough that two would read as zero.
pub fn round4(value: f64) -> f64 {
    finite_or_zero((value * 10_000.0).round() / 10_000.0)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Hours between two instants as a fractional number.
pub fn hours_between(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

/// Serializes `None` as `0`, rounding present values to two decimals.
pub fn zero_if_none<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.map(round2).unwrap_or(0.0))
}

/// Serializes present values rounded to two decimals and keeps `null`.
pub fn rounded_opt<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&round2(*v)),
        None => serializer.serialize_none(),
    }
}

/// Like [`rounded_opt`] but keeps four decimals.
pub fn precise_opt<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&round4(*v)),
        None => serializer.serialize_none(),
    }
}
