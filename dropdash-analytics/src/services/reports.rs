//! One function per metrics object: load rows, run the calculator, record
//! the computation.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use dropdash_shared::errors::{AppError, AppResult, ErrorCode};
use dropdash_shared::middleware::record_computation;

use crate::metrics::completeness::{self, CompletenessSummary, ProfileCompleteness};
use crate::metrics::drops::{
    compare_city_snapshots, compare_drop_stats, previous_drop, CitySnapshot, CityStatsComparison,
    DropComparisonReport, DropRef,
};
use crate::metrics::funnel::{self, FunnelSnapshot};
use crate::metrics::messaging::{self, MessagingStats};
use crate::metrics::penetration::{self, CityPenetration, WorldDominationSummary};
use crate::metrics::period::{DateWindow, Period};
use crate::metrics::plans::PlanDetector;
use crate::metrics::retention::{self, RetentionReport};
use crate::services::datasets;
use crate::store::Store;

pub async fn funnel(store: &Store, period: Period, now: DateTime<Utc>) -> AppResult<FunnelSnapshot> {
    let window = period.window(now);
    let data = datasets::funnel(store, window).await?;

    let started = Instant::now();
    let snapshot = funnel::compute(&data, &window);
    record_computation("funnel", started);
    Ok(snapshot)
}

pub async fn retention(store: &Store, weeks: usize, now: DateTime<Utc>) -> AppResult<RetentionReport> {
    let users = store.users(DateWindow::unbounded()).await?;

    let started = Instant::now();
    let report = retention::report(&users, now, weeks);
    record_computation("retention", started);
    Ok(report)
}

pub async fn completeness(store: &Store, period: Period, now: DateTime<Utc>) -> AppResult<CompletenessSummary> {
    let (profiles, counts) = datasets::completeness(store, period.window(now)).await?;

    let started = Instant::now();
    let summary = completeness::summarize(&profiles, &counts);
    record_computation("completeness", started);

    tracing::debug!(
        period = %period,
        profiles = summary.total_profiles,
        avg_score = ?summary.avg_score,
        "completeness summary computed"
    );
    Ok(summary)
}

pub async fn profile_completeness(store: &Store, profile_id: Uuid) -> AppResult<ProfileCompleteness> {
    let profile = store
        .profile(profile_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;
    let counts = store.asset_counts(vec![profile.id]).await?;

    let started = Instant::now();
    let scored = completeness::score_profile(&profile, counts.get(&profile.id).copied().unwrap_or_default());
    record_computation("profile_completeness", started);
    Ok(scored)
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub period: Period,
    pub funnel: FunnelSnapshot,
    pub retention: RetentionReport,
    pub completeness: CompletenessSummary,
}

pub async fn overview(store: &Store, period: Period, weeks: usize, now: DateTime<Utc>) -> AppResult<Overview> {
    let (funnel, retention, completeness) = tokio::try_join!(
        funnel(store, period, now),
        retention(store, weeks, now),
        completeness(store, period, now),
    )?;
    Ok(Overview {
        period,
        funnel,
        retention,
        completeness,
    })
}

pub async fn messaging(store: &Store, period: Period, now: DateTime<Utc>) -> AppResult<MessagingStats> {
    let window = period.window(now);
    let data = datasets::messaging(store, window).await?;

    let started = Instant::now();
    let stats = messaging::compute(&data, &window, now, PlanDetector::global());
    record_computation("messaging", started);
    Ok(stats)
}

fn drop_not_found(id: Uuid) -> AppError {
    AppError::with_details(ErrorCode::DropNotFound, "drop not found", json!({ "drop_id": id }))
}

/// Compare a drop against `against`, or against the latest earlier drop in
/// the same city when no baseline is given.
pub async fn drop_comparison(store: &Store, drop_id: Uuid, against: Option<Uuid>) -> AppResult<DropComparisonReport> {
    let drop = store.drop(drop_id).await?.ok_or_else(|| drop_not_found(drop_id))?;

    let previous = match against {
        Some(id) => store.drop(id).await?.ok_or_else(|| drop_not_found(id))?,
        None => {
            let earlier = store.earlier_drops(drop.city_id, drop.starts_at).await?;
            previous_drop(&earlier, &drop).cloned().ok_or_else(|| {
                AppError::with_details(
                    ErrorCode::PreviousDropNotFound,
                    "no earlier drop to compare against",
                    json!({ "drop_id": drop.id, "city_id": drop.city_id }),
                )
            })?
        }
    };

    let (current_stats, previous_stats) =
        tokio::try_join!(store.drop_stats(drop.id), store.drop_stats(previous.id))?;
    let current_stats = current_stats.ok_or_else(|| drop_not_found(drop.id))?;
    let previous_stats = previous_stats.ok_or_else(|| drop_not_found(previous.id))?;

    let started = Instant::now();
    let comparison = compare_drop_stats(&current_stats, &previous_stats);
    record_computation("drop_comparison", started);

    tracing::debug!(
        drop_id = %drop.id,
        previous_id = %previous.id,
        match_rate_points = ?comparison.match_rate.point_change,
        "drop comparison computed"
    );

    Ok(DropComparisonReport {
        drop: DropRef::from(&drop),
        previous: DropRef::from(&previous),
        comparison,
    })
}

pub async fn world_domination(
    store: &Store,
    period: Period,
    top: usize,
    now: DateTime<Utc>,
) -> AppResult<WorldDominationSummary> {
    let (cities, waitlist) = tokio::try_join!(store.cities(), store.waitlist_counts(period.window(now)))?;

    let started = Instant::now();
    let summary = penetration::summarize(&cities, &waitlist, top);
    record_computation("world_domination", started);
    Ok(summary)
}

#[derive(Debug, Serialize)]
pub struct CityReport {
    pub city: CityPenetration,
    pub period: Period,
    pub current: CitySnapshot,
    /// Absent for the all-time period, which has no preceding window.
    pub previous: Option<CitySnapshot>,
    pub comparison: Option<CityStatsComparison>,
}

pub async fn city(store: &Store, city_id: Uuid, period: Period, now: DateTime<Utc>) -> AppResult<CityReport> {
    let (city, profiles) = tokio::try_join!(store.city(city_id), store.city_profiles(city_id))?;
    let city = city.ok_or_else(|| {
        AppError::with_details(ErrorCode::CityNotFound, "city not found", json!({ "city_id": city_id }))
    })?;

    let started = Instant::now();
    let window = period.window(now);
    let current = CitySnapshot::from_profiles(&profiles, city.id, &window);
    let previous = window
        .previous(now)
        .map(|w| CitySnapshot::from_profiles(&profiles, city.id, &w));
    let comparison = previous.as_ref().map(|p| compare_city_snapshots(&current, p));
    record_computation("city_comparison", started);

    Ok(CityReport {
        city: CityPenetration::new(&city, current.waitlist_signups),
        period,
        current,
        previous,
        comparison,
    })
}
