use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use dropdash_shared::errors::AppResult;
use dropdash_shared::types::api::ApiResponse;

use crate::metrics::completeness::{CompletenessSummary, ProfileCompleteness};
use crate::metrics::funnel::FunnelSnapshot;
use crate::metrics::messaging::MessagingStats;
use crate::metrics::period::Period;
use crate::metrics::plans::{PlanDetection, PlanDetector};
use crate::metrics::retention::RetentionReport;
use crate::services::reports::{self, Overview};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// `1`, `7`, `30`, `90` or `all`; anything else means all time.
    pub period: Option<String>,
}

impl PeriodQuery {
    pub fn period(&self) -> Period {
        Period::parse(self.period.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RetentionQuery {
    pub weeks: Option<usize>,
}

/// GET /analytics/overview?period=7
/// Funnel, retention and completeness, computed concurrently.
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<Overview>>> {
    let overview = reports::overview(&state.store, query.period(), state.config.cohort_weeks, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(overview)))
}

/// GET /analytics/funnel?period=30
pub async fn get_funnel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<FunnelSnapshot>>> {
    let snapshot = reports::funnel(&state.store, query.period(), Utc::now()).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /analytics/retention?weeks=8
pub async fn get_retention(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RetentionQuery>,
) -> AppResult<Json<ApiResponse<RetentionReport>>> {
    let weeks = query.weeks.unwrap_or(state.config.cohort_weeks).max(1);
    let report = reports::retention(&state.store, weeks, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /analytics/completeness?period=all
pub async fn get_completeness(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<CompletenessSummary>>> {
    let summary = reports::completeness(&state.store, query.period(), Utc::now()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /analytics/profiles/:id/completeness
pub async fn get_profile_completeness(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProfileCompleteness>>> {
    let scored = reports::profile_completeness(&state.store, profile_id).await?;
    Ok(Json(ApiResponse::ok(scored)))
}

/// GET /analytics/messaging?period=7
pub async fn get_messaging(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<MessagingStats>>> {
    let stats = reports::messaging(&state.store, query.period(), Utc::now()).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

#[derive(Debug, Deserialize)]
pub struct DetectPlansRequest {
    pub content: String,
}

/// POST /analytics/plans/detect
pub async fn detect_plans(Json(body): Json<DetectPlansRequest>) -> Json<ApiResponse<PlanDetection>> {
    Json(ApiResponse::ok(PlanDetector::global().classify(&body.content)))
}
