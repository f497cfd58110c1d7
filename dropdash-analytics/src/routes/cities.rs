use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use dropdash_shared::errors::AppResult;
use dropdash_shared::types::api::ApiResponse;

use crate::metrics::penetration::WorldDominationSummary;
use crate::routes::stats::PeriodQuery;
use crate::services::reports::{self, CityReport};
use crate::AppState;

/// GET /analytics/cities?period=30
pub async fn get_world_domination(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<WorldDominationSummary>>> {
    let summary =
        reports::world_domination(&state.store, query.period(), state.config.top_cities, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /analytics/cities/:id?period=30
/// Penetration plus current vs previous window for one city.
pub async fn get_city(
    State(state): State<Arc<AppState>>,
    Path(city_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<CityReport>>> {
    let report = reports::city(&state.store, city_id, query.period(), Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}
