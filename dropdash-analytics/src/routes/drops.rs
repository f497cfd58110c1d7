use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use dropdash_shared::errors::AppResult;
use dropdash_shared::types::api::ApiResponse;

use crate::metrics::drops::DropComparisonReport;
use crate::services::reports;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ComparisonQuery {
    /// Baseline drop; defaults to the previous drop in the same city.
    pub against: Option<Uuid>,
}

/// GET /analytics/drops/:id/comparison?against=<drop id>
pub async fn get_drop_comparison(
    State(state): State<Arc<AppState>>,
    Path(drop_id): Path<Uuid>,
    Query(query): Query<ComparisonQuery>,
) -> AppResult<Json<ApiResponse<DropComparisonReport>>> {
    let report = reports::drop_comparison(&state.store, drop_id, query.against).await?;
    Ok(Json(ApiResponse::ok(report)))
}
