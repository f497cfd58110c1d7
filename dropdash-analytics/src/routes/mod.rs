pub mod cities;
pub mod drops;
pub mod health;
pub mod stats;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::prometheus))
        .route("/analytics/overview", get(stats::get_overview))
        .route("/analytics/funnel", get(stats::get_funnel))
        .route("/analytics/retention", get(stats::get_retention))
        .route("/analytics/completeness", get(stats::get_completeness))
        .route("/analytics/profiles/:id/completeness", get(stats::get_profile_completeness))
        .route("/analytics/messaging", get(stats::get_messaging))
        .route("/analytics/plans/detect", post(stats::detect_plans))
        .route("/analytics/drops/:id/comparison", get(drops::get_drop_comparison))
        .route("/analytics/cities", get(cities::get_world_domination))
        .route("/analytics/cities/:id", get(cities::get_city))
        .with_state(state)
}
