use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use dropdash_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => HealthCheck {
            name: "database".into(),
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => HealthCheck {
            name: "database".into(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };

    Json(HealthResponse::healthy("dropdash-analytics", env!("CARGO_PKG_VERSION")).with_checks(vec![database]))
}

/// GET /metrics, Prometheus text format.
pub async fn prometheus(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
