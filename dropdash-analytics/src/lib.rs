pub mod config;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
    pub metrics: PrometheusHandle,
}
