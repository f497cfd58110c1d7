use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dropdash_analytics::config::AppConfig;
use dropdash_analytics::store::Store;
use dropdash_analytics::{routes, AppState};
use dropdash_shared::clients::db::create_pool;
use dropdash_shared::middleware::{init_metrics, init_tracing, metrics_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("dropdash-analytics");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url, config.db_pool_size)?;
    let metrics = init_metrics()?;

    let state = Arc::new(AppState {
        store: Store::new(db),
        config,
        metrics,
    });

    let app = routes::router(state)
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "dropdash-analytics starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
