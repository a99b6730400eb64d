use anyhow::Result;
use benchmark_service::{
    api::{self, ApiState},
    config::AppConfig,
    metrics_server, observability,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let state = ApiState {
        pool,
        sample_threshold: cfg.benchmark.sample_threshold,
    };

    tracing::info!(
        sample_threshold = cfg.benchmark.sample_threshold,
        "starting benchmark service"
    );

    api::serve(&cfg.api.bind_addr, state).await
}
