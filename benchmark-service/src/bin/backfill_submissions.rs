use anyhow::{bail, Result};
use benchmark_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::PostgresSubmissionSink,
    sources::SubmissionCsvFileSource,
    transform,
};
use benchmark_client::domain::SubmissionDraft;
use sqlx::postgres::PgPoolOptions;
use std::{env, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_submissions <csv_file_path>");
    }
    let file_path = &args[1];

    // Load configuration (can point BENCHMARK_CONFIG to a backfill-specific file).
    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let sink = PostgresSubmissionSink::new(
        pool,
        cfg.backfill.batch_size,
        cfg.backfill.max_retries,
        Duration::from_millis(cfg.backfill.retry_backoff_ms),
    );

    let source = SubmissionCsvFileSource::new(file_path);

    let pipeline: Pipeline<_, SubmissionDraft, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::SubmissionValidation::default())],
        sink,
    };

    pipeline.run().await?;

    Ok(())
}
