use anyhow::Result;
use benchmark_client::{db::submission_queries, stats};
use benchmark_service::{config::AppConfig, observability};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let threshold = cfg.benchmark.sample_threshold;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let entries = submission_queries::all_category_euis(&pool).await?;
    let total = entries.len();
    let by_category = stats::category_aggregates(entries);

    for (category, s) in &by_category {
        tracing::info!(
            category = %category,
            count = s.count,
            median_eui = s.median_eui,
            p25_eui = s.p25_eui,
            p75_eui = s.p75_eui,
            is_sufficient_data = stats::is_sufficient_sample(s.count, threshold),
            "category aggregate"
        );
    }

    tracing::info!(
        submissions = total,
        categories = by_category.len(),
        sample_threshold = threshold,
        "category report complete"
    );

    Ok(())
}
