use std::time::Duration;

use benchmark_client::domain::SubmissionDraft;
use futures::StreamExt;
use sqlx::{postgres::PgPool, Postgres, QueryBuilder};

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Batching sink that writes validated drafts into `facility_submissions`.
///
/// Derived values (annual kWh, EUI, annual cost) are computed at bind time so
/// the stored row always matches its readings.
pub struct PostgresSubmissionSink {
    pool: PgPool,
    batch_size: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl PostgresSubmissionSink {
    pub fn new(pool: PgPool, batch_size: usize, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            pool,
            batch_size,
            max_retries,
            retry_backoff,
        }
    }

    async fn flush_batch(&self, batch: &[Envelope<SubmissionDraft>]) -> Result<(), PipelineError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut attempt: u32 = 0;
        loop {
            match self.insert_batch(batch).await {
                Ok(()) => {
                    let counter = metrics::counter!("submissions_ingested_total");
                    counter.increment(batch.len() as u64);

                    // Approximate end-to-end latency from earliest received_at to now.
                    if let Some(min_received) = batch.iter().map(|e| e.received_at).min() {
                        if let Ok(dur) = std::time::SystemTime::now().duration_since(min_received) {
                            let hist = metrics::histogram!("backfill_end_to_end_latency_seconds");
                            hist.record(dur.as_secs_f64());
                        }
                    }

                    return Ok(());
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let sleep_for = self.retry_backoff * attempt;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        "submission sink flush failed, retrying with backoff"
                    );
                    tokio::time::sleep(sleep_for).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "submission sink flush failed, giving up");
                    metrics::counter!("submission_sink_errors_total").increment(1);
                    return Err(PipelineError::Sink(e.to_string()));
                }
            }
        }
    }

    async fn insert_batch(&self, batch: &[Envelope<SubmissionDraft>]) -> Result<(), sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO facility_submissions (user_id, internal_label, facility_type, area_m2, monthly_kwh, annual_kwh, eui, annual_cost, country) ",
        );

        builder.push_values(batch, |mut b, env| {
            let d = &env.payload;
            b.push_bind(&d.user_id)
                .push_bind(&d.internal_label)
                .push_bind(d.facility_type.as_label())
                .push_bind(d.area_m2)
                .push_bind(&d.monthly_kwh)
                .push_bind(d.annual_kwh())
                .push_bind(d.eui())
                .push_bind(d.annual_cost())
                .push_bind(&d.country);
        });

        let query = builder.build();
        query.execute(&self.pool).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl Sink<SubmissionDraft> for PostgresSubmissionSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<SubmissionDraft>, PipelineError>>
            + Send
            + Unpin
            + 'static,
    {
        let mut buffer: Vec<Envelope<SubmissionDraft>> = Vec::with_capacity(self.batch_size);

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    // Rejected rows are already counted upstream; keep draining.
                    tracing::warn!(error = %e, "skipping record rejected upstream of the sink");
                    continue;
                }
            };

            buffer.push(env);
            if buffer.len() >= self.batch_size {
                self.flush_batch(&buffer).await?;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            self.flush_batch(&buffer).await?;
        }

        Ok(())
    }
}
