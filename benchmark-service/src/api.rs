use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use time::OffsetDateTime;

use benchmark_client::{
    db::submission_queries,
    domain::{BuildingCategory, FacilitySubmission, SubmissionDraft},
    stats,
};

use crate::transform;

/// Shared state for the JSON API: the connection pool plus the configured
/// minimum peer sample size.
#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    pub sample_threshold: usize,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(msg: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": msg.to_string() })),
    )
}

fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

fn internal_error(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "api request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/submissions", post(create_submission).get(list_submissions))
        .route("/submissions/:id", get(get_submission).delete(delete_submission))
        .route("/submissions/:id/benchmark", get(benchmark_submission))
        .route("/benchmark", get(benchmark_adhoc))
        .route("/aggregates", get(aggregates))
        .with_state(state)
}

/// Bind and serve the API until the task is cancelled or the listener fails.
pub async fn serve(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(bind_addr, "benchmark API listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct SubmissionRequest {
    facility_type: String,
    area_m2: f64,
    monthly_kwh: Vec<f64>,
    monthly_cost: Option<Vec<f64>>,
    internal_label: Option<String>,
    user_id: Option<String>,
    country: Option<String>,
}

async fn create_submission(
    State(state): State<ApiState>,
    Json(req): Json<SubmissionRequest>,
) -> Result<Json<FacilitySubmission>, ApiError> {
    let facility_type: BuildingCategory = req.facility_type.parse().map_err(bad_request)?;

    let draft = SubmissionDraft {
        user_id: req.user_id,
        internal_label: req.internal_label,
        facility_type,
        area_m2: req.area_m2,
        monthly_kwh: req.monthly_kwh,
        monthly_cost: req.monthly_cost,
        country: req.country,
    };
    transform::validate_submission(&draft).map_err(bad_request)?;

    let stored = submission_queries::insert_submission(&state.pool, &draft)
        .await
        .map_err(internal_error)?;

    metrics::counter!("submissions_created_total").increment(1);
    Ok(Json(stored))
}

#[derive(Debug, serde::Deserialize)]
struct IdsQuery {
    /// Comma-separated row ids, e.g. `?ids=3,17,42`.
    ids: String,
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

async fn list_submissions(
    State(state): State<ApiState>,
    Query(query): Query<IdsQuery>,
) -> Result<Json<Vec<FacilitySubmission>>, ApiError> {
    let ids = parse_ids(&query.ids).map_err(bad_request)?;
    let rows = submission_queries::fetch_submissions_by_ids(&state.pool, &ids)
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}

async fn get_submission(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<FacilitySubmission>, ApiError> {
    submission_queries::fetch_submission(&state.pool, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(not_found)
}

async fn delete_submission(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = submission_queries::delete_submission(&state.pool, id)
        .await
        .map_err(internal_error)?;

    if removed {
        metrics::counter!("submissions_deleted_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// Benchmark a stored submission against its category peers. The subject row
/// is excluded from its own peer set.
async fn benchmark_submission(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<stats::BenchmarkResult>, ApiError> {
    let record = submission_queries::fetch_submission(&state.pool, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    let peers = submission_queries::peer_euis(&state.pool, record.facility_type, Some(id))
        .await
        .map_err(internal_error)?;

    let result = stats::compute_benchmark(
        record.facility_type,
        record.eui,
        &peers,
        state.sample_threshold,
    )
    .map_err(|e| internal_error(e.into()))?;

    Ok(Json(result))
}

#[derive(Debug, serde::Deserialize)]
struct BenchmarkQuery {
    facility_type: String,
    eui: f64,
}

/// Benchmark an EUI that is not on record against all submissions of a
/// category.
async fn benchmark_adhoc(
    State(state): State<ApiState>,
    Query(query): Query<BenchmarkQuery>,
) -> Result<Json<stats::BenchmarkResult>, ApiError> {
    let facility_type: BuildingCategory = query.facility_type.parse().map_err(bad_request)?;

    let peers = submission_queries::peer_euis(&state.pool, facility_type, None)
        .await
        .map_err(internal_error)?;

    let result = stats::compute_benchmark(facility_type, query.eui, &peers, state.sample_threshold)
        .map_err(bad_request)?;

    Ok(Json(result))
}

#[derive(Debug, serde::Serialize)]
struct CategoryAggregate {
    facility_type: String,
    count: usize,
    median_eui: f64,
    p25_eui: f64,
    p75_eui: f64,
    is_sufficient_data: bool,
}

#[derive(Debug, serde::Serialize)]
struct AggregatesResponse {
    sample_threshold: usize,
    #[serde(with = "time::serde::rfc3339")]
    generated_at: OffsetDateTime,
    categories: Vec<CategoryAggregate>,
}

/// Per-category aggregates for the public dashboard. Every category on record
/// is returned; the threshold and per-entry flag let the presentation layer
/// split disclosed benchmarks from categories still collecting data.
async fn aggregates(
    State(state): State<ApiState>,
) -> Result<Json<AggregatesResponse>, ApiError> {
    let entries = submission_queries::all_category_euis(&state.pool)
        .await
        .map_err(internal_error)?;

    let categories = stats::category_aggregates(entries)
        .into_iter()
        .map(|(category, s)| CategoryAggregate {
            facility_type: category.as_label().to_string(),
            count: s.count,
            median_eui: s.median_eui,
            p25_eui: s.p25_eui,
            p75_eui: s.p75_eui,
            is_sufficient_data: stats::is_sufficient_sample(s.count, state.sample_threshold),
        })
        .collect();

    Ok(Json(AggregatesResponse {
        sample_threshold: state.sample_threshold,
        generated_at: OffsetDateTime::now_utc(),
        categories,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_accepts_spaced_lists() {
        assert_eq!(parse_ids("3, 17,42").unwrap(), vec![3, 17, 42]);
    }

    #[test]
    fn parse_ids_ignores_empty_segments() {
        assert_eq!(parse_ids("5,,9,").unwrap(), vec![5, 9]);
    }

    #[test]
    fn parse_ids_rejects_garbage() {
        assert!(parse_ids("1,two,3").is_err());
    }
}
