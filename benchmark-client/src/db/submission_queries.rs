use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::domain::{BuildingCategory, FacilitySubmission, SubmissionDraft};

#[derive(Debug, Clone, sqlx::FromRow)]
struct CategoryEuiRow {
    facility_type: String,
    eui: f64,
}

/// Insert a validated draft and return the stored row, including the derived
/// values persisted alongside it.
pub async fn insert_submission(
    pool: &PgPool,
    draft: &SubmissionDraft,
) -> Result<FacilitySubmission> {
    let row = sqlx::query_as::<_, FacilitySubmission>(
        r#"
        INSERT INTO facility_submissions
            (user_id, internal_label, facility_type, area_m2, monthly_kwh,
             annual_kwh, eui, annual_cost, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING
            id, created_at, user_id, internal_label, facility_type, area_m2,
            monthly_kwh, annual_kwh, eui, annual_cost, country
        "#,
    )
    .bind(&draft.user_id)
    .bind(&draft.internal_label)
    .bind(draft.facility_type.as_label())
    .bind(draft.area_m2)
    .bind(&draft.monthly_kwh)
    .bind(draft.annual_kwh())
    .bind(draft.eui())
    .bind(draft.annual_cost())
    .bind(&draft.country)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn fetch_submission(pool: &PgPool, id: i64) -> Result<Option<FacilitySubmission>> {
    let row = sqlx::query_as::<_, FacilitySubmission>(
        r#"
        SELECT
            id, created_at, user_id, internal_label, facility_type, area_m2,
            monthly_kwh, annual_kwh, eui, annual_cost, country
        FROM facility_submissions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch the submissions a caller has identified as theirs. The id set is
/// always supplied explicitly; there is no ambient notion of ownership here.
pub async fn fetch_submissions_by_ids(
    pool: &PgPool,
    ids: &[i64],
) -> Result<Vec<FacilitySubmission>> {
    let rows = sqlx::query_as::<_, FacilitySubmission>(
        r#"
        SELECT
            id, created_at, user_id, internal_label, facility_type, area_m2,
            monthly_kwh, annual_kwh, eui, annual_cost, country
        FROM facility_submissions
        WHERE id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Hard-delete a submission. Returns whether a row was removed; once gone it
/// no longer contributes to any peer set or aggregate.
pub async fn delete_submission(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM facility_submissions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All EUI values on record for one category, optionally excluding a single
/// row (the subject of a benchmark, so a facility is not its own peer).
pub async fn peer_euis(
    pool: &PgPool,
    category: BuildingCategory,
    exclude: Option<i64>,
) -> Result<Vec<f64>> {
    let euis = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT eui
        FROM facility_submissions
        WHERE facility_type = $1
          AND ($2::bigint IS NULL OR id <> $2)
        "#,
    )
    .bind(category.as_label())
    .bind(exclude)
    .fetch_all(pool)
    .await?;

    Ok(euis)
}

/// The full `(category, eui)` dataset for aggregate computation.
///
/// Rows are only written through the validated insert path; a stored label
/// that fails to parse is data corruption and surfaces as an error.
pub async fn all_category_euis(pool: &PgPool) -> Result<Vec<(BuildingCategory, f64)>> {
    let rows = sqlx::query_as::<_, CategoryEuiRow>(
        "SELECT facility_type, eui FROM facility_submissions",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let category: BuildingCategory = row
                .facility_type
                .parse()
                .with_context(|| format!("stored facility_type '{}'", row.facility_type))?;
            Ok((category, row.eui))
        })
        .collect()
}
