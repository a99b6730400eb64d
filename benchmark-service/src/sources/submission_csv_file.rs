use std::{fs::File, path::PathBuf};

use benchmark_client::domain::{submission::MONTHS_PER_YEAR, BuildingCategory, SubmissionDraft};
use csv::StringRecord;
use futures::Stream;

use crate::pipeline::{Envelope, PipelineError, Source};

/// CSV backfill source for facility submissions.
///
/// Expected header columns (by name):
/// - facility_type (category label, e.g. "Office")
/// - area_m2
/// - kwh_1 .. kwh_12 (monthly readings, January first)
/// - cost_1 .. cost_12 (optional monthly costs; all-empty means absent)
/// - internal_label (optional)
/// - user_id (optional)
/// - country (optional)
pub struct SubmissionCsvFileSource {
    path: PathBuf,
}

impl SubmissionCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn record_to_draft(
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<SubmissionDraft, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let type_str = get("facility_type")?;
    let facility_type: BuildingCategory = type_str
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid facility_type '{type_str}': {e}")))?;

    let area_str = get("area_m2")?;
    let area_m2: f64 = area_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid area_m2 '{area_str}': {e}")))?;

    let mut monthly_kwh = Vec::with_capacity(MONTHS_PER_YEAR);
    for month in 1..=MONTHS_PER_YEAR {
        let col = format!("kwh_{month}");
        let raw = get(&col)?;
        let kwh: f64 = raw
            .trim()
            .parse()
            .map_err(|e| PipelineError::Source(format!("invalid {col} '{raw}': {e}")))?;
        monthly_kwh.push(kwh);
    }

    // Cost columns are optional as a block: absent headers or an all-empty row
    // both mean "no cost data".
    let mut monthly_cost = Vec::with_capacity(MONTHS_PER_YEAR);
    for month in 1..=MONTHS_PER_YEAR {
        let col = format!("cost_{month}");
        match get(&col).ok().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let cost: f64 = raw.parse().map_err(|e| {
                    PipelineError::Source(format!("invalid {col} '{raw}': {e}"))
                })?;
                monthly_cost.push(cost);
            }
            _ => {}
        }
    }
    let monthly_cost = if monthly_cost.is_empty() {
        None
    } else if monthly_cost.len() == MONTHS_PER_YEAR {
        Some(monthly_cost)
    } else {
        return Err(PipelineError::Source(format!(
            "expected all {MONTHS_PER_YEAR} cost columns or none, got {}",
            monthly_cost.len()
        )));
    };

    Ok(SubmissionDraft {
        user_id: get("user_id").ok().and_then(parse_optional_string),
        internal_label: get("internal_label").ok().and_then(parse_optional_string),
        facility_type,
        area_m2,
        monthly_kwh,
        monthly_cost,
        country: get("country").ok().and_then(parse_optional_string),
    })
}

#[async_trait::async_trait]
impl Source<SubmissionDraft> for SubmissionCsvFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<SubmissionDraft>, PipelineError>> + Send>>
    {
        // Blocking CSV reader wrapped in a single async task; backfills run as
        // one-shot bins, not on a latency-sensitive path.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
            let mut rdr = csv::Reader::from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                .clone();

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;

                let draft = match record_to_draft(&record, &headers) {
                    Ok(d) => d,
                    Err(e) => {
                        metrics::counter!("submission_csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                yield Envelope::now(draft);
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_and_record(with_costs: bool) -> (StringRecord, StringRecord) {
        let mut headers = vec!["facility_type".to_string(), "area_m2".to_string()];
        let mut fields = vec!["Office".to_string(), "1500".to_string()];
        for month in 1..=12 {
            headers.push(format!("kwh_{month}"));
            fields.push("1000".to_string());
        }
        if with_costs {
            for month in 1..=12 {
                headers.push(format!("cost_{month}"));
                fields.push("250".to_string());
            }
        }
        headers.push("internal_label".to_string());
        fields.push("Tower A".to_string());
        (
            StringRecord::from(headers),
            StringRecord::from(fields),
        )
    }

    #[test]
    fn parses_a_full_row() {
        let (headers, record) = headers_and_record(true);
        let draft = record_to_draft(&record, &headers).unwrap();
        assert_eq!(draft.facility_type, BuildingCategory::Office);
        assert_eq!(draft.area_m2, 1500.0);
        assert_eq!(draft.monthly_kwh.len(), 12);
        assert_eq!(draft.annual_kwh(), 12_000.0);
        assert_eq!(draft.annual_cost(), Some(3000.0));
        assert_eq!(draft.internal_label.as_deref(), Some("Tower A"));
        assert_eq!(draft.user_id, None);
    }

    #[test]
    fn missing_cost_columns_mean_no_cost_data() {
        let (headers, record) = headers_and_record(false);
        let draft = record_to_draft(&record, &headers).unwrap();
        assert_eq!(draft.monthly_cost, None);
    }

    #[test]
    fn unknown_category_is_a_source_error() {
        let (headers, mut fields) = headers_and_record(false);
        fields = StringRecord::from(
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| if i == 0 { "Bunker" } else { f })
                .collect::<Vec<_>>(),
        );
        let res = record_to_draft(&fields, &headers);
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
