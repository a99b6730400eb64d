use benchmark_client::domain::{submission::MONTHS_PER_YEAR, SubmissionDraft};

use crate::pipeline::{Envelope, PipelineError, Transform};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("area_m2 must be a positive number, got {0}")]
    NonPositiveArea(f64),
    #[error("expected 12 monthly kWh readings, got {0}")]
    WrongReadingCount(usize),
    #[error("monthly kWh reading for month {month} must be finite and non-negative")]
    BadReading { month: usize },
    #[error("expected 12 monthly cost entries, got {0}")]
    WrongCostCount(usize),
    #[error("monthly cost for month {month} must be finite and non-negative")]
    BadCost { month: usize },
    #[error("derived EUI is not finite")]
    NonFiniteEui,
}

/// Pure validation of a `SubmissionDraft`.
///
/// Rules:
/// - area must be finite and strictly positive;
/// - exactly 12 monthly kWh readings, each finite and >= 0;
/// - monthly costs, when supplied, exactly 12 entries, each finite and >= 0;
/// - the derived EUI must be finite.
///
/// Derived values on a draft are only trusted once this has passed.
pub fn validate_submission(draft: &SubmissionDraft) -> Result<(), ValidationError> {
    if !draft.area_m2.is_finite() || draft.area_m2 <= 0.0 {
        return Err(ValidationError::NonPositiveArea(draft.area_m2));
    }

    if draft.monthly_kwh.len() != MONTHS_PER_YEAR {
        return Err(ValidationError::WrongReadingCount(draft.monthly_kwh.len()));
    }
    for (i, kwh) in draft.monthly_kwh.iter().enumerate() {
        if !kwh.is_finite() || *kwh < 0.0 {
            return Err(ValidationError::BadReading { month: i + 1 });
        }
    }

    if let Some(costs) = &draft.monthly_cost {
        if costs.len() != MONTHS_PER_YEAR {
            return Err(ValidationError::WrongCostCount(costs.len()));
        }
        for (i, cost) in costs.iter().enumerate() {
            if !cost.is_finite() || *cost < 0.0 {
                return Err(ValidationError::BadCost { month: i + 1 });
            }
        }
    }

    // Readings can individually pass and still sum out of f64 range.
    if !draft.eui().is_finite() {
        return Err(ValidationError::NonFiniteEui);
    }

    Ok(())
}

#[derive(Clone, Default)]
pub struct SubmissionValidation;

#[async_trait::async_trait]
impl Transform<SubmissionDraft, SubmissionDraft> for SubmissionValidation {
    async fn apply(
        &self,
        input: Envelope<SubmissionDraft>,
    ) -> Result<Envelope<SubmissionDraft>, PipelineError> {
        match validate_submission(&input.payload) {
            Ok(()) => Ok(input),
            Err(e) => {
                metrics::counter!("validation_submission_rejected_total").increment(1);
                Err(PipelineError::Transform(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchmark_client::domain::BuildingCategory;

    fn valid_draft() -> SubmissionDraft {
        SubmissionDraft {
            user_id: None,
            internal_label: Some("HQ".to_string()),
            facility_type: BuildingCategory::Office,
            area_m2: 1200.0,
            monthly_kwh: vec![18_000.0; 12],
            monthly_cost: None,
            country: Some("Panama".to_string()),
        }
    }

    #[test]
    fn accepts_valid_draft() {
        assert_eq!(validate_submission(&valid_draft()), Ok(()));
    }

    #[test]
    fn rejects_zero_area() {
        let mut d = valid_draft();
        d.area_m2 = 0.0;
        assert!(matches!(
            validate_submission(&d),
            Err(ValidationError::NonPositiveArea(_))
        ));
    }

    #[test]
    fn rejects_wrong_reading_count() {
        let mut d = valid_draft();
        d.monthly_kwh.pop();
        assert_eq!(
            validate_submission(&d),
            Err(ValidationError::WrongReadingCount(11))
        );
    }

    #[test]
    fn rejects_negative_reading() {
        let mut d = valid_draft();
        d.monthly_kwh[3] = -1.0;
        assert_eq!(
            validate_submission(&d),
            Err(ValidationError::BadReading { month: 4 })
        );
    }

    #[test]
    fn rejects_nan_reading() {
        let mut d = valid_draft();
        d.monthly_kwh[0] = f64::NAN;
        assert_eq!(
            validate_submission(&d),
            Err(ValidationError::BadReading { month: 1 })
        );
    }

    #[test]
    fn rejects_short_cost_vector() {
        let mut d = valid_draft();
        d.monthly_cost = Some(vec![100.0; 6]);
        assert_eq!(
            validate_submission(&d),
            Err(ValidationError::WrongCostCount(6))
        );
    }

    #[test]
    fn rejects_overflowing_annual_sum() {
        let mut d = valid_draft();
        d.monthly_kwh = vec![f64::MAX; 12];
        assert_eq!(validate_submission(&d), Err(ValidationError::NonFiniteEui));
    }
}
