use time::OffsetDateTime;

use super::BuildingCategory;

/// Number of monthly readings a complete submission carries.
pub const MONTHS_PER_YEAR: usize = 12;

/// A facility submission as supplied by a caller, before storage.
///
/// Derived quantities are methods rather than fields; they are only
/// meaningful once the draft has passed validation (positive area, twelve
/// finite non-negative readings).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmissionDraft {
    pub user_id: Option<String>,
    pub internal_label: Option<String>,
    pub facility_type: BuildingCategory,
    pub area_m2: f64,
    pub monthly_kwh: Vec<f64>,
    pub monthly_cost: Option<Vec<f64>>,
    pub country: Option<String>,
}

impl SubmissionDraft {
    /// Annual consumption, the sum of the monthly readings.
    pub fn annual_kwh(&self) -> f64 {
        self.monthly_kwh.iter().sum()
    }

    /// Energy-use intensity in kWh/m²/year. Not finite when area is zero.
    pub fn eui(&self) -> f64 {
        self.annual_kwh() / self.area_m2
    }

    /// Annual cost when monthly costs were supplied.
    pub fn annual_cost(&self) -> Option<f64> {
        self.monthly_cost.as_ref().map(|c| c.iter().sum())
    }
}

/// A stored facility submission, including the derived values persisted at
/// insert time.
#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FacilitySubmission {
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    pub user_id: Option<String>,
    pub internal_label: Option<String>,
    #[sqlx(try_from = "String")]
    pub facility_type: BuildingCategory,
    pub area_m2: f64,
    pub monthly_kwh: Vec<f64>,
    pub annual_kwh: f64,
    pub eui: f64,
    pub annual_cost: Option<f64>,
    pub country: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(area: f64, monthly: Vec<f64>) -> SubmissionDraft {
        SubmissionDraft {
            user_id: None,
            internal_label: None,
            facility_type: BuildingCategory::Office,
            area_m2: area,
            monthly_kwh: monthly,
            monthly_cost: None,
            country: None,
        }
    }

    #[test]
    fn annual_kwh_sums_monthly_readings() {
        let d = draft(100.0, vec![10.0; 12]);
        assert_eq!(d.annual_kwh(), 120.0);
    }

    #[test]
    fn eui_divides_annual_by_area() {
        let d = draft(60.0, vec![10.0; 12]);
        assert_eq!(d.eui(), 2.0);
    }

    #[test]
    fn eui_is_not_finite_for_zero_area() {
        let d = draft(0.0, vec![10.0; 12]);
        assert!(!d.eui().is_finite());
    }

    #[test]
    fn annual_cost_absent_without_monthly_costs() {
        let d = draft(100.0, vec![10.0; 12]);
        assert_eq!(d.annual_cost(), None);
    }

    #[test]
    fn annual_cost_sums_when_present() {
        let mut d = draft(100.0, vec![10.0; 12]);
        d.monthly_cost = Some(vec![5.0; 12]);
        assert_eq!(d.annual_cost(), Some(60.0));
    }
}
