//! Benchmark statistics over energy-use intensity (EUI) values.
//!
//! Everything here is a pure function of its inputs: values come in as plain
//! slices fetched by the caller, derived statistics go out as owned values.
//! Degenerate samples (empty or single-element peer sets) produce defined
//! output rather than errors; the only failure path is a non-finite subject
//! EUI, which callers are expected to have rejected during validation.

use std::collections::BTreeMap;

use crate::domain::BuildingCategory;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("subject EUI must be finite, got {0}")]
    InvalidInput(f64),
}

/// Outcome of benchmarking one facility against its category peers.
///
/// Recomputed on every request; never persisted. `percentile` is withheld
/// (zero) whenever `is_sufficient_data` is false, so presentation layers gate
/// on the flag rather than the number.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BenchmarkResult {
    pub facility_type: BuildingCategory,
    pub eui: f64,
    pub category_median_eui: Option<f64>,
    pub percentile: u8,
    pub sample_size: usize,
    pub is_sufficient_data: bool,
}

/// Per-category aggregate for public display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CategoryStats {
    pub count: usize,
    pub median_eui: f64,
    pub p25_eui: f64,
    pub p75_eui: f64,
}

/// Median of a sequence of values; `None` on empty input.
///
/// Sorts a local copy, so input order is irrelevant. Odd counts return the
/// exact middle element, even counts the mean of the two central elements.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(median_of_sorted(&sorted))
}

// Callers guarantee `sorted` is non-empty and ascending.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Rank-based percentile of a subject EUI within its peer set.
///
/// Lower EUI is better, so the percentile is the share of peers with a
/// strictly higher EUI, rounded to an integer in [0, 100]: 100 means the
/// subject beats every peer, 0 that every peer is at least as efficient.
/// Peers tied with the subject do not count as worse. An empty peer set
/// yields 0.
pub fn percentile_rank(subject_eui: f64, peer_euis: &[f64]) -> u8 {
    if peer_euis.is_empty() {
        return 0;
    }
    let worse = peer_euis.iter().filter(|&&p| p > subject_eui).count();
    ((worse as f64 / peer_euis.len() as f64) * 100.0).round() as u8
}

/// Whether a peer sample is large enough to disclose a comparison.
pub fn is_sufficient_sample(sample_size: usize, threshold: usize) -> bool {
    sample_size >= threshold
}

/// Benchmark one facility EUI against the peer EUIs of its category.
///
/// The percentile is only disclosed when the sample meets `threshold`; the
/// median is reported whenever the peer set is non-empty.
pub fn compute_benchmark(
    facility_type: BuildingCategory,
    subject_eui: f64,
    peer_euis: &[f64],
    threshold: usize,
) -> Result<BenchmarkResult, StatsError> {
    if !subject_eui.is_finite() {
        return Err(StatsError::InvalidInput(subject_eui));
    }

    let sample_size = peer_euis.len();
    let is_sufficient_data = is_sufficient_sample(sample_size, threshold);
    let percentile = if is_sufficient_data {
        percentile_rank(subject_eui, peer_euis)
    } else {
        0
    };

    Ok(BenchmarkResult {
        facility_type,
        eui: subject_eui,
        category_median_eui: median(peer_euis),
        percentile,
        sample_size,
        is_sufficient_data,
    })
}

/// Group `(category, eui)` entries and compute per-category summary stats.
///
/// Every category present in the input appears exactly once in the output;
/// categories with no entries are simply absent. The 25th/75th percentiles
/// use the nearest-rank index `floor(n * q)` into the sorted values, so a
/// single-entry category has p25 = p75 = median.
pub fn category_aggregates<I>(entries: I) -> BTreeMap<BuildingCategory, CategoryStats>
where
    I: IntoIterator<Item = (BuildingCategory, f64)>,
{
    let mut groups: BTreeMap<BuildingCategory, Vec<f64>> = BTreeMap::new();
    for (category, eui) in entries {
        groups.entry(category).or_default().push(eui);
    }

    groups
        .into_iter()
        .map(|(category, mut euis)| {
            euis.sort_by(|a, b| a.total_cmp(b));
            let n = euis.len();
            let stats = CategoryStats {
                count: n,
                median_eui: median_of_sorted(&euis),
                p25_eui: euis[(n as f64 * 0.25) as usize],
                p75_eui: euis[(n as f64 * 0.75) as usize],
            };
            (category, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_odd_count_returns_middle_element() {
        assert_eq!(median(&[100.0, 150.0, 200.0, 250.0, 300.0]), Some(200.0));
    }

    #[test]
    fn median_even_count_averages_central_pair() {
        assert_eq!(median(&[100.0, 200.0]), Some(150.0));
    }

    #[test]
    fn median_is_order_invariant() {
        let a = median(&[300.0, 100.0, 250.0, 150.0, 200.0]);
        let b = median(&[100.0, 150.0, 200.0, 250.0, 300.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn median_lies_within_input_range() {
        let values = [42.0, 7.0, 99.0, 13.0, 56.0, 21.0];
        let m = median(&values).unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(m >= min && m <= max);
    }

    #[test]
    fn percentile_of_empty_peer_set_is_zero() {
        assert_eq!(percentile_rank(150.0, &[]), 0);
    }

    #[test]
    fn percentile_100_when_strictly_best() {
        assert_eq!(percentile_rank(90.0, &[100.0, 200.0]), 100);
    }

    #[test]
    fn percentile_0_when_strictly_worst() {
        assert_eq!(percentile_rank(500.0, &[100.0, 200.0, 300.0]), 0);
    }

    #[test]
    fn ties_do_not_count_as_worse() {
        // One strictly-worse peer out of three; the two ties contribute nothing.
        assert_eq!(percentile_rank(200.0, &[200.0, 200.0, 300.0]), 33);
    }

    #[test]
    fn sufficiency_boundary_is_inclusive() {
        assert!(is_sufficient_sample(5, 5));
        assert!(!is_sufficient_sample(4, 5));
        assert!(is_sufficient_sample(11, 10));
    }

    #[test]
    fn benchmark_office_subject_beats_four_of_five_peers() {
        let peers = [100.0, 150.0, 200.0, 250.0, 300.0];
        let r = compute_benchmark(BuildingCategory::Office, 120.0, &peers, 5).unwrap();
        assert_eq!(r.category_median_eui, Some(200.0));
        assert_eq!(r.percentile, 80);
        assert_eq!(r.sample_size, 5);
        assert!(r.is_sufficient_data);
    }

    #[test]
    fn benchmark_with_no_peers_is_defined_and_insufficient() {
        let r = compute_benchmark(BuildingCategory::Retail, 150.0, &[], 5).unwrap();
        assert_eq!(r.category_median_eui, None);
        assert_eq!(r.percentile, 0);
        assert_eq!(r.sample_size, 0);
        assert!(!r.is_sufficient_data);
    }

    #[test]
    fn benchmark_withholds_percentile_below_threshold() {
        // Subject would rank at 100, but two peers is below the threshold.
        let r = compute_benchmark(BuildingCategory::Hotel, 90.0, &[100.0, 200.0], 5).unwrap();
        assert_eq!(r.category_median_eui, Some(150.0));
        assert_eq!(r.percentile, 0);
        assert!(!r.is_sufficient_data);
    }

    #[test]
    fn benchmark_even_peer_count_at_low_threshold() {
        let r = compute_benchmark(BuildingCategory::Hotel, 90.0, &[100.0, 200.0], 2).unwrap();
        assert_eq!(r.category_median_eui, Some(150.0));
        assert_eq!(r.percentile, 100);
        assert!(r.is_sufficient_data);
    }

    #[test]
    fn benchmark_rejects_non_finite_subject() {
        let err = compute_benchmark(BuildingCategory::Office, f64::INFINITY, &[100.0], 1)
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
        assert!(compute_benchmark(BuildingCategory::Office, f64::NAN, &[100.0], 1).is_err());
    }

    #[test]
    fn aggregates_group_sort_and_rank() {
        let entries = vec![
            (BuildingCategory::Office, 100.0),
            (BuildingCategory::Office, 200.0),
            (BuildingCategory::Office, 300.0),
            (BuildingCategory::Retail, 50.0),
        ];
        let by_category = category_aggregates(entries);
        assert_eq!(by_category.len(), 2);

        let office = &by_category[&BuildingCategory::Office];
        assert_eq!(office.count, 3);
        assert_eq!(office.median_eui, 200.0);
        assert_eq!(office.p25_eui, 100.0);
        assert_eq!(office.p75_eui, 300.0);

        let retail = &by_category[&BuildingCategory::Retail];
        assert_eq!(retail.count, 1);
        assert_eq!(retail.median_eui, 50.0);
        assert_eq!(retail.p25_eui, 50.0);
        assert_eq!(retail.p75_eui, 50.0);
    }

    #[test]
    fn aggregates_omit_absent_categories() {
        let by_category = category_aggregates(vec![(BuildingCategory::School, 120.0)]);
        assert_eq!(by_category.len(), 1);
        assert!(!by_category.contains_key(&BuildingCategory::Office));
    }
}
