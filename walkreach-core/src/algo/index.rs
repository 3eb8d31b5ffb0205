//! Per-building accessibility indices

use std::collections::BTreeMap;

use log::{debug, info};
use ndarray::Array2;

use super::pca::Pca;
use super::reach::BuildingReach;
use crate::model::AccessibilityWeights;

/// Cumulative explained variance the retained components must reach
pub const PCA_VARIANCE_THRESHOLD: f64 = 0.95;

/// Building reach row with both service indices attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBuilding {
    pub reach: BuildingReach,
    pub service_index: f64,
    pub service_index_pca: f64,
}

/// Sum of `group_weight × subgroup_weight` over the weighted subgroups this
/// building reaches at least once. The count itself does not matter.
pub fn weighted_sum_index(counts: &BTreeMap<String, usize>, weights: &AccessibilityWeights) -> f64 {
    weights
        .iter()
        .filter(|(subgroup, _)| counts.get(*subgroup).is_some_and(|&count| count > 0))
        .map(|(_, weight)| weight.factor())
        .sum()
}

/// PCA score per building, rescaled to `[0, 100]` over the given set.
///
/// Features are the weighted subgroup counts in weight-table order.
pub fn pca_index(counts: &[&BTreeMap<String, usize>], weights: &AccessibilityWeights) -> Vec<f64> {
    let mut features = Array2::<f64>::zeros((counts.len(), weights.len()));
    for (row, building) in counts.iter().enumerate() {
        for (column, (subgroup, weight)) in weights.iter().enumerate() {
            let count = building.get(subgroup).copied().unwrap_or(0);
            features[[row, column]] = count as f64 * weight.factor();
        }
    }

    let pca = Pca::fit(&features.view());
    let retained = pca.components_for_variance(PCA_VARIANCE_THRESHOLD);
    debug!(
        "PCA retained {retained} of {} components",
        pca.eigenvalues().len()
    );

    rescale(&pca.summed_scores(retained).to_vec())
}

/// Linear map of `raw` onto `[0, 100]`; all zeros when the values are equal
pub(crate) fn rescale(raw: &[f64]) -> Vec<f64> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > min) {
        return vec![0.0; raw.len()];
    }

    let span = max - min;
    raw.iter()
        .map(|&value| ((value - min) / span * 100.0).clamp(0.0, 100.0))
        .collect()
}

/// Attaches both indices to every building row
pub fn score_buildings(rows: Vec<BuildingReach>, weights: &AccessibilityWeights) -> Vec<ScoredBuilding> {
    let counts: Vec<&BTreeMap<String, usize>> =
        rows.iter().map(|row| &row.subgroup_counts).collect();
    let pca_scores = pca_index(&counts, weights);

    let scored: Vec<ScoredBuilding> = rows
        .into_iter()
        .zip(pca_scores)
        .map(|(reach, service_index_pca)| ScoredBuilding {
            service_index: weighted_sum_index(&reach.subgroup_counts, weights),
            reach,
            service_index_pca,
        })
        .collect();

    info!(
        "Scored {} buildings across {} subgroups",
        scored.len(),
        weights.len()
    );
    scored
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;

    fn counts(entries: &[(&str, usize)]) -> BTreeMap<String, usize> {
        entries
            .iter()
            .map(|(name, count)| ((*name).to_string(), *count))
            .collect()
    }

    fn row(id: i64, entries: &[(&str, usize)]) -> BuildingReach {
        BuildingReach {
            id,
            geometry: point! { x: 0.0, y: 0.0 },
            floors: 5,
            apartments: 40,
            region: None,
            subgroup_counts: counts(entries),
        }
    }

    #[test]
    fn weighted_sum_ignores_count_magnitude() {
        let weights = AccessibilityWeights::new([("park", 2.0, 3.0)]).unwrap();
        let one = weighted_sum_index(&counts(&[("park", 1)]), &weights);
        let five = weighted_sum_index(&counts(&[("park", 5)]), &weights);
        assert_eq!(one, 6.0);
        assert_eq!(one, five);
    }

    #[test]
    fn weighted_sum_skips_absent_and_unweighted_subgroups() {
        let weights =
            AccessibilityWeights::new([("park", 2.0, 3.0), ("school", 1.0, 0.5)]).unwrap();
        assert_eq!(weighted_sum_index(&counts(&[]), &weights), 0.0);
        assert_eq!(weighted_sum_index(&counts(&[("park", 0)]), &weights), 0.0);
        assert_eq!(
            weighted_sum_index(&counts(&[("school", 2), ("cafe", 9)]), &weights),
            0.5
        );
    }

    #[test]
    fn pca_index_of_single_column_is_linear() {
        let weights = AccessibilityWeights::new([("park", 1.0, 1.0)]).unwrap();
        let rows = [counts(&[]), counts(&[("park", 1)]), counts(&[("park", 2)])];
        let refs: Vec<_> = rows.iter().collect();
        let scores = pca_index(&refs, &weights);
        assert!((scores[0] - 0.0).abs() < 1e-9);
        assert!((scores[1] - 50.0).abs() < 1e-9);
        assert!((scores[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn pca_index_stays_within_bounds() {
        let weights = AccessibilityWeights::new([
            ("park", 1.0, 2.0),
            ("school", 3.0, 1.0),
            ("clinic", 0.5, 0.5),
        ])
        .unwrap();
        let rows = [
            counts(&[("park", 3), ("school", 1)]),
            counts(&[("park", 1), ("clinic", 4)]),
            counts(&[("school", 2), ("clinic", 1)]),
            counts(&[]),
            counts(&[("park", 6), ("school", 3), ("clinic", 2)]),
        ];
        let refs: Vec<_> = rows.iter().collect();
        let scores = pca_index(&refs, &weights);

        assert!(scores.iter().all(|&s| (0.0..=100.0).contains(&s)));
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert!((max - 100.0).abs() < 1e-9);
    }

    #[test]
    fn pca_index_of_identical_buildings_is_zero() {
        let weights = AccessibilityWeights::new([("park", 1.0, 1.0)]).unwrap();
        let rows = [counts(&[("park", 2)]), counts(&[("park", 2)])];
        let refs: Vec<_> = rows.iter().collect();
        assert_eq!(pca_index(&refs, &weights), vec![0.0, 0.0]);
        assert!(pca_index(&[], &weights).is_empty());
    }

    #[test]
    fn score_buildings_keeps_row_order() {
        let weights = AccessibilityWeights::new([("park", 2.0, 3.0)]).unwrap();
        let scored = score_buildings(vec![row(7, &[("park", 4)]), row(8, &[])], &weights);
        assert_eq!(scored[0].reach.id, 7);
        assert_eq!(scored[0].service_index, 6.0);
        assert_eq!(scored[0].service_index_pca, 100.0);
        assert_eq!(scored[1].service_index, 0.0);
        assert_eq!(scored[1].service_index_pca, 0.0);
    }
}
