// src/linkage/confidence.rs - Weighted match confidence and tiers
use std::collections::BTreeMap;

use crate::models::matching::ConfidenceTier;
use crate::utils::constants::{CONFIDENCE_BIN_EDGES, CONFIDENCE_WEIGHTS};

fn group_columns<'a>(
    features: &'a BTreeMap<String, Vec<i64>>,
    alternatives: &'a [&'a str],
) -> impl Iterator<Item = &'a Vec<i64>> + 'a {
    features
        .iter()
        .filter(move |(label, _)| alternatives.iter().any(|alt| label.contains(alt)))
        .map(|(_, column)| column)
}

/// Sum of the name / website / domain indicators per row.
pub fn account_scores(features: &BTreeMap<String, Vec<i64>>, rows: usize) -> Vec<i64> {
    let (alternatives, _) = CONFIDENCE_WEIGHTS[0];
    let mut totals = vec![0i64; rows];
    for column in group_columns(features, alternatives) {
        for (total, value) in totals.iter_mut().zip(column) {
            *total += value;
        }
    }
    totals
}

/// 0-100 score: each weight group counts once if any of its columns fired.
pub fn confidence_scores(features: &BTreeMap<String, Vec<i64>>, rows: usize) -> Vec<i64> {
    let max_score: u32 = CONFIDENCE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut totals = vec![0u32; rows];
    for (alternatives, weight) in CONFIDENCE_WEIGHTS.iter() {
        let mut fired = vec![false; rows];
        for column in group_columns(features, alternatives) {
            for (flag, value) in fired.iter_mut().zip(column) {
                *flag |= *value > 0;
            }
        }
        for (total, hit) in totals.iter_mut().zip(fired) {
            if hit {
                *total += weight;
            }
        }
    }
    totals
        .into_iter()
        .map(|t| (f64::from(t) / f64::from(max_score) * 100.0).round() as i64)
        .collect()
}

/// Right-inclusive binning over the fixed edges. Anything above the last edge is `High`.
pub fn confidence_tier(score: i64) -> ConfidenceTier {
    const TIERS: [ConfidenceTier; 5] = [
        ConfidenceTier::None,
        ConfidenceTier::Low,
        ConfidenceTier::Fair,
        ConfidenceTier::Moderate,
        ConfidenceTier::Good,
    ];
    CONFIDENCE_BIN_EDGES
        .windows(2)
        .zip(TIERS)
        .find(|(edges, _)| score > edges[0] && score <= edges[1])
        .map(|(_, tier)| tier)
        .unwrap_or(ConfidenceTier::High)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(columns: &[(&str, Vec<i64>)]) -> BTreeMap<String, Vec<i64>> {
        columns
            .iter()
            .map(|(label, values)| (label.to_string(), values.clone()))
            .collect()
    }

    #[test]
    fn test_confidence_counts_each_group_once() {
        let f = features(&[
            ("Match_AccountName_ZI_AccountName", vec![1, 1, 0]),
            ("Match_AccountNameClean_ZI_AccountNameClean", vec![1, 0, 0]),
            ("Match_BillingCity_ZI_City", vec![1, 0, 0]),
            ("Match_BillingCountryClean_ZI_CountryClean", vec![0, 0, 1]),
        ]);
        assert_eq!(confidence_scores(&f, 3), vec![60, 40, 10]);
        assert_eq!(account_scores(&f, 3), vec![2, 1, 0]);
    }

    #[test]
    fn test_unweighted_features_score_zero() {
        let f = features(&[("Match_SIC_ZI_SICCode", vec![1])]);
        assert_eq!(confidence_scores(&f, 1), vec![0]);
    }

    #[test]
    fn test_all_groups_reach_one_hundred() {
        let f = features(&[
            ("Match_DomainClean_DNB_DomainClean", vec![1]),
            ("Match_BillingCity_DNB_City", vec![1]),
            ("Match_BillingStateClean_DNB_StateClean", vec![1]),
            ("Match_BillingPostalCode_DNB_PostalCode", vec![1]),
            ("Match_BillingCountryClean_DNB_CountryClean", vec![1]),
        ]);
        assert_eq!(confidence_scores(&f, 1), vec![100]);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(confidence_tier(0), ConfidenceTier::None);
        assert_eq!(confidence_tier(1), ConfidenceTier::Low);
        assert_eq!(confidence_tier(50), ConfidenceTier::Low);
        assert_eq!(confidence_tier(51), ConfidenceTier::Fair);
        assert_eq!(confidence_tier(60), ConfidenceTier::Fair);
        assert_eq!(confidence_tier(70), ConfidenceTier::Moderate);
        assert_eq!(confidence_tier(80), ConfidenceTier::Good);
        assert_eq!(confidence_tier(81), ConfidenceTier::High);
        assert_eq!(confidence_tier(100), ConfidenceTier::High);
    }

    #[test]
    fn test_tier_is_monotonic() {
        let tiers: Vec<ConfidenceTier> = (0..=100).map(confidence_tier).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
    }
}
