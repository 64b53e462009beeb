// src/models/stats_models.rs
use serde::Serialize;
use std::time::Duration;

/// Counters collected over a single linkage run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkageStats {
    pub profile_name: String,
    pub left_records: usize,
    pub right_records: usize,
    pub index_rules_applied: usize,
    pub index_rules_skipped: usize,
    pub candidate_pairs: usize,
    pub features_computed: usize,
    pub features_skipped: usize,
    pub pairs_with_signal: usize,
    pub avg_confidence: Option<f64>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl LinkageStats {
    pub fn reduction_ratio(&self) -> f64 {
        let full = (self.left_records * self.right_records) as f64;
        if full == 0.0 {
            0.0
        } else {
            1.0 - self.candidate_pairs as f64 / full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_ratio() {
        let stats = LinkageStats {
            left_records: 10,
            right_records: 10,
            candidate_pairs: 25,
            ..Default::default()
        };
        assert!((stats.reduction_ratio() - 0.75).abs() < 1e-9);
        assert_eq!(LinkageStats::default().reduction_ratio(), 0.0);
    }
}
