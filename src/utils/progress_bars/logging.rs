// src/utils/progress_bars/logging.rs - Logging helpers for the cleaning and linkage stages
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::stats_models::LinkageStats;

/// The pipeline stage a logger reports for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageStage {
    Dataset,
    NameCleaning,
    Geography,
    Indexing,
    Comparison,
    Confidence,
    Linkage,
}

impl LinkageStage {
    fn tag(&self) -> (&'static str, &'static str) {
        match self {
            LinkageStage::Dataset => ("DATASET", "🗄️"),
            LinkageStage::NameCleaning => ("NAME", "👤"),
            LinkageStage::Geography => ("GEO", "📍"),
            LinkageStage::Indexing => ("INDEX", "🧱"),
            LinkageStage::Comparison => ("COMPARE", "🔍"),
            LinkageStage::Confidence => ("CONFIDENCE", "🎯"),
            LinkageStage::Linkage => ("LINKAGE", "🔗"),
        }
    }
}

#[derive(Clone)]
pub struct LinkageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl LinkageLogger {
    pub fn new(stage: LinkageStage) -> Self {
        let (stage_name, stage_emoji) = stage.tag();
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, subject: &str) {
        info!(
            "[{}] {} 🚀 Starting {} ({})",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            subject
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {} records",
            self.stage_name, self.stage_emoji, count, data_type
        );
    }

    pub fn log_missing_columns(&self, side: &str, missing: &[String]) {
        if missing.is_empty() {
            debug!(
                "[{}] {} All referenced {} columns present",
                self.stage_name, self.stage_emoji, side
            );
        } else {
            warn!(
                "[{}] {} ⚠️  Missing labels in {}: {:?}",
                self.stage_name, self.stage_emoji, side, missing
            );
        }
    }

    pub fn log_candidates(&self, candidate_pairs: usize, rules: &[String]) {
        info!(
            "[{}] {} 🧱 Blocks: {:?}",
            self.stage_name, self.stage_emoji, rules
        );
        info!(
            "[{}] {} 📈 Potential duplicates found: {}",
            self.stage_name, self.stage_emoji, candidate_pairs
        );
    }

    pub fn log_features(&self, labels: &[String], n_jobs: usize) {
        info!(
            "[{}] {} ⚙️  Comparison features ({} worker(s)): {:?}",
            self.stage_name, self.stage_emoji, n_jobs, labels
        );
    }

    pub fn log_filtering_results(&self, original_pairs: usize, remaining_pairs: usize) {
        let percent_kept = if original_pairs > 0 {
            (remaining_pairs as f64 / original_pairs as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 🎯 Pair filtering: {} total → {} with match signal ({:.1}% kept)",
            self.stage_name, self.stage_emoji, original_pairs, remaining_pairs, percent_kept
        );
    }

    pub fn log_completion(&self, stats: &LinkageStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED '{}': {} matched pairs from {} candidates in {:.2?}",
            self.stage_name,
            self.stage_emoji,
            stats.profile_name,
            stats.pairs_with_signal,
            stats.candidate_pairs,
            duration
        );
        info!(
            "[{}] {} 📊 Results: {} x {} records, reduction ratio {:.4}, {} features computed, {} skipped{}",
            self.stage_name,
            self.stage_emoji,
            stats.left_records,
            stats.right_records,
            stats.reduction_ratio(),
            stats.features_computed,
            stats.features_skipped,
            stats
                .avg_confidence
                .map(|c| format!(", avg confidence {:.1}", c))
                .unwrap_or_default()
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.stage_name, self.stage_emoji, count, issue_type
            );
        }
    }
}

pub fn log_job_start(run_id: &str, profile: &str, left: &str, right: &str) {
    info!("🚀 ===== ACCOUNT LINKAGE JOB STARTING =====");
    info!("📅 Run ID: {}", run_id);
    info!("🎯 Profile: {}", profile);
    info!("🗄️  Left dataset: {}  |  Right dataset: {}", left, right);
    info!("==========================================");
}

pub fn log_job_phase(phase: &str, details: Option<&str>) {
    let msg = if let Some(details) = details {
        format!("🔄 Job Phase: {} - {}", phase, details)
    } else {
        format!("🔄 Job Phase: {}", phase)
    };
    info!("{}", msg);
}

pub fn log_job_completion(run_id: &str, duration: std::time::Duration, stats: &LinkageStats) {
    info!("🎉 ===== ACCOUNT LINKAGE JOB COMPLETED =====");
    info!("📅 Run ID: {}", run_id);
    info!("⏱️  Total Duration: {:.2?}", duration);
    info!(
        "🎯 Matched pairs: {} (from {} candidates)",
        stats.pairs_with_signal, stats.candidate_pairs
    );
    info!("===========================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_has_its_own_stage_tag() {
        let logger = LinkageLogger::new(LinkageStage::Linkage);
        assert_eq!(logger.stage_name, "LINKAGE");
        assert_ne!(LinkageStage::Linkage.tag(), LinkageStage::Confidence.tag());
    }
}
