// src/utils/config.rs - Run configuration sourced from the environment
use log::{info, warn};

use crate::models::matching::LinkageOptions;
use crate::utils::constants::{
    DEFAULT_COMPARE_JOBS, DEFAULT_SORTED_NEIGHBOUR_WINDOW, DEFAULT_STRING_THRESHOLD,
};
use crate::utils::env::{env_or, env_string_or};

/// Worker count bounded to `1..=available cores`.
pub fn clamp_jobs(jobs: usize) -> usize {
    jobs.clamp(1, num_cpus::get().max(1))
}

/// Sorted-neighbour windows are centred on a record, so an even width is bumped to the next odd one.
pub fn odd_window(window: usize) -> usize {
    let window = window.max(1);
    if window % 2 == 0 {
        warn!(
            "Sorted-neighbour window {} is even, using {}",
            window,
            window + 1
        );
        window + 1
    } else {
        window
    }
}

#[derive(Debug, Clone)]
pub struct LinkageConfig {
    /// Worker threads for feature computation
    pub n_jobs: usize,
    /// Similarity threshold for text comparisons
    pub string_threshold: f64,
    /// Window for sorted-neighbour rules built from named profiles
    pub sorted_neighbour_window: usize,
    /// Schema holding the business-object tables
    pub warehouse_schema: String,
    /// Schema holding stopwords, countries and geography reference tables
    pub reference_schema: String,
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            n_jobs: DEFAULT_COMPARE_JOBS,
            string_threshold: DEFAULT_STRING_THRESHOLD,
            sorted_neighbour_window: DEFAULT_SORTED_NEIGHBOUR_WINDOW,
            warehouse_schema: "marketing_ops".to_string(),
            reference_schema: "maintenance".to_string(),
        }
    }
}

impl LinkageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let n_jobs = clamp_jobs(env_or("LINKAGE_N_JOBS", defaults.n_jobs));
        let string_threshold =
            env_or("LINKAGE_STRING_THRESHOLD", defaults.string_threshold).clamp(0.0, 1.0);
        let sorted_neighbour_window =
            odd_window(env_or("LINKAGE_SN_WINDOW", defaults.sorted_neighbour_window));

        Self {
            n_jobs,
            string_threshold,
            sorted_neighbour_window,
            warehouse_schema: env_string_or("WAREHOUSE_SCHEMA", &defaults.warehouse_schema),
            reference_schema: env_string_or("REFERENCE_SCHEMA", &defaults.reference_schema),
        }
    }

    pub fn log_config(&self) {
        info!("🔧 Linkage configuration:");
        info!("   • {} comparison worker(s)", self.n_jobs);
        info!("   • string similarity threshold {:.2}", self.string_threshold);
        info!("   • sorted-neighbour window {}", self.sorted_neighbour_window);
        info!(
            "   • warehouse schema '{}', reference schema '{}'",
            self.warehouse_schema, self.reference_schema
        );
    }

    /// Engine options for one run, carrying this configuration's tuning knobs.
    pub fn linkage_options(&self, confidence_score: bool, secondary: bool) -> LinkageOptions {
        LinkageOptions {
            confidence_score,
            secondary,
            n_jobs: self.n_jobs,
            string_threshold: self.string_threshold,
            sorted_neighbour_window: self.sorted_neighbour_window,
        }
    }

    /// Fully qualified business-object table.
    pub fn warehouse_table(&self, table: &str) -> String {
        format!("{}.{}", self.warehouse_schema, table)
    }

    /// Fully qualified reference table.
    pub fn reference_table(&self, table: &str) -> String {
        format!("{}.{}", self.reference_schema, table)
    }
}
