// src/models/matching.rs - Typed matching configuration and match outputs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::constants::{
    DEFAULT_COMPARE_JOBS, DEFAULT_SORTED_NEIGHBOUR_WINDOW, DEFAULT_STRING_THRESHOLD,
};

/// String similarity algorithms available to text comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StringMethod {
    #[default]
    Cosine,
    #[serde(alias = "jaro_winkler")]
    Jarowinkler,
    Levenshtein,
    DamerauLevenshtein,
}

impl StringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringMethod::Cosine => "cosine",
            StringMethod::Jarowinkler => "jarowinkler",
            StringMethod::Levenshtein => "levenshtein",
            StringMethod::DamerauLevenshtein => "damerau_levenshtein",
        }
    }
}

/// How a compare rule scores a pair of fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonKind {
    /// Text fields get the default string method, every other type is compared exactly.
    #[default]
    Auto,
    String { method: StringMethod, threshold: f64 },
    Exact,
}

/// Restricts which record pairs get compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexRule {
    Block {
        left: String,
        right: String,
    },
    SortedNeighbour {
        left: String,
        right: String,
        #[serde(default = "default_window")]
        window: usize,
    },
}

fn default_window() -> usize {
    DEFAULT_SORTED_NEIGHBOUR_WINDOW
}

impl IndexRule {
    pub fn block(left: &str, right: &str) -> Self {
        IndexRule::Block {
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    pub fn sorted_neighbour(left: &str, right: &str) -> Self {
        IndexRule::SortedNeighbour {
            left: left.to_string(),
            right: right.to_string(),
            window: DEFAULT_SORTED_NEIGHBOUR_WINDOW,
        }
    }

    pub fn fields(&self) -> (&str, &str) {
        match self {
            IndexRule::Block { left, right } | IndexRule::SortedNeighbour { left, right, .. } => {
                (left, right)
            }
        }
    }
}

impl fmt::Display for IndexRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRule::Block { left, right } => write!(f, "Block({} = {})", left, right),
            IndexRule::SortedNeighbour {
                left,
                right,
                window,
            } => write!(f, "SortedNeighbourhood({} ~ {}, window={})", left, right, window),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareRule {
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub kind: ComparisonKind,
}

impl CompareRule {
    pub fn auto(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            kind: ComparisonKind::Auto,
        }
    }

    /// Feature column label, e.g. `SF_BillingCity` vs `ZI_City` -> `Match_BillingCity_ZI_City`.
    pub fn label(&self) -> String {
        let stem = self.left.strip_prefix("SF_").unwrap_or(&self.left);
        format!("Match_{}_{}", stem, self.right)
    }
}

/// A named set of index and compare rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingProfile {
    pub name: String,
    pub index: Vec<IndexRule>,
    pub compare: Vec<CompareRule>,
}

impl MatchingProfile {
    /// Every (left, right) field pair the profile touches, in rule order.
    pub fn referenced_columns(&self) -> (Vec<String>, Vec<String>) {
        let mut left_cols = Vec::new();
        let mut right_cols = Vec::new();
        for rule in &self.index {
            let (l, r) = rule.fields();
            left_cols.push(l.to_string());
            right_cols.push(r.to_string());
        }
        for rule in &self.compare {
            left_cols.push(rule.left.clone());
            right_cols.push(rule.right.clone());
        }
        (left_cols, right_cols)
    }
}

/// Positions of a candidate pair within the left and right tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    pub left: usize,
    pub right: usize,
}

impl CandidatePair {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }
}

/// Discretized confidence, right-inclusive bins over (-1, 0, 50, 60, 70, 80].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConfidenceTier {
    None,
    Low,
    Fair,
    Moderate,
    Good,
    High,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::None => "0",
            ConfidenceTier::Low => "0-50",
            ConfidenceTier::Fair => "50-60",
            ConfidenceTier::Moderate => "60-70",
            ConfidenceTier::Good => "70-80",
            ConfidenceTier::High => "80+",
        }
    }
}

/// Knobs for one linkage run.
#[derive(Debug, Clone)]
pub struct LinkageOptions {
    pub confidence_score: bool,
    pub secondary: bool,
    pub n_jobs: usize,
    pub string_threshold: f64,
    pub sorted_neighbour_window: usize,
}

impl Default for LinkageOptions {
    fn default() -> Self {
        Self {
            confidence_score: false,
            secondary: false,
            n_jobs: DEFAULT_COMPARE_JOBS,
            string_threshold: DEFAULT_STRING_THRESHOLD,
            sorted_neighbour_window: DEFAULT_SORTED_NEIGHBOUR_WINDOW,
        }
    }
}
