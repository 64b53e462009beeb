// src/utils/constants.rs

/// Minimum string similarity for a text comparison to count as a match.
pub const DEFAULT_STRING_THRESHOLD: f64 = 0.85;

/// Sorted-neighbourhood window; pairs whose ranks differ by at most `window / 2` are admitted.
pub const DEFAULT_SORTED_NEIGHBOUR_WINDOW: usize = 3;

/// Worker count for feature computation when none is configured.
pub const DEFAULT_COMPARE_JOBS: usize = 4;

/// Character n-gram size used by the cosine string comparison.
pub const COSINE_NGRAM: usize = 2;

/// Attribute groups (alternatives matched anywhere in a feature label) and their confidence weights.
pub const CONFIDENCE_WEIGHTS: [(&[&str], u32); 5] = [
    (&["Match_AccountName", "Match_WebsiteClean", "Match_Domain"], 40),
    (&["Match_BillingCity"], 20),
    (&["Match_BillingStateClean"], 10),
    (&["Match_BillingPostalCode"], 20),
    (&["Match_BillingCountryClean"], 10),
];

/// Right-inclusive bin edges for confidence tiers. Scores above the last edge form the top tier.
pub const CONFIDENCE_BIN_EDGES: [i64; 6] = [-1, 0, 50, 60, 70, 80];

pub const SCORE_COLUMN: &str = "Match_zScore";
pub const ACCOUNT_COLUMN: &str = "Match_zAccount";
pub const CONFIDENCE_COLUMN: &str = "Match_zConfidence";
pub const CONFIDENCE_BINS_COLUMN: &str = "Match_zConfidence_bins";
