// src/linkage/comparator.rs - Field-level comparisons over candidate pairs
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::error::LinkageResult;
use crate::models::matching::{CandidatePair, CompareRule, ComparisonKind, StringMethod};
use crate::models::table::{ColumnType, Table, Value};
use crate::utils::constants::COSINE_NGRAM;
use crate::utils::progress_bars::logging::LinkageLogger;

/// A compare rule resolved against the actual column types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    String { method: StringMethod, threshold: f64 },
    Exact,
}

fn is_textual(col_type: ColumnType) -> bool {
    matches!(col_type, ColumnType::Text | ColumnType::Category)
}

/// Pick the comparison for a rule, or `None` when the column types differ.
pub fn resolve_comparison(
    kind: ComparisonKind,
    left_type: ColumnType,
    right_type: ColumnType,
    default_threshold: f64,
) -> Option<Comparison> {
    let same_family = left_type == right_type || (is_textual(left_type) && is_textual(right_type));
    if !same_family {
        return None;
    }
    Some(match kind {
        ComparisonKind::Auto if is_textual(left_type) => Comparison::String {
            method: StringMethod::Cosine,
            threshold: default_threshold,
        },
        ComparisonKind::Auto | ComparisonKind::Exact => Comparison::Exact,
        ComparisonKind::String { method, threshold } => Comparison::String { method, threshold },
    })
}

fn ngram_counts(text: &str) -> HashMap<Vec<char>, usize> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut counts = HashMap::new();
    for gram in chars.windows(COSINE_NGRAM) {
        *counts.entry(gram.to_vec()).or_insert(0) += 1;
    }
    counts
}

/// Cosine similarity of character-bigram count vectors, case folded.
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    if a.to_lowercase() == b.to_lowercase() && !a.is_empty() {
        return 1.0;
    }
    let (va, vb) = (ngram_counts(a), ngram_counts(b));
    let dot: usize = va
        .iter()
        .filter_map(|(gram, ca)| vb.get(gram).map(|cb| ca * cb))
        .sum();
    let norm = |v: &HashMap<Vec<char>, usize>| (v.values().map(|c| (c * c) as f64).sum::<f64>()).sqrt();
    let denom = norm(&va) * norm(&vb);
    if denom == 0.0 {
        0.0
    } else {
        dot as f64 / denom
    }
}

pub fn string_similarity(method: StringMethod, a: &str, b: &str) -> f64 {
    match method {
        StringMethod::Cosine => cosine_similarity(a, b),
        StringMethod::Jarowinkler => strsim::jaro_winkler(a, b),
        StringMethod::Levenshtein => strsim::normalized_levenshtein(a, b),
        StringMethod::DamerauLevenshtein => strsim::normalized_damerau_levenshtein(a, b),
    }
}

/// 1 when the pair matches under `comparison`, 0 otherwise. Nulls never match.
pub fn score_values(comparison: Comparison, left: &Value, right: &Value) -> i64 {
    if left.is_null() || right.is_null() {
        return 0;
    }
    let matched = match comparison {
        Comparison::Exact => left == right,
        Comparison::String { method, threshold } => {
            string_similarity(method, &left.to_string(), &right.to_string()) >= threshold
        }
    };
    i64::from(matched)
}

/// A feature column ready to be computed.
#[derive(Debug, Clone)]
struct ResolvedFeature {
    label: String,
    left_pos: usize,
    right_pos: usize,
    comparison: Comparison,
}

/// Binary feature columns keyed (and therefore sorted) by label, aligned with the candidate pairs.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub columns: BTreeMap<String, Vec<i64>>,
    pub skipped: usize,
}

impl FeatureSet {
    pub fn row_sum(&self, row: usize) -> i64 {
        self.columns.values().map(|col| col[row]).sum()
    }
}

pub struct Comparator<'a> {
    left: &'a Table,
    right: &'a Table,
    logger: &'a LinkageLogger,
}

impl<'a> Comparator<'a> {
    pub fn new(left: &'a Table, right: &'a Table, logger: &'a LinkageLogger) -> Self {
        Self { left, right, logger }
    }

    fn resolve(&self, rules: &[CompareRule], default_threshold: f64) -> (Vec<ResolvedFeature>, usize) {
        let mut resolved = Vec::new();
        let mut labels = HashSet::new();
        let mut skipped = 0;
        for rule in rules {
            let label = rule.label();
            if labels.contains(&label) {
                self.logger.log_warning(&format!(
                    "Comparison {} vs {} duplicates feature '{}', skipping",
                    rule.left, rule.right, label
                ));
                skipped += 1;
                continue;
            }
            let (Some(left_pos), Some(right_pos)) = (
                self.left.column_position(&rule.left),
                self.right.column_position(&rule.right),
            ) else {
                self.logger.log_debug(&format!(
                    "Skipping comparison {} vs {}: column missing",
                    rule.left, rule.right
                ));
                skipped += 1;
                continue;
            };
            let left_type = self.left.columns()[left_pos].col_type;
            let right_type = self.right.columns()[right_pos].col_type;
            match resolve_comparison(rule.kind, left_type, right_type, default_threshold) {
                Some(comparison) => {
                    labels.insert(label.clone());
                    resolved.push(ResolvedFeature {
                        label,
                        left_pos,
                        right_pos,
                        comparison,
                    });
                }
                None => {
                    self.logger.log_warning(&format!(
                        "Column '{}' ({}) and column '{}' ({}) have different data types, skipping",
                        rule.left,
                        left_type.as_str(),
                        rule.right,
                        right_type.as_str()
                    ));
                    skipped += 1;
                }
            }
        }
        (resolved, skipped)
    }

    /// Compute every resolvable feature column on a pool of `n_jobs` workers.
    pub fn compute(
        &self,
        pairs: &[CandidatePair],
        rules: &[CompareRule],
        default_threshold: f64,
        n_jobs: usize,
    ) -> LinkageResult<FeatureSet> {
        let (features, skipped) = self.resolve(rules, default_threshold);
        let labels: Vec<String> = features.iter().map(|f| f.label.clone()).collect();
        self.logger.log_features(&labels, n_jobs);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs.max(1))
            .build()?;
        let left_rows = self.left.rows();
        let right_rows = self.right.rows();
        let computed: Vec<(String, Vec<i64>)> = pool.install(|| {
            features
                .par_iter()
                .map(|feature| {
                    let scores = pairs
                        .iter()
                        .map(|pair| {
                            score_values(
                                feature.comparison,
                                &left_rows[pair.left][feature.left_pos],
                                &right_rows[pair.right][feature.right_pos],
                            )
                        })
                        .collect();
                    (feature.label.clone(), scores)
                })
                .collect()
        });

        Ok(FeatureSet {
            columns: computed.into_iter().collect(),
            skipped,
        })
    }
}
