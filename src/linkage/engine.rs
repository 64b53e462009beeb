// src/linkage/engine.rs - Record linkage between two indexed tables
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use super::comparator::Comparator;
use super::confidence::{account_scores, confidence_scores, confidence_tier};
use super::error::{LinkageError, LinkageResult};
use super::indexer::build_candidates;
use super::profile::ProfileSelector;
use crate::models::matching::{CandidatePair, LinkageOptions, MatchingProfile};
use crate::models::stats_models::LinkageStats;
use crate::models::table::{Column, ColumnType, Table, TableIndex, Value};
use crate::utils::constants::{
    ACCOUNT_COLUMN, CONFIDENCE_BINS_COLUMN, CONFIDENCE_COLUMN, SCORE_COLUMN,
};
use crate::utils::progress_bars::logging::{LinkageLogger, LinkageStage};

/// Matched table plus the counters collected while building it.
#[derive(Debug, Clone)]
pub struct LinkageOutput {
    pub table: Table,
    pub stats: LinkageStats,
}

/// Finds potential matches between a left and a right table under a matching profile.
///
/// ```ignore
/// let linkage = RecordLinkage::new(&accounts, &zoominfo, &ProfileSelector::Named("ZoomInfo".into()), options)?;
/// let matches = linkage.get_potential_matches()?;
/// ```
pub struct RecordLinkage<'a> {
    left: &'a Table,
    right: &'a Table,
    left_index: &'a TableIndex,
    right_index: &'a TableIndex,
    profile: MatchingProfile,
    options: LinkageOptions,
}

impl<'a> RecordLinkage<'a> {
    pub fn new(
        left: &'a Table,
        right: &'a Table,
        selector: &ProfileSelector,
        options: LinkageOptions,
    ) -> LinkageResult<Self> {
        let profile = selector.resolve(options.sorted_neighbour_window)?;
        let left_index = left.index().ok_or(LinkageError::MissingIndex("left"))?;
        let right_index = right.index().ok_or(LinkageError::MissingIndex("right"))?;

        let linkage = Self {
            left,
            right,
            left_index,
            right_index,
            profile,
            options,
        };
        linkage.find_missing_cols();
        Ok(linkage)
    }

    /// Columns the profile references that are absent from the left and right tables.
    pub fn find_missing_cols(&self) -> (Vec<String>, Vec<String>) {
        let (left_cols, right_cols) = self.profile.referenced_columns();
        let left_missing: Vec<String> = left_cols
            .into_iter()
            .filter(|c| !self.left.has_column(c))
            .collect();
        let right_missing: Vec<String> = right_cols
            .into_iter()
            .filter(|c| !self.right.has_column(c))
            .collect();

        let logger = LinkageLogger::new(LinkageStage::Indexing);
        logger.log_missing_columns("left", &left_missing);
        logger.log_missing_columns("right", &right_missing);
        (left_missing, right_missing)
    }

    /// Index, compare, filter, optionally score, and format.
    pub fn get_potential_matches(&self) -> LinkageResult<LinkageOutput> {
        let start = Instant::now();
        let index_logger = LinkageLogger::new(LinkageStage::Indexing);
        index_logger.log_start(&self.profile.name);
        let candidates = build_candidates(self.left, self.right, &self.profile.index, &index_logger);

        let compare_logger = LinkageLogger::new(LinkageStage::Comparison);
        let features = Comparator::new(self.left, self.right, &compare_logger).compute(
            &candidates.pairs,
            &self.profile.compare,
            self.options.string_threshold,
            self.options.n_jobs,
        )?;

        let survivors: Vec<usize> = (0..candidates.pairs.len())
            .filter(|&row| features.row_sum(row) >= 1)
            .collect();
        compare_logger.log_filtering_results(candidates.pairs.len(), survivors.len());

        let mut match_columns: BTreeMap<String, (ColumnType, Vec<Value>)> = BTreeMap::new();
        let kept: BTreeMap<String, Vec<i64>> = features
            .columns
            .iter()
            .map(|(label, column)| (label.clone(), survivors.iter().map(|&r| column[r]).collect()))
            .collect();
        let scores: Vec<i64> = (0..survivors.len())
            .map(|row| kept.values().map(|col| col[row]).sum())
            .collect();
        for (label, column) in &kept {
            match_columns.insert(label.clone(), int_column(column));
        }
        match_columns.insert(SCORE_COLUMN.to_string(), int_column(&scores));

        let mut avg_confidence = None;
        if self.options.confidence_score {
            let confidence_logger = LinkageLogger::new(LinkageStage::Confidence);
            confidence_logger.log_phase("Scoring match confidence", None);
            let confidence = confidence_scores(&kept, survivors.len());
            let tiers: Vec<Value> = confidence
                .iter()
                .map(|&score| Value::text(confidence_tier(score).label()))
                .collect();
            if !confidence.is_empty() {
                avg_confidence =
                    Some(confidence.iter().sum::<i64>() as f64 / confidence.len() as f64);
            }
            match_columns.insert(
                ACCOUNT_COLUMN.to_string(),
                int_column(&account_scores(&kept, survivors.len())),
            );
            match_columns.insert(CONFIDENCE_COLUMN.to_string(), int_column(&confidence));
            match_columns.insert(CONFIDENCE_BINS_COLUMN.to_string(), (ColumnType::Category, tiers));
        }

        let surviving_pairs: Vec<CandidatePair> =
            survivors.iter().map(|&row| candidates.pairs[row]).collect();
        let table = self.format_output(&surviving_pairs, match_columns);

        let stats = LinkageStats {
            profile_name: self.profile.name.clone(),
            left_records: self.left.len(),
            right_records: self.right.len(),
            index_rules_applied: candidates.applied.len(),
            index_rules_skipped: candidates.skipped.len(),
            candidate_pairs: candidates.pairs.len(),
            features_computed: features.columns.len(),
            features_skipped: features.skipped,
            pairs_with_signal: surviving_pairs.len(),
            avg_confidence,
            elapsed: start.elapsed(),
        };
        LinkageLogger::new(LinkageStage::Linkage).log_completion(&stats);
        Ok(LinkageOutput { table, stats })
    }

    /// (left key, left columns, sorted match columns, right key, right columns), one row per pair.
    fn format_output(
        &self,
        pairs: &[CandidatePair],
        match_columns: BTreeMap<String, (ColumnType, Vec<Value>)>,
    ) -> Table {
        let left_names: HashSet<&str> = std::iter::once(self.left_index.name.as_str())
            .chain(self.left.column_names())
            .collect();
        let right_names: HashSet<&str> = std::iter::once(self.right_index.name.as_str())
            .chain(self.right.column_names())
            .collect();
        let left_name = |name: &str| suffixed(name, &right_names, "_df1");
        let right_name = |name: &str| suffixed(name, &left_names, "_df2");

        let mut columns = vec![Column::new(
            left_name(&self.left_index.name),
            infer_type(&self.left_index.labels),
        )];
        columns.extend(
            self.left
                .columns()
                .iter()
                .map(|c| Column::new(left_name(&c.name), c.col_type)),
        );
        columns.extend(
            match_columns
                .iter()
                .map(|(name, (col_type, _))| Column::new(name.clone(), *col_type)),
        );
        columns.push(Column::new(
            right_name(&self.right_index.name),
            infer_type(&self.right_index.labels),
        ));
        columns.extend(
            self.right
                .columns()
                .iter()
                .map(|c| Column::new(right_name(&c.name), c.col_type)),
        );

        let mut order: Vec<usize> = (0..pairs.len()).collect();
        if self.options.secondary {
            order.sort_by_key(|&i| (pairs[i].right, pairs[i].left));
        }

        let mut table = Table::new(columns);
        for i in order {
            let pair = pairs[i];
            let mut row = Vec::with_capacity(table.columns().len());
            row.push(self.left_index.labels[pair.left].clone());
            row.extend(self.left.rows()[pair.left].iter().cloned());
            row.extend(match_columns.values().map(|(_, values)| values[i].clone()));
            row.push(self.right_index.labels[pair.right].clone());
            row.extend(self.right.rows()[pair.right].iter().cloned());
            table.push_row(row);
        }
        table
    }
}

fn int_column(values: &[i64]) -> (ColumnType, Vec<Value>) {
    (ColumnType::Int, values.iter().map(|&v| Value::Int(v)).collect())
}

fn suffixed(name: &str, other_side: &HashSet<&str>, suffix: &str) -> String {
    if other_side.contains(name) {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}

fn infer_type(labels: &[Value]) -> ColumnType {
    match labels.iter().find(|v| !v.is_null()) {
        Some(Value::Int(_)) => ColumnType::Int,
        Some(Value::Float(_)) => ColumnType::Float,
        Some(Value::Bool(_)) => ColumnType::Bool,
        Some(Value::DateTime(_)) => ColumnType::DateTime,
        _ => ColumnType::Text,
    }
}
