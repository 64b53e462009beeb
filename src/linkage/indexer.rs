// src/linkage/indexer.rs - Candidate pair generation (blocking and sorted neighbourhood)
use std::collections::{BTreeMap, BTreeSet};

use crate::models::matching::{CandidatePair, IndexRule};
use crate::models::table::{IndexKey, Table, Value};
use crate::utils::progress_bars::logging::LinkageLogger;

/// Union of the pairs admitted by every usable rule.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    pub pairs: Vec<CandidatePair>,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

fn keys(values: &[&Value]) -> Vec<Option<IndexKey>> {
    values.iter().map(|v| v.index_key()).collect()
}

/// Pairs with equal, non-null keys.
pub fn block_pairs(left: &[Option<IndexKey>], right: &[Option<IndexKey>], out: &mut BTreeSet<CandidatePair>) {
    let mut by_key: BTreeMap<&IndexKey, Vec<usize>> = BTreeMap::new();
    for (pos, key) in right.iter().enumerate() {
        if let Some(key) = key {
            by_key.entry(key).or_default().push(pos);
        }
    }
    for (l, key) in left.iter().enumerate() {
        let Some(matches) = key.as_ref().and_then(|k| by_key.get(k)) else {
            continue;
        };
        for &r in matches {
            out.insert(CandidatePair::new(l, r));
        }
    }
}

/// Pairs whose keys sit within `window / 2` ranks of each other in the sorted union of distinct keys.
pub fn sorted_neighbour_pairs(
    left: &[Option<IndexKey>],
    right: &[Option<IndexKey>],
    window: usize,
    out: &mut BTreeSet<CandidatePair>,
) {
    let distinct: BTreeSet<&IndexKey> = left.iter().chain(right).flatten().collect();
    let rank: BTreeMap<&IndexKey, usize> = distinct.into_iter().enumerate().map(|(i, k)| (k, i)).collect();

    let mut right_by_rank: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (pos, key) in right.iter().enumerate() {
        if let Some(r) = key.as_ref().and_then(|k| rank.get(k)) {
            right_by_rank.entry(*r).or_default().push(pos);
        }
    }

    let half = window / 2;
    for (l, key) in left.iter().enumerate() {
        let Some(&r) = key.as_ref().and_then(|k| rank.get(k)) else {
            continue;
        };
        for positions in right_by_rank.range(r.saturating_sub(half)..=r + half).map(|(_, p)| p) {
            for &pos in positions {
                out.insert(CandidatePair::new(l, pos));
            }
        }
    }
}

/// True when `pair` satisfies `rule` on the given tables. Missing columns never admit.
pub fn rule_admits(rule: &IndexRule, left: &Table, right: &Table, pair: CandidatePair) -> bool {
    let (lf, rf) = rule.fields();
    let (Some(l), Some(r)) = (left.value(pair.left, lf), right.value(pair.right, rf)) else {
        return false;
    };
    match rule {
        IndexRule::Block { .. } => l.index_key().is_some() && l.index_key() == r.index_key(),
        IndexRule::SortedNeighbour { .. } => {
            let mut single = BTreeSet::new();
            let (Some(lv), Some(rv)) = (left.column_values(lf), right.column_values(rf)) else {
                return false;
            };
            sorted_neighbour_pairs_for(rule, &lv, &rv, &mut single);
            single.contains(&pair)
        }
    }
}

fn sorted_neighbour_pairs_for(
    rule: &IndexRule,
    left: &[&Value],
    right: &[&Value],
    out: &mut BTreeSet<CandidatePair>,
) {
    if let IndexRule::SortedNeighbour { window, .. } = rule {
        sorted_neighbour_pairs(&keys(left), &keys(right), *window, out);
    }
}

/// Apply every rule and union the results, ordered by left then right position.
pub fn build_candidates(
    left: &Table,
    right: &Table,
    rules: &[IndexRule],
    logger: &LinkageLogger,
) -> CandidateIndex {
    let mut pairs = BTreeSet::new();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for rule in rules {
        let (lf, rf) = rule.fields();
        let (Some(left_values), Some(right_values)) = (left.column_values(lf), right.column_values(rf))
        else {
            logger.log_warning(&format!("Skipping index rule {}: column missing", rule));
            skipped.push(rule.to_string());
            continue;
        };
        match rule {
            IndexRule::Block { .. } => {
                block_pairs(&keys(&left_values), &keys(&right_values), &mut pairs)
            }
            IndexRule::SortedNeighbour { .. } => {
                sorted_neighbour_pairs_for(rule, &left_values, &right_values, &mut pairs)
            }
        }
        applied.push(rule.to_string());
    }

    let pairs: Vec<CandidatePair> = pairs.into_iter().collect();
    logger.log_candidates(pairs.len(), &applied);
    CandidateIndex {
        pairs,
        applied,
        skipped,
    }
}
