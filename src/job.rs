// src/job.rs - Linkage job: load both datasets, standardize geography, link, report
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join;
use indicatif::ProgressBar;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use crate::cleaning::geo::GeoStandardizer;
use crate::datasets::{DatasetBuilder, DatasetKind};
use crate::linkage::engine::{LinkageOutput, RecordLinkage};
use crate::linkage::profile::ProfileSelector;
use crate::models::stats_models::LinkageStats;
use crate::models::table::{Table, Value};
use crate::utils::config::LinkageConfig;
use crate::utils::progress_bars::logging::{log_job_phase, LinkageLogger, LinkageStage};
use crate::utils::warehouse::QueryExecutor;

/// Phases advanced on the job progress bar.
pub const JOB_PHASES: u64 = 4;

/// What to link against what.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub profile: ProfileSelector,
    pub left: DatasetKind,
    pub right: DatasetKind,
    pub left_filter: Option<String>,
    pub right_filter: Option<String>,
    pub confidence_score: bool,
    pub secondary: bool,
}

impl JobSpec {
    pub fn profile_label(&self) -> String {
        match &self.profile {
            ProfileSelector::Named(name) => name.clone(),
            ProfileSelector::Inline(profile) => profile.name.clone(),
        }
    }
}

fn advance(progress: Option<&ProgressBar>, message: &str) {
    if let Some(pb) = progress {
        pb.set_message(message.to_string());
        pb.inc(1);
    }
}

fn standardize(geo: &GeoStandardizer, table: &mut Table, kind: DatasetKind) {
    if let Some((country, state)) = kind.geo_columns() {
        geo.standardize_country(table, country);
        geo.standardize_state(table, state);
    }
}

/// Build both datasets concurrently, standardize account geography, and run the linkage.
pub async fn run_linkage_job<E: QueryExecutor>(
    client: &E,
    config: &LinkageConfig,
    spec: &JobSpec,
    progress: Option<&ProgressBar>,
) -> Result<LinkageOutput> {
    let builder = DatasetBuilder::new(client, config);

    log_job_phase(
        "Loading datasets",
        Some(&format!("{} ⟷ {}", spec.left, spec.right)),
    );
    let (mut left, mut right) = try_join(
        builder.build(spec.left, spec.left_filter.as_deref()),
        builder.build(spec.right, spec.right_filter.as_deref()),
    )
    .await
    .context("Failed to load linkage datasets")?;
    advance(progress, "datasets loaded");

    if spec.left.geo_columns().is_some() || spec.right.geo_columns().is_some() {
        log_job_phase("Standardizing geography", None);
        let geo = GeoStandardizer::load(client, config).await?;
        standardize(&geo, &mut left, spec.left);
        standardize(&geo, &mut right, spec.right);
    }
    advance(progress, "geography standardized");

    log_job_phase("Linking records", Some(&spec.profile_label()));
    let options = config.linkage_options(spec.confidence_score, spec.secondary);
    let linkage = RecordLinkage::new(&left, &right, &spec.profile, options)?;
    let output = linkage.get_potential_matches()?;
    advance(progress, "linkage complete");

    if output.table.is_empty() {
        LinkageLogger::new(LinkageStage::Linkage)
            .log_warning("No candidate pair carried any match signal");
    }
    Ok(output)
}

#[derive(Serialize)]
struct ColumnReport<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    col_type: &'static str,
}

#[derive(Serialize)]
struct MatchReport<'a> {
    run_id: &'a str,
    generated_at: DateTime<Utc>,
    stats: &'a LinkageStats,
    columns: Vec<ColumnReport<'a>>,
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn report<'a>(run_id: &'a str, output: &'a LinkageOutput) -> Result<MatchReport<'a>> {
    let names = output.table.column_names();
    let columns = output
        .table
        .columns()
        .iter()
        .map(|c| ColumnReport {
            name: &c.name,
            col_type: c.col_type.as_str(),
        })
        .collect();
    let rows = output
        .table
        .rows()
        .iter()
        .map(|row| {
            names
                .iter()
                .zip(row)
                .map(|(name, value): (&&str, &Value)| {
                    serde_json::to_value(value).map(|json| (name.to_string(), json))
                })
                .collect::<Result<serde_json::Map<_, _>, serde_json::Error>>()
        })
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to serialize matched rows")?;
    Ok(MatchReport {
        run_id,
        generated_at: Utc::now(),
        stats: &output.stats,
        columns,
        rows,
    })
}

/// Write the matched table and run statistics as pretty JSON.
pub fn write_matches_json(path: &Path, run_id: &str, output: &LinkageOutput) -> Result<()> {
    let start = Instant::now();
    let report = report(run_id, output)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .with_context(|| format!("Failed to write matches to {}", path.display()))?;
    info!(
        "💾 Wrote {} matched rows to {} in {:.2?}",
        output.table.len(),
        path.display(),
        start.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::ColumnType;
    use crate::utils::constants::{CONFIDENCE_BINS_COLUMN, CONFIDENCE_COLUMN, SCORE_COLUMN};
    use crate::utils::warehouse::fixtures::FixtureWarehouse;

    fn warehouse() -> FixtureWarehouse {
        let terms = Table::from_rows(&[("term", ColumnType::Text)], vec![]);
        let countries = Table::from_rows(
            &[("Name", ColumnType::Text), ("ISO2", ColumnType::Text)],
            vec![vec!["United States".into(), "US".into()]],
        );
        let states = Table::from_rows(
            &[("Name", ColumnType::Text), ("Code", ColumnType::Text)],
            vec![vec!["Massachusetts".into(), "MA".into()]],
        );
        let accounts = Table::from_rows(
            &[
                ("AccountId", ColumnType::Text),
                ("AccountName", ColumnType::Text),
                ("Website", ColumnType::Text),
                ("BillingCity", ColumnType::Text),
                ("BillingState", ColumnType::Text),
                ("BillingCountry", ColumnType::Text),
            ],
            vec![
                vec![
                    "0011".into(),
                    "Acme Inc".into(),
                    "acme.com".into(),
                    "Boston".into(),
                    "MA".into(),
                    "US".into(),
                ],
                vec![
                    "0012".into(),
                    "Globex".into(),
                    "globex.com".into(),
                    "Springfield".into(),
                    Value::Null,
                    "US".into(),
                ],
            ],
        );
        let zoominfo = Table::from_rows(
            &[
                ("ZoomInfoId", ColumnType::Int),
                ("AccountId", ColumnType::Text),
                ("AccountName", ColumnType::Text),
                ("Website", ColumnType::Text),
                ("City", ColumnType::Text),
                ("State", ColumnType::Text),
                ("Country", ColumnType::Text),
            ],
            vec![vec![
                Value::Int(77),
                "0011".into(),
                "ACME INC.".into(),
                "https://www.acme.com".into(),
                "boston".into(),
                "Massachusetts".into(),
                "United States".into(),
            ]],
        );
        FixtureWarehouse::new()
            .with_table("maintenance.stopwords", terms.clone())
            .with_table("maintenance.countries", terms)
            .with_table("maintenance.geo_country", countries)
            .with_table("maintenance.geo_states", states)
            .with_table("marketing_ops.account", accounts)
            .with_table("marketing_ops.zoominfo_account", zoominfo)
    }

    fn zoominfo_spec() -> JobSpec {
        JobSpec {
            profile: ProfileSelector::Named("ZoomInfo".to_string()),
            left: DatasetKind::Accounts,
            right: DatasetKind::ZoominfoAccounts,
            left_filter: None,
            right_filter: None,
            confidence_score: true,
            secondary: false,
        }
    }

    #[tokio::test]
    async fn test_zoominfo_job_links_account() {
        let warehouse = warehouse();
        let output = run_linkage_job(&warehouse, &LinkageConfig::default(), &zoominfo_spec(), None)
            .await
            .unwrap();
        let table = &output.table;

        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "SF_Index"), Some(&Value::text("0011")));
        assert_eq!(table.value(0, "ZI_Index"), Some(&Value::Int(77)));
        assert_eq!(
            table.value(0, "SF_BillingStateClean"),
            Some(&Value::text("Massachusetts"))
        );
        assert_eq!(
            table.value(0, "Match_BillingCountryClean_ZI_CountryClean"),
            Some(&Value::Int(1))
        );
        assert_eq!(table.value(0, SCORE_COLUMN), Some(&Value::Int(7)));
        assert_eq!(table.value(0, CONFIDENCE_COLUMN), Some(&Value::Int(80)));
        assert_eq!(table.value(0, CONFIDENCE_BINS_COLUMN), Some(&Value::text("70-80")));
        assert_eq!(output.stats.features_computed, 7);
        assert_eq!(output.stats.features_skipped, 4);
    }

    #[tokio::test]
    async fn test_unknown_profile_fails_job() {
        let warehouse = warehouse();
        let mut spec = zoominfo_spec();
        spec.profile = ProfileSelector::Named("Hoovers".to_string());
        let err = run_linkage_job(&warehouse, &LinkageConfig::default(), &spec, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown matching profile"));
    }

    #[tokio::test]
    async fn test_write_matches_json() {
        let warehouse = warehouse();
        let output = run_linkage_job(&warehouse, &LinkageConfig::default(), &zoominfo_spec(), None)
            .await
            .unwrap();
        let path = std::env::temp_dir().join(format!("matches-{}.json", uuid::Uuid::new_v4()));
        write_matches_json(&path, "run-1", &output).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["run_id"], "run-1");
        assert_eq!(written["rows"][0]["ZI_Index"], 77);
        assert_eq!(written["rows"][0]["Match_zConfidence_bins"], "70-80");
        assert_eq!(written["columns"][0]["name"], "SF_Index");
        assert_eq!(written["stats"]["pairs_with_signal"], 1);
        std::fs::remove_file(path).unwrap();
    }
}
