use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use linkage_lib::datasets::DatasetKind;
use linkage_lib::job::{run_linkage_job, write_matches_json, JobSpec, JOB_PHASES};
use linkage_lib::linkage::profile::{parse_rules, ProfileSelector};
use linkage_lib::utils::config::{clamp_jobs, LinkageConfig};
use linkage_lib::utils::db_connect::{connect, get_pool_status};
use linkage_lib::utils::env::load_env;
use linkage_lib::utils::progress_bars::logging::{log_job_completion, log_job_start};
use linkage_lib::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Link CRM records against enrichment datasets", long_about = None)]
struct LinkageArgs {
    /// Named matching profile (ZoomInfo, DNB, name)
    #[arg(long, conflicts_with = "rules", required_unless_present = "rules")]
    profile: Option<String>,

    /// Inline matching rules as JSON
    #[arg(long)]
    rules: Option<String>,

    /// Left-hand dataset
    #[arg(long, value_enum)]
    left: DatasetKind,

    /// Right-hand dataset
    #[arg(long, value_enum)]
    right: DatasetKind,

    /// SQL condition appended to the left dataset query
    #[arg(long)]
    left_filter: Option<String>,

    /// SQL condition appended to the right dataset query
    #[arg(long)]
    right_filter: Option<String>,

    /// Add weighted confidence score and tier columns
    #[arg(long)]
    confidence: bool,

    /// Order output rows by the right-hand record
    #[arg(long)]
    secondary: bool,

    /// Worker threads for comparisons (overrides LINKAGE_N_JOBS)
    #[arg(long)]
    jobs: Option<usize>,

    /// Where to write the matched table
    #[arg(short, long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = LinkageArgs::parse();
    let start = Instant::now();

    let mut config = LinkageConfig::from_env();
    if let Some(jobs) = args.jobs {
        config.n_jobs = clamp_jobs(jobs);
    }
    config.log_config();

    let profile = match (&args.profile, &args.rules) {
        (_, Some(rules)) => ProfileSelector::Inline(
            parse_rules(rules, config.sorted_neighbour_window).context("Invalid --rules")?,
        ),
        (Some(name), None) => ProfileSelector::Named(name.clone()),
        (None, None) => anyhow::bail!("Either --profile or --rules is required"),
    };
    let spec = JobSpec {
        profile,
        left: args.left,
        right: args.right,
        left_filter: args.left_filter,
        right_filter: args.right_filter,
        confidence_score: args.confidence,
        secondary: args.secondary,
    };

    let run_id = Uuid::new_v4().to_string();
    log_job_start(
        &run_id,
        &spec.profile_label(),
        &spec.left.to_string(),
        &spec.right.to_string(),
    );

    let progress_config = ProgressConfig::from_env();
    let multi_progress = progress_config.create_multi_progress();
    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = progress_config.create_phase_bar(mp, JOB_PHASES);
        pb.set_message("Connecting to warehouse...");
        pb
    });

    let pool = connect().await.context("Failed to connect to database")?;
    let (connections, idle) = get_pool_status(&pool);
    info!("Warehouse pool ready: {} connection(s), {} idle", connections, idle);

    let output = run_linkage_job(&pool, &config, &spec, main_pb.as_ref()).await?;
    write_matches_json(&args.output, &run_id, &output)?;

    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.finish_with_message("Matches written");
    }
    log_job_completion(&run_id, start.elapsed(), &output.stats);
    Ok(())
}
