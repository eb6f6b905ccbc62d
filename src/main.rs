//! HitDash - Mechanical Turk requester dashboard
//!
//! A CLI tool that lists a requester's HITs, summarizes them by HIT type
//! and status, and drills into the assignments of one HIT type with their
//! answers decoded.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (credentials, config, service failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod records;
mod report;
mod retrieval;
mod service;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{DrillDown, HitType, Report, ReportMetadata, Submission, UnitSource, WorkUnit};
use service::{MturkClient, TaskService};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Progress bar positions per pass; callbacks report fractions of this.
const PROGRESS_STEPS: u64 = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("HitDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_dashboard(args).await {
        error!("Dashboard failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .hitdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to choose the environment, limits and report paths.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the listing, optional drill-down, and report generation.
async fn run_dashboard(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Connect
    println!("🔌 Connecting to {} requester API...", config.service.environment);
    println!("   Endpoint: {}", config.service.effective_endpoint());
    println!("   Timeout: {}s", config.service.timeout_seconds);

    let client = MturkClient::from_config(&config.service).await;

    let balance = match client.account_balance().await {
        Ok(balance) => {
            println!("   Balance: ${}", balance);
            Some(balance)
        }
        Err(e) => {
            warn!("Could not fetch account balance: {}", e);
            None
        }
    };

    // Step 2: List HITs and summarize
    println!("\n📋 Listing up to {} HITs...", config.retrieval.max_units);
    let bar = progress_bar(args.quiet);
    let units = retrieval::list_work_units(&client, config.retrieval.max_units, |fraction| {
        set_fraction(&bar, fraction)
    })
    .await?;
    bar.finish_and_clear();

    let hit_summary = analysis::summarize_work_units(&units);
    println!(
        "   {} HITs across {} HIT types",
        units.len(),
        analysis::hit_types(&units).len()
    );

    // Step 3: Drill into one HIT type
    let (drill_down, submissions) = match args.type_id {
        Some(ref type_id) => {
            let (drill_down, submissions) =
                drill_into(&client, &config, &units, type_id, args.from_listing, args.quiet)
                    .await?;
            (Some(drill_down), submissions)
        }
        None => (None, Vec::new()),
    };

    // Step 4: Build the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let report = Report {
        metadata: ReportMetadata {
            environment: config.service.environment.to_string(),
            generated_at: Utc::now(),
            balance,
            units_listed: units.len(),
            duration_seconds: duration,
        },
        hit_summary,
        drill_down,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.report.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(export) = export_path(&config, report.drill_down.as_ref()) {
        report::export_submissions(&submissions, Path::new(export))?;
        println!("   Exported {} assignments to {}", submissions.len(), export);
    }

    // Print summary
    println!("\n📊 Dashboard Summary:");
    println!("   HITs listed: {}", report.metadata.units_listed);
    println!("   Summary rows: {}", report.hit_summary.len());
    if let Some(ref drill_down) = report.drill_down {
        println!(
            "   {}: {} assignments from {} workers",
            drill_down.hit_type.label(),
            drill_down.stats.total,
            drill_down.workers.len()
        );
        println!(
            "   - ⏳ Pending review: {} | ⚠️  Undecodable answers: {}",
            drill_down.stats.pending_review, drill_down.stats.extraction_errors
        );
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Done! Report saved to: {}", output_path.display());

    Ok(())
}

/// Retrieve the assignments of one HIT type and summarize them.
async fn drill_into<S: TaskService>(
    service: &S,
    config: &Config,
    units: &[WorkUnit],
    type_id: &str,
    from_listing: bool,
    quiet: bool,
) -> Result<(DrillDown, Vec<Submission>)> {
    let hit_type = analysis::hit_types(units)
        .into_iter()
        .find(|t| t.type_id == type_id)
        .unwrap_or_else(|| {
            warn!("HIT type {} is not among the listed HITs", type_id);
            HitType {
                type_id: type_id.to_string(),
                title: "(not listed)".to_string(),
            }
        });

    println!("\n🔎 Retrieving assignments for {}...", hit_type.label());

    let (source, unit_count, submissions) = if from_listing {
        let unit_ids = analysis::units_of_type(units, type_id);
        let bar = progress_bar(quiet);
        let subs = retrieval::retrieve_submissions(service, type_id, &unit_ids, |fraction| {
            set_fraction(&bar, fraction)
        })
        .await?;
        bar.finish_and_clear();
        (UnitSource::Listed, unit_ids.len(), subs)
    } else {
        let discovery_bar = progress_bar(quiet);
        let unit_bar = progress_bar(quiet);
        let (unit_ids, subs) = retrieval::review_submissions(
            service,
            type_id,
            config.retrieval.reviewable_ceiling,
            |fraction| set_fraction(&discovery_bar, fraction),
            |fraction| set_fraction(&unit_bar, fraction),
        )
        .await?;
        discovery_bar.finish_and_clear();
        unit_bar.finish_and_clear();
        (UnitSource::Reviewable, unit_ids.len(), subs)
    };

    let drill_down = DrillDown {
        hit_type,
        source,
        units_retrieved: unit_count,
        totals: analysis::unit_totals(units, type_id),
        workers: analysis::summarize_workers(&submissions),
        stats: analysis::submission_stats(&submissions),
        answer_fields: analysis::answer_fields(&submissions),
        extraction_errors: submissions
            .iter()
            .filter_map(|s| s.extraction_error().cloned())
            .collect(),
    };

    Ok((drill_down, submissions))
}

/// Where to export assignments, if anywhere.
///
/// An export needs a drill-down; without one a configured path is skipped.
fn export_path<'a>(config: &'a Config, drill_down: Option<&DrillDown>) -> Option<&'a str> {
    let export = config.report.export.as_deref()?;
    if drill_down.is_none() {
        warn!("Export to {} skipped: no --type-id given", export);
        return None;
    }
    Some(export)
}

/// A bar over [`PROGRESS_STEPS`] positions; hidden in quiet mode.
fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(PROGRESS_STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

fn set_fraction(bar: &ProgressBar, fraction: f64) {
    let position = (fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f64).round() as u64;
    bar.set_position(position);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
