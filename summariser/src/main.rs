use anyhow::{anyhow, Context};
use clap::Parser;
use eval_trend_model::load_run_records;
use eval_trend_summariser::table::{comparison_table, runs_table, suite_table, trend_table};
use eval_trend_summariser::{
    compare_runs, order, summarise_configurations, summarise_suites, Report, SummariserConfig,
};
use log::debug;
use std::fs::File;
use std::path::PathBuf;

/// Environment variable name to set a custom run records file path
const RUN_RECORDS_PATH_ENV: &str = "RUN_RECORDS_PATH";
/// Default path for the run records file
const DEFAULT_RUN_RECORDS_PATH: &str = "run_records.jsonl";
/// Environment variable name to set a configuration file path
const CONFIG_PATH_ENV: &str = "EVAL_TREND_CONFIG";

#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Path to the run records, either JSON lines or a single JSON array.
    ///
    /// Defaults to the `RUN_RECORDS_PATH` environment variable, then `run_records.jsonl`.
    #[clap(short, long)]
    runs: Option<PathBuf>,

    /// Path to a TOML configuration file.
    ///
    /// Defaults to the `EVAL_TREND_CONFIG` environment variable. Without either, the default
    /// thresholds are used.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Minimum pass rate increase, in percentage points, that counts as an improvement
    #[clap(long, allow_negative_numbers = true)]
    improvement: Option<f64>,

    /// Pass rate change at or below which a run is a minor regression
    #[clap(long, allow_negative_numbers = true)]
    minor_regression: Option<f64>,

    /// Pass rate change at or below which a run is a major regression
    #[clap(long, allow_negative_numbers = true)]
    major_regression: Option<f64>,

    /// Only consider runs of this suite
    #[clap(short, long)]
    suite: Option<String>,

    /// Build a separate trend for every model and system prompt configuration of a suite
    #[clap(long, default_value = "false")]
    by_config: bool,

    /// Write the full report as JSON to this path
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Compare two runs case by case instead of summarising, for example `--compare run-1 run-2`
    #[clap(long, num_args = 2, value_names = ["BASELINE", "CURRENT"])]
    compare: Option<Vec<String>>,

    /// List the loaded runs, newest first, instead of summarising
    #[clap(short, long, default_value = "false")]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match cli
        .config
        .clone()
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
    {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            SummariserConfig::load(&path)?
        }
        None => SummariserConfig::default(),
    };
    let thresholds = config
        .thresholds
        .with_overrides(cli.improvement, cli.minor_regression, cli.major_regression)
        .context("Invalid thresholds")?;
    debug!("Using thresholds {thresholds:?}");

    let runs_path = cli.runs.clone().unwrap_or_else(|| {
        std::env::var(RUN_RECORDS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RUN_RECORDS_PATH))
    });
    debug!("Loading run records from {}", runs_path.display());
    let loaded = load_run_records(&runs_path)?;
    if !loaded.rejected.is_empty() {
        log::warn!(
            "{} run records in {} were rejected",
            loaded.rejected.len(),
            runs_path.display()
        );
    }

    let mut runs = loaded.records;
    if let Some(suite) = &cli.suite {
        runs.retain(|run| run.suite_id() == suite);
    }

    if cli.list {
        let ordered = order(&runs);
        println!("Stored runs ({}):", ordered.len());
        println!("{}", runs_table(&ordered.iter().rev().collect::<Vec<_>>()));
        return Ok(());
    }

    if let Some(ids) = &cli.compare {
        let find = |id: &String| {
            runs.iter()
                .find(|run| run.id() == id)
                .ok_or_else(|| anyhow!("Run '{id}' not found"))
        };
        let baseline = find(&ids[0]).context("Baseline")?;
        let current = find(&ids[1]).context("Current")?;

        let comparison = compare_runs(baseline, current, &config.compare)?;
        println!("Comparing runs:");
        for (label, run) in [("Baseline", baseline), ("Current", current)] {
            println!(
                "  {:<9} {} ({}, {})",
                format!("{label}:"),
                run.id(),
                run.model(),
                run.timestamp().format("%Y-%m-%d %H:%M")
            );
        }
        println!(
            "Regressions: {} | Improvements: {} | Unchanged: {}",
            comparison.regressions, comparison.improvements, comparison.unchanged
        );
        println!("{}", comparison_table(&comparison));
        return Ok(());
    }

    let suites = if cli.by_config {
        summarise_configurations(&runs, &thresholds)
    } else {
        summarise_suites(&runs, &thresholds)
    };

    println!("\nSummary of suites");
    println!("{}", suite_table(&suites));
    for report in &suites {
        match &report.configuration {
            Some(configuration) => println!(
                "\n{} with {} ({})",
                report.suite_id,
                configuration.model,
                configuration
                    .system_prompt_name
                    .as_deref()
                    .unwrap_or("no system prompt")
            ),
            None => println!("\n{}", report.suite_id),
        }
        println!("{}", trend_table(report));
    }

    if let Some(output) = &cli.output {
        let file = File::create(output)
            .with_context(|| format!("Failed to create report file {}", output.display()))?;
        Report::new(thresholds, loaded.rejected, suites).write_to(file)?;
        log::info!("Wrote report to {}", output.display());
    }

    Ok(())
}
