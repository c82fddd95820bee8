//! Timefold CLI Module
//!
//! Command-line interface for out-of-fold runs, split inspection and
//! baseline benchmarks.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{ColumnSelection, DataLoader, Dataset, PanelFrame};
use crate::evaluation::{benchmark_target, ThresholdSearch};
use crate::harness::{HarnessConfig, ModelRunResult, OutOfFoldTrainer};
use crate::preprocessing::prepare_targets;
use crate::splits::{instantiate_splits, SplitMethod, WalkForwardConfig};
use crate::training::{
    format_params, DecisionTreeConfig, GradientBoostingConfig, LightGBMConfig, ParamGrid, RandomForestConfig,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "timefold")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Leakage-free out-of-fold training for time-series classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the out-of-fold harness on a CSV file
    Run {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Entity column (e.g. ticker)
        #[arg(long)]
        entity_col: Option<String>,

        /// Time column (date, integer or %Y-%m-%d string)
        #[arg(long)]
        time_col: Option<String>,
        /// chrono format of a string time column
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Model (random_forest, gradient_boosting, decision_tree, lightgbm)
        #[arg(short, long, default_value = "random_forest")]
        model: String,

        /// Split method (ts, panel, kfold, tsrecur, panelrecur, tswindow, panelwindow)
        #[arg(long)]
        method: Option<String>,

        /// Number of folds
        #[arg(long)]
        splits: Option<usize>,

        /// Harness configuration JSON; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Parameter grid JSON (`{"name": [values, ...]}`)
        #[arg(long)]
        grid: Option<PathBuf>,

        /// Holdout CSV scored by every fold's model (lightgbm only)
        #[arg(long)]
        holdout: Option<PathBuf>,

        /// Search the decision threshold per fold
        #[arg(long)]
        threshold_search: bool,

        /// Log one-class and random-walk baselines
        #[arg(long)]
        benchmarks: bool,

        /// Target is already 0/1
        #[arg(long)]
        labeled: bool,

        /// EMA smoothing factor for the target
        #[arg(long)]
        ema_gamma: Option<f64>,

        /// Write the prediction frame to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the fold layout of a split method
    Splits {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Entity column, required by panel methods
        #[arg(long)]
        entity_col: Option<String>,

        /// Time column, required by panel methods
        #[arg(long)]
        time_col: Option<String>,
        /// chrono format of a string time column
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Split method
        #[arg(long, default_value = "ts")]
        method: String,

        /// Number of folds
        #[arg(long, default_value = "4")]
        splits: usize,

        /// Walk-forward minimum training length
        #[arg(long, default_value = "252")]
        train: usize,

        /// Walk-forward test length
        #[arg(long, default_value = "21")]
        test: usize,
    },

    /// Report one-class and random-walk baselines for a target
    Benchmark {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Entity column for per-entity shifting
        #[arg(long)]
        entity_col: Option<String>,

        /// Time column
        #[arg(long)]
        time_col: Option<String>,
        /// chrono format of a string time column
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Target is already 0/1
        #[arg(long)]
        labeled: bool,

        /// EMA smoothing factor for the target
        #[arg(long, default_value = "1.0")]
        ema_gamma: f64,
    },
}

/// Options of the `run` command
pub struct RunArgs<'a> {
    pub data: &'a Path,
    pub target: &'a str,
    pub entity_col: Option<&'a str>,
    pub time_col: Option<&'a str>,
    pub date_format: &'a str,
    pub model: &'a str,
    pub method: Option<&'a str>,
    pub splits: Option<usize>,
    pub config: Option<&'a Path>,
    pub grid: Option<&'a Path>,
    pub holdout: Option<&'a Path>,
    pub threshold_search: bool,
    pub benchmarks: bool,
    pub labeled: bool,
    pub ema_gamma: Option<f64>,
    pub output: Option<&'a Path>,
}

// ─── Data loading ──────────────────────────────────────────────────────────────

fn load_dataset(
    path: &Path,
    target: &str,
    entity_col: Option<&str>,
    time_col: Option<&str>,
    date_format: &str,
) -> anyhow::Result<(DataLoader, Dataset)> {
    step_run("Loading data");
    let start = Instant::now();
    let loader = DataLoader::new().with_date_format(date_format);
    let df = loader.load_csv(path)?;

    let mut selection = ColumnSelection::new(target);
    if let Some(entity) = entity_col {
        selection = selection.with_entity(entity);
    }
    if let Some(time) = time_col {
        selection = selection.with_time(time);
    }
    let dataset = loader.dataset_from_frame(&df, &selection)?;
    step_done(&format!(
        "{} rows × {} features in {:?}",
        dataset.n_rows(),
        dataset.features().n_features(),
        start.elapsed()
    ));
    Ok((loader, dataset))
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(args: &RunArgs<'_>) -> anyhow::Result<()> {
    section("Run");

    let mut config = match args.config {
        Some(path) => HarnessConfig::from_json_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(method) = args.method {
        config.split_method = method.parse::<SplitMethod>()?;
    }
    if let Some(n) = args.splits {
        config.n_splits = n;
    }
    if let Some(gamma) = args.ema_gamma {
        config.ema_gamma = gamma;
    }
    if args.threshold_search && config.threshold_search.is_none() {
        config.threshold_search = Some(ThresholdSearch::default());
    }
    config.benchmarks |= args.benchmarks;
    config.labeled |= args.labeled;
    config.label = args.model.to_string();
    if let Some(entity) = args.entity_col {
        config.ticker = entity.to_string();
    }

    let (loader, mut dataset) = load_dataset(args.data, args.target, args.entity_col, args.time_col, args.date_format)?;
    if let Some(path) = args.holdout {
        let holdout = loader.holdout_from_frame(&loader.load_csv(path)?, &dataset)?;
        dataset = dataset.with_holdout(holdout)?;
    }

    let grid: Option<ParamGrid> = match args.grid {
        Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => None,
    };

    let trainer = OutOfFoldTrainer::new(&dataset, &config)?;

    step_run(&format!("Training {} over {} folds", args.model.cyan(), config.split_method));
    let start = Instant::now();
    let result = match args.model {
        "random_forest" => trainer.run(&RandomForestConfig::default(), grid.as_ref())?,
        "gradient_boosting" => trainer.run(&GradientBoostingConfig::default(), grid.as_ref())?,
        "decision_tree" => trainer.run(&DecisionTreeConfig::default(), grid.as_ref())?,
        "lightgbm" => trainer.run_boosting(&LightGBMConfig::default(), grid.as_ref())?,
        other => anyhow::bail!("Invalid model type: {}", other),
    };
    step_done(&format!("{:?}", start.elapsed()));

    print_summary(&result);

    if let Some(path) = args.output {
        step_run(&format!("Saving → {}", path.display()));
        result.predictions.write_csv(path)?;
        step_done(&format!("{} rows", result.predictions.len()));
    }
    println!();
    Ok(())
}

fn print_summary(result: &ModelRunResult) {
    section("Summary");
    kv("Folds", &result.n_folds.to_string());
    kv("Untested rows", &result.uncovered_rows.to_string());
    kv("Smoothed labels", &result.n_targets_changed.to_string());
    kv("Precision", &format!("{:.4}", result.scores.mean_precision()));
    kv("Recall", &format!("{:.4}", result.scores.mean_recall()));
    kv("Accuracy", &format!("{:.4}", result.scores.mean_accuracy()));
    kv("F1", &format!("{:.4}", result.scores.mean_f1()));
    if let Some(params) = &result.best_params {
        kv("Best params", &format_params(params));
    }
    if let Some(boosting) = &result.boosting {
        let iterations: Vec<String> = boosting.best_iterations.iter().map(|i| i.to_string()).collect();
        kv("Best iterations", &iterations.join(", "));
    }
    kv("Time", &format!("{:.3}s", result.elapsed_secs));

    if !result.importances.is_empty() {
        section("Top features");
        for (name, value) in result.top_importances(10) {
            println!("  {:<28} {}", muted(name), format!("{:.4}", value).white());
        }
    }

    if let Some(report) = &result.benchmark {
        section("Benchmarks");
        println!("{}", report);
    }
}

pub fn cmd_splits(
    data_path: &Path,
    entity_col: Option<&str>,
    time_col: Option<&str>,
    date_format: &str,
    method: &str,
    n_splits: usize,
    walk_forward: WalkForwardConfig,
) -> anyhow::Result<()> {
    section("Splits");

    let method: SplitMethod = method.parse()?;
    let loader = DataLoader::new().with_date_format(date_format);
    let df = loader.load_csv(data_path)?;
    let groups: Option<PanelFrame> = match (entity_col, time_col) {
        (Some(entity), Some(time)) => Some(loader.panel_from_frame(&df, entity, time)?),
        _ => None,
    };

    let (folds, _) = instantiate_splits(df.height(), n_splits, groups.as_ref(), method, &walk_forward)?;

    kv("Method", method.as_str());
    kv("Rows", &df.height().to_string());
    println!();
    println!(
        "  {:<6} {:>10} {:>10}   {}",
        muted("fold"),
        muted("train"),
        muted("test"),
        muted("test rows")
    );
    let mut n_folds = 0;
    for (i, split) in folds.enumerate() {
        let first = split.test_indices.iter().min().copied().unwrap_or_default();
        let last = split.test_indices.iter().max().copied().unwrap_or_default();
        println!(
            "  {:<6} {:>10} {:>10}   {}",
            (i + 1).to_string().white(),
            split.train_indices.len(),
            split.test_indices.len(),
            dim(&format!("{}..={}", first, last))
        );
        n_folds += 1;
    }
    if n_folds == 0 {
        println!("  {}", "No folds: not enough rows for this method".yellow());
    }
    println!();
    Ok(())
}

pub fn cmd_benchmark(
    data_path: &Path,
    target: &str,
    entity_col: Option<&str>,
    time_col: Option<&str>,
    date_format: &str,
    labeled: bool,
    ema_gamma: f64,
) -> anyhow::Result<()> {
    section("Benchmark");

    let (_, dataset) = load_dataset(data_path, target, entity_col, time_col, date_format)?;
    let targets = prepare_targets(dataset.target(), labeled, ema_gamma)?;
    let groups = if entity_col.is_some() { dataset.groups() } else { None };
    let report = benchmark_target(&targets.smoothed, groups);

    println!();
    println!("{}", report);
    Ok(())
}
