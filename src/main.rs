//! Timefold - Main Entry Point

use clap::Parser;
use timefold::cli::{cmd_benchmark, cmd_run, cmd_splits, Cli, Commands, RunArgs};
use timefold::splits::WalkForwardConfig;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timefold=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            target,
            entity_col,
            time_col,
            date_format,
            model,
            method,
            splits,
            config,
            grid,
            holdout,
            threshold_search,
            benchmarks,
            labeled,
            ema_gamma,
            output,
        } => {
            cmd_run(&RunArgs {
                data: &data,
                target: &target,
                entity_col: entity_col.as_deref(),
                time_col: time_col.as_deref(),
                date_format: &date_format,
                model: &model,
                method: method.as_deref(),
                splits,
                config: config.as_deref(),
                grid: grid.as_deref(),
                holdout: holdout.as_deref(),
                threshold_search,
                benchmarks,
                labeled,
                ema_gamma,
                output: output.as_deref(),
            })?;
        }
        Commands::Splits { data, entity_col, time_col, date_format, method, splits, train, test } => {
            cmd_splits(
                &data,
                entity_col.as_deref(),
                time_col.as_deref(),
                &date_format,
                &method,
                splits,
                WalkForwardConfig::new(train, test),
            )?;
        }
        Commands::Benchmark { data, target, entity_col, time_col, date_format, labeled, ema_gamma } => {
            cmd_benchmark(
                &data,
                &target,
                entity_col.as_deref(),
                time_col.as_deref(),
                &date_format,
                labeled,
                ema_gamma,
            )?;
        }
    }

    Ok(())
}
