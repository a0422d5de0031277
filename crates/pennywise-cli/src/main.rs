//! Pennywise CLI - Personal spending tracker
//!
//! Usage:
//!   pennywise add 12.50 food              Record an expense
//!   pennywise budgets set food 400        Set a monthly budget
//!   pennywise anomalies --period 30d      Flag unusual spending days
//!   pennywise recommend                   Suggest budgets from history

mod cli;
mod commands;


use anyhow::Result;
use chrono::Local;
use clap::Parser;
use pennywise_core::AnomalyEngine;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let today = Local::now().date_naive();
    let store = commands::open_store(&cli.data_dir)?;
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Add {
            amount,
            category,
            kind,
            date,
        } => {
            let engine = AnomalyEngine::with_config(config.anomaly.clone());
            commands::cmd_add(
                &store,
                &engine,
                amount,
                &category,
                &kind,
                date.as_deref(),
                today,
            )
            .map(|_| ())
        }
        Commands::List { period, limit } => commands::cmd_list(&store, period, limit, today),
        Commands::Breakdown { period } => commands::cmd_breakdown(&store, period, today),
        Commands::Budgets { action } => match action {
            None | Some(BudgetsAction::List) => commands::cmd_budgets_list(&store),
            Some(BudgetsAction::Set { category, amount }) => {
                commands::cmd_budgets_set(&store, &category, amount).map(|_| ())
            }
            Some(BudgetsAction::Status { period }) => {
                commands::cmd_budgets_status(&store, period, today)
            }
            Some(BudgetsAction::Remaining { period }) => {
                commands::cmd_budgets_remaining(&store, period, today)
            }
        },
        Commands::Anomalies { period, json } => {
            commands::cmd_anomalies(&store, &config, period, today, json).map(|_| ())
        }
        Commands::Check {
            amount,
            category,
            date,
        } => commands::cmd_check(&store, &config, amount, &category, date.as_deref(), today)
            .map(|_| ()),
        Commands::Recommend { dry_run } => {
            commands::cmd_recommend(&store, &config, dry_run).map(|_| ())
        }
        Commands::Summary { period, messages } => {
            commands::cmd_summary(&store, &config, period, today, messages).map(|_| ())
        }
        Commands::Generate {
            days,
            min_per_day,
            max_per_day,
            seed,
            append,
        } => commands::cmd_generate(
            &store,
            days,
            min_per_day,
            max_per_day,
            seed,
            append,
            today,
        )
        .map(|_| ()),
    }
}
