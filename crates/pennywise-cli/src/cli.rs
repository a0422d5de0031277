//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pennywise_core::{Period, SummaryPeriod};

/// Pennywise - Track spending, budgets and anomalies
#[derive(Parser)]
#[command(name = "pennywise")]
#[command(about = "Personal spending tracker with budget analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding records.csv, budgets.csv and analytics files
    #[arg(long, env = "PENNYWISE_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Analytics config file (defaults to the data-dir override, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a transaction, then report budget alerts and anomalies
    Add {
        /// Amount (non-negative)
        amount: f64,

        /// Category (expenses: food, transport, entertainment, shopping, others)
        category: String,

        /// Transaction type: expense or income
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Date as YYYY-MM-DD or YYYYMMDD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List transactions
    List {
        /// Period: 7d, 30d, this_month, last_month, all
        #[arg(short, long, default_value = "this_month")]
        period: Period,

        /// Maximum number of transactions to show (most recent first)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show spending per category with percentages
    Breakdown {
        /// Period: 7d, 30d, this_month, last_month, all
        #[arg(short, long, default_value = "this_month")]
        period: Period,
    },

    /// Manage monthly budgets (list, set, status, remaining)
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Flag anomalous spending days within a period
    Anomalies {
        /// Period: 7d, 30d, this_month, last_month, all
        #[arg(short, long, default_value = "all")]
        period: Period,

        /// Print every labeled day as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a transaction would be anomalous without saving it
    Check {
        /// Amount (non-negative)
        amount: f64,

        /// Expense category
        category: String,

        /// Date as YYYY-MM-DD or YYYYMMDD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Recommend budgets from clustered monthly history
    Recommend {
        /// Show recommendations without saving analytics files
        #[arg(long)]
        dry_run: bool,
    },

    /// Build the spending summary payload for an AI summarizer
    Summary {
        /// Summary span: week or month
        #[arg(short, long, default_value = "week")]
        period: SummaryPeriod,

        /// Print chat messages (system + user) instead of the bare payload
        #[arg(long)]
        messages: bool,
    },

    /// Generate synthetic transactions into records.csv
    Generate {
        /// Number of days back from today to cover
        #[arg(long, default_value = "60")]
        days: i64,

        /// Minimum transactions per day
        #[arg(long, default_value = "1")]
        min_per_day: usize,

        /// Maximum transactions per day
        #[arg(long, default_value = "3")]
        max_per_day: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Append to existing records instead of replacing them
        #[arg(long)]
        append: bool,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// Show monthly budgets
    List,

    /// Set the monthly budget for a category
    Set {
        /// Category name
        category: String,

        /// New monthly limit (non-negative)
        amount: f64,
    },

    /// Compare spending against budgets
    Status {
        /// Month to analyze: this_month or last_month
        #[arg(short, long, default_value = "this_month")]
        period: Period,
    },

    /// Show what is left of each budget
    Remaining {
        /// Month to analyze: this_month or last_month
        #[arg(short, long, default_value = "this_month")]
        period: Period,
    },
}
