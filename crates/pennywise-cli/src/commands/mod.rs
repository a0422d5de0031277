//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `records` - Transaction commands (add, list, breakdown)
//! - `budgets` - Budget commands (list, set, status, remaining)
//! - `analytics` - Anomaly, recommendation and summary commands
//! - `generate` - Synthetic data generator

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use pennywise_core::{AnalyticsConfig, Store};
use tracing::debug;

pub mod analytics;
pub mod budgets;
pub mod generate;
pub mod records;

// Re-export command functions for main.rs
pub use analytics::*;
pub use budgets::*;
pub use generate::*;
pub use records::*;

/// Open the data directory, creating it on first use
pub fn open_store(data_dir: &Path) -> Result<Store> {
    Store::open(data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))
}

/// Resolve analytics configuration (explicit path, override file, built-in)
pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let config = AnalyticsConfig::load(path).context("Failed to load analytics config")?;
    debug!(?config, "Analytics config loaded");
    Ok(config)
}

/// Parse a user-entered date: YYYY-MM-DD, YYYYMMDD, or empty for `today`
pub fn parse_date_input(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(today);
    };

    let format = if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        "%Y%m%d"
    } else {
        "%Y-%m-%d"
    };
    match NaiveDate::parse_from_str(raw, format) {
        Ok(date) => Ok(date),
        Err(_) => bail!("Invalid date '{}'. Use YYYY-MM-DD or YYYYMMDD", raw),
    }
}

/// Validate a transaction amount
pub fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        bail!("Amount must be a non-negative number, got {}", amount);
    }
    Ok(())
}
