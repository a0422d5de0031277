//! File-backed persistence in a single data directory
//!
//! This module is organized by artifact:
//! - `records` - transaction records (`records.csv`)
//! - `budgets` - budget limits (`budgets.csv`)
//! - `analytics` - monthly history and recommendations (pretty JSON)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

mod analytics;
mod budgets;
mod records;

pub const RECORDS_FILE: &str = "records.csv";
pub const BUDGETS_FILE: &str = "budgets.csv";
pub const MONTHLY_SPENDING_FILE: &str = "monthly_spending.json";
pub const RECOMMENDATIONS_FILE: &str = "budget_recommendations.json";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PENNYWISE_DATA_DIR";

/// Data directory used when nothing else is configured
pub const DEFAULT_DATA_DIR: &str = "data";

/// Handle to the data directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open (creating if needed) a data directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened data directory");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    pub fn budgets_path(&self) -> PathBuf {
        self.dir.join(BUDGETS_FILE)
    }

    pub fn monthly_spending_path(&self) -> PathBuf {
        self.dir.join(MONTHLY_SPENDING_FILE)
    }

    pub fn recommendations_path(&self) -> PathBuf {
        self.dir.join(RECOMMENDATIONS_FILE)
    }
}
