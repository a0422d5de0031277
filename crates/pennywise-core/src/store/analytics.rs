//! Analytics artifacts stored as pretty JSON

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::Store;
use crate::error::Result;
use crate::models::{Category, MonthlySpending};

impl Store {
    /// Monthly spending history; empty if never saved
    pub fn load_monthly_spending(&self) -> Result<Vec<MonthlySpending>> {
        read_json_or_default(&self.monthly_spending_path())
    }

    pub fn save_monthly_spending(&self, monthly: &[MonthlySpending]) -> Result<()> {
        write_json(&self.monthly_spending_path(), monthly)?;
        info!(months = monthly.len(), "Saved monthly spending history");
        Ok(())
    }

    /// Last saved budget recommendations; empty if never saved
    pub fn load_recommendations(&self) -> Result<BTreeMap<Category, f64>> {
        read_json_or_default(&self.recommendations_path())
    }

    pub fn save_recommendations(&self, recommendations: &BTreeMap<Category, f64>) -> Result<()> {
        write_json(&self.recommendations_path(), recommendations)?;
        info!(
            categories = recommendations.len(),
            "Saved budget recommendations"
        );
        Ok(())
    }
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
