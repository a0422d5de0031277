//! Budget limits CSV (`category,budget`)

use std::fs::File;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::{info, warn};

use super::Store;
use crate::budget::Budgets;
use crate::error::Result;
use crate::models::Category;

impl Store {
    /// Load budget limits
    ///
    /// A missing file is created with every category at zero. Rows for unknown
    /// categories are ignored; unparseable or negative amounts count as zero.
    /// The result always holds every category.
    pub fn load_budgets(&self) -> Result<Budgets> {
        let path = self.budgets_path();
        if !path.exists() {
            let budgets = Budgets::zeroed();
            self.save_budgets(&budgets)?;
            info!(path = %path.display(), "Created empty budgets file");
            return Ok(budgets);
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(File::open(&path)?);

        let headers = rdr.headers()?.clone();
        let category_col = headers.iter().position(|h| h == "category");
        let budget_col = headers.iter().position(|h| h == "budget");

        let mut budgets = Budgets::default();
        for result in rdr.records() {
            let row = result?;
            let name = category_col.and_then(|i| row.get(i)).unwrap_or("");
            if name.is_empty() {
                warn!(?row, "Skipping budget row with missing category");
                continue;
            }
            let Ok(category) = name.parse::<Category>() else {
                continue;
            };

            let raw = budget_col.and_then(|i| row.get(i)).unwrap_or("");
            let value = raw.parse::<f64>().unwrap_or_else(|_| {
                warn!(category = %category, raw, "Invalid budget amount, using 0");
                0.0
            });
            if let Err(e) = budgets.set(category, value) {
                warn!(error = %e, "Ignoring budget row");
                budgets.set(category, 0.0)?;
            }
        }

        budgets.fill_missing();
        Ok(budgets)
    }

    /// Write every category's limit in canonical order
    pub fn save_budgets(&self, budgets: &Budgets) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_path(self.budgets_path())?;
        wtr.write_record(["category", "budget"])?;
        for category in Category::ALL {
            let limit = budgets.limit(category).to_string();
            wtr.write_record([category.as_str(), limit.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
