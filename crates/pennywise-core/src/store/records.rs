//! Transaction records CSV

use std::fs::File;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use super::Store;
use crate::error::{Error, Result};
use crate::models::{TransactionKind, TransactionRecord};

const HEADER: [&str; 4] = ["amount", "category", "type", "date"];

impl Store {
    /// Load all records; a missing file is an empty list
    ///
    /// Rows with an unparseable, negative or non-finite amount, or an empty
    /// category, type or date, are skipped with a warning.
    pub fn load_records(&self) -> Result<Vec<TransactionRecord>> {
        let path = self.records_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(File::open(&path)?);

        let headers = rdr.headers()?.clone();
        let columns = column_indices(&headers)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, result) in rdr.records().enumerate() {
            let row = result?;
            match parse_row(&row, &columns) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    warn!(line = line + 2, %reason, "Skipping record");
                }
            }
        }

        debug!(loaded = records.len(), skipped, "Loaded records");
        Ok(records)
    }

    /// Overwrite the records file
    pub fn save_records(&self, records: &[TransactionRecord]) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_path(self.records_path())?;
        wtr.write_record(HEADER)?;

        for record in records {
            let amount = record.amount.to_string();
            wtr.write_record([
                amount.as_str(),
                record.category.as_str(),
                record.kind().as_str(),
                record.date.as_deref().unwrap_or(""),
            ])?;
        }
        wtr.flush()?;

        info!(count = records.len(), "Saved records");
        Ok(())
    }

    /// Append `record` to `records` and save immediately
    pub fn add_record(
        &self,
        records: &mut Vec<TransactionRecord>,
        record: TransactionRecord,
    ) -> Result<()> {
        records.push(record);
        self.save_records(records)
    }
}

/// Positions of the required columns, in `HEADER` order
fn column_indices(headers: &StringRecord) -> Result<[usize; 4]> {
    let mut indices = [0usize; 4];
    for (slot, name) in indices.iter_mut().zip(HEADER) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::InvalidData(format!("records.csv is missing the '{}' column", name))
            })?;
    }
    Ok(indices)
}

fn parse_row(
    row: &StringRecord,
    columns: &[usize; 4],
) -> std::result::Result<TransactionRecord, String> {
    let field = |i: usize| row.get(columns[i]).unwrap_or("");

    let amount: f64 = field(0)
        .parse()
        .map_err(|_| format!("invalid amount '{}'", field(0)))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("unusable amount '{}'", field(0)));
    }
    let (category, kind, date) = (field(1), field(2), field(3));
    if category.is_empty() || kind.is_empty() || date.is_empty() {
        return Err("empty field".to_string());
    }

    Ok(TransactionRecord {
        amount,
        category: category.to_string(),
        kind: Some(kind.parse().unwrap_or(TransactionKind::Other)),
        date: Some(date.to_string()),
    })
}
