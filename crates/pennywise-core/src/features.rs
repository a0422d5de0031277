//! Daily feature aggregation
//!
//! Turns raw transaction records into one feature vector per calendar day:
//! `total_spent`, `spent_<category>` for every category in canonical order,
//! `weekday` (Mon=0..Sun=6) and `is_weekend`. Only expense records with a
//! parseable date and a known category contribute. Days without expenses are
//! absent from the table rather than zero-filled.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{zeroed_totals, Category, CategoryTotals, TransactionRecord};

/// Column holding the day's total expense
pub const TOTAL_SPENT: &str = "total_spent";
/// Column holding the weekday number
pub const WEEKDAY: &str = "weekday";
/// Column holding 1.0 on Saturday/Sunday
pub const IS_WEEKEND: &str = "is_weekend";

/// Column name for a category's daily spending
pub fn category_column(category: Category) -> String {
    format!("spent_{}", category.as_str())
}

/// The fixed feature schema, in order
pub fn feature_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(Category::ALL.len() + 3);
    columns.push(TOTAL_SPENT.to_string());
    columns.extend(Category::ALL.iter().map(|c| category_column(*c)));
    columns.push(WEEKDAY.to_string());
    columns.push(IS_WEEKEND.to_string());
    columns
}

/// Spending features for a single day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyFeatures {
    pub date: NaiveDate,
    pub total_spent: f64,
    pub spent: CategoryTotals,
    pub weekday: u32,
    pub is_weekend: bool,
}

impl DailyFeatures {
    /// A zero-spending day; weekday fields come from the date alone
    pub fn zero(date: NaiveDate) -> Self {
        let weekday = date.weekday().num_days_from_monday();
        Self {
            date,
            total_spent: 0.0,
            spent: zeroed_totals(),
            weekday,
            is_weekend: weekday >= 5,
        }
    }

    /// Amount spent in one category (zero when absent)
    pub fn spent_on(&self, category: Category) -> f64 {
        self.spent.get(&category).copied().unwrap_or(0.0)
    }

    /// Numeric values in `feature_columns()` order
    pub fn values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(Category::ALL.len() + 3);
        values.push(self.total_spent);
        values.extend(Category::ALL.iter().map(|c| self.spent_on(*c)));
        values.push(self.weekday as f64);
        values.push(if self.is_weekend { 1.0 } else { 0.0 });
        values
    }
}

/// Date-ordered daily features sharing one column set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyFeatureTable {
    rows: Vec<DailyFeatures>,
}

impl DailyFeatureTable {
    /// Build a table from rows, ordering them by date
    pub fn from_rows(mut rows: Vec<DailyFeatures>) -> Self {
        rows.sort_by_key(|r| r.date);
        Self { rows }
    }

    pub fn rows(&self) -> &[DailyFeatures] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyFeatures> {
        self.rows.iter().find(|r| r.date == date)
    }

    pub fn columns(&self) -> Vec<String> {
        feature_columns()
    }

    /// Numeric view of the table for model fitting and scoring
    pub fn to_matrix(&self) -> FeatureMatrix {
        FeatureMatrix {
            columns: feature_columns(),
            rows: self.rows.iter().map(DailyFeatures::values).collect(),
        }
    }
}

/// Named numeric columns with one row per observation
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build a matrix, checking every row matches the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(Error::InvalidData(format!(
                "Row has {} values but matrix has {} columns",
                bad.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Reorder to `columns`, zero-filling any column this matrix lacks
    ///
    /// Columns not listed are dropped. Never fails: shape differences are
    /// normalized here rather than surfacing at scoring time.
    pub fn reindex(&self, columns: &[String]) -> FeatureMatrix {
        let positions: Vec<Option<usize>> = columns
            .iter()
            .map(|name| self.columns.iter().position(|c| c == name))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|pos| pos.map(|i| row[i]).unwrap_or(0.0))
                    .collect()
            })
            .collect();

        FeatureMatrix {
            columns: columns.to_vec(),
            rows,
        }
    }
}

/// Aggregate records into one feature vector per day with expense activity
///
/// Cleaning rules: a missing `type` counts as expense; records with a missing
/// or unparseable date, a non-expense kind, a negative or non-finite amount, or
/// a category outside the closed vocabulary are skipped. Days whose totals
/// overflow are dropped. With no surviving expenses the table is empty.
pub fn build_daily_features<'a, I>(records: I) -> DailyFeatureTable
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut days: BTreeMap<NaiveDate, DailyFeatures> = BTreeMap::new();

    for record in records {
        if !record.is_expense() || !record.has_valid_amount() {
            continue;
        }
        let Some(date) = record.parsed_date() else {
            continue;
        };
        let Some(category) = record.spending_category() else {
            continue;
        };

        let day = days.entry(date).or_insert_with(|| DailyFeatures::zero(date));
        day.total_spent += record.amount;
        *day.spent.entry(category).or_insert(0.0) += record.amount;
    }

    days.retain(|date, day| {
        let finite = day.values().iter().all(|v| v.is_finite());
        if !finite {
            debug!(%date, "Dropping day with overflowing spending total");
        }
        finite
    });

    DailyFeatureTable {
        rows: days.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_day_scenario() {
        let records = vec![
            TransactionRecord::expense(20.0, Category::Food, date(2024, 1, 1)),
            TransactionRecord::expense(5.0, Category::Transport, date(2024, 1, 1)),
            TransactionRecord::expense(100.0, Category::Food, date(2024, 1, 2)),
        ];

        let table = build_daily_features(&records);
        assert_eq!(table.len(), 2);

        let monday = table.get(date(2024, 1, 1)).unwrap();
        assert_eq!(monday.total_spent, 25.0);
        assert_eq!(monday.spent_on(Category::Food), 20.0);
        assert_eq!(monday.spent_on(Category::Transport), 5.0);
        assert_eq!(monday.spent_on(Category::Shopping), 0.0);
        assert_eq!(monday.weekday, 0);
        assert!(!monday.is_weekend);

        let tuesday = table.get(date(2024, 1, 2)).unwrap();
        assert_eq!(tuesday.total_spent, 100.0);
        assert_eq!(tuesday.weekday, 1);
    }

    #[test]
    fn test_rows_hold_every_category_and_sum_to_total() {
        let records = vec![
            TransactionRecord::expense(3.5, Category::Shopping, date(2024, 3, 2)),
            TransactionRecord::expense(7.25, Category::Others, date(2024, 3, 2)),
            TransactionRecord::expense(12.0, Category::Entertainment, date(2024, 3, 3)),
            TransactionRecord::new(999.0, "salary", TransactionKind::Income, date(2024, 3, 3)),
        ];

        let table = build_daily_features(&records);
        for row in table.rows() {
            assert_eq!(row.spent.len(), Category::ALL.len());
            let sum: f64 = row.spent.values().sum();
            assert!((row.total_spent - sum).abs() < 1e-9);
        }

        let saturday = table.get(date(2024, 3, 2)).unwrap();
        assert_eq!(saturday.weekday, 5);
        assert!(saturday.is_weekend);
        assert_eq!(table.get(date(2024, 3, 3)).unwrap().total_spent, 12.0);
    }

    #[test]
    fn test_cleaning_rules() {
        let mut no_kind = TransactionRecord::expense(4.0, Category::Food, date(2024, 5, 1));
        no_kind.kind = None;
        let mut no_date = TransactionRecord::expense(50.0, Category::Food, date(2024, 5, 1));
        no_date.date = None;
        let mut bad_date = TransactionRecord::expense(60.0, Category::Food, date(2024, 5, 1));
        bad_date.date = Some("2024-05-xx".to_string());
        let unknown_category =
            TransactionRecord::new(70.0, "salary", TransactionKind::Expense, date(2024, 5, 1));
        let income = TransactionRecord::new(80.0, "food", TransactionKind::Income, date(2024, 5, 1));

        let records = vec![no_kind, no_date, bad_date, unknown_category, income];
        let table = build_daily_features(&records);

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].total_spent, 4.0);
    }

    #[test]
    fn test_no_expenses_gives_empty_table() {
        let records = vec![TransactionRecord::new(
            3000.0,
            "salary",
            TransactionKind::Income,
            date(2024, 1, 31),
        )];
        let table = build_daily_features(&records);
        assert!(table.is_empty());
        assert!(table.to_matrix().is_empty());

        let empty: Vec<TransactionRecord> = Vec::new();
        assert!(build_daily_features(&empty).is_empty());
    }

    #[test]
    fn test_column_order_and_matrix_values() {
        let records = vec![
            TransactionRecord::expense(10.0, Category::Transport, date(2024, 1, 7)),
            TransactionRecord::expense(2.0, Category::Others, date(2024, 1, 7)),
        ];
        let matrix = build_daily_features(&records).to_matrix();
        assert_eq!(
            matrix.columns(),
            &[
                "total_spent",
                "spent_food",
                "spent_transport",
                "spent_entertainment",
                "spent_shopping",
                "spent_others",
                "weekday",
                "is_weekend"
            ]
        );
        assert_eq!(
            matrix.rows()[0],
            vec![12.0, 0.0, 10.0, 0.0, 0.0, 2.0, 6.0, 1.0]
        );
    }

    #[test]
    fn test_rows_sorted_by_date() {
        let records = vec![
            TransactionRecord::expense(1.0, Category::Food, date(2024, 2, 10)),
            TransactionRecord::expense(1.0, Category::Food, date(2024, 1, 10)),
            TransactionRecord::expense(1.0, Category::Food, date(2024, 2, 1)),
        ];
        let table = build_daily_features(&records);
        assert_eq!(
            table.dates(),
            vec![date(2024, 1, 10), date(2024, 2, 1), date(2024, 2, 10)]
        );
    }

    #[test]
    fn test_reindex_zero_fills_and_reorders() {
        let matrix = FeatureMatrix::new(
            vec!["b".to_string(), "a".to_string()],
            vec![vec![2.0, 1.0]],
        )
        .unwrap();
        let target = vec!["a".to_string(), "c".to_string(), "b".to_string()];
        let aligned = matrix.reindex(&target);
        assert_eq!(aligned.columns(), target.as_slice());
        assert_eq!(aligned.rows()[0], vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_unusable_amounts_are_skipped() {
        let day = date(2024, 1, 25);
        let records = vec![
            TransactionRecord::expense(20.0, Category::Food, day),
            TransactionRecord::expense(f64::INFINITY, Category::Food, day),
            TransactionRecord::expense(f64::NAN, Category::Transport, day),
            TransactionRecord::expense(-5.0, Category::Shopping, day),
        ];
        let table = build_daily_features(&records);

        assert_eq!(table.len(), 1);
        let row = table.get(day).unwrap();
        assert_eq!(row.total_spent, 20.0);
        assert_eq!(row.spent_on(Category::Transport), 0.0);
        assert_eq!(row.spent_on(Category::Shopping), 0.0);
    }

    #[test]
    fn test_overflowing_day_is_dropped() {
        let records = vec![
            TransactionRecord::expense(20.0, Category::Food, date(2024, 1, 24)),
            TransactionRecord::expense(1e308, Category::Food, date(2024, 1, 25)),
            TransactionRecord::expense(1e308, Category::Shopping, date(2024, 1, 25)),
        ];
        let table = build_daily_features(&records);

        assert_eq!(table.dates(), vec![date(2024, 1, 24)]);
        assert!(table.to_matrix().rows().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let result = FeatureMatrix::new(vec!["a".to_string()], vec![vec![1.0, 2.0]]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
