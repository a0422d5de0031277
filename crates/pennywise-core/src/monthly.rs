//! Monthly spending and budget-adherence ratios

use std::collections::BTreeMap;

use crate::budget::Budgets;
use crate::models::{zeroed_totals, Category, CategoryTotals, MonthlySpending, TransactionRecord};

/// Total expense per category for every month present in `records`
///
/// The month key is the first 7 characters of the date string; shorter dates
/// and negative or non-finite amounts are skipped. Output is sorted by month with every category present.
pub fn aggregate_monthly_spending(records: &[TransactionRecord]) -> Vec<MonthlySpending> {
    let mut months: BTreeMap<String, CategoryTotals> = BTreeMap::new();

    for record in records {
        let Some(month) = record.month_key() else {
            continue;
        };
        if !record.is_expense() || !record.has_valid_amount() {
            continue;
        }

        let totals = months.entry(month.to_string()).or_insert_with(zeroed_totals);
        if let Some(category) = record.spending_category() {
            *totals.entry(category).or_insert(0.0) += record.amount;
        }
    }

    months
        .into_iter()
        .map(|(month, spending)| MonthlySpending { month, spending })
        .collect()
}

/// spent / limit, or 1.0 for an unset (non-positive) limit
pub fn adherence_ratio(spent: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        1.0
    } else {
        spent / limit
    }
}

/// One ratio row per month, columns in canonical category order
pub fn build_ratio_matrix(monthly: &[MonthlySpending], budgets: &Budgets) -> Vec<Vec<f64>> {
    monthly
        .iter()
        .map(|m| {
            Category::ALL
                .iter()
                .map(|c| {
                    let spent = m.spending.get(c).copied().unwrap_or(0.0);
                    adherence_ratio(spent, budgets.limit(*c))
                })
                .collect()
        })
        .collect()
}
