//! Budget map and budget checks
//!
//! `Budgets` is a plain value owned by whoever loaded it (normally the CLI via
//! `Store::load_budgets`). Analytics borrow it for the length of one call and
//! never keep or mutate it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{zeroed_totals, Category, CategoryTotals, TransactionRecord};

/// Milestones announced as spending crosses them, as fractions of the limit
const MILESTONES: [f64; 3] = [0.8, 0.9, 1.0];

/// Monthly spending limit per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Budgets(BTreeMap<Category, f64>);

impl Budgets {
    /// Every category present with a zero (unset) limit
    pub fn zeroed() -> Self {
        Self(zeroed_totals())
    }

    /// Limit for `category`; missing categories count as 0 (unset)
    pub fn limit(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.0.get(&category).copied()
    }

    /// Set a limit, rejecting negative or non-finite values
    pub fn set(&mut self, category: Category, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidData(format!(
                "Budget for '{}' must be a non-negative number, got {}",
                category, value
            )));
        }
        self.0.insert(category, value);
        Ok(())
    }

    /// Add a zero limit for any category not yet present
    pub fn fill_missing(&mut self) {
        for category in Category::ALL {
            self.0.entry(category).or_insert(0.0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }

    pub fn as_map(&self) -> &BTreeMap<Category, f64> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, f64)> for Budgets {
    fn from_iter<T: IntoIterator<Item = (Category, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<Category, f64>> for Budgets {
    fn from(map: BTreeMap<Category, f64>) -> Self {
        Self(map)
    }
}

/// A budget warning for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetAlert {
    /// Spending is above the limit
    Exceeded {
        category: Category,
        spent: f64,
        limit: f64,
    },
    /// Spending just crossed `percent`% of the limit
    Milestone {
        category: Category,
        percent: u32,
        spent: f64,
        limit: f64,
    },
}

impl std::fmt::Display for BudgetAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exceeded {
                category,
                spent,
                limit,
            } => write!(
                f,
                "You exceeded the budget for '{}': {:.2} / {:.2}",
                category, spent, limit
            ),
            Self::Milestone {
                category,
                percent,
                spent,
                limit,
            } => write!(
                f,
                "You reached {}% of '{}' budget: {:.2} / {:.2}",
                percent, category, spent, limit
            ),
        }
    }
}

/// Where a category stands against its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Within,
    AtLimit,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Within => "Within Budget",
            Self::AtLimit => "At Limit",
            Self::Exceeded => "Exceeded",
        }
    }
}

/// Status line for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatus {
    pub category: Category,
    pub spent: f64,
    pub limit: f64,
    pub status: BudgetStatus,
}

/// Total expense per category across `records`
pub fn calculate_spending(records: &[TransactionRecord]) -> CategoryTotals {
    let mut spending = zeroed_totals();
    for record in records.iter().filter(|r| r.is_expense() && r.has_valid_amount()) {
        if let Some(category) = record.spending_category() {
            *spending.entry(category).or_insert(0.0) += record.amount;
        }
    }
    spending
}

/// Expense total for one category within a "YYYY-MM" month
pub fn calculate_category_spent(
    records: &[TransactionRecord],
    category: Category,
    month_key: &str,
) -> f64 {
    records
        .iter()
        .filter(|r| r.is_expense() && r.has_valid_amount())
        .filter(|r| r.spending_category() == Some(category))
        .filter(|r| r.date.as_deref().is_some_and(|d| d.starts_with(month_key)))
        .map(|r| r.amount)
        .sum()
}

/// Overspend warnings for every category above its limit
pub fn check_budget(spending: &CategoryTotals, budgets: &Budgets) -> Vec<BudgetAlert> {
    spending
        .iter()
        .filter(|(c, spent)| **spent > budgets.limit(**c))
        .map(|(c, spent)| BudgetAlert::Exceeded {
            category: *c,
            spent: *spent,
            limit: budgets.limit(*c),
        })
        .collect()
}

/// Alerts triggered by adding `new_record` to `records`
///
/// `records` must already contain `new_record`. Reports overspending for the
/// record's month, or else the first milestone (80/90/100%) that this record
/// pushed spending across.
pub fn check_budget_alerts(
    records: &[TransactionRecord],
    budgets: &Budgets,
    new_record: &TransactionRecord,
) -> Vec<BudgetAlert> {
    if !new_record.is_expense() || !new_record.has_valid_amount() {
        return Vec::new();
    }
    let (Some(month_key), Some(category)) = (new_record.month_key(), new_record.spending_category())
    else {
        return Vec::new();
    };
    let Some(limit) = budgets.get(category) else {
        return Vec::new();
    };

    let spent = calculate_category_spent(records, category, month_key);
    if spent > limit {
        return vec![BudgetAlert::Exceeded {
            category,
            spent,
            limit,
        }];
    }

    let before = spent - new_record.amount;
    MILESTONES
        .iter()
        .find(|pct| spent >= limit * **pct && before < limit * **pct)
        .map(|pct| {
            vec![BudgetAlert::Milestone {
                category,
                percent: (pct * 100.0).round() as u32,
                spent,
                limit,
            }]
        })
        .unwrap_or_default()
}

/// Status of every category against its limit
pub fn budget_status(spending: &CategoryTotals, budgets: &Budgets) -> Vec<CategoryStatus> {
    Category::ALL
        .iter()
        .map(|c| {
            let spent = spending.get(c).copied().unwrap_or(0.0);
            let limit = budgets.limit(*c);
            let status = if spent > limit {
                BudgetStatus::Exceeded
            } else if spent == limit {
                BudgetStatus::AtLimit
            } else {
                BudgetStatus::Within
            };
            CategoryStatus {
                category: *c,
                spent,
                limit,
                status,
            }
        })
        .collect()
}

/// Limit minus spending for every budgeted category
pub fn remaining(spending: &CategoryTotals, budgets: &Budgets) -> CategoryTotals {
    budgets
        .iter()
        .map(|(c, limit)| (c, limit - spending.get(&c).copied().unwrap_or(0.0)))
        .collect()
}
