//! Domain models for Pennywise

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Date format used by records on disk and on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Spending categories, in canonical column order
///
/// The vocabulary is closed: every aggregation emits exactly these columns,
/// in exactly this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Others,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 5] = [
        Self::Food,
        Self::Transport,
        Self::Entertainment,
        Self::Shopping,
        Self::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Others => "others",
        }
    }

    /// Position of this category in the canonical order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Parse a user-typed category, suggesting the closest known one on a miss
    ///
    /// Returns `Err(Error::InvalidCategory)` carrying a hint when nothing is
    /// close enough to suggest.
    pub fn parse_or_suggest(input: &str) -> Result<Category> {
        let normalized = input.trim().to_lowercase();
        if let Ok(category) = normalized.parse() {
            return Ok(category);
        }

        Self::closest(&normalized).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(|c| c.as_str()).collect();
            Error::InvalidCategory(format!(
                "'{}'. Please use one of: {}",
                normalized,
                known.join(", ")
            ))
        })
    }

    /// Closest category by character similarity (ratio >= 0.6)
    pub fn closest(input: &str) -> Option<Category> {
        Self::ALL
            .iter()
            .map(|c| (*c, similarity(input, c.as_str())))
            .filter(|(_, ratio)| *ratio >= 0.6)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, _)| c)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "entertainment" => Ok(Self::Entertainment),
            "shopping" => Ok(Self::Shopping),
            "others" | "other" => Ok(Self::Others),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 2 * LCS / (len_a + len_b)
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut curr = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        prev = curr;
    }

    2.0 * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

/// Per-category amounts, always holding every category
pub type CategoryTotals = BTreeMap<Category, f64>;

/// A `CategoryTotals` with every category set to zero
pub fn zeroed_totals() -> CategoryTotals {
    Category::ALL.iter().map(|c| (*c, 0.0)).collect()
}

/// Whether a transaction spends or earns money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
    /// Anything else found in the data; ignored by spending analytics
    #[serde(other)]
    Other,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense record as supplied by the persistence layer
///
/// Fields are kept loose: `kind` may be absent (treated as expense) and `date`
/// may be absent or unparseable (the record is then skipped by analytics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl TransactionRecord {
    pub fn new(amount: f64, category: &str, kind: TransactionKind, date: NaiveDate) -> Self {
        Self {
            amount,
            category: category.to_string(),
            kind: Some(kind),
            date: Some(date.format(DATE_FORMAT).to_string()),
        }
    }

    /// Shorthand for an expense in a known category
    pub fn expense(amount: f64, category: Category, date: NaiveDate) -> Self {
        Self::new(amount, category.as_str(), TransactionKind::Expense, date)
    }

    /// The record's kind, defaulting to expense when missing
    pub fn kind(&self) -> TransactionKind {
        self.kind.unwrap_or_default()
    }

    pub fn is_expense(&self) -> bool {
        self.kind() == TransactionKind::Expense
    }

    /// Parsed `YYYY-MM-DD` date, or None when missing or malformed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
    }

    /// The first 7 characters of the date string ("YYYY-MM"), or None if it is
    /// shorter
    pub fn month_key(&self) -> Option<&str> {
        let date = self.date.as_deref()?;
        let mut ends = date.char_indices().map(|(i, c)| i + c.len_utf8());
        ends.nth(6).map(|end| &date[..end])
    }

    /// A countable amount: finite and not negative
    pub fn has_valid_amount(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }

    /// Category if it belongs to the closed vocabulary
    pub fn spending_category(&self) -> Option<Category> {
        self.category.parse().ok()
    }
}

/// Clean a loosely-typed JSON array into records
///
/// Non-objects and objects that do not deserialize (missing amount or category,
/// wrong field types) are dropped. Missing `type` and `date` survive as `None`.
pub fn records_from_json(values: &[Value]) -> Vec<TransactionRecord> {
    values
        .iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

/// Total expense per category for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpending {
    /// "YYYY-MM"
    pub month: String,
    pub spending: CategoryTotals,
}
