//! Reporting periods relative to a reference day

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::TransactionRecord;

/// A window of days ending at (and including) the reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    /// Today and the six days before it
    #[serde(rename = "7d")]
    Last7Days,
    /// Today and the 29 days before it
    #[serde(rename = "30d")]
    Last30Days,
    #[default]
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "last_month")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 5] = [
        Period::Last7Days,
        Period::Last30Days,
        Period::ThisMonth,
        Period::LastMonth,
        Period::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::All => "all",
        }
    }

    /// Whether `date` falls in this period as seen from `today`
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::Last7Days => date >= today - Duration::days(6),
            Self::Last30Days => date >= today - Duration::days(29),
            Self::ThisMonth => date.year() == today.year() && date.month() == today.month(),
            Self::LastMonth => {
                let last = first_of_month(today) - Duration::days(1);
                date.year() == last.year() && date.month() == last.month()
            }
            Self::All => true,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL_PERIODS
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "Unknown period '{}'. Use one of: 7d, 30d, this_month, last_month, all",
                    s
                ))
            })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First day of `date`'s month
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of `date`'s month
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Records whose date falls within `period` as seen from `today`
///
/// `All` returns every record untouched; other periods drop records whose
/// date is missing or malformed.
pub fn filter_records_by_period(
    records: &[TransactionRecord],
    period: Period,
    today: NaiveDate,
) -> Vec<TransactionRecord> {
    if period == Period::All {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| r.parsed_date().is_some_and(|d| period.contains(d, today)))
        .cloned()
        .collect()
}
