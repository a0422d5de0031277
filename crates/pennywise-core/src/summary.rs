//! Spending summary payload for an external text summarizer
//!
//! Builds the JSON document (recent transactions, budgets, totals and anomalous
//! days) plus the chat messages that frame it. Sending them anywhere is left to
//! the caller.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::anomaly::AnomalyEngine;
use crate::budget::{calculate_spending, Budgets};
use crate::error::Result;
use crate::features::build_daily_features;
use crate::models::{CategoryTotals, TransactionRecord, DATE_FORMAT};
use crate::outlier::OutlierModel;
use crate::period::{first_of_month, last_of_month};

/// System prompt framing the summary for a chat model
pub const SYSTEM_PROMPT: &str = "You are a data-driven financial advisor. \
Analyze the user's transaction data, monthly budgets, spending trends, \
and highlight any anomalies in spending patterns. \
Budgets represent the maximum allowed expenses per category per month. \
Provide a brief numeric overview, detect anomalies, and give one clear actionable tip.";

/// Span covered by a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPeriod {
    /// Records dated on or after seven days ago
    Week,
    /// Records from the first day of the current month onward
    Month,
}

impl SummaryPeriod {
    /// Earliest included date and the human-readable label
    fn bounds(&self, today: NaiveDate) -> (NaiveDate, String) {
        match self {
            Self::Week => (today - Duration::days(7), "last 7 days".to_string()),
            Self::Month => {
                let first = first_of_month(today);
                let last = last_of_month(today);
                (first, format!("from {} to {}", first, last))
            }
        }
    }
}

impl std::str::FromStr for SummaryPeriod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(crate::error::Error::InvalidData(format!(
                "Invalid period type '{}'. Use 'week' or 'month'",
                s
            ))),
        }
    }
}

/// The payload handed to the summarizer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummary {
    pub period: String,
    pub transactions: Vec<TransactionRecord>,
    pub budgets: Budgets,
    pub spending: CategoryTotals,
    /// Flagged dates; absent when there were no expense days to examine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_detection_error: Option<String>,
}

/// One message of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl SpendingSummary {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// System and user messages asking a chat model to analyze this summary
    pub fn to_chat_messages(&self) -> Result<Vec<ChatMessage>> {
        let user = format!(
            "Here is the user's financial data as JSON:\n```\n{}\n```\n\
             Please provide your analysis in a structured but easy-to-read way.",
            self.to_json_pretty()?
        );
        Ok(vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ])
    }
}

/// Build the summary for `period` as seen from `today`
///
/// Anomalies come from the batch detector run over the same subset, so they
/// are relative to the period itself. A detector failure is reported in
/// `anomaly_detection_error` rather than failing the summary.
pub fn summarize_spending<M: OutlierModel>(
    records: &[TransactionRecord],
    budgets: &Budgets,
    period: SummaryPeriod,
    today: NaiveDate,
    engine: &mut AnomalyEngine<M>,
) -> SpendingSummary {
    let (cutoff, label) = period.bounds(today);

    let recent: Vec<TransactionRecord> = records
        .iter()
        .filter(|r| r.parsed_date().is_some_and(|d| d >= cutoff))
        .cloned()
        .collect();
    debug!(
        period = %label,
        transactions = recent.len(),
        "Building spending summary"
    );

    let spending = calculate_spending(&recent);

    let table = build_daily_features(&recent);
    let (anomalies, anomaly_detection_error) = if table.is_empty() {
        (None, None)
    } else {
        match engine.anomalous_dates(&table) {
            Ok(dates) => (
                Some(
                    dates
                        .iter()
                        .map(|d| d.format(DATE_FORMAT).to_string())
                        .collect(),
                ),
                None,
            ),
            Err(e) => {
                warn!(error = %e, "Anomaly detection failed for summary");
                (None, Some(e.to_string()))
            }
        }
    };

    SpendingSummary {
        period: label,
        transactions: recent,
        budgets: budgets.clone(),
        spending,
        anomalies,
        anomaly_detection_error,
    }
}
