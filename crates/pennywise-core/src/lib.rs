//! Pennywise Core Library
//!
//! Spending analytics for the Pennywise personal finance tracker:
//! - Daily feature aggregation and monthly budget-adherence ratios
//! - Pluggable outlier models (isolation forest by default)
//! - Batch and per-transaction anomaly detection
//! - K-means budget recommendations
//! - CSV/JSON storage in a data directory
//! - Budget checks, reporting periods and summary payloads

pub mod anomaly;
pub mod budget;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod monthly;
pub mod outlier;
pub mod period;
pub mod recommend;
pub mod store;
pub mod summary;

pub use anomaly::{AnomalyConfig, AnomalyEngine, LabeledDay, ModelFactory, OnlineWindow};
pub use budget::{BudgetAlert, BudgetStatus, Budgets, CategoryStatus};
pub use cluster::{KMeans, KMeansConfig};
pub use config::AnalyticsConfig;
pub use error::{Error, Result};
pub use features::{build_daily_features, DailyFeatureTable, DailyFeatures, FeatureMatrix};
pub use models::{Category, CategoryTotals, MonthlySpending, TransactionKind, TransactionRecord};
pub use monthly::{aggregate_monthly_spending, build_ratio_matrix};
pub use outlier::{AnomalyLabel, IsolationForest, OutlierConfig, OutlierModel};
pub use period::{filter_records_by_period, Period};
pub use recommend::{recommend_budgets, BudgetRecommender, Outcome, Recommendation, RecommendConfig};
pub use store::Store;
pub use summary::{summarize_spending, SpendingSummary, SummaryPeriod};
