//! Integration tests for pennywise-core
//!
//! These tests exercise the full store → analyze → persist workflow against a
//! scratch data directory.

use std::fs;

use chrono::{Duration, NaiveDate};
use pennywise_core::{
    budget::{budget_status, calculate_spending, check_budget_alerts, BudgetStatus},
    filter_records_by_period, recommend_budgets, summarize_spending, AnalyticsConfig,
    AnomalyEngine, BudgetAlert, BudgetRecommender, Category, Outcome, Period, Store,
    SummaryPeriod, TransactionKind, TransactionRecord,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Records CSV as a user would leave it: mostly clean, a few bad rows
fn records_csv() -> &'static str {
    "amount,category,type,date
12.50,food,expense,2024-01-03
30,transport,expense,2024-01-04
2500,salary,income,2024-01-05
oops,food,expense,2024-01-06
45,entertainment,expense,2024-02-10
18,food,expense,2024-02-11
60,shopping,expense,2024-03-01
22,food,expense,2024-03-02
"
}

fn seeded_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = Store::open(dir.path()).expect("Failed to open store");
    fs::write(store.records_path(), records_csv()).expect("Failed to write records");
    (dir, store)
}

// =============================================================================
// Storage Integration Tests
// =============================================================================

#[test]
fn test_load_clean_and_aggregate() {
    let (_dir, store) = seeded_store();

    let records = store.load_records().expect("Failed to load records");
    assert_eq!(records.len(), 7, "the row with a bad amount is skipped");

    let spending = calculate_spending(&records);
    assert_eq!(spending[&Category::Food], 52.5);
    assert_eq!(spending[&Category::Transport], 30.0);
    assert_eq!(spending.values().sum::<f64>(), 187.5);

    let table = pennywise_core::build_daily_features(&records);
    assert_eq!(table.len(), 6, "income day contributes no row");
    for row in table.rows() {
        let categories: f64 = Category::ALL.iter().map(|c| row.spent_on(*c)).sum();
        assert!((row.total_spent - categories).abs() < 1e-9);
    }
}

#[test]
fn test_budget_file_lifecycle() {
    let (_dir, store) = seeded_store();

    let mut budgets = store.load_budgets().expect("Failed to load budgets");
    assert!(budgets.iter().all(|(_, limit)| limit == 0.0));

    budgets.set(Category::Food, 40.0).unwrap();
    store.save_budgets(&budgets).expect("Failed to save budgets");

    let reloaded = store.load_budgets().expect("Failed to reload budgets");
    assert_eq!(reloaded.limit(Category::Food), 40.0);

    let records = store.load_records().unwrap();
    let march = filter_records_by_period(&records, Period::ThisMonth, date(2024, 3, 20));
    let status = budget_status(&calculate_spending(&march), &reloaded);
    let food = status.iter().find(|s| s.category == Category::Food).unwrap();
    assert_eq!(food.spent, 22.0);
    assert_eq!(food.status, BudgetStatus::Within);
}

#[test]
fn test_add_record_triggers_milestone_alert() {
    let (_dir, store) = seeded_store();
    let mut budgets = store.load_budgets().unwrap();
    budgets.set(Category::Food, 50.0).unwrap();

    let mut records = store.load_records().unwrap();
    let new_record = TransactionRecord::expense(20.0, Category::Food, date(2024, 3, 9));
    store
        .add_record(&mut records, new_record.clone())
        .expect("Failed to add record");

    let alerts = check_budget_alerts(&records, &budgets, &new_record);
    assert_eq!(
        alerts,
        vec![BudgetAlert::Milestone {
            category: Category::Food,
            percent: 80,
            spent: 42.0,
            limit: 50.0,
        }]
    );

    assert_eq!(store.load_records().unwrap().len(), 8);
}

// =============================================================================
// Anomaly Detection Integration Tests
// =============================================================================

#[test]
fn test_spike_detected_from_persisted_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let today = date(2024, 3, 15);

    let history: Vec<TransactionRecord> = (1..=40)
        .map(|i: i64| {
            let amount = 18.0 + ((i * 37) % 40) as f64 * 0.1;
            TransactionRecord::expense(amount, Category::Food, today - Duration::days(i))
        })
        .collect();
    store.save_records(&history).unwrap();
    let history = store.load_records().unwrap();

    let config = AnalyticsConfig::embedded().expect("Embedded config must parse");
    let engine = AnomalyEngine::with_config(config.anomaly);

    let spike = TransactionRecord::expense(500.0, Category::Food, today);
    assert!(engine.is_anomalous(&spike, &history));

    let income = TransactionRecord::new(500.0, "bonus", TransactionKind::Income, today);
    assert!(!engine.is_anomalous(&income, &history));
}

#[test]
fn test_weekly_summary_payload() {
    let (_dir, store) = seeded_store();
    let records = store.load_records().unwrap();
    let budgets = store.load_budgets().unwrap();
    let mut engine = AnomalyEngine::new();

    let summary = summarize_spending(
        &records,
        &budgets,
        SummaryPeriod::Week,
        date(2024, 3, 5),
        &mut engine,
    );

    assert_eq!(summary.transactions.len(), 2);
    let json: serde_json::Value =
        serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["period"], "last 7 days");
    assert_eq!(json["spending"]["shopping"], 60.0);
    assert!(json["anomalies"].is_array());
}

// =============================================================================
// Recommendation Integration Tests
// =============================================================================

#[test]
fn test_recommendations_persisted_after_clustering() {
    let (_dir, store) = seeded_store();
    let records = store.load_records().unwrap();
    let mut budgets = store.load_budgets().unwrap();
    budgets.set(Category::Food, 200.0).unwrap();
    budgets.set(Category::Entertainment, 100.0).unwrap();

    let recommended =
        recommend_budgets(&records, &budgets, &store).expect("Recommendation failed");

    assert_eq!(recommended.len(), Category::ALL.len());
    assert!(recommended.values().all(|v| *v >= 100.0));
    assert_eq!(store.load_recommendations().unwrap(), recommended);

    let monthly = store.load_monthly_spending().unwrap();
    let months: Vec<_> = monthly.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
}

#[test]
fn test_short_history_keeps_budgets_and_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let mut budgets = store.load_budgets().unwrap();
    budgets.set(Category::Transport, 75.0).unwrap();

    let records = vec![
        TransactionRecord::expense(10.0, Category::Transport, date(2024, 4, 1)),
        TransactionRecord::expense(10.0, Category::Transport, date(2024, 5, 1)),
    ];

    let result = BudgetRecommender::default()
        .recommend(&records, &budgets)
        .unwrap();
    assert!(matches!(result.outcome, Outcome::InsufficientHistory { .. }));

    let recommended = recommend_budgets(&records, &budgets, &store).unwrap();
    assert_eq!(&recommended, budgets.as_map());
    assert!(!store.monthly_spending_path().exists());
    assert!(!store.recommendations_path().exists());
}
