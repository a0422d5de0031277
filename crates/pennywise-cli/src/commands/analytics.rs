//! Analytics command implementations (anomalies, check, recommend, summary)

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pennywise_core::{
    build_daily_features, filter_records_by_period, summarize_spending, AnalyticsConfig,
    AnomalyEngine, BudgetRecommender, Category, Outcome, Period, SpendingSummary, Store,
    SummaryPeriod, TransactionRecord,
};

use super::{check_amount, parse_date_input, records::resolve_category};

/// Batch-label the period's spending days and print the anomalous ones
pub fn cmd_anomalies(
    store: &Store,
    config: &AnalyticsConfig,
    period: Period,
    today: NaiveDate,
    json: bool,
) -> Result<Vec<NaiveDate>> {
    let records = store.load_records().context("Failed to load records")?;
    let filtered = filter_records_by_period(&records, period, today);
    let table = build_daily_features(&filtered);

    if table.is_empty() {
        println!("No expense days in period '{}'.", period);
        return Ok(Vec::new());
    }

    let mut engine = AnomalyEngine::with_config(config.anomaly.clone());
    let labeled = engine
        .detect(&table)
        .context("Anomaly detection failed")?;
    let flagged: Vec<NaiveDate> = labeled.iter().filter(|d| d.anomaly).map(|d| d.date).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&labeled)?);
        return Ok(flagged);
    }

    println!();
    println!(
        "🔍 Anomalous Spending Days ({}, {} days examined)",
        period,
        table.len()
    );
    println!("   ─────────────────────────────────────────");
    if flagged.is_empty() {
        println!("   None - spending looks consistent.");
    }
    for day in labeled.iter().filter(|d| d.anomaly) {
        let top = Category::ALL
            .iter()
            .max_by(|a, b| {
                day.features
                    .spent_on(**a)
                    .total_cmp(&day.features.spent_on(**b))
            })
            .map(|c| c.as_str())
            .unwrap_or("-");
        println!(
            "   🚨 {} │ {:>10.2} │ mostly {}",
            day.date, day.features.total_spent, top
        );
    }

    Ok(flagged)
}

/// Judge a hypothetical expense against the trailing window without saving it
pub fn cmd_check(
    store: &Store,
    config: &AnalyticsConfig,
    amount: f64,
    category: &str,
    date: Option<&str>,
    today: NaiveDate,
) -> Result<bool> {
    check_amount(amount)?;
    let category = resolve_category(category)?;
    let date = parse_date_input(date, today)?;
    let history = store.load_records().context("Failed to load records")?;

    let candidate = TransactionRecord::expense(amount, category, date);
    let engine = AnomalyEngine::with_config(config.anomaly.clone());
    let anomalous = engine.is_anomalous(&candidate, &history);

    if anomalous {
        println!(
            "🚨 {:.2} on {} for {} looks anomalous against the previous {} days",
            amount, date, category, config.anomaly.window_days
        );
    } else {
        println!(
            "✅ {:.2} on {} for {} looks normal",
            amount, date, category
        );
    }

    Ok(anomalous)
}

/// Print recommended budgets; saves analytics files unless `dry_run`
pub fn cmd_recommend(
    store: &Store,
    config: &AnalyticsConfig,
    dry_run: bool,
) -> Result<BTreeMap<Category, f64>> {
    let records = store.load_records().context("Failed to load records")?;
    let budgets = store.load_budgets().context("Failed to load budgets")?;
    let recommender = BudgetRecommender::new(config.recommend.clone());

    let recommendation = recommender
        .recommend(&records, &budgets)
        .context("Failed to compute recommendations")?;

    match &recommendation.outcome {
        Outcome::NoData => {
            println!("Not enough data to generate recommendations.");
            return Ok(recommendation.budgets);
        }
        Outcome::InsufficientHistory { months, required } => {
            println!(
                "Only {} month(s) of history; {} are needed. Current budgets kept.",
                months, required
            );
        }
        Outcome::Clustered { .. } => {
            if !dry_run {
                recommendation
                    .save(store)
                    .context("Failed to save recommendations")?;
            }
        }
    }

    println!();
    println!("💡 Recommended Monthly Budgets");
    println!("   ─────────────────────────────────────────");
    for (category, value) in &recommendation.budgets {
        println!(
            "   {:<14} {:>10.2}   (current {:.2})",
            category.as_str(),
            value,
            budgets.limit(*category)
        );
    }

    Ok(recommendation.budgets)
}

/// Print the summary payload (or chat messages) as JSON
pub fn cmd_summary(
    store: &Store,
    config: &AnalyticsConfig,
    period: SummaryPeriod,
    today: NaiveDate,
    messages: bool,
) -> Result<SpendingSummary> {
    let records = store.load_records().context("Failed to load records")?;
    let budgets = store.load_budgets().context("Failed to load budgets")?;
    let mut engine = AnomalyEngine::with_config(config.anomaly.clone());

    let summary = summarize_spending(&records, &budgets, period, today, &mut engine);

    if messages {
        let chat = summary.to_chat_messages()?;
        println!("{}", serde_json::to_string_pretty(&chat)?);
    } else {
        println!("{}", summary.to_json_pretty()?);
    }

    Ok(summary)
}
