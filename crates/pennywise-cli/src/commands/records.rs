//! Transaction command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pennywise_core::{
    budget::{calculate_spending, check_budget_alerts},
    filter_records_by_period, AnomalyEngine, Category, Period, Store, TransactionKind,
    TransactionRecord,
};

use super::{check_amount, parse_date_input};

/// Add a transaction, save it, then print budget alerts and the anomaly verdict
///
/// Expense categories go through name suggestion ("fod" -> food); income keeps
/// its free-form category.
pub fn cmd_add(
    store: &Store,
    engine: &AnomalyEngine,
    amount: f64,
    category: &str,
    kind: &str,
    date: Option<&str>,
    today: NaiveDate,
) -> Result<TransactionRecord> {
    check_amount(amount)?;
    let kind: TransactionKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}. Use 'expense' or 'income'", e))?;
    let date = parse_date_input(date, today)?;

    let category = match kind {
        TransactionKind::Expense => resolve_category(category)?.as_str().to_string(),
        _ => {
            let trimmed = category.trim().to_lowercase();
            if trimmed.is_empty() {
                anyhow::bail!("Category cannot be empty");
            }
            trimmed
        }
    };

    let budgets = store.load_budgets().context("Failed to load budgets")?;
    let mut records = store.load_records().context("Failed to load records")?;
    let history = records.clone();

    let record = TransactionRecord::new(amount, &category, kind, date);
    store
        .add_record(&mut records, record.clone())
        .context("Failed to save record")?;

    println!(
        "✅ Added {} of {:.2} for '{}' on {}",
        record.kind(),
        record.amount,
        record.category,
        date
    );

    for alert in check_budget_alerts(&records, &budgets, &record) {
        println!("   ⚠️  {}", alert);
    }

    if engine.is_anomalous(&record, &history) {
        println!("   🚨 This transaction looks anomalous compared to your recent spending!");
    }

    Ok(record)
}

/// Parse an expense category, accepting a close match with a notice
pub fn resolve_category(input: &str) -> Result<Category> {
    let category = Category::parse_or_suggest(input)?;
    if input.parse::<Category>().is_err() {
        println!("   Unknown category '{}', using '{}'", input.trim(), category);
    }
    Ok(category)
}

pub fn cmd_list(store: &Store, period: Period, limit: usize, today: NaiveDate) -> Result<()> {
    let records = store.load_records().context("Failed to load records")?;
    let mut filtered = filter_records_by_period(&records, period, today);

    if filtered.is_empty() {
        println!("No transactions for period '{}'. Add one with:", period);
        println!("  pennywise add 12.50 food");
        return Ok(());
    }

    filtered.sort_by(|a, b| b.date.cmp(&a.date));

    println!();
    println!("📝 Transactions ({}, {} total)", period, filtered.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for record in filtered.iter().take(limit) {
        let amount_str = if record.is_expense() {
            format!("\x1b[31m-{:.2}\x1b[0m", record.amount) // Red for expenses
        } else {
            format!("\x1b[32m+{:.2}\x1b[0m", record.amount) // Green for income
        };
        println!(
            "   {} │ {:>10} │ {}",
            record.date.as_deref().unwrap_or("----------"),
            amount_str,
            record.category
        );
    }

    Ok(())
}

/// Spending per category with share of the total
pub fn cmd_breakdown(store: &Store, period: Period, today: NaiveDate) -> Result<()> {
    let records = store.load_records().context("Failed to load records")?;
    let filtered = filter_records_by_period(&records, period, today);
    if filtered.is_empty() {
        println!("No transactions to display for period '{}'.", period);
        return Ok(());
    }

    let spending = calculate_spending(&filtered);
    let total: f64 = spending.values().sum();
    if total == 0.0 {
        println!("No expenses recorded in period '{}'.", period);
        return Ok(());
    }

    println!();
    println!("📊 Spending Breakdown ({})", period);
    println!("   ─────────────────────────────────────────");
    for (category, amount) in &spending {
        println!(
            "   {:<14} {:>10.2}  ({:>5.1}%)",
            category.as_str(),
            amount,
            amount / total * 100.0
        );
    }
    println!("   {:<14} {:>10.2}", "total", total);

    Ok(())
}
