//! Budget command implementations

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use pennywise_core::{
    budget::{budget_status, calculate_spending, remaining, BudgetStatus},
    filter_records_by_period, Budgets, Category, Period, Store,
};

pub fn cmd_budgets_list(store: &Store) -> Result<()> {
    let budgets = store.load_budgets().context("Failed to load budgets")?;

    println!();
    println!("💰 Monthly Budgets");
    println!("   ─────────────────────────────");
    for (category, limit) in budgets.iter() {
        if limit > 0.0 {
            println!("   {:<14} {:>10.2}", category.as_str(), limit);
        } else {
            println!("   {:<14} {:>10}", category.as_str(), "unset");
        }
    }
    println!();
    println!("   Use 'pennywise budgets set <category> <amount>' to change a limit.");

    Ok(())
}

/// Set one category's monthly limit and save
pub fn cmd_budgets_set(store: &Store, category: &str, amount: f64) -> Result<Budgets> {
    let Ok(category) = category.parse::<Category>() else {
        bail!(
            "Invalid category '{}'. Use one of: food, transport, entertainment, shopping, others",
            category
        );
    };

    let mut budgets = store.load_budgets().context("Failed to load budgets")?;
    budgets.set(category, amount)?;
    store.save_budgets(&budgets).context("Failed to save budgets")?;

    println!("✅ Budget for '{}' set to {:.2}", category, amount);
    Ok(budgets)
}

/// Budgets are monthly, so only month periods make sense here
fn require_month_period(period: Period) -> Result<()> {
    if !matches!(period, Period::ThisMonth | Period::LastMonth) {
        bail!("Budgets are monthly limits; use --period this_month or last_month");
    }
    Ok(())
}

pub fn cmd_budgets_status(store: &Store, period: Period, today: NaiveDate) -> Result<()> {
    require_month_period(period)?;
    let budgets = store.load_budgets().context("Failed to load budgets")?;
    let records = store.load_records().context("Failed to load records")?;
    let filtered = filter_records_by_period(&records, period, today);
    if filtered.is_empty() {
        println!("No transactions to calculate budget status for '{}'.", period);
        return Ok(());
    }

    let spending = calculate_spending(&filtered);

    println!();
    println!("📋 Budget Status ({})", period);
    println!("   ─────────────────────────────────────────────");
    for status in budget_status(&spending, &budgets) {
        let icon = match status.status {
            BudgetStatus::Within => "✅",
            BudgetStatus::AtLimit => "⚠️ ",
            BudgetStatus::Exceeded => "🔴",
        };
        println!(
            "   {} {:<14} {:<14} {:>9.2} / {:.2}",
            icon,
            status.category.as_str(),
            status.status.as_str(),
            status.spent,
            status.limit
        );
    }

    Ok(())
}

pub fn cmd_budgets_remaining(store: &Store, period: Period, today: NaiveDate) -> Result<()> {
    require_month_period(period)?;
    let budgets = store.load_budgets().context("Failed to load budgets")?;
    let records = store.load_records().context("Failed to load records")?;
    let filtered = filter_records_by_period(&records, period, today);
    if filtered.is_empty() {
        println!("No transactions to calculate remaining budgets for '{}'.", period);
        return Ok(());
    }

    let spending = calculate_spending(&filtered);

    println!();
    println!("💵 Remaining Budget ({})", period);
    println!("   ─────────────────────────────────────────");
    for (category, left) in remaining(&spending, &budgets) {
        println!(
            "   {:<14} {:>10.2} left of {:.2}",
            category.as_str(),
            left,
            budgets.limit(category)
        );
    }

    Ok(())
}
