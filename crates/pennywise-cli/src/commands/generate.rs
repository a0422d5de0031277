//! Synthetic transaction generator for trying out the analytics

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use pennywise_core::{Category, Store, TransactionKind, TransactionRecord};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Typical per-transaction expense range and pick weight per category
const EXPENSE_PROFILE: [(Category, f64, f64, f64); 5] = [
    (Category::Food, 5.0, 50.0, 0.40),
    (Category::Transport, 2.0, 20.0, 0.25),
    (Category::Entertainment, 0.0, 40.0, 0.10),
    (Category::Shopping, 0.0, 100.0, 0.15),
    (Category::Others, 0.0, 30.0, 0.10),
];

const INCOME_CATEGORIES: [&str; 3] = ["salary", "bonus", "gift"];

/// Share of generated transactions that are expenses
const EXPENSE_SHARE: f64 = 0.85;

/// Chance that an expense is inflated 2-5x
const SPLURGE_CHANCE: f64 = 0.05;

const SALARY: f64 = 3000.0;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn generate_record(rng: &mut StdRng, weights: &WeightedIndex<f64>, date: NaiveDate) -> TransactionRecord {
    if rng.gen::<f64>() < EXPENSE_SHARE {
        let (category, low, high, _) = EXPENSE_PROFILE[weights.sample(rng)];
        let mut amount = round_cents(rng.gen_range(low..=high));
        if rng.gen::<f64>() < SPLURGE_CHANCE {
            amount = round_cents(amount * rng.gen_range(2.0..=5.0));
        }
        TransactionRecord::expense(amount, category, date)
    } else {
        let category = INCOME_CATEGORIES.choose(rng).copied().unwrap_or("salary");
        let amount = match category {
            "salary" => SALARY,
            "bonus" => round_cents(rng.gen_range(100.0..=500.0)),
            _ => round_cents(rng.gen_range(20.0..=200.0)),
        };
        TransactionRecord::new(amount, category, TransactionKind::Income, date)
    }
}

/// Between `min_per_day` and `max_per_day` records for every day in `[start, end]`
pub fn generate_records(
    rng: &mut StdRng,
    start: NaiveDate,
    end: NaiveDate,
    min_per_day: usize,
    max_per_day: usize,
) -> Result<Vec<TransactionRecord>> {
    if min_per_day > max_per_day {
        bail!(
            "--min-per-day ({}) cannot exceed --max-per-day ({})",
            min_per_day,
            max_per_day
        );
    }
    let weights = WeightedIndex::new(EXPENSE_PROFILE.iter().map(|p| p.3))
        .context("Invalid category weights")?;

    let mut records = Vec::new();
    let mut day = start;
    while day <= end {
        let count = rng.gen_range(min_per_day..=max_per_day);
        for _ in 0..count {
            records.push(generate_record(rng, &weights, day));
        }
        day += Duration::days(1);
    }
    Ok(records)
}

/// Fill records.csv with `days` days of synthetic history ending today
pub fn cmd_generate(
    store: &Store,
    days: i64,
    min_per_day: usize,
    max_per_day: usize,
    seed: Option<u64>,
    append: bool,
    today: NaiveDate,
) -> Result<usize> {
    if days < 0 {
        bail!("--days must not be negative");
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let Some(start) = Duration::try_days(days).and_then(|span| today.checked_sub_signed(span))
    else {
        bail!("--days {} reaches outside the supported calendar", days);
    };
    let generated = generate_records(&mut rng, start, today, min_per_day, max_per_day)?;
    let count = generated.len();

    let mut records = if append {
        store.load_records().context("Failed to load records")?
    } else {
        Vec::new()
    };
    records.extend(generated);
    store.save_records(&records).context("Failed to save records")?;

    println!(
        "✅ Generated {} transactions from {} to {} in {}",
        count,
        start,
        today,
        store.records_path().display()
    );

    Ok(count)
}
