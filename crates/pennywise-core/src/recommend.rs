//! Budget recommendations from clustered monthly behavior
//!
//! Months are described by their budget-adherence ratios and grouped with
//! k-means. The cluster holding the most recent month supplies a ratio per
//! category, which is blended with the current budget to produce the
//! suggestion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::Budgets;
use crate::cluster::{KMeans, KMeansConfig};
use crate::error::{Error, Result};
use crate::models::{Category, MonthlySpending, TransactionRecord};
use crate::monthly::{aggregate_monthly_spending, build_ratio_matrix};
use crate::store::Store;

/// Recommendation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Clustering parameters; `k` doubles as the minimum number of months
    pub clustering: KMeansConfig,
    /// Weight of the current budget in the blend (the suggestion gets the rest)
    pub current_weight: f64,
    /// Lowest value ever recommended
    pub floor: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            clustering: KMeansConfig::default(),
            current_weight: 0.7,
            floor: 100.0,
        }
    }
}

impl RecommendConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.current_weight) {
            return Err(Error::Config(format!(
                "current_weight must be in [0, 1], got {}",
                self.current_weight
            )));
        }
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(Error::Config(format!(
                "floor must be a non-negative number, got {}",
                self.floor
            )));
        }
        self.clustering.validate()
    }
}

/// How a recommendation was reached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// No expense months at all
    NoData,
    /// Fewer months than clusters; current budgets returned unchanged
    InsufficientHistory { months: usize, required: usize },
    /// Latest month assigned to `cluster` with the given center ratios
    Clustered { cluster: usize, center: Vec<f64> },
}

/// Result of one recommendation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub outcome: Outcome,
    /// Monthly history the recommendation was derived from
    pub monthly: Vec<MonthlySpending>,
    /// Recommended limit per category
    pub budgets: BTreeMap<Category, f64>,
}

impl Recommendation {
    /// Persist the monthly history and recommendations if clustering ran
    ///
    /// Returns whether anything was written.
    pub fn save(&self, store: &Store) -> Result<bool> {
        if !matches!(self.outcome, Outcome::Clustered { .. }) {
            return Ok(false);
        }
        store.save_monthly_spending(&self.monthly)?;
        store.save_recommendations(&self.budgets)?;
        debug!(outcome = ?self.outcome, "Persisted clustered recommendation");
        Ok(true)
    }
}

/// Blend one category's current budget with its cluster-suggested value
///
/// `suggested = ratio * current`, blended by `current_weight`, floored and
/// rounded to cents. A blend that overflows keeps the current budget.
pub fn blend_recommendation(center_ratio: f64, current: f64, config: &RecommendConfig) -> f64 {
    let suggested = center_ratio * current;
    let blended = config.current_weight * current + (1.0 - config.current_weight) * suggested;
    if !blended.is_finite() {
        return round_cents(current.max(config.floor));
    }
    round_cents(blended.max(config.floor))
}

fn round_cents(value: f64) -> f64 {
    let cents = (value * 100.0).round();
    if cents.is_finite() {
        cents / 100.0
    } else {
        value
    }
}

/// Clustering recommender over transaction history
#[derive(Debug, Clone, Default)]
pub struct BudgetRecommender {
    config: RecommendConfig,
}

impl BudgetRecommender {
    pub fn new(config: RecommendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Compute recommendations without touching storage
    pub fn recommend(&self, records: &[TransactionRecord], budgets: &Budgets) -> Result<Recommendation> {
        self.config.validate()?;

        let monthly = aggregate_monthly_spending(records);
        if monthly.is_empty() {
            return Ok(Recommendation {
                outcome: Outcome::NoData,
                monthly,
                budgets: BTreeMap::new(),
            });
        }

        let required = self.config.clustering.k;
        if monthly.len() < required {
            debug!(
                months = monthly.len(),
                required, "Not enough months to cluster, keeping current budgets"
            );
            return Ok(Recommendation {
                outcome: Outcome::InsufficientHistory {
                    months: monthly.len(),
                    required,
                },
                monthly,
                budgets: budgets.as_map().clone(),
            });
        }

        let ratios = build_ratio_matrix(&monthly, budgets);
        let model = KMeans::fit(&ratios, &self.config.clustering)?;

        let latest = ratios
            .last()
            .ok_or_else(|| Error::InvalidData("Ratio matrix is empty".into()))?;
        let cluster = model.predict(latest);
        let center = model
            .center(cluster)
            .ok_or_else(|| Error::InvalidData(format!("No center for cluster {}", cluster)))?
            .to_vec();

        debug!(
            months = monthly.len(),
            cluster,
            ?center,
            "Latest month assigned to cluster"
        );

        let recommended = Category::ALL
            .iter()
            .map(|c| {
                let value = blend_recommendation(center[c.index()], budgets.limit(*c), &self.config);
                (*c, value)
            })
            .collect();

        Ok(Recommendation {
            outcome: Outcome::Clustered { cluster, center },
            monthly,
            budgets: recommended,
        })
    }

    /// Recommend budgets and persist the clustered result
    ///
    /// When clustering ran, the monthly history and the recommendation map are
    /// written through `store`. Fallback outcomes (no data, too few months) save
    /// nothing.
    pub fn recommend_and_save(
        &self,
        records: &[TransactionRecord],
        budgets: &Budgets,
        store: &Store,
    ) -> Result<BTreeMap<Category, f64>> {
        let recommendation = self.recommend(records, budgets)?;
        recommendation.save(store)?;
        Ok(recommendation.budgets)
    }
}

/// Recommend budgets with the default policy, persisting clustered results
pub fn recommend_budgets(
    records: &[TransactionRecord],
    budgets: &Budgets,
    store: &Store,
) -> Result<BTreeMap<Category, f64>> {
    BudgetRecommender::default().recommend_and_save(records, budgets, store)
}
