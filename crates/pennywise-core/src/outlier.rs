//! Outlier scoring models
//!
//! `OutlierModel` is the seam the anomaly engine trains and scores through.
//! `IsolationForest` is the default implementation: an ensemble of random
//! partitioning trees where rows that isolate in fewer splits score as more
//! anomalous. Labels come from a contamination-based threshold fitted on the
//! training rows' own scores.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;

/// Verdict for one scored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

impl AnomalyLabel {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Self::Anomalous)
    }
}

/// An unsupervised model that learns "normal" rows and labels new ones
pub trait OutlierModel {
    /// Fit on every row of `data`, replacing any previous fit
    fn fit(&mut self, data: &FeatureMatrix) -> Result<()>;

    /// Label each row of `data`; errors if the model has not been fitted
    fn score(&self, data: &FeatureMatrix) -> Result<Vec<AnomalyLabel>>;

    /// Columns the model was fitted on, if fitted
    fn columns(&self) -> Option<&[String]>;
}

/// Isolation forest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Rows drawn (without replacement) per tree, capped at the row count
    pub max_samples: usize,
    /// Expected fraction of anomalous rows, in (0, 0.5]
    pub contamination: f64,
    /// Seed for subsampling and split selection
    pub seed: u64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
        }
    }
}

impl OutlierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Config("n_estimators must be at least 1".into()));
        }
        if self.max_samples == 0 {
            return Err(Error::Config("max_samples must be at least 1".into()));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(Error::Config(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Observed range of `feature` among the rows that reached this node
        min: f64,
        max: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct Fitted {
    columns: Vec<String>,
    trees: Vec<Node>,
    sample_size: usize,
    threshold: f64,
}

/// Isolation-forest outlier model
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: OutlierConfig,
    fitted: Option<Fitted>,
}

impl IsolationForest {
    pub fn new(config: OutlierConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Score threshold above which a row is anomalous
    pub fn threshold(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.threshold)
    }

    /// Raw anomaly scores in (0, 1]; higher means more isolated
    pub fn anomaly_scores(&self, data: &FeatureMatrix) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(Error::ModelNotTrained)?;
        check_columns(&fitted.columns, data.columns())?;
        Ok(scores_for(fitted, data.rows()))
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(OutlierConfig::default())
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, data: &FeatureMatrix) -> Result<()> {
        self.config.validate()?;
        if data.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }

        let rows = data.rows();
        let sample_size = self.config.max_samples.min(rows.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let trees: Vec<Node> = (0..self.config.n_estimators)
            .map(|_| {
                let indices = sample(&mut rng, rows.len(), sample_size).into_vec();
                grow(rows, indices, 0, height_limit, &mut rng)
            })
            .collect();

        let mut fitted = Fitted {
            columns: data.columns().to_vec(),
            trees,
            sample_size,
            threshold: 0.0,
        };

        let training_scores = scores_for(&fitted, rows);
        fitted.threshold = quantile(&training_scores, 1.0 - self.config.contamination);

        debug!(
            rows = rows.len(),
            trees = fitted.trees.len(),
            sample_size,
            threshold = fitted.threshold,
            "Fitted isolation forest"
        );

        self.fitted = Some(fitted);
        Ok(())
    }

    fn score(&self, data: &FeatureMatrix) -> Result<Vec<AnomalyLabel>> {
        let threshold = self.threshold().ok_or(Error::ModelNotTrained)?;
        let scores = self.anomaly_scores(data)?;
        Ok(scores
            .into_iter()
            .map(|s| {
                if s > threshold {
                    AnomalyLabel::Anomalous
                } else {
                    AnomalyLabel::Normal
                }
            })
            .collect())
    }

    fn columns(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }
}

fn check_columns(expected: &[String], actual: &[String]) -> Result<()> {
    if expected != actual {
        return Err(Error::ColumnMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

fn grow(
    rows: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Only features that still vary inside this node, over a representable
    // span, can split it
    let n_features = rows[indices[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..n_features)
        .filter_map(|f| {
            let (min, max) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &i| {
                (acc.0.min(rows[i][f]), acc.1.max(rows[i][f]))
            });
            (max > min && (max - min).is_finite()).then_some((f, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| rows[i][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        min,
        max,
        left: Box::new(grow(rows, left, depth + 1, height_limit, rng)),
        right: Box::new(grow(rows, right, depth + 1, height_limit, rng)),
    }
}

/// Expected path length of `point` through `node`, starting at `depth`
///
/// A value outside the node's observed range could have been cut off by a
/// threshold drawn between the range edge and the value itself; that chance
/// (distance past the edge over the widened span) counts as isolation at the
/// next level. In-range values follow the plain isolation path.
fn path_length(node: &Node, point: &[f64], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            min,
            max,
            left,
            right,
        } => {
            let value = point[*feature];
            let child = if value < *threshold { left } else { right };
            let rest = path_length(child, point, depth + 1.0);

            let escape = if value > *max {
                (value - max) / (value - min)
            } else if value < *min {
                (min - value) / (max - value)
            } else {
                0.0
            };

            escape * (depth + 1.0) + (1.0 - escape) * rest
        }
    }
}

fn scores_for(fitted: &Fitted, rows: &[Vec<f64>]) -> Vec<f64> {
    let normalizer = average_path_length(fitted.sample_size);
    let n_trees = fitted.trees.len() as f64;

    rows.iter()
        .map(|row| {
            let mean_depth = fitted
                .trees
                .iter()
                .map(|tree| path_length(tree, row, 0.0))
                .sum::<f64>()
                / n_trees;
            let normalized = if normalizer > 0.0 {
                mean_depth / normalizer
            } else {
                1.0
            };
            2f64.powf(-normalized)
        })
        .collect()
}

/// Average path length of an unsuccessful BST search over `n` items
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated quantile, `q` in [0, 1]
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
