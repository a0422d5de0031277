//! K-means clustering
//!
//! Lloyd iterations with k-means++ seeding. Several seeded restarts run and
//! the one with the lowest inertia (sum of squared distances to the assigned
//! center) wins.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// K-means parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,
    /// Seed for k-means++ initialization
    pub seed: u64,
    /// Independent restarts; the lowest-inertia run is kept
    pub n_init: usize,
    /// Maximum Lloyd iterations per restart
    pub max_iter: usize,
    /// Stop once no center moves more than this (squared distance)
    pub tol: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
        }
    }
}

impl KMeansConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Config("cluster count k must be at least 1".into()));
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(Error::Config(
                "n_init and max_iter must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A fitted clustering
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    centers: Vec<Vec<f64>>,
    inertia: f64,
}

impl KMeans {
    /// Cluster `points` into `config.k` groups
    ///
    /// Requires at least `k` points, all of the same width.
    pub fn fit(points: &[Vec<f64>], config: &KMeansConfig) -> Result<Self> {
        config.validate()?;
        if points.len() < config.k {
            return Err(Error::InvalidData(format!(
                "Need at least {} points to form {} clusters, got {}",
                config.k,
                config.k,
                points.len()
            )));
        }
        let width = points[0].len();
        if points.iter().any(|p| p.len() != width) {
            return Err(Error::InvalidData("Points have differing widths".into()));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut best: Option<KMeans> = None;

        for run in 0..config.n_init {
            let initial = plus_plus_init(points, config.k, &mut rng);
            let fitted = lloyd(points, initial, config);
            debug!(run, inertia = fitted.inertia, "k-means restart finished");

            if best.as_ref().map_or(true, |b| fitted.inertia < b.inertia) {
                best = Some(fitted);
            }
        }

        best.ok_or_else(|| Error::InvalidData("k-means produced no runs".into()))
    }

    pub fn centers(&self) -> &[Vec<f64>] {
        &self.centers
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Index of the nearest center (lowest index on ties)
    pub fn predict(&self, point: &[f64]) -> usize {
        nearest(&self.centers, point).0
    }

    pub fn center(&self, cluster: usize) -> Option<&[f64]> {
        self.centers.get(cluster).map(Vec::as_slice)
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(centers: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
    centers
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(c, point)))
        .fold((0, f64::INFINITY), |best, (i, d)| {
            if d < best.1 {
                (i, d)
            } else {
                best
            }
        })
}

/// k-means++: each new center drawn with probability proportional to the
/// squared distance from the nearest center chosen so far
fn plus_plus_init(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centers = vec![points[rng.gen_range(0..points.len())].clone()];

    while centers.len() < k {
        let distances: Vec<f64> = points.iter().map(|p| nearest(&centers, p).1).collect();

        // All-zero weights (every point on a center) fall back to a uniform pick
        let chosen = match WeightedIndex::new(sampling_weights(&distances)) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..points.len()),
        };

        centers.push(points[chosen].clone());
    }

    centers
}

/// Squared distances rescaled so their total stays finite
///
/// When distances overflow, the infinitely distant points share the draw.
fn sampling_weights(distances: &[f64]) -> Vec<f64> {
    let total: f64 = distances.iter().sum();
    if total.is_finite() {
        return distances.to_vec();
    }
    let max = distances.iter().copied().fold(0.0, f64::max);
    if max.is_finite() {
        distances.iter().map(|d| d / max).collect()
    } else {
        distances
            .iter()
            .map(|d| if d.is_infinite() { 1.0 } else { 0.0 })
            .collect()
    }
}

fn lloyd(points: &[Vec<f64>], mut centers: Vec<Vec<f64>>, config: &KMeansConfig) -> KMeans {
    let width = points[0].len();

    for _ in 0..config.max_iter {
        let mut sums = vec![vec![0.0; width]; centers.len()];
        let mut counts = vec![0usize; centers.len()];

        for point in points {
            let (cluster, _) = nearest(&centers, point);
            counts[cluster] += 1;
            for (s, v) in sums[cluster].iter_mut().zip(point) {
                *s += v;
            }
        }

        let mut shift = 0.0f64;
        for (i, center) in centers.iter_mut().enumerate() {
            // An empty cluster keeps its previous center
            if counts[i] == 0 {
                continue;
            }
            let updated: Vec<f64> = sums[i].iter().map(|s| s / counts[i] as f64).collect();
            shift = shift.max(squared_distance(center, &updated));
            *center = updated;
        }

        if shift <= config.tol {
            break;
        }
    }

    let inertia = points.iter().map(|p| nearest(&centers, p).1).sum();
    KMeans { centers, inertia }
}
