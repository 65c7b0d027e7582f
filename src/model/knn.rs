//! Nearest-neighbor yield regressor
//!
//! Frozen training set in the normalized feature space; prediction is the
//! uniform mean of the k closest training targets by Euclidean distance.

use std::cmp::Ordering;

use crate::features::FeatureVector;

/// Trained k-nearest-neighbor regressor
#[derive(Debug, Clone, PartialEq)]
pub struct KnnRegressor {
    k: usize,
    features: Vec<[f64; FeatureVector::DIM]>,
    /// Normalized yield per training row
    targets: Vec<f64>,
}

/// A training row selected for a prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
    pub target: f64,
}

impl KnnRegressor {
    pub fn new(k: usize, features: Vec<Vec<f64>>, targets: Vec<f64>) -> std::result::Result<Self, String> {
        if features.is_empty() {
            return Err("training set is empty".to_string());
        }
        if k == 0 || k > features.len() {
            return Err(format!(
                "n_neighbors must be in 1..={}, got {}",
                features.len(),
                k
            ));
        }
        if targets.len() != features.len() {
            return Err(format!(
                "{} training rows but {} targets",
                features.len(),
                targets.len()
            ));
        }

        let mut rows = Vec::with_capacity(features.len());
        for (i, row) in features.into_iter().enumerate() {
            let row: [f64; FeatureVector::DIM] = row.try_into().map_err(|r: Vec<f64>| {
                format!(
                    "training row {} has {} columns, expected {}",
                    i,
                    r.len(),
                    FeatureVector::DIM
                )
            })?;
            if row.iter().any(|x| !x.is_finite()) {
                return Err(format!("training row {} has a non-finite value", i));
            }
            rows.push(row);
        }
        if let Some(i) = targets.iter().position(|t| !t.is_finite()) {
            return Err(format!("target {} is not finite", i));
        }

        Ok(KnnRegressor {
            k,
            features: rows,
            targets,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn training_rows(&self) -> impl Iterator<Item = &[f64; FeatureVector::DIM]> {
        self.features.iter()
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// The k nearest training rows, closest first. Equal distances keep
    /// training-row order.
    pub fn neighbors(&self, x: &[f64; FeatureVector::DIM]) -> Vec<Neighbor> {
        let mut candidates: Vec<(f64, usize)> = self
            .features
            .iter()
            .enumerate()
            .map(|(i, row)| (squared_distance(row, x), i))
            .collect();

        let by_distance =
            |a: &(f64, usize), b: &(f64, usize)| -> Ordering { a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)) };

        if self.k < candidates.len() {
            candidates.select_nth_unstable_by(self.k - 1, by_distance);
            candidates.truncate(self.k);
        }
        candidates.sort_by(by_distance);

        candidates
            .into_iter()
            .map(|(d2, row)| Neighbor {
                row,
                distance: d2.sqrt(),
                target: self.targets[row],
            })
            .collect()
    }

    /// Predict normalized yield for an assembled vector
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let neighbors = self.neighbors(&features.to_array());
        log::debug!(
            "Nearest rows {:?}",
            neighbors.iter().map(|n| n.row).collect::<Vec<_>>()
        );
        neighbors.iter().map(|n| n.target).sum::<f64>() / neighbors.len() as f64
    }
}

fn squared_distance(a: &[f64; FeatureVector::DIM], b: &[f64; FeatureVector::DIM]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
