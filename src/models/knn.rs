//! Brute-force k-nearest-neighbours classifier

use crate::models::classifier::Classifier;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Neighbour vote weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KnnWeights {
    /// Every neighbour counts once
    #[default]
    Uniform,
    /// Neighbours count by inverse distance
    Distance,
}

fn default_p() -> f64 {
    2.0
}

/// KNN model with its training set stored inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    /// Number of neighbours that vote
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: KnnWeights,
    /// Minkowski order (1 = manhattan, 2 = euclidean)
    #[serde(default = "default_p")]
    pub p: f64,
    /// Known labels; vote ties go to the earliest entry
    #[serde(default)]
    pub classes: Vec<i64>,
    /// Training rows, already scaled
    pub fit_x: Vec<Vec<f64>>,
    /// Training labels
    pub fit_y: Vec<i64>,
}

impl KnnClassifier {
    /// Parse and validate a JSON model
    pub fn from_json(json: &str) -> Result<Self> {
        let mut model: KnnClassifier =
            serde_json::from_str(json).context("Failed to parse KNN model")?;
        model.validate()?;
        Ok(model)
    }

    /// Check internal consistency; fills `classes` from the labels when empty
    pub fn validate(&mut self) -> Result<()> {
        if self.fit_x.is_empty() {
            bail!("KNN model has no training samples");
        }
        if self.fit_x.len() != self.fit_y.len() {
            bail!(
                "KNN model has {} samples but {} labels",
                self.fit_x.len(),
                self.fit_y.len()
            );
        }
        if self.n_neighbors == 0 || self.n_neighbors > self.fit_x.len() {
            bail!(
                "n_neighbors must be in 1..={}, got {}",
                self.fit_x.len(),
                self.n_neighbors
            );
        }
        if !(self.p >= 1.0) || !self.p.is_finite() {
            bail!("Minkowski order p must be a finite value >= 1, got {}", self.p);
        }

        let width = self.fit_x[0].len();
        if let Some(i) = self.fit_x.iter().position(|row| row.len() != width) {
            bail!(
                "training row {} has {} features, expected {}",
                i,
                self.fit_x[i].len(),
                width
            );
        }

        if self.classes.is_empty() {
            let mut classes = self.fit_y.clone();
            classes.sort_unstable();
            classes.dedup();
            self.classes = classes;
        } else if let Some(label) = self.fit_y.iter().find(|y| !self.classes.contains(*y)) {
            bail!("training label {} is not a declared class", label);
        }

        Ok(())
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        if self.p == 1.0 {
            diffs.sum()
        } else if self.p == 2.0 {
            diffs.map(|d| d * d).sum::<f64>().sqrt()
        } else {
            diffs.map(|d| d.powf(self.p)).sum::<f64>().powf(1.0 / self.p)
        }
    }

    /// `(distance, training index)` of the k nearest rows, nearest first
    fn neighbors(&self, row: &[f64]) -> Vec<(f64, usize)> {
        let mut distances: Vec<(f64, usize)> = self
            .fit_x
            .iter()
            .enumerate()
            .map(|(i, sample)| (self.distance(row, sample), i))
            .collect();

        // stable: equal distances keep training order
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));
        distances.truncate(self.n_neighbors);
        distances
    }

    /// Weighted vote per entry of `classes`
    fn votes(&self, neighbors: &[(f64, usize)]) -> Result<Vec<f64>> {
        let exact_match = neighbors.iter().any(|(d, _)| *d == 0.0);
        let mut votes = vec![0.0; self.classes.len()];

        for &(d, i) in neighbors {
            let weight = match self.weights {
                KnnWeights::Uniform => 1.0,
                KnnWeights::Distance if exact_match => {
                    if d == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
                KnnWeights::Distance => 1.0 / d,
            };

            let label = self.fit_y[i];
            let slot = self
                .classes
                .iter()
                .position(|&c| c == label)
                .with_context(|| format!("label {} missing from classes", label))?;
            votes[slot] += weight;
        }

        Ok(votes)
    }
}

impl Classifier for KnnClassifier {
    fn name(&self) -> &str {
        "knn"
    }

    fn n_features(&self) -> Option<usize> {
        self.fit_x.first().map(Vec::len)
    }

    fn predict(&self, row: &[f64]) -> Result<i64> {
        if let Some(width) = self.n_features() {
            if row.len() != width {
                bail!("KNN model expects {} features, got {}", width, row.len());
            }
        }
        if let Some(i) = row.iter().position(|x| !x.is_finite()) {
            bail!("input contains NaN or infinity at feature {}", i);
        }

        let neighbors = self.neighbors(row);
        let votes = self.votes(&neighbors)?;

        let mut best = 0;
        for (slot, &vote) in votes.iter().enumerate() {
            if vote > votes[best] {
                best = slot;
            }
        }

        debug!(
            k = self.n_neighbors,
            nearest = neighbors.first().map(|n| n.0),
            votes = ?votes,
            "KNN vote complete"
        );

        Ok(self.classes[best])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(k: usize, weights: KnnWeights) -> KnnClassifier {
        let mut model = KnnClassifier {
            n_neighbors: k,
            weights,
            p: 2.0,
            classes: Vec::new(),
            fit_x: vec![
                vec![0.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![5.0, 5.0],
                vec![5.0, 6.0],
            ],
            fit_y: vec![0, 0, 0, 1, 1],
        };
        model.validate().unwrap();
        model
    }

    #[test]
    fn test_classes_derived_from_labels() {
        let model = model(3, KnnWeights::Uniform);
        assert_eq!(model.classes, vec![0, 1]);
        assert_eq!(model.n_features(), Some(2));
    }

    #[test]
    fn test_majority_vote() {
        let model = model(3, KnnWeights::Uniform);
        assert_eq!(model.predict(&[0.2, 0.2]).unwrap(), 0);
        assert_eq!(model.predict(&[4.8, 5.5]).unwrap(), 1);
    }

    #[test]
    fn test_uniform_tie_goes_to_first_class() {
        let model = model(4, KnnWeights::Uniform);
        // nearest four split two and two
        assert_eq!(model.predict(&[3.0, 3.0]).unwrap(), 0);
    }

    #[test]
    fn test_distance_weights() {
        // k = 5 uniform would be 3 vs 2 for class 0
        let uniform = model(5, KnnWeights::Uniform);
        let weighted = model(5, KnnWeights::Distance);
        assert_eq!(uniform.predict(&[5.0, 5.4]).unwrap(), 0);
        assert_eq!(weighted.predict(&[5.0, 5.4]).unwrap(), 1);
    }

    #[test]
    fn test_exact_match_wins_distance_vote() {
        let model = model(5, KnnWeights::Distance);
        assert_eq!(model.predict(&[5.0, 6.0]).unwrap(), 1);
    }

    #[test]
    fn test_manhattan_distance() {
        let mut model = model(1, KnnWeights::Uniform);
        model.p = 1.0;
        assert_eq!(model.distance(&[0.0, 0.0], &[3.0, 4.0]), 7.0);
        model.p = 2.0;
        assert_eq!(model.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        model.p = 3.0;
        let d = model.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 91.0_f64.powf(1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_width_mismatch() {
        let model = model(3, KnnWeights::Uniform);
        assert!(model.predict(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let model = model(3, KnnWeights::Uniform);
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = model.predict(&[0.0, bad]).unwrap_err();
            assert!(err.to_string().contains("NaN or infinity at feature 1"));
        }
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "n_neighbors": 1,
            "weights": "distance",
            "classes": [0, 1],
            "fit_x": [[0.0], [1.0]],
            "fit_y": [0, 1]
        }"#;
        let model = KnnClassifier::from_json(json).unwrap();
        assert_eq!(model.p, 2.0);
        assert_eq!(model.weights, KnnWeights::Distance);
        assert_eq!(model.predict(&[0.9]).unwrap(), 1);
    }

    #[test]
    fn test_invalid_models() {
        let too_many_neighbors = r#"{"n_neighbors": 3, "fit_x": [[0.0]], "fit_y": [0]}"#;
        assert!(KnnClassifier::from_json(too_many_neighbors).is_err());

        let ragged = r#"{"n_neighbors": 1, "fit_x": [[0.0], [1.0, 2.0]], "fit_y": [0, 1]}"#;
        assert!(KnnClassifier::from_json(ragged).is_err());

        let label_count = r#"{"n_neighbors": 1, "fit_x": [[0.0]], "fit_y": [0, 1]}"#;
        assert!(KnnClassifier::from_json(label_count).is_err());

        let undeclared = r#"{"n_neighbors": 1, "classes": [0], "fit_x": [[0.0]], "fit_y": [1]}"#;
        assert!(KnnClassifier::from_json(undeclared).is_err());

        assert!(KnnClassifier::from_json("not json").is_err());
    }
}
