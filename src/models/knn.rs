// Knn - k-nearest-neighbour classifier
//
// Keeps the full scaled training matrix. Votes are uniform; the probability
// of a class is its share of the k votes. Equal distances are resolved by
// training order, so predictions are deterministic.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, TrainingError};
use crate::models::{check_width, squared_distance, ClassifierModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Knn {
    k: usize,
    n_classes: usize,
    points: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl Knn {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        k: usize,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainingError::InsufficientSamples {
                required: 1,
                collected: rows.len().min(labels.len()),
            });
        }
        if k == 0 {
            return Err(TrainingError::InvalidConfig {
                reason: "knn_k must be at least 1".to_string(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(TrainingError::InvalidConfig {
                reason: format!("label {} out of range for {} classes", bad, n_classes),
            });
        }

        Ok(Self {
            k: k.min(rows.len()),
            n_classes,
            points: rows.to_vec(),
            labels: labels.to_vec(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn vote(&self, row: &[f64]) -> Vec<f64> {
        let mut distances: Vec<(f64, usize)> = self
            .points
            .iter()
            .zip(&self.labels)
            .map(|(p, &label)| (squared_distance(p, row), label))
            .collect();
        // Stable sort keeps training order among equal distances
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes = vec![0.0; self.n_classes];
        for &(_, label) in distances.iter().take(self.k) {
            votes[label] += 1.0;
        }
        let k = self.k as f64;
        votes.iter().map(|v| v / k).collect()
    }
}

impl ClassifierModel for Knn {
    fn n_features(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.points.len() != self.labels.len() {
            return Err(incompatible(format!(
                "{} points but {} labels",
                self.points.len(),
                self.labels.len()
            )));
        }
        if self.k == 0 || self.k > self.points.len() {
            return Err(incompatible(format!(
                "k must be between 1 and {}, got {}",
                self.points.len(),
                self.k
            )));
        }
        if let Some(&bad) = self.labels.iter().find(|&&l| l >= self.n_classes) {
            return Err(incompatible(format!(
                "label {} out of range for {} classes",
                bad, self.n_classes
            )));
        }
        let width = self.n_features();
        if self.points.iter().any(|p| p.len() != width) {
            return Err(incompatible("points differ in width".to_string()));
        }
        Ok(())
    }

    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        check_width("KNN", self.n_features(), batch)?;
        self.validate()?;
        Ok(batch.iter().map(|row| self.vote(row)).collect())
    }
}

fn incompatible(reason: String) -> ArtifactError {
    ArtifactError::Incompatible {
        artifact: "knn_model".to_string(),
        reason,
    }
}
