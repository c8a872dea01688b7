// StandardScaler - per-feature standardisation
//
// Learned offline from the class-balanced training matrix. Features with zero
// variance keep a scale of 1 so transformed values stay finite.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, TrainingError};
use crate::models::check_width;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation per column
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, TrainingError> {
        let first = rows.first().ok_or(TrainingError::InsufficientSamples {
            required: 1,
            collected: 0,
        })?;
        let width = first.len();
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(TrainingError::InvalidConfig {
                reason: format!("ragged feature matrix ({} vs {} columns)", width, row.len()),
            });
        }

        let n = rows.len() as f64;
        let mean: Vec<f64> = (0..width)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let scale = (0..width)
            .map(|j| {
                let variance = rows
                    .iter()
                    .map(|r| (r[j] - mean[j]) * (r[j] - mean[j]))
                    .sum::<f64>()
                    / n;
                let std = variance.sqrt();
                if std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Build a scaler from explicit parameters
    pub fn from_parts(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check invariants that deserialisation alone cannot enforce
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.mean.len() != self.scale.len() {
            return Err(ArtifactError::Incompatible {
                artifact: "scaler".to_string(),
                reason: format!("{} means but {} scales", self.mean.len(), self.scale.len()),
            });
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ArtifactError::Incompatible {
                artifact: "scaler".to_string(),
                reason: "scale values must be finite and non-zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardise every row of `batch`
    pub fn transform(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        check_width("scaler", self.n_features(), batch)?;
        Ok(batch.iter().map(|row| self.transform_row(row)).collect())
    }

    fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_standardises() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows).unwrap();

        assert_eq!(scaled[0], vec![-1.0, 0.0]);
        assert_eq!(scaled[1], vec![1.0, 0.0]);
    }

    #[test]
    fn test_width_mismatch_is_shape_error() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0, 3.0]]).unwrap();
        let err = scaler.transform(&[vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ArtifactError::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_fit_requires_rows() {
        assert!(StandardScaler::fit(&[]).is_err());
    }

    #[test]
    fn test_from_parts_rejects_zero_scale() {
        assert!(StandardScaler::from_parts(vec![0.0], vec![0.0]).is_err());
        assert!(StandardScaler::from_parts(vec![0.0, 1.0], vec![1.0]).is_err());
    }
}
