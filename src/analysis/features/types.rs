// Types module - the fixed-length feature vector
//
// Layout, in strict order:
//   [0..13)   mean of each MFCC coefficient over frames
//   [13..26)  standard deviation of each MFCC coefficient over frames
//   [26..28)  mean, standard deviation of the full pitch map
//   [28..30)  mean, standard deviation of the spectral centroid series

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Cepstral coefficients per frame
pub const MFCC_COUNT: usize = 13;

/// Length of every [`FeatureVector`]
pub const FEATURE_LEN: usize = 2 * MFCC_COUNT + 4;

/// Acoustic summary of one recording
///
/// Construction validates the length, so a vector that exists always has
/// exactly [`FEATURE_LEN`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn from_vec(values: Vec<f64>) -> Result<Self, ExtractionError> {
        if values.len() != FEATURE_LEN {
            return Err(ExtractionError::InvalidFeatureLength {
                expected: FEATURE_LEN,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    pub fn mfcc_mean(&self) -> &[f64] {
        &self.values[..MFCC_COUNT]
    }

    pub fn mfcc_std(&self) -> &[f64] {
        &self.values[MFCC_COUNT..2 * MFCC_COUNT]
    }

    /// `(mean, std)` of the pitch map
    pub fn pitch(&self) -> (f64, f64) {
        (self.values[2 * MFCC_COUNT], self.values[2 * MFCC_COUNT + 1])
    }

    /// `(mean, std)` of the spectral centroid
    pub fn centroid(&self) -> (f64, f64) {
        (self.values[2 * MFCC_COUNT + 2], self.values[2 * MFCC_COUNT + 3])
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = ExtractionError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_vec(values)
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(vector: FeatureVector) -> Self {
        vector.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = FeatureVector::from_vec(vec![0.0; 32]).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::InvalidFeatureLength {
                expected: FEATURE_LEN,
                actual: 32
            }
        );
    }

    #[test]
    fn test_block_accessors() {
        let values: Vec<f64> = (0..FEATURE_LEN).map(|i| i as f64).collect();
        let vector = FeatureVector::from_vec(values).unwrap();
        assert_eq!(vector.mfcc_mean()[0], 0.0);
        assert_eq!(vector.mfcc_std()[0], 13.0);
        assert_eq!(vector.pitch(), (26.0, 27.0));
        assert_eq!(vector.centroid(), (28.0, 29.0));
    }

    #[test]
    fn test_deserialize_validates_length() {
        assert!(serde_json::from_str::<FeatureVector>("[1.0, 2.0]").is_err());
        let json = serde_json::to_string(&vec![0.5; FEATURE_LEN]).unwrap();
        let vector: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(vector.as_slice().len(), FEATURE_LEN);
    }
}
