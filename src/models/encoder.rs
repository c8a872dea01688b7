// LabelEncoder - bijection between category names and class codes
//
// Classes are sorted lexicographically at fit time, so code i always means
// `classes[i]` and probability vectors can be zipped with `classes()`.

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit over the distinct labels in `labels`
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Use `classes` verbatim as the code order
    pub fn from_classes(classes: Vec<String>) -> Result<Self, ArtifactError> {
        let mut seen = classes.clone();
        seen.sort();
        seen.dedup();
        if seen.len() != classes.len() {
            return Err(ArtifactError::Incompatible {
                artifact: "label_encoder".to_string(),
                reason: "duplicate class names".to_string(),
            });
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: &str) -> Result<usize, ArtifactError> {
        self.classes
            .iter()
            .position(|c| c == label)
            .ok_or_else(|| ArtifactError::Incompatible {
                artifact: "label_encoder".to_string(),
                reason: format!("unknown label {}", label),
            })
    }

    pub fn inverse_transform(&self, code: usize) -> Result<&str, ArtifactError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| ArtifactError::Incompatible {
                artifact: "label_encoder".to_string(),
                reason: format!("class code {} out of range 0..{}", code, self.classes.len()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_classes() {
        let encoder = LabelEncoder::fit(&["Male", "Female", "Male"]);
        assert_eq!(encoder.classes(), ["Female", "Male"]);
        assert_eq!(encoder.transform("Female").unwrap(), 0);
        assert_eq!(encoder.transform("Male").unwrap(), 1);
        assert_eq!(encoder.inverse_transform(1).unwrap(), "Male");
    }

    #[test]
    fn test_unknown_values_are_errors() {
        let encoder = LabelEncoder::fit(&["Male", "Female"]);
        assert!(encoder.transform("Other").is_err());
        assert!(encoder.inverse_transform(2).is_err());
    }

    #[test]
    fn test_from_classes_keeps_order() {
        let encoder =
            LabelEncoder::from_classes(vec!["Male".to_string(), "Female".to_string()]).unwrap();
        assert_eq!(encoder.inverse_transform(0).unwrap(), "Male");
        assert!(LabelEncoder::from_classes(vec!["A".to_string(), "A".to_string()]).is_err());
    }
}
