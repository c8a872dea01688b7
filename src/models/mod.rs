// Models module - fitted preprocessing and classifier artifacts
//
// Every artifact here is immutable once fitted or loaded. Classifiers are
// used through the ClassifierModel trait so the prediction path, tests and
// the artifact store never depend on a concrete algorithm.
//
// Class codes are the LabelEncoder's indices; probability vectors are always
// indexed by class code.

pub mod encoder;
pub mod forest;
pub mod knn;
pub mod scaler;
pub mod svm;

pub use encoder::LabelEncoder;
pub use forest::{DecisionTree, ForestParams, RandomForest};
pub use knn::Knn;
pub use scaler::StandardScaler;
pub use svm::{Svm, SvmParams};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ArtifactError;

/// Identifier of each classifier family, in the fixed evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "Random Forest")]
    RandomForest,
    #[serde(rename = "SVM")]
    Svm,
    #[serde(rename = "KNN")]
    Knn,
}

impl ModelId {
    /// Evaluation and display order
    pub const ALL: [ModelId; 3] = [ModelId::RandomForest, ModelId::Svm, ModelId::Knn];

    pub fn name(&self) -> &'static str {
        match self {
            ModelId::RandomForest => "Random Forest",
            ModelId::Svm => "SVM",
            ModelId::Knn => "KNN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A trained predictor over scaled feature batches
///
/// Implementations must be pure: no interior mutation during prediction,
/// so one instance can be shared by any number of callers.
pub trait ClassifierModel: Send + Sync {
    /// Feature width the model was fitted on
    fn n_features(&self) -> usize;

    /// Number of class codes the model distinguishes
    fn n_classes(&self) -> usize;

    /// Check internal consistency of a deserialized model
    fn validate(&self) -> Result<(), ArtifactError> {
        Ok(())
    }

    /// Probability distribution over class codes for each row
    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError>;

    /// Discrete class code for each row
    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<usize>, ArtifactError> {
        Ok(self
            .predict_proba(batch)?
            .iter()
            .map(|row| argmax(row))
            .collect())
    }
}

/// A classifier tagged with its identifier
pub struct NamedModel {
    pub id: ModelId,
    pub model: Box<dyn ClassifierModel>,
}

impl NamedModel {
    pub fn new(id: ModelId, model: Box<dyn ClassifierModel>) -> Self {
        Self { id, model }
    }
}

impl fmt::Debug for NamedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedModel")
            .field("id", &self.id)
            .field("n_features", &self.model.n_features())
            .field("n_classes", &self.model.n_classes())
            .finish()
    }
}

/// Persisted form of a classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredModel {
    RandomForest(RandomForest),
    Svm(Svm),
    Knn(Knn),
}

impl StoredModel {
    pub fn id(&self) -> ModelId {
        match self {
            StoredModel::RandomForest(_) => ModelId::RandomForest,
            StoredModel::Svm(_) => ModelId::Svm,
            StoredModel::Knn(_) => ModelId::Knn,
        }
    }

    pub fn into_named(self) -> NamedModel {
        let id = self.id();
        let model: Box<dyn ClassifierModel> = match self {
            StoredModel::RandomForest(model) => Box::new(model),
            StoredModel::Svm(model) => Box::new(model),
            StoredModel::Knn(model) => Box::new(model),
        };
        NamedModel::new(id, model)
    }
}

/// Index of the first maximum
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Fail with `ShapeMismatch` unless every row has `expected` columns
pub fn check_width(
    component: &str,
    expected: usize,
    batch: &[Vec<f64>],
) -> Result<(), ArtifactError> {
    match batch.iter().find(|row| row.len() != expected) {
        Some(row) => Err(ArtifactError::ShapeMismatch {
            component: component.to_string(),
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
