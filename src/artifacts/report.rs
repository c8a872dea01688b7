// AccuracyReport - recorded test accuracy per model
//
// Written by the trainer next to the model artifacts as a flat JSON object,
// e.g. {"Random Forest": 0.91, "SVM": 0.88, "KNN": 0.86}. Display only: a
// missing or unreadable report never blocks predictions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ArtifactError, ReportError};
use crate::models::ModelId;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccuracyReport {
    scores: BTreeMap<String, f64>,
}

impl AccuracyReport {
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (ModelId, f64)>,
    {
        Self {
            scores: scores
                .into_iter()
                .map(|(id, score)| (id.name().to_string(), score))
                .collect(),
        }
    }

    /// Read and validate a report file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ReportError::Missing {
                path: display.clone(),
            },
            _ => ReportError::Corrupt {
                path: display.clone(),
                reason: err.to_string(),
            },
        })?;

        let report: Self = serde_json::from_str(&text).map_err(|err| ReportError::Corrupt {
            path: display.clone(),
            reason: err.to_string(),
        })?;

        if let Some((name, score)) = report
            .scores
            .iter()
            .find(|(_, score)| !(0.0..=1.0).contains(*score))
        {
            return Err(ReportError::Corrupt {
                path: display,
                reason: format!("score {} for {} is outside [0, 1]", score, name),
            });
        }

        Ok(report)
    }

    /// Like `load`, but degrades to an empty report
    ///
    /// The error is handed back so the caller can show its own notice.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> (Self, Option<ReportError>) {
        match Self::load(path) {
            Ok(report) => (report, None),
            Err(err) => {
                log::warn!("[AccuracyReport] {}. No accuracy data available.", err);
                (Self::default(), Some(err))
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let persist_failed = |reason: String| ArtifactError::PersistFailed {
            artifact: "model_accuracies".to_string(),
            reason,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| persist_failed(e.to_string()))?;
        fs::write(path, json).map_err(|e| persist_failed(format!("{}: {}", path.display(), e)))?;
        log::info!("[AccuracyReport] Wrote {:?}", path);
        Ok(())
    }

    pub fn get(&self, id: ModelId) -> Option<f64> {
        self.scores.get(id.name()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Known models in evaluation order, then any other keys alphabetically
    pub fn ordered(&self) -> Vec<(&str, f64)> {
        let known = ModelId::ALL
            .into_iter()
            .filter_map(|id| self.scores.get_key_value(id.name()));
        let unknown = self
            .scores
            .iter()
            .filter(|(name, _)| ModelId::from_name(name).is_none());

        known
            .chain(unknown)
            .map(|(name, score)| (name.as_str(), *score))
            .collect()
    }
}
