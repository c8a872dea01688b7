// ArtifactStore - load-once cache of the validated artifact set
//
// The first call to load() reads every artifact from the source, validates
// that they fit together and caches the outcome for the lifetime of the
// store. Concurrent first callers block on the same initialization; later
// callers get the cached Arc (or the cached error) without touching storage.

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::analysis::features::FEATURE_LEN;
use crate::config::ArtifactConfig;
use crate::error::{log_artifact_error, ArtifactError};
use crate::models::{LabelEncoder, ModelId, NamedModel, StandardScaler, StoredModel};

use super::source::{ArtifactKind, ArtifactSource, FsArtifactSource};

/// Number of categories every artifact set distinguishes
const CLASS_COUNT: usize = 2;

/// Scaler, encoder and the three classifiers, checked for compatibility
#[derive(Debug)]
pub struct ArtifactSet {
    scaler: StandardScaler,
    encoder: LabelEncoder,
    models: Vec<NamedModel>,
}

impl ArtifactSet {
    /// Assemble a set, rejecting artifacts that disagree on shape
    ///
    /// `models` must hold exactly one model per `ModelId`, in `ModelId::ALL`
    /// order.
    pub fn new(
        scaler: StandardScaler,
        encoder: LabelEncoder,
        models: Vec<NamedModel>,
    ) -> Result<Self, ArtifactError> {
        scaler.validate()?;

        if encoder.len() != CLASS_COUNT {
            return Err(ArtifactError::Incompatible {
                artifact: ArtifactKind::LabelEncoder.name().to_string(),
                reason: format!("expected {} classes, found {}", CLASS_COUNT, encoder.len()),
            });
        }
        if scaler.n_features() != FEATURE_LEN {
            return Err(ArtifactError::Incompatible {
                artifact: ArtifactKind::Scaler.name().to_string(),
                reason: format!(
                    "fitted on {} features, extractor produces {}",
                    scaler.n_features(),
                    FEATURE_LEN
                ),
            });
        }

        let ids: Vec<ModelId> = models.iter().map(|m| m.id).collect();
        if ids != ModelId::ALL {
            return Err(ArtifactError::Incompatible {
                artifact: "models".to_string(),
                reason: format!("expected models {:?}, found {:?}", ModelId::ALL, ids),
            });
        }

        for named in &models {
            named.model.validate()?;
            let artifact = ArtifactKind::for_model(named.id).name().to_string();
            if named.model.n_features() != scaler.n_features() {
                return Err(ArtifactError::Incompatible {
                    artifact,
                    reason: format!(
                        "model expects {} features, scaler produces {}",
                        named.model.n_features(),
                        scaler.n_features()
                    ),
                });
            }
            if named.model.n_classes() != encoder.len() {
                return Err(ArtifactError::Incompatible {
                    artifact,
                    reason: format!(
                        "model has {} classes, encoder has {}",
                        named.model.n_classes(),
                        encoder.len()
                    ),
                });
            }
        }

        Ok(Self {
            scaler,
            encoder,
            models,
        })
    }

    /// Read and validate every artifact from `source`
    pub fn from_source(source: &dyn ArtifactSource) -> Result<Self, ArtifactError> {
        let scaler: StandardScaler = parse(source, ArtifactKind::Scaler)?;
        let encoder: LabelEncoder = parse(source, ArtifactKind::LabelEncoder)?;
        // Re-check the bijection, which deserialization does not enforce
        let encoder = LabelEncoder::from_classes(encoder.classes().to_vec())?;

        let mut models = Vec::with_capacity(ModelId::ALL.len());
        for id in ModelId::ALL {
            let kind = ArtifactKind::for_model(id);
            let stored: StoredModel = parse(source, kind)?;
            if stored.id() != id {
                return Err(ArtifactError::Incompatible {
                    artifact: kind.name().to_string(),
                    reason: format!("file holds a {} model", stored.id()),
                });
            }
            models.push(stored.into_named());
        }

        Self::new(scaler, encoder, models)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    /// Classifiers in `ModelId::ALL` order
    pub fn models(&self) -> &[NamedModel] {
        &self.models
    }
}

fn parse<T: DeserializeOwned>(source: &dyn ArtifactSource, kind: ArtifactKind) -> Result<T, ArtifactError> {
    let text = source.read(kind)?;
    serde_json::from_str(&text).map_err(|e| ArtifactError::Corrupt {
        artifact: kind.name().to_string(),
        reason: e.to_string(),
    })
}

/// Single-flight owner of the process-wide artifact set
pub struct ArtifactStore {
    source: Box<dyn ArtifactSource>,
    cell: OnceCell<Result<Arc<ArtifactSet>, ArtifactError>>,
}

impl ArtifactStore {
    pub fn new(source: Box<dyn ArtifactSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Store reading JSON artifacts from `config.dir`
    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(Box::new(FsArtifactSource::new(config.clone())))
    }

    /// Load on first use, then return the cached outcome
    ///
    /// Failures are cached too: a store that failed once keeps failing with
    /// the same error.
    pub fn load(&self) -> Result<Arc<ArtifactSet>, ArtifactError> {
        self.cell
            .get_or_init(|| {
                let result = ArtifactSet::from_source(self.source.as_ref()).map(Arc::new);
                match &result {
                    Ok(_) => tracing::info!("[ArtifactStore] Artifacts loaded"),
                    Err(err) => log_artifact_error(err, "ArtifactStore::load"),
                }
                result
            })
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
