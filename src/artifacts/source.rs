// ArtifactSource - raw access to persisted artifacts

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::config::ArtifactConfig;
use crate::error::ArtifactError;
use crate::models::ModelId;

/// The five artifacts a prediction needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    RandomForest,
    Svm,
    Knn,
    Scaler,
    LabelEncoder,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::RandomForest,
        ArtifactKind::Svm,
        ArtifactKind::Knn,
        ArtifactKind::Scaler,
        ArtifactKind::LabelEncoder,
    ];

    /// Name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::RandomForest => "random_forest_model",
            ArtifactKind::Svm => "svm_model",
            ArtifactKind::Knn => "knn_model",
            ArtifactKind::Scaler => "scaler",
            ArtifactKind::LabelEncoder => "label_encoder",
        }
    }

    pub fn for_model(id: ModelId) -> Self {
        match id {
            ModelId::RandomForest => ArtifactKind::RandomForest,
            ModelId::Svm => ArtifactKind::Svm,
            ModelId::Knn => ArtifactKind::Knn,
        }
    }

    pub fn file_name<'a>(&self, config: &'a ArtifactConfig) -> &'a str {
        match self {
            ArtifactKind::RandomForest => &config.random_forest_file,
            ArtifactKind::Svm => &config.svm_file,
            ArtifactKind::Knn => &config.knn_file,
            ArtifactKind::Scaler => &config.scaler_file,
            ArtifactKind::LabelEncoder => &config.label_encoder_file,
        }
    }
}

/// Reads the serialized form of one artifact
///
/// Implementations are called at most once per artifact by ArtifactStore.
pub trait ArtifactSource: Send + Sync {
    fn read(&self, kind: ArtifactKind) -> Result<String, ArtifactError>;
}

/// Artifacts stored as JSON files under one directory
#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    config: ArtifactConfig,
}

impl FsArtifactSource {
    pub fn new(config: ArtifactConfig) -> Self {
        Self { config }
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.config.dir.join(kind.file_name(&self.config))
    }

    /// Serialize `value` as pretty JSON into the artifact's file
    pub fn write<T: Serialize>(&self, kind: ArtifactKind, value: &T) -> Result<PathBuf, ArtifactError> {
        let path = self.path(kind);
        let persist_failed = |reason: String| ArtifactError::PersistFailed {
            artifact: kind.name().to_string(),
            reason,
        };

        let json = serde_json::to_string_pretty(value).map_err(|e| persist_failed(e.to_string()))?;
        fs::create_dir_all(&self.config.dir)
            .map_err(|e| persist_failed(format!("{}: {}", self.config.dir.display(), e)))?;
        fs::write(&path, json).map_err(|e| persist_failed(format!("{}: {}", path.display(), e)))?;

        log::info!("[ArtifactStore] Wrote {} to {:?}", kind.name(), path);
        Ok(path)
    }
}

impl ArtifactSource for FsArtifactSource {
    fn read(&self, kind: ArtifactKind) -> Result<String, ArtifactError> {
        let path = self.path(kind);
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ArtifactError::Missing {
                artifact: kind.name().to_string(),
                path: path.display().to_string(),
            },
            _ => ArtifactError::Corrupt {
                artifact: kind.name().to_string(),
                reason: format!("{}: {}", path.display(), err),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsArtifactSource::new(ArtifactConfig::default().with_dir(dir.path()));

        match source.read(ArtifactKind::Svm) {
            Err(ArtifactError::Missing { artifact, path }) => {
                assert_eq!(artifact, "svm_model");
                assert!(path.ends_with("svm_model.json"));
            }
            other => panic!("expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            FsArtifactSource::new(ArtifactConfig::default().with_dir(dir.path().join("nested")));

        let path = source
            .write(ArtifactKind::LabelEncoder, &vec!["Female", "Male"])
            .unwrap();
        assert!(path.exists());

        let text = source.read(ArtifactKind::LabelEncoder).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec!["Female", "Male"]);
    }

    #[test]
    fn test_model_kinds_match_model_ids() {
        let kinds: Vec<ArtifactKind> = ModelId::ALL.into_iter().map(ArtifactKind::for_model).collect();
        assert_eq!(kinds, ArtifactKind::ALL[..3].to_vec());
    }
}
