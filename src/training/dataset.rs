// Dataset - labeled feature matrix built from category folders
//
// Layout: <root>/<category>/*.wav, one folder per configured category.
// Files are visited in name order so the matrix is reproducible. A file
// that fails extraction is skipped with a warning; a category left with no
// samples is an error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::features::FeatureExtractor;
use crate::error::TrainingError;

/// Extracted features with their category names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureDataset {
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<String>,
    /// Files that could not be turned into a feature vector
    pub skipped: Vec<PathBuf>,
}

impl FeatureDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, category: &str) -> usize {
        self.labels.iter().filter(|l| *l == category).count()
    }
}

/// WAV files of one category folder, sorted by path
pub fn list_category(root: &Path, category: &str) -> Result<Vec<PathBuf>, TrainingError> {
    let folder = root.join(category);
    let entries = fs::read_dir(&folder).map_err(|_| TrainingError::DatasetMissing {
        path: folder.display().to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Extract every category folder under `root`
pub fn load_dataset(
    extractor: &FeatureExtractor,
    root: &Path,
    categories: &[String],
) -> Result<FeatureDataset, TrainingError> {
    if !root.is_dir() {
        return Err(TrainingError::DatasetMissing {
            path: root.display().to_string(),
        });
    }

    let mut dataset = FeatureDataset::default();
    for category in categories {
        tracing::info!("[Trainer] Processing category: {}", category);
        let files = list_category(root, category)?;

        let mut extracted = 0;
        for path in files {
            tracing::debug!("[Trainer] Processing file: {:?}", path);
            match extractor.extract(&path) {
                Ok(features) => {
                    dataset.rows.push(features.into_vec());
                    dataset.labels.push(category.clone());
                    extracted += 1;
                }
                Err(err) => {
                    tracing::warn!("[Trainer] Skipping {:?}: {}", path, err);
                    dataset.skipped.push(path);
                }
            }
        }

        if extracted == 0 {
            return Err(TrainingError::EmptyCategory {
                category: category.clone(),
            });
        }
    }

    tracing::info!(
        "[Trainer] Feature extraction complete. Total samples: {}",
        dataset.len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::FEATURE_LEN;
    use crate::fixtures::write_voice_dataset;

    fn categories() -> Vec<String> {
        vec!["Male".to_string(), "Female".to_string()]
    }

    #[test]
    fn test_load_dataset_reads_every_category() {
        let dir = tempfile::tempdir().unwrap();
        write_voice_dataset(dir.path(), &["Male", "Female"], 2).unwrap();
        fs::write(dir.path().join("Male/notes.txt"), "ignored").unwrap();

        let dataset = load_dataset(&FeatureExtractor::default(), dir.path(), &categories()).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.count("Male"), 2);
        assert_eq!(dataset.count("Female"), 2);
        assert!(dataset.rows.iter().all(|r| r.len() == FEATURE_LEN));
        // Category order first, then file name order
        assert_eq!(dataset.labels, vec!["Male", "Male", "Female", "Female"]);
    }

    #[test]
    fn test_undecodable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_voice_dataset(dir.path(), &["Male", "Female"], 1).unwrap();
        let broken = dir.path().join("Female/broken.wav");
        fs::write(&broken, b"not a wav file").unwrap();

        let dataset = load_dataset(&FeatureExtractor::default(), dir.path(), &categories()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.skipped, vec![broken]);
    }

    #[test]
    fn test_missing_category_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_voice_dataset(dir.path(), &["Male"], 1).unwrap();

        let result = load_dataset(&FeatureExtractor::default(), dir.path(), &categories());
        assert!(matches!(result, Err(TrainingError::DatasetMissing { path }) if path.ends_with("Female")));
    }

    #[test]
    fn test_empty_category_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_voice_dataset(dir.path(), &["Male"], 1).unwrap();
        fs::create_dir_all(dir.path().join("Female")).unwrap();

        let result = load_dataset(&FeatureExtractor::default(), dir.path(), &categories());
        assert_eq!(
            result,
            Err(TrainingError::EmptyCategory {
                category: "Female".to_string()
            })
        );
    }
}
