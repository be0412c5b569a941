//! Model artifact - the fitted pipeline plus its metadata record
//!
//! Both files are produced by the offline trainer and are read-only here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::classifier::{first_duplicate, Classifier, ModelError, Pipeline};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent artifact: {0}")]
    Inconsistent(String),
}

impl From<ModelError> for ArtifactError {
    fn from(err: ModelError) -> Self {
        ArtifactError::Inconsistent(err.to_string())
    }
}

pub const UNKNOWN_MODEL: &str = "Unknown";

/// Metadata written next to the classifier at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub model_name: Option<String>,
    /// Mean cross-validation accuracy of the selected model
    #[serde(default)]
    pub model_score: f64,
    /// Accuracy on the held-out split
    #[serde(default)]
    pub test_accuracy: f64,
    /// Exact column order the classifier expects
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    #[serde(default = "default_simplified")]
    pub is_simplified: bool,
    #[serde(default)]
    pub feature_count: Option<usize>,
}

fn default_simplified() -> bool {
    true
}

impl ModelMetadata {
    pub fn feature_count(&self) -> usize {
        self.feature_count.unwrap_or(self.feature_names.len())
    }

    /// Model name for logs and prediction responses, `"Unknown"` when absent or empty
    pub fn display_name(&self) -> &str {
        match self.model_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_MODEL,
        }
    }
}

/// A loaded classifier with its metadata
pub struct ModelArtifact {
    pub classifier: Box<dyn Classifier>,
    pub metadata: ModelMetadata,
    /// SHA-256 of the classifier file, when loaded from disk
    pub checksum: Option<String>,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("model_name", &self.metadata.display_name())
            .field("features", &self.classifier.n_features())
            .field("classes", &self.classifier.classes())
            .field("checksum", &self.checksum)
            .finish()
    }
}

impl ModelArtifact {
    /// Pair an in-memory classifier with its metadata, checking they agree
    pub fn new(
        classifier: Box<dyn Classifier>,
        metadata: ModelMetadata,
    ) -> Result<Self, ArtifactError> {
        if metadata.feature_names.len() != classifier.n_features() {
            return Err(ArtifactError::Inconsistent(format!(
                "metadata lists {} features, classifier expects {}",
                metadata.feature_names.len(),
                classifier.n_features()
            )));
        }

        if let Some(label) = first_duplicate(&metadata.classes) {
            return Err(ArtifactError::Inconsistent(format!(
                "metadata lists class {:?} more than once",
                label
            )));
        }

        let declared: BTreeSet<&str> = metadata.classes.iter().map(String::as_str).collect();
        let fitted: BTreeSet<&str> = classifier.classes().iter().map(String::as_str).collect();
        if declared != fitted {
            return Err(ArtifactError::Inconsistent(format!(
                "metadata classes {:?} differ from classifier classes {:?}",
                metadata.classes,
                classifier.classes()
            )));
        }

        Ok(Self {
            classifier,
            metadata,
            checksum: None,
        })
    }

    /// Read and validate both artifact files
    pub fn load(model_path: &Path, info_path: &Path) -> Result<Self, ArtifactError> {
        let model_bytes = read_file(model_path)?;
        let info_bytes = read_file(info_path)?;

        let pipeline: Pipeline =
            serde_json::from_slice(&model_bytes).map_err(|source| ArtifactError::Parse {
                path: model_path.to_path_buf(),
                source,
            })?;
        pipeline.validate()?;

        let metadata: ModelMetadata =
            serde_json::from_slice(&info_bytes).map_err(|source| ArtifactError::Parse {
                path: info_path.to_path_buf(),
                source,
            })?;

        let mut artifact = Self::new(Box::new(pipeline), metadata)?;
        artifact.checksum = Some(format!("{:x}", Sha256::digest(&model_bytes)));
        Ok(artifact)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    const PIPELINE: &str = r#"{
        "classes": ["Dropout", "Graduate"],
        "scaler": null,
        "estimator": {
            "type": "decision_tree",
            "n_features": 2,
            "nodes": [
                {"feature": 1, "threshold": 0.5, "left": 1, "right": 2},
                {"value": [4.0, 1.0]},
                {"value": [1.0, 4.0]}
            ]
        }
    }"#;

    const INFO: &str = r#"{
        "model_name": "CART",
        "model_score": 0.74,
        "test_accuracy": 0.72,
        "feature_names": ["Gender", "Scholarship holder"],
        "classes": ["Graduate", "Dropout"]
    }"#;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_artifact() {
        let model = temp_file(PIPELINE);
        let info = temp_file(INFO);

        let artifact = assert_ok!(ModelArtifact::load(model.path(), info.path()));
        assert_eq!(artifact.metadata.model_name.as_deref(), Some("CART"));
        assert_eq!(artifact.metadata.display_name(), "CART");
        assert!(artifact.metadata.is_simplified, "is_simplified defaults to true");
        assert_eq!(artifact.metadata.feature_count(), 2);
        assert_eq!(artifact.classifier.n_features(), 2);
        assert_eq!(artifact.checksum.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_load_missing_file() {
        let info = temp_file(INFO);
        let err = assert_err!(ModelArtifact::load(
            Path::new("/nonexistent/model.json"),
            info.path()
        ));
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn test_load_corrupt_json() {
        let model = temp_file("{ not json");
        let info = temp_file(INFO);
        let err = assert_err!(ModelArtifact::load(model.path(), info.path()));
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn test_load_feature_count_mismatch() {
        let model = temp_file(PIPELINE);
        let info = temp_file(
            r#"{
                "model_name": "CART",
                "feature_names": ["Gender"],
                "classes": ["Dropout", "Graduate"]
            }"#,
        );
        let err = assert_err!(ModelArtifact::load(model.path(), info.path()));
        assert!(matches!(err, ArtifactError::Inconsistent(_)));
    }

    #[test]
    fn test_load_class_mismatch() {
        let model = temp_file(PIPELINE);
        let info = temp_file(
            r#"{
                "feature_names": ["Gender", "Scholarship holder"],
                "classes": ["Dropout", "Enrolled"]
            }"#,
        );
        assert!(matches!(
            ModelArtifact::load(model.path(), info.path()),
            Err(ArtifactError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_load_without_model_name() {
        let model = temp_file(PIPELINE);
        let info = temp_file(
            r#"{
                "feature_names": ["Gender", "Scholarship holder"],
                "classes": ["Dropout", "Graduate"]
            }"#,
        );
        let artifact = assert_ok!(ModelArtifact::load(model.path(), info.path()));
        assert_eq!(artifact.metadata.model_name, None);
        assert_eq!(artifact.metadata.display_name(), UNKNOWN_MODEL);
    }

    #[test]
    fn test_load_rejects_duplicate_classes() {
        let model = temp_file(
            r#"{
                "classes": ["Dropout", "Dropout"],
                "estimator": {"type": "linear_svc", "coef": [[1.0]], "intercept": [0.0]}
            }"#,
        );
        let info = temp_file(r#"{"feature_names": ["Gender"], "classes": ["Dropout"]}"#);
        assert!(matches!(
            ModelArtifact::load(model.path(), info.path()),
            Err(ArtifactError::Inconsistent(_))
        ));

        let model = temp_file(PIPELINE);
        let info = temp_file(
            r#"{
                "feature_names": ["Gender", "Scholarship holder"],
                "classes": ["Dropout", "Graduate", "Graduate"]
            }"#,
        );
        assert!(matches!(
            ModelArtifact::load(model.path(), info.path()),
            Err(ArtifactError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_load_invalid_pipeline() {
        let model = temp_file(
            r#"{
                "classes": ["A"],
                "estimator": {"type": "linear_svc", "coef": [[1.0]], "intercept": []}
            }"#,
        );
        let info = temp_file(r#"{"feature_names": ["Gender"], "classes": ["A"]}"#);
        assert!(matches!(
            ModelArtifact::load(model.path(), info.path()),
            Err(ArtifactError::Inconsistent(_))
        ));
    }
}
