//! Prediction Service - owns the loaded artifact
//!
//! Constructed once by the process bootstrap and shared through the
//! router state. The artifact is written at most once per successful
//! `load()`; requests take a cheap `Arc` clone and never hold the lock
//! while predicting.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::features;
use crate::model::{ArtifactError, ModelArtifact, ModelError};
use crate::models::{
    FeatureInfo, FeaturesResponse, ModelInfo, PredictionModelInfo, PredictionResult, StudentRecord,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Model not loaded")]
    Unavailable,

    #[error("{0}")]
    PredictionFailed(String),
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        ServiceError::PredictionFailed(err.to_string())
    }
}

pub struct PredictionService {
    model_path: PathBuf,
    info_path: PathBuf,
    artifact: RwLock<Option<Arc<ModelArtifact>>>,
}

impl PredictionService {
    pub fn new(model_path: impl Into<PathBuf>, info_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            info_path: info_path.into(),
            artifact: RwLock::new(None),
        }
    }

    /// Service that starts out loaded with an in-memory artifact
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            model_path: PathBuf::new(),
            info_path: PathBuf::new(),
            artifact: RwLock::new(Some(Arc::new(artifact))),
        }
    }

    /// Read the artifact files. A no-op when already loaded; on failure the
    /// current state is left as it was.
    pub fn load(&self) -> Result<(), ArtifactError> {
        if self.is_loaded() {
            tracing::debug!("Model already loaded, skipping");
            return Ok(());
        }

        let artifact = ModelArtifact::load(&self.model_path, &self.info_path)?;

        tracing::info!("Model loaded: {}", artifact.metadata.display_name());
        tracing::info!("Features: {}", artifact.metadata.feature_names.len());
        tracing::info!("Classes: {:?}", artifact.metadata.classes);
        if let Some(checksum) = &artifact.checksum {
            tracing::debug!("Model checksum (sha256): {}", checksum);
        }

        let mut slot = self.artifact.write();
        if slot.is_none() {
            *slot = Some(Arc::new(artifact));
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.read().is_some()
    }

    fn current(&self) -> Result<Arc<ModelArtifact>, ServiceError> {
        self.artifact.read().clone().ok_or(ServiceError::Unavailable)
    }

    /// Feature count reported by the status endpoint, 0 when not loaded
    pub fn feature_count(&self) -> usize {
        self.artifact
            .read()
            .as_ref()
            .map_or(0, |artifact| artifact.metadata.feature_count())
    }

    pub fn describe(&self) -> Result<ModelInfo, ServiceError> {
        let artifact = self.current()?;
        let meta = &artifact.metadata;

        Ok(ModelInfo {
            model_name: meta.model_name.clone(),
            model_score: meta.model_score,
            test_accuracy: meta.test_accuracy,
            features_count: meta.feature_names.len(),
            classes: meta.classes.clone(),
            is_simplified: meta.is_simplified,
            feature_names: meta.feature_names.clone(),
        })
    }

    pub fn predict(&self, record: &StudentRecord) -> Result<PredictionResult, ServiceError> {
        let artifact = self.current()?;
        let meta = &artifact.metadata;
        let classifier = &*artifact.classifier;

        let row = features::build_row(record, &meta.feature_names)
            .map_err(ServiceError::PredictionFailed)?;
        let prediction = classifier.predict(&row)?;

        let confidence = match classifier.predict_proba(&row) {
            Ok(probabilities) if probabilities.iter().any(|p| !p.is_finite()) => {
                tracing::warn!("Non-finite probability estimate, using prediction_only");
                PredictionResult::sentinel_confidence()
            }
            Ok(probabilities) => classifier
                .classes()
                .iter()
                .cloned()
                .zip(probabilities)
                .collect::<BTreeMap<_, _>>(),
            Err(ModelError::ProbabilityUnsupported) => {
                tracing::debug!("Classifier has no probability estimates, using prediction_only");
                PredictionResult::sentinel_confidence()
            }
            Err(e) => {
                tracing::warn!("Error getting probabilities, using prediction_only: {}", e);
                PredictionResult::sentinel_confidence()
            }
        };

        Ok(PredictionResult {
            prediction,
            confidence,
            model_info: PredictionModelInfo {
                model_name: meta.display_name().to_string(),
                features_used: meta.feature_names.len(),
                is_simplified: meta.is_simplified,
            },
        })
    }

    pub fn feature_catalog(&self) -> Result<FeaturesResponse, ServiceError> {
        let artifact = self.current()?;

        let features: Vec<FeatureInfo> = artifact
            .metadata
            .feature_names
            .iter()
            .map(|name| FeatureInfo {
                name: name.clone(),
                description: features::describe(name).to_string(),
            })
            .collect();

        Ok(FeaturesResponse {
            total_features: features.len(),
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classifier, Estimator, ModelMetadata, Pipeline};
    use crate::models::PREDICTION_ONLY;
    use crate::service::features::{DESCRIPTION_UNAVAILABLE, FEATURE_MAPPING};

    /// Label is chosen by the value of column 0; probabilities optional
    struct ThresholdClassifier {
        classes: Vec<String>,
        n_features: usize,
        proba: Option<Result<Vec<f64>, ModelError>>,
    }

    impl Classifier for ThresholdClassifier {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn n_features(&self) -> usize {
            self.n_features
        }

        fn predict(&self, row: &[f64]) -> Result<String, ModelError> {
            let idx = if row[0] >= 50.0 { 1 } else { 0 };
            Ok(self.classes[idx].clone())
        }

        fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
            self.proba.clone().unwrap_or(Err(ModelError::ProbabilityUnsupported))
        }
    }

    fn feature_names() -> Vec<String> {
        FEATURE_MAPPING.iter().map(|(_, column)| column.to_string()).collect()
    }

    fn metadata(feature_names: Vec<String>) -> ModelMetadata {
        ModelMetadata {
            model_name: Some("Test Classifier".to_string()),
            model_score: 0.85,
            test_accuracy: 0.82,
            feature_names,
            classes: vec!["Dropout".into(), "Graduate".into()],
            is_simplified: true,
            feature_count: None,
        }
    }

    fn service(
        proba: Option<Result<Vec<f64>, ModelError>>,
        names: Vec<String>,
    ) -> PredictionService {
        let classifier = ThresholdClassifier {
            classes: vec!["Dropout".into(), "Graduate".into()],
            n_features: names.len(),
            proba,
        };
        let artifact = ModelArtifact::new(Box::new(classifier), metadata(names)).unwrap();
        PredictionService::with_artifact(artifact)
    }

    #[test]
    fn test_unloaded_service_is_unavailable() {
        let service = PredictionService::new("/nonexistent/model.json", "/nonexistent/info.json");
        assert!(!service.is_loaded());
        assert_eq!(service.feature_count(), 0);
        assert!(matches!(service.describe(), Err(ServiceError::Unavailable)));
        assert!(matches!(service.feature_catalog(), Err(ServiceError::Unavailable)));
        assert!(matches!(
            service.predict(&StudentRecord::example()),
            Err(ServiceError::Unavailable)
        ));
    }

    #[test]
    fn test_failed_load_leaves_service_unavailable() {
        let service = PredictionService::new("/nonexistent/model.json", "/nonexistent/info.json");
        assert!(service.load().is_err());
        assert!(!service.is_loaded());
    }

    #[test]
    fn test_load_is_noop_when_loaded() {
        let service = service(None, feature_names());
        assert!(service.load().is_ok());
        assert!(service.is_loaded());
    }

    #[test]
    fn test_predict_with_probabilities() {
        let service = service(Some(Ok(vec![0.3, 0.7])), feature_names());
        let result = service.predict(&StudentRecord::example()).unwrap();

        assert_eq!(result.prediction, "Dropout");
        assert_eq!(result.confidence.len(), 2);
        assert_eq!(result.confidence["Dropout"], 0.3);
        assert_eq!(result.confidence["Graduate"], 0.7);
        assert!(result.has_probabilities());
        assert_eq!(result.model_info.model_name, "Test Classifier");
        assert_eq!(result.model_info.features_used, 14);
        assert!(result.model_info.is_simplified);
    }

    #[test]
    fn test_predict_without_probability_support() {
        let service = service(None, feature_names());
        let result = service.predict(&StudentRecord::example()).unwrap();

        assert_eq!(result.confidence, PredictionResult::sentinel_confidence());
        assert_eq!(result.confidence[PREDICTION_ONLY], 1.0);
    }

    #[test]
    fn test_probability_error_degrades_to_sentinel() {
        let failing = Some(Err(ModelError::Invalid("boom".to_string())));
        let service = service(failing, feature_names());
        let result = service.predict(&StudentRecord::example()).unwrap();

        assert_eq!(result.confidence, PredictionResult::sentinel_confidence());
    }

    #[test]
    fn test_non_finite_probabilities_degrade_to_sentinel() {
        let service = service(Some(Ok(vec![f64::NAN, f64::NAN])), feature_names());
        let result = service.predict(&StudentRecord::example()).unwrap();

        assert_eq!(result.confidence, PredictionResult::sentinel_confidence());
    }

    #[test]
    fn test_naive_bayes_extreme_value_degrades_to_sentinel() {
        let names = feature_names();
        let pipeline = Pipeline {
            classes: vec!["Dropout".into(), "Graduate".into()],
            scaler: None,
            estimator: Estimator::GaussianNb {
                class_prior: vec![0.5, 0.5],
                theta: vec![vec![0.0; 14], vec![1.0; 14]],
                var: vec![vec![1.0; 14], vec![1.0; 14]],
            },
        };
        pipeline.validate().unwrap();
        let artifact = ModelArtifact::new(Box::new(pipeline), metadata(names)).unwrap();
        let service = PredictionService::with_artifact(artifact);

        let mut record = StudentRecord::example();
        record.admission_grade = 1e200;
        let result = service.predict(&record).unwrap();

        assert!(["Dropout", "Graduate"].contains(&result.prediction.as_str()));
        assert_eq!(result.confidence, PredictionResult::sentinel_confidence());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["confidence"][PREDICTION_ONLY], 1.0);
    }

    #[test]
    fn test_missing_model_name() {
        let classifier = ThresholdClassifier {
            classes: vec!["Dropout".into(), "Graduate".into()],
            n_features: 14,
            proba: None,
        };
        let mut meta = metadata(feature_names());
        meta.model_name = None;
        let artifact = ModelArtifact::new(Box::new(classifier), meta).unwrap();
        let service = PredictionService::with_artifact(artifact);

        assert_eq!(service.describe().unwrap().model_name, None);
        let result = service.predict(&StudentRecord::example()).unwrap();
        assert_eq!(result.model_info.model_name, "Unknown");
    }

    #[test]
    fn test_columns_follow_feature_names() {
        // admission grade (140) first -> Graduate; age (18) first -> Dropout
        let mut names = feature_names();
        names.swap(0, 3);
        let by_grade = service(None, names);
        assert_eq!(by_grade.predict(&StudentRecord::example()).unwrap().prediction, "Graduate");

        let by_age = service(None, feature_names());
        assert_eq!(by_age.predict(&StudentRecord::example()).unwrap().prediction, "Dropout");
    }

    #[test]
    fn test_unmapped_feature_fails_prediction() {
        let mut names = feature_names();
        names[5] = "Course".to_string();
        let service = service(None, names);

        match service.predict(&StudentRecord::example()) {
            Err(ServiceError::PredictionFailed(msg)) => assert!(msg.contains("Course")),
            other => panic!("expected PredictionFailed, got {:?}", other.map(|r| r.prediction)),
        }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let service = service(Some(Ok(vec![0.25, 0.75])), feature_names());
        let first = service.predict(&StudentRecord::example()).unwrap();
        let second = service.predict(&StudentRecord::example()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_describe() {
        let service = service(None, feature_names());
        let info = service.describe().unwrap();

        assert_eq!(info.model_name.as_deref(), Some("Test Classifier"));
        assert_eq!(info.model_score, 0.85);
        assert_eq!(info.test_accuracy, 0.82);
        assert_eq!(info.features_count, 14);
        assert_eq!(info.classes, vec!["Dropout", "Graduate"]);
        assert!(info.is_simplified);
        assert_eq!(info.feature_names[0], "Age at enrollment");
        assert_eq!(service.feature_count(), 14);
    }

    #[test]
    fn test_feature_catalog_placeholder() {
        let mut names = feature_names();
        names[13] = "Inflation rate".to_string();
        let service = service(None, names);

        let catalog = service.feature_catalog().unwrap();
        assert_eq!(catalog.total_features, 14);
        assert_eq!(catalog.features[0].name, "Age at enrollment");
        assert_eq!(catalog.features[13].description, DESCRIPTION_UNAVAILABLE);
    }
}
