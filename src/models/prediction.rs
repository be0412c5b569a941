//! Prediction response models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key used when per-class probabilities are unavailable
pub const PREDICTION_ONLY: &str = "prediction_only";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub confidence: BTreeMap<String, f64>,
    pub model_info: PredictionModelInfo,
}

impl PredictionResult {
    /// `{"prediction_only": 1.0}`
    pub fn sentinel_confidence() -> BTreeMap<String, f64> {
        BTreeMap::from([(PREDICTION_ONLY.to_string(), 1.0)])
    }

    pub fn has_probabilities(&self) -> bool {
        !self.confidence.contains_key(PREDICTION_ONLY)
    }
}

/// Metadata echoed back with every prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionModelInfo {
    pub model_name: String,
    pub features_used: usize,
    pub is_simplified: bool,
}

/// `GET /api/model-info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// `null` when the metadata has no name
    pub model_name: Option<String>,
    pub model_score: f64,
    pub test_accuracy: f64,
    pub features_count: usize,
    pub classes: Vec<String>,
    pub is_simplified: bool,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub description: String,
}

/// `GET /api/features`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturesResponse {
    pub total_features: usize,
    pub features: Vec<FeatureInfo>,
}
