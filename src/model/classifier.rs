//! Classifier trait and the fitted pipeline

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::estimators::Estimator;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("probability estimates are not supported by this classifier")]
    ProbabilityUnsupported,

    #[error("non-finite value in feature column {0}")]
    NonFinite(usize),

    #[error("invalid model: {0}")]
    Invalid(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A fitted classifier over a single tabular row.
///
/// Rows are positional: column `i` must be the `i`-th entry of the
/// artifact's `feature_names`.
pub trait Classifier: Send + Sync {
    /// Class labels, in the order probability vectors are reported
    fn classes(&self) -> &[String];

    /// Row width the classifier was fitted on
    fn n_features(&self) -> usize;

    /// Predict exactly one label
    fn predict(&self, row: &[f64]) -> Result<String, ModelError>;

    /// Per-class probabilities aligned with [`Classifier::classes`]
    fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::ProbabilityUnsupported)
    }
}

// ============================================================================
// SCALER
// ============================================================================

/// Standardization fitted at training time: `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                // zero-variance columns are left unscaled
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.mean.len() != self.scale.len() {
            return Err(ModelError::Invalid(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Optional scaler followed by one estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub classes: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl Pipeline {
    /// Check that every stage agrees on row width and class count
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("pipeline has no classes".to_string()));
        }
        if let Some(label) = first_duplicate(&self.classes) {
            return Err(ModelError::Invalid(format!("duplicate class label {:?}", label)));
        }

        self.estimator.validate(self.classes.len())?;

        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
            if scaler.n_features() != self.estimator.n_features() {
                return Err(ModelError::Invalid(format!(
                    "scaler expects {} features, estimator expects {}",
                    scaler.n_features(),
                    self.estimator.n_features()
                )));
            }
        }

        Ok(())
    }

    fn prepare(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                actual: row.len(),
            });
        }
        if let Some(idx) = row.iter().position(|x| !x.is_finite()) {
            return Err(ModelError::NonFinite(idx));
        }

        Ok(match &self.scaler {
            Some(scaler) => scaler.transform(row),
            None => row.to_vec(),
        })
    }

    fn label(&self, idx: usize) -> Result<String, ModelError> {
        self.classes
            .get(idx)
            .cloned()
            .ok_or_else(|| ModelError::Invalid(format!("class index {} out of range", idx)))
    }
}

impl Classifier for Pipeline {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.estimator.n_features()
    }

    fn predict(&self, row: &[f64]) -> Result<String, ModelError> {
        let x = self.prepare(row)?;
        let idx = self.estimator.predict_index(&x, self.classes.len())?;
        self.label(idx)
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if !self.estimator.supports_proba() {
            return Err(ModelError::ProbabilityUnsupported);
        }
        let x = self.prepare(row)?;
        self.estimator.predict_proba(&x, self.classes.len())
    }
}

/// First label that appears more than once
pub(crate) fn first_duplicate(labels: &[String]) -> Option<&str> {
    let mut seen = BTreeSet::new();
    labels
        .iter()
        .map(String::as_str)
        .find(|label| !seen.insert(*label))
}

/// Index of the largest value; ties go to the lowest index
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}
