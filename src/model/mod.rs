//! Model Module - classifier runtime and artifact loading
//!
//! The offline trainer exports a fitted pipeline as JSON. This module
//! evaluates it natively; nothing here trains or tunes.

pub mod artifact;
pub mod classifier;
pub mod estimators;

pub use artifact::{ArtifactError, ModelArtifact, ModelMetadata};
pub use classifier::{Classifier, ModelError, Pipeline, StandardScaler};
pub use estimators::Estimator;
