//! Services

pub mod features;
pub mod prediction;

pub use prediction::{PredictionService, ServiceError};
