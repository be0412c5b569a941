//! Prediction handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::models::{FeaturesResponse, ModelInfo, PredictionResult, StudentRecord};
use crate::{AppError, AppResult, AppState};

/// Model metadata
pub async fn model_info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let info = state.service.describe()?;
    Ok(Json(info))
}

/// Predict the outcome for one student
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<PredictionResult>> {
    // Availability is checked before the body is looked at
    if !state.service.is_loaded() {
        return Err(AppError::ModelNotLoaded);
    }

    let Json(body) = body?;
    let record = StudentRecord::from_json(&body)?;

    run_prediction(&state, &record)
}

/// Predict for the built-in example student
pub async fn predict_example(State(state): State<AppState>) -> AppResult<Json<PredictionResult>> {
    run_prediction(&state, &StudentRecord::example())
}

/// Feature names with descriptions
pub async fn features(State(state): State<AppState>) -> AppResult<Json<FeaturesResponse>> {
    let catalog = state.service.feature_catalog()?;
    Ok(Json(catalog))
}

fn run_prediction(state: &AppState, record: &StudentRecord) -> AppResult<Json<PredictionResult>> {
    let result = state.service.predict(record)?;

    tracing::debug!(
        "Prediction: {} (probabilities: {})",
        result.prediction,
        result.has_probabilities()
    );

    Ok(Json(result))
}
