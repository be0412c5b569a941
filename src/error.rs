//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::models::ValidationErrors;
use crate::service::ServiceError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Model availability
    ModelNotLoaded,

    // Request errors
    BadRequest(String),
    Validation(ValidationErrors),

    // Prediction errors
    PredictionFailed(String),

    // Routing
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ModelNotLoaded => {
                (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(errors) => {
                tracing::debug!("Rejected request: {}", errors);
                (StatusCode::BAD_REQUEST, errors.to_string())
            }
            AppError::PredictionFailed(msg) => {
                tracing::warn!("Prediction error: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Prediction error: {}", msg))
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Endpoint not found".to_string()),
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        if let AppError::Validation(errors) = &self {
            body["details"] = json!(errors.messages());
        }

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable => AppError::ModelNotLoaded,
            ServiceError::PredictionFailed(msg) => AppError::PredictionFailed(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}
