//! Student Dropout Prediction API
//!
//! Serves a pre-trained student outcome classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 DROPOUT PREDICTION SERVER                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  Router   │  │  Validator    │  │  Prediction Service │ │
//! │  │  (Axum)   │─▶│ StudentRecord │─▶│  (column mapping)   │ │
//! │  └───────────┘  └───────────────┘  └──────────┬──────────┘ │
//! │                                               ▼            │
//! │                                    ┌─────────────────────┐ │
//! │                                    │  Model Artifact     │ │
//! │                                    │  (pipeline + meta)  │ │
//! │                                    └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod models;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use service::PredictionService;

/// Preflight cache lifetime
const CORS_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, config: Config) -> Self {
        Self { service, config }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api", get(handlers::health::status))
        .route("/api/", get(handlers::health::status))
        .route("/api/model-info", get(handlers::prediction::model_info))
        .route("/api/predict", post(handlers::prediction::predict))
        .route("/api/predict-example", post(handlers::prediction::predict_example))
        .route("/api/features", get(handlers::prediction::features));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .fallback(handlers::health::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer()),
        )
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(CORS_MAX_AGE)
}
