//! Student Dropout Prediction Server
//!
//! Loads the model artifact once, then serves the prediction API. A missing
//! or corrupt artifact does not stop the server: every model endpoint
//! answers 503 until the process is restarted with a valid artifact.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dropout_predictor::{create_router, AppState, Config, PredictionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    init_tracing(&config);

    tracing::info!("Starting {} v{}", config.api_title, config.api_version);
    tracing::debug!("{}", config.api_description);

    let service = Arc::new(PredictionService::new(&config.model_path, &config.model_info_path));
    if let Err(e) = service.load() {
        tracing::warn!("Model not loaded ({}). Model endpoints will answer 503.", e);
    }

    let app = create_router(AppState::new(service, config.clone()));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("🛑 Shutting down");
    Ok(())
}

fn init_tracing(config: &Config) {
    let default_filter = if config.is_production() {
        "dropout_predictor=info,tower_http=info"
    } else {
        "dropout_predictor=debug,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
