//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Fitted classifier pipeline (JSON)
    pub model_path: PathBuf,

    /// Companion metadata record (JSON)
    pub model_info_path: PathBuf,

    pub api_title: String,
    pub api_description: String,
    pub api_version: String,

    /// Log output format ("text" or "json")
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("artifacts/student_dropout_simple_model.json"),
            model_info_path: PathBuf::from("artifacts/student_dropout_simple_model_info.json"),
            api_title: "Student Dropout Prediction API - Simplified".to_string(),
            api_description: "Simplified dropout prediction API using 14 essential fields"
                .to_string(),
            api_version: "2.0.0".to_string(),
            log_format: "text".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            model_info_path: env::var("MODEL_INFO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_info_path),

            api_title: env::var("API_TITLE").unwrap_or(defaults.api_title),

            api_description: env::var("API_DESCRIPTION").unwrap_or(defaults.api_description),

            api_version: env::var("API_VERSION").unwrap_or(defaults.api_version),

            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
