//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Everything except the
//! Gemini API key has a default.

use crate::services::alert::NotificationPermission;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Gemini ---
    /// API key for the Generative Language API
    pub gemini_api_key: String,
    /// API base URL (overridden in tests)
    pub gemini_base_url: String,

    // --- Server ---
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory for the durable key-value store
    pub data_dir: PathBuf,

    // --- Tuning ---
    pub movement_min_distance_m: f64,
    pub movement_min_interval_ms: i64,
    pub alert_window_ms: u64,
    pub asset_retry_max: u32,
    pub asset_retry_base_ms: u64,
    /// Permission state reported by the notification sink
    pub notification_permission: NotificationPermission,
}

impl Config {
    /// Config for tests: no real key, ephemeral values.
    pub fn test_default() -> Self {
        Self {
            gemini_api_key: "test_api_key".to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            movement_min_distance_m: 100.0,
            movement_min_interval_ms: 30_000,
            alert_window_ms: 8_000,
            asset_retry_max: 2,
            asset_retry_base_ms: 1_000,
            notification_permission: NotificationPermission::Undetermined,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?,
            gemini_base_url: var(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            frontend_url: var("FRONTEND_URL", "http://localhost:5173"),
            port: parse("PORT", &var("PORT", "8080"))?,
            data_dir: PathBuf::from(var("DATA_DIR", "data")),
            movement_min_distance_m: parse(
                "MOVEMENT_MIN_DISTANCE_M",
                &var("MOVEMENT_MIN_DISTANCE_M", "100"),
            )?,
            movement_min_interval_ms: parse(
                "MOVEMENT_MIN_INTERVAL_MS",
                &var("MOVEMENT_MIN_INTERVAL_MS", "30000"),
            )?,
            alert_window_ms: parse("ALERT_WINDOW_MS", &var("ALERT_WINDOW_MS", "8000"))?,
            asset_retry_max: parse("ASSET_RETRY_MAX", &var("ASSET_RETRY_MAX", "2"))?,
            asset_retry_base_ms: parse(
                "ASSET_RETRY_BASE_MS",
                &var("ASSET_RETRY_BASE_MS", "1000"),
            )?,
            notification_permission: parse(
                "NOTIFICATION_PERMISSION",
                &var("NOTIFICATION_PERMISSION", "undetermined"),
            )?,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
