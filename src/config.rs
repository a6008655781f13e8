use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Careletter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Global request body ceiling (10 MB). Oversized bodies get 413
/// before any handler runs.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Fixed-window rate limit applied per user id or client IP.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 60;
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default retention period for summaries and transcriptions,
/// used until the user picks one in settings.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

pub fn default_log_filter() -> String {
    format!("{}=info,tower_http=warn", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory (`~/Careletter/` unless overridden
/// by `CARELETTER_DATA_DIR`).
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CARELETTER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Careletter")
}

/// Get the database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("careletter.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// Base URL interpolated into patient-facing links (portal, feedback form).
    pub public_base_url: String,
    pub from_email: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub resend_api_key: String,
    pub resend_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind = std::env::var("CARELETTER_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidVar {
            var: "CARELETTER_BIND_ADDR",
            value: bind.clone(),
        })?;

        Ok(Self {
            bind_addr,
            database_path: database_path(),
            public_base_url: std::env::var("CARELETTER_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            from_email: std::env::var("CARELETTER_FROM_EMAIL")
                .unwrap_or_else(|_| "summaries@careletter.example".to_string()),
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            gemini_api_key: require("GEMINI_API_KEY")?,
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            resend_api_key: require("RESEND_API_KEY")?,
            resend_base_url: std::env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var))
}
