//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;

use mooproof_core::extract::ExtractOptions;
use mooproof_core::submission::SubmissionSettings;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub generation_model: String,
    pub max_output_tokens: u32,
    pub usage_retention_days: i64,
    pub serialize_submissions: bool,
    pub docx_paragraph_breaks: bool,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000".parse::<SocketAddr>().ok())?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Workflow Settings ---
        let generation_model =
            std::env::var("GENERATION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let max_output_tokens = parse_var("MAX_OUTPUT_TOKENS", Some(2000))?;
        let usage_retention_days = parse_var("USAGE_RETENTION_DAYS", Some(7))?;
        let serialize_submissions = parse_flag("SERIALIZE_SUBMISSIONS")?;
        let docx_paragraph_breaks = parse_flag("DOCX_PARAGRAPH_BREAKS")?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", Some(10 * 1024 * 1024))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            generation_model,
            max_output_tokens,
            usage_retention_days,
            serialize_submissions,
            docx_paragraph_breaks,
            cors_origin,
            max_upload_bytes,
        })
    }

    /// The knobs the submission workflow reads.
    pub fn submission_settings(&self) -> SubmissionSettings {
        SubmissionSettings {
            usage_retention: chrono::Duration::days(self.usage_retention_days),
            extract_options: ExtractOptions {
                paragraph_breaks: self.docx_paragraph_breaks,
                ..ExtractOptions::default()
            },
            serialize_per_user: self.serialize_submissions,
        }
    }
}

fn parse_var<T>(name: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}

fn parse_flag(name: &str) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => flag_value(&raw)
            .ok_or_else(|| ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a boolean", raw))),
        Err(_) => Ok(false),
    }
}

fn flag_value(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
