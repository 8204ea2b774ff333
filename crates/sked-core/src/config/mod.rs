use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::MAX_SERIES_OCCURRENCES;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub recurrence: RecurrenceConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    pub max_occurrences: usize,
}

impl RecurrenceConfig {
    /// ## Summary
    /// Returns the configured occurrence limit, never above the hard cap.
    #[must_use]
    pub fn occurrence_limit(&self) -> usize {
        self.max_occurrences.clamp(1, MAX_SERIES_OCCURRENCES)
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            max_occurrences: MAX_SERIES_OCCURRENCES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub urn_domain: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            urn_domain: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("recurrence.max_occurrences", 200)?
            .set_default("identity.urn_domain", "localhost")?
            .set_default("logging.level", "debug")?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "Failed to load .env file"),
    }

    Settings::load()
}
