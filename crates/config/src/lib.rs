//! Configuration management for the language tutor
//!
//! Supports loading configuration from:
//! - YAML files under `config/`
//! - Environment variables (LINGUA__ prefix)
//! - A standalone pedagogy YAML (stopwords, stubs, pattern rules, thresholds)

pub mod pedagogy;
pub mod settings;

pub use pedagogy::{
    GateThresholds, GraphSettings, HeuristicChunk, MissionSettings, PatternRule, PedagogyConfig,
};
pub use settings::{
    load_settings, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings, TutorSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
