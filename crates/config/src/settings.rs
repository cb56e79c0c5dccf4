//! Main settings module

use config::{Config, Environment, File};
use lingua_core::CefrLevel;
use serde::{Deserialize, Serialize};

use crate::pedagogy::PedagogyConfig;
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Tutor session defaults
    #[serde(default)]
    pub tutor: TutorSettings,

    /// Pedagogy tables, either inline or loaded from `pedagogy_path`
    #[serde(default)]
    pub pedagogy: PedagogyConfig,

    /// Optional YAML file that replaces the inline pedagogy tables
    #[serde(default)]
    pub pedagogy_path: Option<String>,
}

impl Settings {
    /// Validate all settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_tutor()?;
        self.pedagogy.validate()?;

        if self.environment.is_strict() && self.server.cors_enabled {
            if self.server.cors_origins.iter().any(|o| o == "*") {
                return Err(ConfigError::InvalidValue {
                    field: "server.cors_origins".to_string(),
                    message: "Wildcard origin is not allowed outside development".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }

    fn validate_tutor(&self) -> Result<(), ConfigError> {
        if self.tutor.max_diagnostics == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tutor.max_diagnostics".to_string(),
                message: "Must keep at least one diagnostics entry".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means localhost only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Tutor session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorSettings {
    /// Level a fresh session starts at
    #[serde(default)]
    pub initial_level: CefrLevel,

    /// Diagnostics entries kept per session
    #[serde(default = "default_max_diagnostics")]
    pub max_diagnostics: usize,

    /// Diagnostics entries returned by the diagnostics endpoint
    #[serde(default = "default_diagnostics_window")]
    pub diagnostics_window: usize,
}

fn default_max_diagnostics() -> usize {
    50
}
fn default_diagnostics_window() -> usize {
    20
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            initial_level: CefrLevel::default(),
            max_diagnostics: default_max_diagnostics(),
            diagnostics_window: default_diagnostics_window(),
        }
    }
}

/// Load settings from files and environment
///
/// Layering: `config/default`, then `config/{env}`, then `LINGUA__*`
/// environment variables. When `pedagogy_path` is set the referenced YAML
/// replaces the inline pedagogy tables.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LINGUA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;

    if let Some(path) = &settings.pedagogy_path {
        settings.pedagogy = PedagogyConfig::load(path)?;
    }

    settings.validate()?;

    Ok(settings)
}
