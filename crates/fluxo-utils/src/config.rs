//! Configuration management utilities
//!
//! Configuration starts from defaults suited to development and is then
//! overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `ENVIRONMENT` | `environment` |
//! | `USE_MOCK_WORKFLOW` | `workflow.use_mock` |
//! | `WORKFLOW_TIMEOUT_SECONDS` | `workflow.timeout_seconds` |
//! | `WORKFLOW_MAX_RETRIES` | `workflow.max_retries` |
//! | `LOG_LEVEL` | `logging.level` |
//! | `LOG_FORMAT` | `logging.format` (`pretty` or `json`) |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// The assembled configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, etc.)
    pub environment: String,
    /// Workflow execution settings
    pub workflow: WorkflowConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "fluxo".to_string(),
            environment: "development".to_string(),
            workflow: WorkflowConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Workflow execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Run the direct sequential strategy instead of the graph executor
    pub use_mock: bool,
    /// Time budget for a single stage call, in seconds
    pub timeout_seconds: f64,
    /// How many times a rejected result is sent back for re-processing
    pub max_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            use_mock: true,
            timeout_seconds: 30.0,
            max_retries: 3,
        }
    }
}

impl WorkflowConfig {
    /// Per-stage timeout as a `Duration`
    ///
    /// Fails for negative, non-finite, or unrepresentably large values.
    pub fn stage_timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout_seconds).map_err(|_| {
            ConfigError::Invalid(format!(
                "workflow.timeout_seconds out of range: {}",
                self.timeout_seconds
            ))
        })
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Create a new configuration builder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(env) = lookup("ENVIRONMENT") {
            builder = builder.environment(env.to_lowercase());
        }
        if let Some(value) = lookup("USE_MOCK_WORKFLOW") {
            builder = builder.use_mock(parse_bool("USE_MOCK_WORKFLOW", &value)?);
        }
        if let Some(value) = lookup("WORKFLOW_TIMEOUT_SECONDS") {
            builder = builder.timeout_seconds(parse_value("WORKFLOW_TIMEOUT_SECONDS", &value)?);
        }
        if let Some(value) = lookup("WORKFLOW_MAX_RETRIES") {
            builder = builder.max_retries(parse_value("WORKFLOW_MAX_RETRIES", &value)?);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            builder = builder.log_level(level.to_lowercase());
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            builder = builder.log_format(format.parse()?);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let timeout = self.workflow.timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "workflow.timeout_seconds must be a positive number, got {timeout}"
            )));
        }
        self.workflow.stage_timeout()?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".to_string()));
        }

        Ok(())
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    app_name: Option<String>,
    environment: Option<String>,
    use_mock: Option<bool>,
    timeout_seconds: Option<f64>,
    max_retries: Option<u32>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
}

impl AppConfigBuilder {
    /// Set the application name
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the environment name
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Select the direct (mock) execution strategy
    pub fn use_mock(mut self, use_mock: bool) -> Self {
        self.use_mock = Some(use_mock);
        self
    }

    /// Set the per-stage timeout in seconds
    pub fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Set the approval retry bound
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the default log level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Set the log output format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig> {
        let defaults = AppConfig::default();

        let config = AppConfig {
            app_name: self.app_name.unwrap_or(defaults.app_name),
            environment: self.environment.unwrap_or(defaults.environment),
            workflow: WorkflowConfig {
                use_mock: self.use_mock.unwrap_or(defaults.workflow.use_mock),
                timeout_seconds: self
                    .timeout_seconds
                    .unwrap_or(defaults.workflow.timeout_seconds),
                max_retries: self.max_retries.unwrap_or(defaults.workflow.max_retries),
            },
            logging: LoggingConfig {
                level: self.log_level.unwrap_or(defaults.logging.level),
                format: self.log_format.unwrap_or(defaults.logging.format),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.environment, "development");
        assert!(config.workflow.use_mock);
        assert_eq!(config.workflow.max_retries, 3);
        assert_eq!(
            config.workflow.stage_timeout().unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ENVIRONMENT", "Production"),
            ("USE_MOCK_WORKFLOW", "false"),
            ("WORKFLOW_TIMEOUT_SECONDS", "2.5"),
            ("WORKFLOW_MAX_RETRIES", "5"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert!(config.is_production());
        assert!(!config.workflow.use_mock);
        assert_eq!(
            config.workflow.stage_timeout().unwrap(),
            Duration::from_millis(2500)
        );
        assert_eq!(config.workflow.max_retries, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_env_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn test_malformed_values_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("USE_MOCK_WORKFLOW", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("USE_MOCK_WORKFLOW"));

        assert!(AppConfig::from_lookup(lookup(&[("WORKFLOW_MAX_RETRIES", "-1")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        assert!(AppConfig::builder().timeout_seconds(0.0).build().is_err());
        let nan = AppConfig::builder().timeout_seconds(f64::NAN).build();
        assert!(nan.is_err());
        assert!(AppConfig::builder().timeout_seconds(0.1).build().is_ok());
    }

    #[test]
    fn test_overflowing_timeout_rejected() {
        let err =
            AppConfig::from_lookup(lookup(&[("WORKFLOW_TIMEOUT_SECONDS", "1e20")])).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let workflow = WorkflowConfig {
            timeout_seconds: 1e20,
            ..WorkflowConfig::default()
        };
        assert!(workflow.stage_timeout().is_err());
    }
}
