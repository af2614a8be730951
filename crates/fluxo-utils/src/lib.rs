//! Shared utilities for fluxo
//!
//! This crate provides common functionality used across the fluxo workspace:
//! logging setup and configuration management.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, AppConfigBuilder, ConfigError, LogFormat, LoggingConfig, WorkflowConfig,
};
pub use logging::{init_tracing, init_tracing_with};
