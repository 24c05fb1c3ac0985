//! # Configuration Modules
//!
//! Orchestrator timings and phrases, loaded from an optional JSON file layered
//! over built-in defaults.

/// `SplashConfig` and its more-config loader.
pub mod config_splash;

pub use config_splash::{load_splash_config, ConfigError, SplashConfig, CONFIG_PATH_ENV};
