//! # Splash Configuration
//!
//! Orchestrator timings and phrases, layered from an optional JSON file over
//! built-in defaults with `more-config`. Keys are PascalCase
//! (`MinDisplayMs`, `StatusList`, ...) and matched case-insensitively.
//!
//! The file location comes from the caller or, failing that, from the
//! `SPLASH_CONFIG` environment variable. A configured but missing file is
//! not an error: the defaults apply.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt};

use config::{ext::*, *};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::orchestrator::OrchestratorSettings;
use crate::core::sync_guard::DEFAULT_AUTO_RELEASE;
use crate::markets::rates::DEFAULT_RATES_URL;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SPLASH_CONFIG";

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// more-config failed to read or parse the file.
    #[error("configuration could not be loaded: {0}")]
    Load(String),

    /// A key held a value of the wrong shape.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Lower-cased key as flattened from the file.
        key: String,
        /// The raw value.
        value: String,
    },

    /// A list that must have entries is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// An interval that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// `SPLASH_CONFIG` is set but not valid unicode.
    #[error("Environment variable error: {0}")]
    VarError(#[from] env::VarError),
}

/// Every tunable of the loading screen and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SplashConfig {
    /// Period of the status ticker.
    pub ticker_interval_ms: u64,
    /// Upper bound on the wait for readiness.
    pub max_wait_ms: u64,
    /// Minimum time the loading screen stays visible.
    pub min_display_ms: u64,
    /// Extra wait before hiding.
    pub grace_delay_ms: u64,
    /// Time between hiding and removal.
    pub transition_delay_ms: u64,
    /// Delay before the first shell poll.
    pub poll_initial_delay_ms: u64,
    /// Period of the shell poll.
    pub poll_interval_ms: u64,
    /// Auto-release delay for sync blocks.
    pub sync_auto_release_ms: u64,
    /// Ticker phrases; the last one is shown on completion.
    pub status_list: Vec<String>,
    /// Written when the shell is ready.
    pub shell_ready_text: String,
    /// Written when the data is ready.
    pub data_ready_text: String,
    /// Written on timeout dismissal.
    pub timeout_text: String,
    /// Rate API root; the base currency is appended.
    pub rates_base_url: String,
}

impl Default for SplashConfig {
    fn default() -> Self {
        let settings = OrchestratorSettings::default();
        Self {
            ticker_interval_ms: millis(settings.ticker_interval),
            max_wait_ms: millis(settings.max_wait),
            min_display_ms: millis(settings.min_display),
            grace_delay_ms: millis(settings.grace_delay),
            transition_delay_ms: millis(settings.transition_delay),
            poll_initial_delay_ms: millis(settings.poll_initial_delay),
            poll_interval_ms: millis(settings.poll_interval),
            sync_auto_release_ms: millis(DEFAULT_AUTO_RELEASE),
            status_list: settings.status_list,
            shell_ready_text: settings.shell_ready_text,
            data_ready_text: settings.data_ready_text,
            timeout_text: settings.timeout_text,
            rates_base_url: DEFAULT_RATES_URL.to_string(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl fmt::Display for SplashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SplashConfig
    Ticker interval: {}ms,
    Max wait: {}ms,
    Min display: {}ms (+{}ms grace, {}ms transition),
    Shell poll: first after {}ms, every {}ms,
    Sync auto-release: {}ms,
    Status list: {:?},
    Rates URL: {}
",
            self.ticker_interval_ms,
            self.max_wait_ms,
            self.min_display_ms,
            self.grace_delay_ms,
            self.transition_delay_ms,
            self.poll_initial_delay_ms,
            self.poll_interval_ms,
            self.sync_auto_release_ms,
            self.status_list,
            self.rates_base_url
        )
    }
}

impl SplashConfig {
    /// Rejects values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_list.is_empty() {
            return Err(ConfigError::Empty("StatusList"));
        }
        if self.ticker_interval_ms == 0 {
            return Err(ConfigError::Zero("TickerIntervalMs"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("PollIntervalMs"));
        }
        Ok(())
    }

    /// Orchestrator settings derived from this configuration.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            ticker_interval: Duration::from_millis(self.ticker_interval_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
            min_display: Duration::from_millis(self.min_display_ms),
            grace_delay: Duration::from_millis(self.grace_delay_ms),
            transition_delay: Duration::from_millis(self.transition_delay_ms),
            poll_initial_delay: Duration::from_millis(self.poll_initial_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            status_list: self.status_list.clone(),
            shell_ready_text: self.shell_ready_text.clone(),
            data_ready_text: self.data_ready_text.clone(),
            timeout_text: self.timeout_text.clone(),
        }
    }

    /// Auto-release delay for sync blocks.
    pub fn sync_auto_release(&self) -> Duration {
        Duration::from_millis(self.sync_auto_release_ms)
    }

    fn apply(&mut self, options: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        let numbers: [(&str, &mut u64); 8] = [
            ("tickerintervalms", &mut self.ticker_interval_ms),
            ("maxwaitms", &mut self.max_wait_ms),
            ("mindisplayms", &mut self.min_display_ms),
            ("gracedelayms", &mut self.grace_delay_ms),
            ("transitiondelayms", &mut self.transition_delay_ms),
            ("pollinitialdelayms", &mut self.poll_initial_delay_ms),
            ("pollintervalms", &mut self.poll_interval_ms),
            ("syncautoreleasems", &mut self.sync_auto_release_ms),
        ];
        for (key, slot) in numbers {
            if let Some(value) = options.get(key) {
                *slot = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
            }
        }

        let texts: [(&str, &mut String); 4] = [
            ("shellreadytext", &mut self.shell_ready_text),
            ("datareadytext", &mut self.data_ready_text),
            ("timeouttext", &mut self.timeout_text),
            ("ratesbaseurl", &mut self.rates_base_url),
        ];
        for (key, slot) in texts {
            if let Some(value) = options.get(key) {
                *slot = value.clone();
            }
        }

        let status_list = status_list_entries(options)?;
        if !status_list.is_empty() {
            self.status_list = status_list;
        }
        Ok(())
    }
}

/// Collects `StatusList:<n>` entries in index order.
fn status_list_entries(options: &BTreeMap<String, String>) -> Result<Vec<String>, ConfigError> {
    let mut entries: Vec<(usize, String)> = Vec::new();
    for (key, value) in options.range("statuslist:".to_string()..) {
        let Some(index) = key.strip_prefix("statuslist:") else {
            break;
        };
        let index = index.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.clone(),
            value: value.clone(),
        })?;
        entries.push((index, value.clone()));
    }
    entries.sort_by_key(|(index, _)| *index);
    Ok(entries.into_iter().map(|(_, value)| value).collect())
}

fn config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => Ok(Some(PathBuf::from(path))),
        Ok(_) | Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::VarError(e)),
    }
}

/// Flattens a JSON file into lower-cased `Section:Key` → value pairs.
fn read_options(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let file: String = path.to_string_lossy().to_string();
    let config_data: Box<dyn ConfigurationRoot> = DefaultConfigurationBuilder::new()
        .add_json_file(&file.is().optional())
        .build()
        .map_err(|e| ConfigError::Load(format!("{}: {:?}", file, e)))?;

    let mut options: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in config_data.iter(None) {
        options.insert(key.to_string().to_lowercase(), value.to_string());
    }
    Ok(options)
}

/// Loads the configuration from `path` (or `SPLASH_CONFIG`) over the defaults.
pub fn load_splash_config(path: Option<&Path>) -> Result<SplashConfig, ConfigError> {
    let mut config = SplashConfig::default();

    match config_path(path)? {
        Some(path) if path.is_file() => {
            let options = read_options(&path)?;
            config.apply(&options)?;
            tracing::debug!(path = %path.display(), keys = options.len(), "splash config loaded");
        }
        Some(path) => {
            tracing::info!(path = %path.display(), "splash config file not found, using defaults");
        }
        None => {}
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp config");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn defaults_match_reference_timings() {
        let config = SplashConfig::default();
        assert_eq!(config.ticker_interval_ms, 400);
        assert_eq!(config.max_wait_ms, 10_000);
        assert_eq!(config.min_display_ms, 1_000);
        assert_eq!(config.grace_delay_ms, 200);
        assert_eq!(config.transition_delay_ms, 300);
        assert_eq!(config.poll_initial_delay_ms, 500);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.sync_auto_release_ms, 10_000);
        assert_eq!(config.status_list.len(), 6);
        assert_eq!(config.orchestrator_settings(), OrchestratorSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"{
                "MaxWaitMs": 5000,
                "MinDisplayMs": 1500,
                "TimeoutText": "Took too long",
                "StatusList": ["One", "Two", "Three"]
            }"#,
        );

        let config = load_splash_config(Some(file.path())).expect("config");
        assert_eq!(config.max_wait_ms, 5_000);
        assert_eq!(config.min_display_ms, 1_500);
        assert_eq!(config.timeout_text, "Took too long");
        assert_eq!(config.status_list, vec!["One", "Two", "Three"]);
        assert_eq!(config.ticker_interval_ms, 400);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_splash_config(Some(&dir.path().join("absent.json"))).expect("config");
        assert_eq!(config, SplashConfig::default());
    }

    #[test]
    fn non_numeric_timing_is_rejected() {
        let file = write_config(r#"{ "TickerIntervalMs": "soon" }"#);
        let err = load_splash_config(Some(file.path())).expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tickerintervalms"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let file = write_config(r#"{ "PollIntervalMs": 0 }"#);
        let err = load_splash_config(Some(file.path())).expect_err("invalid");
        assert!(matches!(err, ConfigError::Zero("PollIntervalMs")));
    }

    #[test]
    fn empty_status_list_fails_validation() {
        let config = SplashConfig {
            status_list: Vec::new(),
            ..SplashConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Empty("StatusList"))));
    }

    #[test]
    fn serde_names_match_file_keys() {
        let json = r#"{ "GraceDelayMs": 50, "StatusList": ["a", "b"] }"#;
        let from_serde: SplashConfig = serde_json::from_str(json).expect("serde");
        let file = write_config(json);
        let from_file = load_splash_config(Some(file.path())).expect("file");
        assert_eq!(from_serde, from_file);
    }
}
