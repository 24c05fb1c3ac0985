use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use lib_splash::configs::{load_splash_config, SplashConfig};
use lib_splash::loggers::{setup_logging, LoggerGuard, LoggerLocalOptions};
use serde::{Deserialize, Serialize};

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Simulates one page load behind the initial loading screen", version)]
#[serde(rename_all = "camelCase")]
pub struct SimConfig {
    #[clap(long, env = "SPLASH_CONFIG", help = "Path to the JSON splash configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "SPLASH_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "SPLASH_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "SPLASH_URL", help = "Page URL at load, e.g. https://host/?redirect=%2Fitems.")]
    pub url: Option<String>,

    #[clap(long, env = "SPLASH_SHELL_DELAY_MS", help = "Milliseconds until the application shell renders.")]
    pub shell_delay_ms: Option<u64>,

    #[clap(long, env = "SPLASH_DATA_DELAY_MS", help = "Milliseconds until the initial data is loaded.")]
    pub data_delay_ms: Option<u64>,

    #[clap(long, env = "SPLASH_FETCH_RATES", help = "Fetch real exchange rates as part of the data load.")]
    #[serde(default)]
    pub fetch_rates: bool,

    #[clap(long, env = "SPLASH_BASE_CURRENCY", help = "Base currency for the rate fetch.")]
    pub base_currency: Option<String>,

    #[clap(long, env = "SPLASH_THEME", help = "Stored theme preference (dark, light).")]
    pub theme: Option<String>,

    #[clap(long, env = "SPLASH_PREFERS_DARK", help = "Pretend the OS prefers a dark colour scheme.")]
    #[serde(default)]
    pub prefers_dark: bool,

    #[clap(long, env = "SPLASH_MAX_WAIT_MS", help = "Overrides MaxWaitMs from the configuration file.")]
    pub max_wait_ms: Option<u64>,

    #[clap(long, env = "SPLASH_MIN_DISPLAY_MS", help = "Overrides MinDisplayMs from the configuration file.")]
    pub min_display_ms: Option<u64>,

    #[clap(long, help = "Print the effective splash configuration as JSON and exit.")]
    #[serde(skip)]
    pub print_config: bool,
}

impl SimConfig {
    // 'other' wins for Some values and set flags
    fn merge(self, other: SimConfig) -> SimConfig {
        SimConfig {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            url: other.url.or(self.url),
            shell_delay_ms: other.shell_delay_ms.or(self.shell_delay_ms),
            data_delay_ms: other.data_delay_ms.or(self.data_delay_ms),
            fetch_rates: other.fetch_rates || self.fetch_rates,
            base_currency: other.base_currency.or(self.base_currency),
            theme: other.theme.or(self.theme),
            prefers_dark: other.prefers_dark || self.prefers_dark,
            max_wait_ms: other.max_wait_ms.or(self.max_wait_ms),
            min_display_ms: other.min_display_ms.or(self.min_display_ms),
            print_config: other.print_config || self.print_config,
        }
    }

    fn defaults() -> SimConfig {
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join("splash_sim").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"));

        SimConfig {
            log_dir: Some(log_dir),
            log_level: Some("info".to_string()),
            url: Some("http://localhost:5173/".to_string()),
            shell_delay_ms: Some(800),
            data_delay_ms: Some(1500),
            base_currency: Some("RUB".to_string()),
            ..Default::default()
        }
    }

    /// The splash configuration from the file, with CLI timing overrides applied.
    pub fn splash_config(&self) -> Result<SplashConfig> {
        let mut splash = load_splash_config(self.config_path.as_deref())?;
        if let Some(max_wait_ms) = self.max_wait_ms {
            splash.max_wait_ms = max_wait_ms;
        }
        if let Some(min_display_ms) = self.min_display_ms {
            splash.min_display_ms = min_display_ms;
        }
        splash.validate()?;
        Ok(splash)
    }
}

/// Installs logging, then loads the splash configuration so its own events
/// (file found, file missing) reach the log.
pub fn start(sim: &SimConfig, app_name: &str) -> Result<(LoggerGuard, SplashConfig)> {
    let guard = setup_logging(
        app_name,
        &LoggerLocalOptions {
            level: sim.log_level.clone().unwrap_or_else(|| "info".to_string()),
            log_dir: sim.log_dir.clone(),
            keep_files: 1,
        },
    )?;
    let splash = sim.splash_config()?;
    tracing::info!("{}", splash);
    Ok((guard, splash))
}

/// Built-in defaults overridden by environment variables and CLI arguments.
pub fn resolve(cli: SimConfig) -> SimConfig {
    SimConfig::defaults().merge(cli)
}

pub fn load_config() -> SimConfig {
    resolve(SimConfig::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_values_override_defaults() {
        let cli = SimConfig::try_parse_from([
            "splash_sim",
            "--shell-delay-ms",
            "50",
            "--fetch-rates",
            "--url",
            "https://shop.example.com/?redirect=%2Fitems",
        ])
        .expect("cli");

        let config = resolve(cli);
        assert_eq!(config.shell_delay_ms, Some(50));
        assert_eq!(config.data_delay_ms, Some(1500));
        assert!(config.fetch_rates);
        assert_eq!(config.url.as_deref(), Some("https://shop.example.com/?redirect=%2Fitems"));
        assert_eq!(config.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn config_loading_is_logged_to_file() {
        let logs = tempfile::tempdir().expect("log dir");
        let configs = tempfile::tempdir().expect("config dir");
        let sim = SimConfig {
            config_path: Some(configs.path().join("missing.json")),
            log_dir: Some(logs.path().to_path_buf()),
            log_level: Some("info".to_string()),
            ..SimConfig::default()
        };

        let (guard, splash) = start(&sim, "splash_sim_test").expect("start");
        assert_eq!(splash, SplashConfig::default());
        let log_file = guard.log_file().expect("file logging").to_path_buf();
        drop(guard);

        let contents = std::fs::read_to_string(log_file).expect("read log");
        assert!(contents.contains("splash config file not found"), "{contents}");
    }

    #[test]
    fn timing_overrides_apply_over_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp config");
        file.write_all(br#"{ "MaxWaitMs": 4000, "MinDisplayMs": 700 }"#)
            .expect("write config");

        let config = SimConfig {
            config_path: Some(file.path().to_path_buf()),
            max_wait_ms: Some(2500),
            ..SimConfig::default()
        };
        let splash = config.splash_config().expect("splash config");
        assert_eq!(splash.max_wait_ms, 2500);
        assert_eq!(splash.min_display_ms, 700);
    }
}
