use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use lib_splash::configs::SplashConfig;
use lib_splash::core::orchestrator::{LOADING_SCREEN_ID, MOUNT_POINT_ID, STATUS_TEXT_ID};
use lib_splash::core::sync_guard::WISHLIST_SYNC_FLAG;
use lib_splash::core::{
    AppEvent, AppEvents, DismissReason, LoadingOrchestrator, OrchestratorPhase, SyncBlockManager,
};
use lib_splash::dom::{Document, MemoryDocument};
use lib_splash::markets::ExchangeRates;
use lib_splash::navigation::{rewrite_spa_redirect, History};
use lib_splash::preferences::theme::{FixedColorScheme, MemoryPreferences, THEME_COLOR_META, THEME_KEY};
use lib_splash::preferences::{init_theme, Theme};
use tokio::time::{sleep, Instant};

use super::config::SimConfig;

/// What one simulated page load did.
#[derive(Debug)]
pub struct PageReport {
    pub theme: Theme,
    pub redirected_to: Option<String>,
    pub reason: DismissReason,
    pub currencies: Option<usize>,
    pub status_history: Vec<String>,
    pub elapsed: Duration,
}

struct LoggedHistory;

impl History for LoggedHistory {
    fn replace_state(&self, path: &str) {
        tracing::info!(path, "history.replaceState");
    }
}

/// Loads a fake page: theme, redirect, orchestrator, then shell and data on their own schedules.
pub async fn simulate(sim: &SimConfig, splash: &SplashConfig) -> Result<PageReport> {
    let started = Instant::now();
    let settings = splash.orchestrator_settings();

    let document = Arc::new(MemoryDocument::new());
    let first_phrase = settings.status_list.first().cloned().unwrap_or_default();
    let status_text = document.insert(STATUS_TEXT_ID, &first_phrase);
    document.insert(LOADING_SCREEN_ID, "");
    let mount = document.insert(MOUNT_POINT_ID, "");
    document.insert_meta(THEME_COLOR_META, Theme::Light.theme_color());

    let mut preferences = MemoryPreferences::new();
    if let Some(theme) = &sim.theme {
        preferences = preferences.with(THEME_KEY, theme);
    }
    let theme = init_theme(&preferences, &FixedColorScheme(sim.prefers_dark), document.as_ref());

    let redirected_to = sim
        .url
        .as_deref()
        .and_then(|url| rewrite_spa_redirect(url, &LoggedHistory));

    let events = AppEvents::new();
    let orchestrator = LoadingOrchestrator::attach(
        Arc::clone(&document) as Arc<dyn Document>,
        &events,
        settings,
    )
    .ok_or_else(|| anyhow!("loading screen elements missing"))?;

    let timeline = tokio::spawn(log_timeline(orchestrator.clone(), started));

    let shell_delay = Duration::from_millis(sim.shell_delay_ms.unwrap_or_default());
    tokio::spawn(async move {
        sleep(shell_delay).await;
        mount.append_child();
        tracing::info!(at_ms = started.elapsed().as_millis() as u64, "shell rendered");
    });

    let data = tokio::spawn(load_data(sim.clone(), splash.clone(), events.clone(), started));

    orchestrator.removed().await;
    let currencies = data.await.map_err(|e| anyhow!("data task failed: {e}"))?;
    let _ = timeline.await;

    let reason = orchestrator
        .dismiss_reason()
        .ok_or_else(|| anyhow!("loading screen removed without dismissal"))?;

    Ok(PageReport {
        theme,
        redirected_to,
        reason,
        currencies,
        status_history: status_text.texts(),
        elapsed: started.elapsed(),
    })
}

async fn load_data(sim: SimConfig, splash: SplashConfig, events: AppEvents, started: Instant) -> Option<usize> {
    let sync = SyncBlockManager::new(WISHLIST_SYNC_FLAG, splash.sync_auto_release());
    let block = sync.block();

    sleep(Duration::from_millis(sim.data_delay_ms.unwrap_or_default())).await;

    let currencies = if sim.fetch_rates {
        let base = sim.base_currency.as_deref().unwrap_or_default();
        match ExchangeRates::new(&splash.rates_base_url) {
            Ok(client) => Some(client.fetch_exchange_rates(base).await.len()),
            Err(e) => {
                tracing::error!(error = %e, "rate client unavailable");
                Some(0)
            }
        }
    } else {
        None
    };

    if !block.release() {
        tracing::warn!(flag = sync.name(), "sync block was already auto-released");
    }
    events.emit(AppEvent::AppDataLoaded);
    tracing::info!(at_ms = started.elapsed().as_millis() as u64, ?currencies, "data loaded");
    currencies
}

async fn log_timeline(orchestrator: LoadingOrchestrator, started: Instant) {
    let mut phases = orchestrator.subscribe_phase();
    loop {
        let phase = *phases.borrow_and_update();
        tracing::info!(at_ms = started.elapsed().as_millis() as u64, ?phase, "loading screen phase");
        if phase == OrchestratorPhase::Removed || phases.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(shell_delay_ms: u64, data_delay_ms: u64) -> SimConfig {
        SimConfig {
            url: Some("https://shop.example.com/?redirect=%2Fwishlist".to_string()),
            shell_delay_ms: Some(shell_delay_ms),
            data_delay_ms: Some(data_delay_ms),
            theme: Some("dark".to_string()),
            ..SimConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_page_completes_after_minimum_display() {
        let report = simulate(&sim(300, 400), &SplashConfig::default())
            .await
            .expect("page load");

        assert_eq!(report.reason, DismissReason::Completed);
        assert_eq!(report.theme, Theme::Dark);
        assert_eq!(report.redirected_to.as_deref(), Some("/wishlist"));
        assert_eq!(report.currencies, None);
        // 1000ms minimum display + 200ms grace + 300ms transition
        assert!(report.elapsed >= Duration::from_millis(1500));
        assert_eq!(report.status_history.last().map(String::as_str), Some("Ready!"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_data_times_out() {
        let splash = SplashConfig {
            max_wait_ms: 2000,
            ..SplashConfig::default()
        };
        let report = simulate(&sim(100, 5000), &splash).await.expect("page load");

        assert_eq!(report.reason, DismissReason::Timeout);
        assert_eq!(
            report.status_history.last().map(String::as_str),
            Some(splash.timeout_text.as_str())
        );
    }
}
