//! # Application Event Bus
//!
//! Page-wide named events, the equivalent of `window.dispatchEvent` for the
//! few signals the bootstrap code cares about. Backed by a
//! `tokio::sync::broadcast` channel: every subscriber sees every event sent
//! after it subscribed, and events sent with no subscribers are dropped.

use tokio::sync::broadcast;

/// Wire name of the data-ready event.
pub const APP_DATA_LOADED: &str = "appDataLoaded";

const DEFAULT_CAPACITY: usize = 16;

/// Events dispatched by the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The initial data fetch finished.
    AppDataLoaded,
}

impl AppEvent {
    /// The event's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::AppDataLoaded => APP_DATA_LOADED,
        }
    }

    /// Parses a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            APP_DATA_LOADED => Some(AppEvent::AppDataLoaded),
            _ => None,
        }
    }
}

/// Cloneable handle to the process event bus.
#[derive(Debug, Clone)]
pub struct AppEvents {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for AppEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEvents {
    /// Creates a new bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Dispatches `event` and returns how many subscribers received it.
    pub fn emit(&self, event: AppEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = event.name(), receivers, "event dispatched");
                receivers
            }
            Err(_) => {
                tracing::debug!(event = event.name(), "event dispatched with no listeners");
                0
            }
        }
    }

    /// Subscribes to every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        assert_eq!(AppEvent::from_name("appDataLoaded"), Some(AppEvent::AppDataLoaded));
        assert_eq!(AppEvent::AppDataLoaded.name(), "appDataLoaded");
        assert_eq!(AppEvent::from_name("appDataLoading"), None);
    }

    #[tokio::test]
    async fn subscribers_only_see_later_events() {
        let events = AppEvents::new();
        assert_eq!(events.emit(AppEvent::AppDataLoaded), 0);

        let mut rx = events.subscribe();
        assert_eq!(events.emit(AppEvent::AppDataLoaded), 1);
        assert_eq!(rx.recv().await.expect("event"), AppEvent::AppDataLoaded);
        assert!(rx.try_recv().is_err());
    }
}
