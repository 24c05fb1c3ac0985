//! # Loading Orchestrator
//!
//! Decides when the initial loading screen may be dismissed. Two readiness
//! signals arrive independently and in any order:
//!
//! - **shell ready**: the mount point has been rendered into (polled, see
//!   [`crate::core::poller`]),
//! - **data ready**: the application dispatched `appDataLoaded` on the
//!   [`AppEvents`] bus, or a caller invoked [`LoadingOrchestrator::mark_data_ready`].
//!
//! The first time both are set the screen is dismissed with
//! [`DismissReason::Completed`]. If the max-wait timer fires first it is
//! dismissed with [`DismissReason::Timeout`]. Either way dismissal happens at
//! most once, and the hide transition never starts before the configured
//! minimum display time has elapsed since attach.
//!
//! While waiting, a ticker walks through the status phrases so the user sees
//! progress. Once a readiness signal has written its own phrase the ticker
//! keeps counting but stops writing, so the display never steps backwards.
//!
//! ## Lifecycle
//! `Loading → Dismissed(reason) → Hidden → Removed`, observable through
//! [`LoadingOrchestrator::subscribe_phase`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::events::{AppEvent, AppEvents};
use crate::core::poller::spawn_shell_poller;
use crate::core::timers::{schedule_once, RepeatingTimer, TickControl};
use crate::dom::{Document, Element};

/// Id of the status-text element.
pub const STATUS_TEXT_ID: &str = "initial-loading-text";
/// Id of the loading-screen container.
pub const LOADING_SCREEN_ID: &str = "initial-loading-screen";
/// Id of the application mount point.
pub const MOUNT_POINT_ID: &str = "root";

/// Default status phrases, shown in order by the ticker.
pub const DEFAULT_STATUS_LIST: [&str; 6] = [
    "Starting up…",
    "Loading resources…",
    "Preparing interface…",
    "Connecting to server…",
    "Almost there…",
    "Ready!",
];

/// Timings and phrases for one orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Period of the status ticker.
    pub ticker_interval: Duration,
    /// Upper bound on the wait for readiness.
    pub max_wait: Duration,
    /// Minimum time the loading screen stays visible after attach.
    pub min_display: Duration,
    /// Extra wait after the minimum display time before hiding.
    pub grace_delay: Duration,
    /// Time between hiding and removing, for the CSS transition.
    pub transition_delay: Duration,
    /// Delay before the first shell poll.
    pub poll_initial_delay: Duration,
    /// Period of the shell poll.
    pub poll_interval: Duration,
    /// Ticker phrases; the last one doubles as the "completed" phrase.
    pub status_list: Vec<String>,
    /// Written when the shell is ready.
    pub shell_ready_text: String,
    /// Written when the data is ready.
    pub data_ready_text: String,
    /// Written when dismissal happens through the max-wait timer.
    pub timeout_text: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            ticker_interval: Duration::from_millis(400),
            max_wait: Duration::from_millis(10_000),
            min_display: Duration::from_millis(1_000),
            grace_delay: Duration::from_millis(200),
            transition_delay: Duration::from_millis(300),
            poll_initial_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            status_list: DEFAULT_STATUS_LIST.iter().map(|s| s.to_string()).collect(),
            shell_ready_text: "Loading data…".to_string(),
            data_ready_text: "Data loaded".to_string(),
            timeout_text: "Loading finished".to_string(),
        }
    }
}

impl OrchestratorSettings {
    fn last_status_index(&self) -> usize {
        self.status_list.len().saturating_sub(1)
    }

    fn completed_text(&self) -> &str {
        self.status_list.last().map(String::as_str).unwrap_or_default()
    }
}

/// Why the loading screen was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// Both readiness signals arrived.
    Completed,
    /// The max-wait timer fired first.
    Timeout,
}

/// Observable lifecycle of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorPhase {
    /// Waiting for readiness.
    Loading,
    /// Dismissal started; the hide transition is scheduled.
    Dismissed(DismissReason),
    /// The loading surface is hidden.
    Hidden,
    /// The loading surface is removed from the document.
    Removed,
}

/// Mutable orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorState {
    /// Index of the last phrase the ticker reached. Never decreases.
    pub current_status_index: usize,
    /// When the orchestrator was attached.
    pub started_at: Instant,
    /// Shell readiness flag.
    pub react_ready: bool,
    /// Data readiness flag.
    pub data_ready: bool,
    /// Set exactly once, at dismissal.
    pub dismissed: Option<DismissReason>,
    status_pinned: bool,
}

impl OrchestratorState {
    /// Fresh state at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self {
            current_status_index: 0,
            started_at,
            react_ready: false,
            data_ready: false,
            dismissed: None,
            status_pinned: false,
        }
    }

    /// Moves the status index one step towards `last_index`.
    ///
    /// Returns the new index, or `None` at the ceiling.
    pub fn advance(&mut self, last_index: usize) -> Option<usize> {
        if self.current_status_index >= last_index {
            return None;
        }
        self.current_status_index += 1;
        Some(self.current_status_index)
    }

    /// True once both readiness flags are set.
    pub fn is_ready(&self) -> bool {
        self.react_ready && self.data_ready
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Shell,
    Data,
}

struct Inner {
    settings: OrchestratorSettings,
    state: Mutex<OrchestratorState>,
    status_text: Arc<dyn Element>,
    surface: Arc<dyn Element>,
    timers: CancellationToken,
    phase_tx: watch::Sender<OrchestratorPhase>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) {
        let mut state = self.state();
        if state.dismissed.is_some() {
            return;
        }
        let Some(index) = state.advance(self.settings.last_status_index()) else {
            return;
        };
        if !state.status_pinned {
            self.status_text
                .set_text_content(&self.settings.status_list[index]);
        }
        tracing::trace!(index, pinned = state.status_pinned, "status ticker advanced");
    }
}

/// Handle to an attached orchestrator. Cheap to clone.
#[derive(Clone)]
pub struct LoadingOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LoadingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingOrchestrator")
            .field("state", &*self.inner.state())
            .field("phase", &*self.inner.phase_tx.borrow())
            .finish()
    }
}

impl LoadingOrchestrator {
    /// Attaches to `document` and starts the ticker, the max-wait timer, the
    /// shell poll and the `appDataLoaded` listener.
    ///
    /// Returns `None` without scheduling anything if the status-text or the
    /// loading-screen element is missing, or if `status_list` is empty.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn attach(
        document: Arc<dyn Document>,
        events: &AppEvents,
        settings: OrchestratorSettings,
    ) -> Option<Self> {
        let Some(status_text) = document.element_by_id(STATUS_TEXT_ID) else {
            tracing::debug!(id = STATUS_TEXT_ID, "status text element missing, orchestrator disabled");
            return None;
        };
        let Some(surface) = document.element_by_id(LOADING_SCREEN_ID) else {
            tracing::debug!(id = LOADING_SCREEN_ID, "loading screen missing, orchestrator disabled");
            return None;
        };
        if settings.status_list.is_empty() {
            tracing::warn!("empty status list, orchestrator disabled");
            return None;
        }

        let (phase_tx, _) = watch::channel(OrchestratorPhase::Loading);
        let orchestrator = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(OrchestratorState::new(Instant::now())),
                status_text,
                surface,
                timers: CancellationToken::new(),
                phase_tx,
                settings,
            }),
        };

        orchestrator.start_ticker();
        orchestrator.start_max_wait();
        orchestrator.start_shell_poll(document);
        orchestrator.listen_for_data(events.subscribe());

        tracing::info!(
            max_wait_ms = orchestrator.inner.settings.max_wait.as_millis() as u64,
            min_display_ms = orchestrator.inner.settings.min_display.as_millis() as u64,
            "loading orchestrator attached"
        );
        Some(orchestrator)
    }

    fn start_ticker(&self) {
        let inner = Arc::clone(&self.inner);
        let period = self.inner.settings.ticker_interval;
        RepeatingTimer::start(period, period, self.inner.timers.child_token(), move || {
            inner.tick();
            TickControl::Continue
        });
    }

    fn start_max_wait(&self) {
        let orchestrator = self.clone();
        schedule_once(
            self.inner.settings.max_wait,
            self.inner.timers.child_token(),
            move || {
                orchestrator.dismiss(DismissReason::Timeout);
            },
        );
    }

    fn start_shell_poll(&self, document: Arc<dyn Document>) {
        let orchestrator = self.clone();
        spawn_shell_poller(
            document,
            MOUNT_POINT_ID,
            self.inner.settings.poll_initial_delay,
            self.inner.settings.poll_interval,
            self.inner.timers.child_token(),
            move || orchestrator.mark_shell_ready(),
        );
    }

    fn listen_for_data(&self, mut events: broadcast::Receiver<AppEvent>) {
        let orchestrator = self.clone();
        let token = self.inner.timers.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(AppEvent::AppDataLoaded) => {
                            orchestrator.mark_data_ready();
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    /// Records that the initial data is available.
    pub fn mark_data_ready(&self) {
        self.signal(Readiness::Data);
    }

    /// Records that the application shell has rendered.
    pub fn mark_shell_ready(&self) {
        self.signal(Readiness::Shell);
    }

    fn signal(&self, readiness: Readiness) {
        let ready = {
            let mut state = self.inner.state();
            if state.dismissed.is_some() {
                tracing::debug!(?readiness, "readiness signal after dismissal ignored");
                return;
            }
            let text = match readiness {
                Readiness::Shell => {
                    state.react_ready = true;
                    &self.inner.settings.shell_ready_text
                }
                Readiness::Data => {
                    state.data_ready = true;
                    &self.inner.settings.data_ready_text
                }
            };
            state.status_pinned = true;
            self.inner.status_text.set_text_content(text);
            tracing::debug!(
                ?readiness,
                react_ready = state.react_ready,
                data_ready = state.data_ready,
                "readiness signal"
            );
            state.is_ready()
        };

        if ready {
            self.dismiss(DismissReason::Completed);
        }
    }

    /// Starts dismissal. Only the first call has an effect; returns whether
    /// this call was it.
    ///
    /// Cancels every outstanding timer, writes the final phrase, then hides
    /// the loading surface once the minimum display time plus grace delay has
    /// passed and removes it after the transition delay. The hide/remove
    /// sequence is not cancellable.
    pub fn dismiss(&self, reason: DismissReason) -> bool {
        let (hide_after, elapsed) = {
            let mut state = self.inner.state();
            if state.dismissed.is_some() {
                return false;
            }
            state.dismissed = Some(reason);
            self.inner.timers.cancel();

            let settings = &self.inner.settings;
            let text = match reason {
                DismissReason::Completed => settings.completed_text(),
                DismissReason::Timeout => settings.timeout_text.as_str(),
            };
            self.inner.status_text.set_text_content(text);

            let elapsed = Instant::now().saturating_duration_since(state.started_at);
            let remaining = settings.min_display.saturating_sub(elapsed);
            (remaining + settings.grace_delay, elapsed)
        };

        match reason {
            DismissReason::Completed => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                hide_in_ms = hide_after.as_millis() as u64,
                "loading completed, dismissing"
            ),
            DismissReason::Timeout => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "readiness wait timed out, dismissing anyway"
            ),
        }
        self.inner.phase_tx.send_replace(OrchestratorPhase::Dismissed(reason));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            sleep(hide_after).await;
            inner.surface.set_hidden(true);
            inner.phase_tx.send_replace(OrchestratorPhase::Hidden);
            tracing::debug!("loading screen hidden");

            sleep(inner.settings.transition_delay).await;
            inner.surface.remove();
            inner.phase_tx.send_replace(OrchestratorPhase::Removed);
            tracing::info!("loading screen removed");
        });
        true
    }

    /// Copy of the current state.
    pub fn state(&self) -> OrchestratorState {
        self.inner.state().clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> OrchestratorPhase {
        *self.inner.phase_tx.borrow()
    }

    /// Receiver that observes every phase change.
    pub fn subscribe_phase(&self) -> watch::Receiver<OrchestratorPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// The dismissal reason, once dismissed.
    pub fn dismiss_reason(&self) -> Option<DismissReason> {
        self.inner.state().dismissed
    }

    /// Waits until the loading surface has been removed.
    pub async fn removed(&self) {
        let mut phases = self.subscribe_phase();
        // The sender lives in `self.inner`, so the channel cannot close here.
        let _ = phases
            .wait_for(|phase| *phase == OrchestratorPhase::Removed)
            .await;
    }

    /// Waits until dismissal has started and returns its reason.
    pub async fn dismissed(&self) -> DismissReason {
        let mut phases = self.subscribe_phase();
        loop {
            if let Some(reason) = self.dismiss_reason() {
                return reason;
            }
            if phases.changed().await.is_err() {
                // Unreachable while `self` holds the sender; fall back to timeout.
                return DismissReason::Timeout;
            }
        }
    }

    /// Time remaining until the max-wait deadline, zero once it has passed.
    pub fn time_until_timeout(&self) -> Duration {
        let state = self.inner.state();
        let deadline = state.started_at + self.inner.settings.max_wait;
        deadline.saturating_duration_since(Instant::now())
    }
}
