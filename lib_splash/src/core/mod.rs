//! # Core Engine Module
//!
//! The loading-screen state machine and the primitives it is built from.
//!
//! ## Core Components:
//!
//! - **`orchestrator`**: gates the loading screen on two readiness signals
//!   plus minimum-display and maximum-wait bounds, and drives the rotating
//!   status text.
//!
//! - **`poller`**: the shell-readiness poll that watches the mount point.
//!
//! - **`timers`**: repeating and one-shot timers tied to a
//!   `CancellationToken`, so a whole group can be stopped at once.
//!
//! - **`events`**: the page-wide event bus carrying `appDataLoaded`.
//!
//! - **`sync_guard`**: a reference-counted flag with auto-release timers,
//!   used to pause wishlist synchronisation.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Page-wide named events.
pub mod events;
/// The loading-screen state machine.
pub mod orchestrator;
/// Mount-point readiness poll.
pub mod poller;
/// Reference-counted sync-block guard.
pub mod sync_guard;
/// Cancellable timers.
pub mod timers;

// --- Public API Re-exports ---
pub use events::{AppEvent, AppEvents, APP_DATA_LOADED};
pub use orchestrator::{
    DismissReason, LoadingOrchestrator, OrchestratorPhase, OrchestratorSettings,
    OrchestratorState,
};
pub use sync_guard::{BlockHandle, SyncBlockManager};
pub use timers::{RepeatingTimer, TickControl};
