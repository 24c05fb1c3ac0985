//! # lib_splash
//!
//! Page-bootstrap building blocks for a single-page application shell. The
//! centre of the crate is the [`core::orchestrator`] state machine that decides
//! when the initial loading screen may be dismissed; the remaining modules are
//! the single-shot collaborators that run during the same page load.
//!
//! Every module is gated behind a cargo feature named after its folder, all of
//! them enabled by the default `full` feature.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Layered configuration for orchestrator timings and phrases.
#[cfg(feature = "configs")]
pub mod configs;
/// Loading orchestrator, timers, event bus and the sync-block guard.
#[cfg(feature = "core")]
pub mod core;
/// Element and document abstraction.
#[cfg(feature = "dom")]
pub mod dom;
/// `tracing` subscriber setup.
#[cfg(feature = "loggers")]
pub mod loggers;
/// Exchange-rate retrieval.
#[cfg(feature = "markets")]
pub mod markets;
/// SPA redirect rewrite.
#[cfg(feature = "navigation")]
pub mod navigation;
/// Theme preference resolution.
#[cfg(feature = "preferences")]
pub mod preferences;
/// Generic HTTP client with retry middleware.
#[cfg(feature = "retrieve")]
pub mod retrieve;
