//! # Cancellable Timers
//!
//! Thin wrappers over `tokio::time` that tie every scheduled callback to a
//! [`CancellationToken`]. The orchestrator hands the same parent token to all
//! of its timers so a single `cancel()` at dismissal stops the ticker, the
//! max-wait timer and the shell poll together.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Returned by a repeating callback to decide whether the timer keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Schedule the next firing.
    Continue,
    /// Stop the timer; no further firings occur.
    Stop,
}

/// A periodic timer with a cancellation token.
///
/// The first firing happens after `first_delay`, then every `period`. The
/// callback runs to completion on each firing; a cancellation observed
/// between firings ends the task.
#[derive(Debug)]
pub struct RepeatingTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RepeatingTimer {
    /// Spawns the timer onto the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start<F>(
        first_delay: Duration,
        period: Duration,
        token: CancellationToken,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        // Deadline is fixed at call time, not when the task first gets polled.
        let start = Instant::now() + first_delay;
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(start, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticks.tick() => {
                        if on_tick() == TickControl::Stop {
                            break;
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    /// Cancels the timer. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the underlying task has exited (stopped or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Runs `on_fire` once after `delay` unless `token` is cancelled first.
///
/// # Panics
/// Panics if called outside a tokio runtime.
pub fn schedule_once<F>(delay: Duration, token: CancellationToken, on_fire: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    let deadline = Instant::now() + delay;
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = tokio::time::sleep_until(deadline) => on_fire(),
        }
    })
}

/// Sleeps for `delay`, returning `false` early if `token` is cancelled.
pub async fn sleep_unless_cancelled(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = sleep(delay) => true,
    }
}
