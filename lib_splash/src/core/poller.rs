//! Shell-readiness poll: watches the application mount point until the
//! framework has rendered at least one child into it.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::timers::{RepeatingTimer, TickControl};
use crate::dom::Document;

/// Polls `mount_id` in `document` and calls `on_ready` once on the first poll
/// that finds a child element.
///
/// A missing mount point counts as "not rendered yet". The poll has no cap of
/// its own; it ends on success or when `token` is cancelled.
pub fn spawn_shell_poller<F>(
    document: Arc<dyn Document>,
    mount_id: &str,
    initial_delay: Duration,
    interval: Duration,
    token: CancellationToken,
    on_ready: F,
) -> RepeatingTimer
where
    F: FnOnce() + Send + 'static,
{
    let mount_id = mount_id.to_string();
    let mut on_ready = Some(on_ready);
    RepeatingTimer::start(initial_delay, interval, token, move || {
        let rendered = document
            .element_by_id(&mount_id)
            .is_some_and(|mount| mount.child_element_count() > 0);
        if !rendered {
            return TickControl::Continue;
        }

        tracing::debug!(mount = %mount_id, "application shell rendered");
        if let Some(callback) = on_ready.take() {
            callback();
        }
        TickControl::Stop
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{sleep, Instant};

    #[tokio::test(start_paused = true)]
    async fn fires_on_first_poll_after_render() {
        let document = Arc::new(MemoryDocument::new());
        let mount = document.insert("root", "");
        let ready_at = Arc::new(std::sync::Mutex::new(None));
        let ready_slot = Arc::clone(&ready_at);
        let started = Instant::now();

        let timer = spawn_shell_poller(
            Arc::clone(&document) as Arc<dyn Document>,
            "root",
            Duration::from_millis(500),
            Duration::from_millis(100),
            CancellationToken::new(),
            move || {
                *ready_slot.lock().expect("slot") = Some(Instant::now());
            },
        );

        sleep(Duration::from_millis(650)).await;
        mount.append_child();
        sleep(Duration::from_millis(500)).await;

        let ready_at = ready_at.lock().expect("slot").expect("shell ready");
        assert_eq!(ready_at - started, Duration::from_millis(700));
        assert!(timer.is_finished());
        // Polls at 500, 600 and 700.
        assert_eq!(mount.snapshot().child_queries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling_a_missing_mount_point() {
        let document = Arc::new(MemoryDocument::new());
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let token = CancellationToken::new();

        let timer = spawn_shell_poller(
            document as Arc<dyn Document>,
            "root",
            Duration::from_millis(500),
            Duration::from_millis(100),
            token.clone(),
            move || flag.store(true, Ordering::SeqCst),
        );

        sleep(Duration::from_millis(900)).await;
        token.cancel();
        sleep(Duration::from_millis(100)).await;

        assert!(timer.is_finished());
        assert!(!fired.load(Ordering::SeqCst));
    }
}
