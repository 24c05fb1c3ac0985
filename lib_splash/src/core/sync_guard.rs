//! # Sync-Block Guard
//!
//! A reference-counted flag that several independent callers can hold at the
//! same time, used to pause background wishlist synchronisation while the
//! page is doing something that would race with it.
//!
//! ## Contract
//! - [`SyncBlockManager::block`] raises the flag and returns a [`BlockHandle`].
//!   Each block also arms an auto-release timer so a caller that forgets to
//!   release cannot hold the flag forever.
//! - Releasing a handle (explicitly or through its timer) lowers the count.
//!   A handle releases at most once.
//! - The flag clears when the outstanding count reaches zero.
//! - [`SyncBlockManager::force_release`] cancels every pending timer and
//!   clears the flag unconditionally.
//!
//! The manager is injected where it is needed rather than living in a global;
//! readers go through [`SyncBlockManager::is_blocked`] or watch it with
//! [`SyncBlockManager::subscribe`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::timers::sleep_unless_cancelled;

/// Name of the wishlist sync flag.
pub const WISHLIST_SYNC_FLAG: &str = "blockWishlistSync";

/// Default auto-release delay for a block.
pub const DEFAULT_AUTO_RELEASE: Duration = Duration::from_millis(10_000);

#[derive(Debug, Default)]
struct BlockTable {
    outstanding: HashMap<u64, CancellationToken>,
    next_id: u64,
}

#[derive(Debug)]
struct Shared {
    name: String,
    table: Mutex<BlockTable>,
    flag: watch::Sender<bool>,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, BlockTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: u64) -> bool {
        let mut table = self.table();
        let Some(timer) = table.outstanding.remove(&id) else {
            return false;
        };
        timer.cancel();
        let remaining = table.outstanding.len();
        if remaining == 0 {
            self.flag.send_replace(false);
        }
        tracing::debug!(flag = %self.name, block = id, remaining, "sync block released");
        true
    }
}

/// Reference-counted guard over one named flag.
#[derive(Debug, Clone)]
pub struct SyncBlockManager {
    shared: Arc<Shared>,
    auto_release: Duration,
}

impl SyncBlockManager {
    /// A manager for `name` whose blocks auto-release after `auto_release`.
    pub fn new(name: &str, auto_release: Duration) -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                name: name.to_string(),
                table: Mutex::new(BlockTable::default()),
                flag,
            }),
            auto_release,
        }
    }

    /// The wishlist sync manager with the default auto-release delay.
    pub fn wishlist() -> Self {
        Self::new(WISHLIST_SYNC_FLAG, DEFAULT_AUTO_RELEASE)
    }

    /// Raises the flag and returns the handle that lowers it again.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime (the auto-release timer is a task).
    pub fn block(&self) -> BlockHandle {
        let timer = CancellationToken::new();
        let (id, outstanding) = {
            let mut table = self.shared.table();
            let id = table.next_id;
            table.next_id += 1;
            table.outstanding.insert(id, timer.clone());
            (id, table.outstanding.len())
        };
        if outstanding == 1 {
            self.shared.flag.send_replace(true);
        }
        tracing::debug!(flag = %self.shared.name, block = id, outstanding, "sync block acquired");

        let shared = Arc::clone(&self.shared);
        let delay = self.auto_release;
        tokio::spawn(async move {
            if sleep_unless_cancelled(delay, &timer).await && shared.release(id) {
                tracing::warn!(
                    flag = %shared.name,
                    block = id,
                    after_ms = delay.as_millis() as u64,
                    "sync block auto-released"
                );
            }
        });

        BlockHandle {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    /// Clears every outstanding block. Returns how many were cleared.
    pub fn force_release(&self) -> usize {
        let cleared = {
            let mut table = self.shared.table();
            let cleared = table.outstanding.len();
            for (_, timer) in table.outstanding.drain() {
                timer.cancel();
            }
            cleared
        };
        self.shared.flag.send_replace(false);
        tracing::info!(flag = %self.shared.name, cleared, "sync blocks force-released");
        cleared
    }

    /// Whether at least one block is outstanding.
    pub fn is_blocked(&self) -> bool {
        *self.shared.flag.borrow()
    }

    /// Number of outstanding blocks.
    pub fn outstanding(&self) -> usize {
        self.shared.table().outstanding.len()
    }

    /// Observes flag changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.flag.subscribe()
    }

    /// The flag name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

/// One outstanding block.
#[must_use = "an unreleased block keeps the flag raised until it auto-releases"]
#[derive(Debug)]
pub struct BlockHandle {
    shared: Arc<Shared>,
    id: u64,
}

impl BlockHandle {
    /// Releases this block. Returns `false` if it was already released,
    /// auto-released or force-released.
    pub fn release(&self) -> bool {
        self.shared.release(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn flag_clears_only_when_all_blocks_release() {
        let manager = SyncBlockManager::wishlist();
        let first = manager.block();
        let second = manager.block();
        assert!(manager.is_blocked());

        assert!(first.release());
        assert!(manager.is_blocked());
        assert_eq!(manager.outstanding(), 1);

        assert!(second.release());
        assert!(!manager.is_blocked());
    }

    #[tokio::test(start_paused = true)]
    async fn release_is_idempotent_per_handle() {
        let manager = SyncBlockManager::wishlist();
        let first = manager.block();
        let _second = manager.block();

        assert!(first.release());
        assert!(!first.release());
        assert!(manager.is_blocked());
        assert_eq!(manager.outstanding(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blocks_auto_release() {
        let manager = SyncBlockManager::new(WISHLIST_SYNC_FLAG, Duration::from_millis(10_000));
        let handle = manager.block();

        sleep(Duration::from_millis(9_999)).await;
        assert!(manager.is_blocked());

        sleep(Duration::from_millis(2)).await;
        assert!(!manager.is_blocked());
        assert!(!handle.release());
    }

    #[tokio::test(start_paused = true)]
    async fn force_release_clears_everything() {
        let manager = SyncBlockManager::wishlist();
        let first = manager.block();
        let second = manager.block();
        let mut flag = manager.subscribe();
        assert!(*flag.borrow_and_update());

        assert_eq!(manager.force_release(), 2);
        assert!(!manager.is_blocked());
        assert!(flag.has_changed().expect("sender alive"));
        assert!(!*flag.borrow_and_update());

        assert!(!first.release());
        assert!(!second.release());

        let third = manager.block();
        assert!(manager.is_blocked());
        assert!(third.release());
        assert!(!manager.is_blocked());
    }
}
