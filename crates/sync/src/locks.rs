//! Per-board serialization.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use boardsync_core::error::CoreError;
use boardsync_core::types::DbId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default bounded wait for a board guard.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(3000);

/// Held for the duration of one board operation, publish included.
pub type BoardGuard = OwnedMutexGuard<()>;

/// Registry of per-board async mutexes.
///
/// Operations on the same board run one at a time, in the order they
/// acquired the guard; different boards never contend. Entries are created
/// on demand and dropped by [`BoardLocks::prune_idle`] once nobody holds or
/// waits on them.
pub struct BoardLocks {
    timeout: Duration,
    locks: Mutex<HashMap<DbId, Arc<Mutex<()>>>>,
}

impl BoardLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait up to the configured timeout for the board's guard.
    pub async fn acquire(&self, board_id: DbId) -> Result<BoardGuard, CoreError> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(board_id).or_default())
        };

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                let waited_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(board_id, waited_ms, "Timed out waiting for board lock");
                Err(CoreError::Busy {
                    board_id,
                    waited_ms,
                })
            }
        }
    }

    /// Drop entries nobody holds or waits on. Returns how many were removed.
    pub async fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        // The map's own reference is the only one left on idle entries.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    /// Number of boards with a registry entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for BoardLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}
