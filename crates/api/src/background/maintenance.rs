//! Periodic pruning of idle board locks and subscriber-less topics.

use std::sync::Arc;
use std::time::Duration;

use boardsync_events::BoardBus;
use boardsync_sync::BoardLocks;
use tokio_util::sync::CancellationToken;

/// How often the pruner runs.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Counts from one pruning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub locks: usize,
    pub topics: usize,
}

/// Drop lock entries nobody holds and broadcast topics nobody reads.
pub async fn prune_once(locks: &BoardLocks, bus: &BoardBus) -> PruneReport {
    PruneReport {
        locks: locks.prune_idle().await,
        topics: bus.prune_idle(),
    }
}

/// Run the pruning loop until `cancel` is triggered.
pub async fn run(locks: Arc<BoardLocks>, bus: Arc<BoardBus>, cancel: CancellationToken) {
    tracing::info!(interval_secs = PRUNE_INTERVAL.as_secs(), "Board maintenance started");

    let mut interval = tokio::time::interval(PRUNE_INTERVAL);
    // The first tick completes immediately; nothing is idle yet at startup.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Board maintenance stopping");
                break;
            }
            _ = interval.tick() => {
                let report = prune_once(&locks, &bus).await;
                if report.locks > 0 || report.topics > 0 {
                    tracing::info!(
                        locks = report.locks,
                        topics = report.topics,
                        "Pruned idle board state",
                    );
                } else {
                    tracing::debug!("Board maintenance: nothing to prune");
                }
            }
        }
    }
}
