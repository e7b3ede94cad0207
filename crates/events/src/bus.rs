//! In-process board bus backed by `tokio::sync::broadcast` channels.
//!
//! [`BoardBus`] is the publish/subscribe hub for [`BoardDelta`]s. It is
//! designed to be shared via `Arc<BoardBus>` across the application.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use boardsync_core::delta::BoardDelta;
use boardsync_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BoardTopic
// ---------------------------------------------------------------------------

/// The pub/sub topic of one board. Displays as `board:{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardTopic(pub DbId);

impl fmt::Display for BoardTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "board:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BroadcastGateway
// ---------------------------------------------------------------------------

/// Fire-and-forget fan-out of deltas to a board's subscribers.
///
/// Callers publish while still holding the board's serialization unit, so
/// implementations must not block and must preserve per-topic call order.
/// Delivery failures are logged, never returned.
pub trait BroadcastGateway: Send + Sync {
    fn publish(&self, topic: BoardTopic, delta: &BoardDelta);
}

// ---------------------------------------------------------------------------
// BoardBus
// ---------------------------------------------------------------------------

/// Default buffer capacity of each board channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus with one broadcast channel per board.
///
/// Channels are created on first subscribe. When a channel's buffer is full
/// the oldest unconsumed deltas are dropped and slow receivers observe
/// `RecvError::Lagged`.
///
/// # Usage
///
/// ```rust
/// use boardsync_events::{BoardBus, BoardTopic};
///
/// let bus = BoardBus::default();
/// let _rx = bus.subscribe(BoardTopic(1));
/// assert_eq!(bus.subscriber_count(BoardTopic(1)), 1);
/// ```
pub struct BoardBus {
    capacity: usize,
    topics: RwLock<HashMap<BoardTopic, broadcast::Sender<BoardDelta>>>,
}

impl BoardBus {
    /// Create a bus whose board channels hold `capacity` deltas.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to every delta published on `topic` from now on.
    pub fn subscribe(&self, topic: BoardTopic) -> broadcast::Receiver<BoardDelta> {
        if let Some(sender) = self
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
        {
            return sender.subscribe();
        }

        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live receivers on `topic`.
    pub fn subscriber_count(&self, topic: BoardTopic) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of topics with a channel, live or idle.
    pub fn topic_count(&self) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop the channels of topics that no longer have receivers.
    ///
    /// Returns the number of topics removed.
    pub fn prune_idle(&self) -> usize {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        let before = topics.len();
        topics.retain(|_, sender| sender.receiver_count() > 0);
        before - topics.len()
    }
}

impl BroadcastGateway for BoardBus {
    fn publish(&self, topic: BoardTopic, delta: &BoardDelta) {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = topics.get(&topic) else {
            tracing::debug!(%topic, action_id = delta.action_id, "No subscribers for board topic");
            return;
        };

        match sender.send(delta.clone()) {
            Ok(receivers) => {
                tracing::debug!(%topic, action_id = delta.action_id, receivers, "Delta published");
            }
            // Only means every receiver has gone away since the last prune.
            Err(_) => {
                tracing::debug!(
                    %topic,
                    action_id = delta.action_id,
                    "Board topic has no live receivers",
                );
            }
        }
    }
}

impl Default for BoardBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
