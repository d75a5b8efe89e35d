//! Outbound events and the broadcast bus that carries them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use fg_fleet::{FleetSnapshot, MetricsSnapshot, Robot};
use fg_spatial::Cell;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Everything observers are told about the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FleetEvent {
    /// Full picture: sent on request, typically to a new subscriber.
    State {
        grid:    Vec<Vec<Cell>>,
        robots:  Vec<Robot>,
        metrics: MetricsSnapshot,
    },
    /// One grid cell changed.
    Cell {
        x:    i32,
        y:    i32,
        cell: Cell,
    },
    /// Robots or metrics changed.
    Fleet {
        robots:  Vec<Robot>,
        metrics: MetricsSnapshot,
    },
}

impl From<FleetSnapshot> for FleetEvent {
    fn from(snap: FleetSnapshot) -> Self {
        FleetEvent::State {
            grid:    snap.grid,
            robots:  snap.robots,
            metrics: snap.metrics,
        }
    }
}

impl FleetEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FleetEvent::State { .. } => "state",
            FleetEvent::Cell { .. } => "cell",
            FleetEvent::Fleet { .. } => "fleet",
        }
    }
}

// ── EventBus ──────────────────────────────────────────────────────────────────

/// Fan-out of [`FleetEvent`]s to any number of subscribers.
///
/// Publishing never blocks.  A subscriber that falls more than `capacity`
/// events behind loses the oldest ones and is told how many on its next
/// receive.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FleetEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to all current subscribers.  Returns how many received it.
    pub fn publish(&self, event: FleetEvent) -> usize {
        let kind = event.kind();
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(event = kind, receivers, "event published");
        receivers
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// One subscriber's view of the bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<FleetEvent>,
}

impl EventReceiver {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Result<FleetEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!(skipped = n, "event receiver lagged");
                EventBusError::Lagged(n)
            }
        })
    }

    /// Take the next event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<FleetEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!(skipped = n, "event receiver lagged");
                EventBusError::Lagged(n)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBusError {
    #[error("event bus is closed")]
    Closed,

    #[error("no events available")]
    Empty,

    #[error("receiver lagged by {0} events")]
    Lagged(u64),
}
