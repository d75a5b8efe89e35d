//! Fleet throughput and congestion counters.

use fg_core::Timestamp;

/// Raw counters.  They only ever grow for the life of the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetMetrics {
    pub started_at:          Timestamp,
    pub completed_tasks:     u64,
    pub total_completion_ms: u64,
    pub last_completion_ms:  Option<u64>,
    pub collisions_avoided:  u64,
    pub congestion_events:   u64,
}

impl FleetMetrics {
    pub fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            completed_tasks:     0,
            total_completion_ms: 0,
            last_completion_ms:  None,
            collisions_avoided:  0,
            congestion_events:   0,
        }
    }

    pub(crate) fn record_completion(&mut self, duration_ms: u64) {
        self.completed_tasks += 1;
        self.total_completion_ms += duration_ms;
        self.last_completion_ms = Some(duration_ms);
    }

    /// A blocked move counts once as an avoided collision and once as a
    /// congestion event.
    pub(crate) fn record_block(&mut self) {
        self.collisions_avoided += 1;
        self.congestion_events += 1;
    }

    /// Derived view as of `now`.
    pub fn snapshot(&self, now: Timestamp) -> MetricsSnapshot {
        let average_completion_ms = if self.completed_tasks > 0 {
            self.total_completion_ms as f64 / self.completed_tasks as f64
        } else {
            0.0
        };
        let elapsed_minutes = now.since(self.started_at) as f64 / 60_000.0;
        let tasks_per_minute = if elapsed_minutes > 0.0 {
            self.completed_tasks as f64 / elapsed_minutes
        } else {
            0.0
        };

        MetricsSnapshot {
            started_at: self.started_at,
            completed_tasks: self.completed_tasks,
            average_completion_ms,
            last_completion_ms: self.last_completion_ms,
            collisions_avoided: self.collisions_avoided,
            congestion_events: self.congestion_events,
            tasks_per_minute,
        }
    }
}

/// What observers see: the counters plus averages computed on read.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MetricsSnapshot {
    pub started_at:            Timestamp,
    pub completed_tasks:       u64,
    /// `total_completion_ms / completed_tasks`, or 0 before the first task.
    pub average_completion_ms: f64,
    pub last_completion_ms:    Option<u64>,
    pub collisions_avoided:    u64,
    pub congestion_events:     u64,
    /// Completed tasks per elapsed minute since `started_at`, or 0.
    pub tasks_per_minute:      f64,
}
