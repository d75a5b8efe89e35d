//! Per-robot task and route state.

use fg_core::{Position, RobotId, Timestamp};

/// Cells per simulated second when a robot is created without a speed.
pub const DEFAULT_SPEED: f64 = 1.0;

// ── RobotSpec ─────────────────────────────────────────────────────────────────

/// What a caller supplies to create a robot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotSpec {
    pub id: RobotId,
    pub name: String,
    pub position: Position,
    /// Defaults to `position`, i.e. the robot starts idle.
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: Option<Position>,
    /// Defaults to [`DEFAULT_SPEED`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub speed: Option<f64>,
}

impl RobotSpec {
    pub fn new(id: impl Into<RobotId>, name: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            target: None,
            speed: None,
        }
    }

    pub fn target(mut self, target: Position) -> Self {
        self.target = Some(target);
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

// ── Robot ─────────────────────────────────────────────────────────────────────

/// A managed robot.
///
/// `path` runs from the robot's position (at the time it was computed) to
/// `target`, both inclusive.  It is empty exactly when no route existed at
/// `last_calculated`; it may go stale as the grid changes until the next
/// recalculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Robot {
    pub id: RobotId,
    pub name: String,
    pub position: Position,
    pub target: Position,

    /// Cells per simulated second.  Always `> 0`.
    pub speed: f64,

    pub path: Vec<Position>,

    /// Index into `path` of the next waypoint to step toward.  Kept within
    /// `[0, path.len() - 1]` (0 for an empty path).
    pub path_index: usize,

    /// Unspent fraction of a step carried into the next tick, in `[0, 1)`.
    pub movement_remainder: f64,

    /// When the current target was assigned (or the last one was reached).
    pub task_started_at: Timestamp,

    /// When `path` was last computed.
    pub last_calculated: Timestamp,
}

impl Robot {
    /// Build the initial record for `spec`.  The path is left empty; the
    /// fleet computes it before storing the robot.
    pub fn from_spec(spec: RobotSpec, now: Timestamp) -> Self {
        Self {
            target: spec.target.unwrap_or(spec.position),
            speed: spec.speed.unwrap_or(DEFAULT_SPEED),
            id: spec.id,
            name: spec.name,
            position: spec.position,
            path: Vec::new(),
            path_index: 0,
            movement_remainder: 0.0,
            task_started_at: now,
            last_calculated: now,
        }
    }

    #[inline]
    pub fn at_target(&self) -> bool {
        self.position == self.target
    }

    #[inline]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// The waypoint at `path_index`, if any.
    #[inline]
    pub fn next_waypoint(&self) -> Option<Position> {
        self.path.get(self.path_index).copied()
    }

    /// `true` if `cell` is on the route or is the robot's position or target.
    pub fn touches(&self, cell: Position) -> bool {
        self.position == cell || self.target == cell || self.path.contains(&cell)
    }

    /// Install a freshly computed path and point `path_index` just past the
    /// robot's current position in it.
    pub(crate) fn set_path(&mut self, path: Vec<Position>, now: Timestamp) {
        self.path = path;
        self.path_index = self.resume_index();
        self.last_calculated = now;
    }

    /// Index of the waypoint after the current position, or 1 when the
    /// position is not on the path, clamped to the last index.
    fn resume_index(&self) -> usize {
        let Some(last) = self.path.len().checked_sub(1) else {
            return 0;
        };
        let next = match self.path.iter().position(|&p| p == self.position) {
            Some(i) => i + 1,
            None => 1,
        };
        next.min(last)
    }

    /// Step onto `to` and advance `path_index`, clamped to the last index.
    pub(crate) fn step_to(&mut self, to: Position) {
        self.position = to;
        let last = self.path.len().saturating_sub(1);
        self.path_index = (self.path_index + 1).min(last);
    }
}
