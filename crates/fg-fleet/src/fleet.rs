//! The `FleetState` struct: robot operations and the tick loop.

use tracing::{debug, info};

use fg_core::{Clock, Position, Timestamp};
use fg_spatial::{Cell, Grid, PathFinder, SharedGrid};

use crate::{FleetMetrics, Map, MetricsSnapshot, Robot, RobotSpec, RobotStore};

// ── Operation results ─────────────────────────────────────────────────────────

/// Result of one [`FleetState::simulate_tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// At least one robot changed cell.
    pub moved: bool,
    /// A task completed or a move was blocked.
    pub metrics_changed: bool,
    pub metrics: MetricsSnapshot,
}

/// Result of a grid edit routed through the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    /// The updated cell, or `None` if the coordinate was out of bounds.
    pub cell: Option<Cell>,
    /// At least one robot's path was recalculated because of the edit.
    pub paths_changed: bool,
}

/// Grid, robots and metrics captured under one exclusive operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSnapshot {
    pub grid: Vec<Vec<Cell>>,
    pub robots: Vec<Robot>,
    pub metrics: MetricsSnapshot,
}

// ── FleetState ────────────────────────────────────────────────────────────────

/// All fleet state plus the collaborators needed to mutate it.
///
/// Every method here is synchronous and assumes exclusive access.  Wrap the
/// state in a [`FleetManager`][crate::FleetManager] to share it between
/// tasks.
///
/// The grid is only ever read here, except by [`FleetState::set_obstacle`]
/// and [`FleetState::toggle_obstacle`], which edit it and recalculate the
/// affected robots as one step.
pub struct FleetState<R: PathFinder, C: Clock> {
    /// Shared obstacle map.  Read-locked for the duration of each search.
    pub grid: SharedGrid,

    /// The routing algorithm.
    pub router: R,

    /// Source of task and metrics timestamps.
    pub clock: C,

    /// Managed robots in insertion order.
    pub robots: RobotStore,

    /// Lifetime counters.
    pub metrics: FleetMetrics,
}

impl<R: PathFinder, C: Clock> FleetState<R, C> {
    pub fn new(grid: SharedGrid, router: R, clock: C) -> Self {
        let metrics = FleetMetrics::new(clock.now());
        Self {
            grid,
            router,
            clock,
            robots: RobotStore::new(),
            metrics,
        }
    }

    // ── Robot lifecycle ───────────────────────────────────────────────────

    /// Create (or replace) a robot and compute its initial path.
    pub fn add_robot(&mut self, spec: RobotSpec) -> Robot {
        let now = self.clock.now();
        let mut robot = Robot::from_spec(spec, now);
        {
            let grid = self.grid.read();
            recalculate(&self.router, &grid, &mut robot, now);
        }
        info!(
            robot = %robot.id,
            position = %robot.position,
            target = %robot.target,
            path_len = robot.path.len(),
            "robot added"
        );
        self.robots.upsert(robot.clone());
        robot
    }

    /// Remove a robot.  Returns `false` if no robot had that id.
    pub fn remove_robot(&mut self, id: &str) -> bool {
        let removed = self.robots.remove(id).is_some();
        if removed {
            info!(robot = id, "robot removed");
        }
        removed
    }

    pub fn robot(&self, id: &str) -> Option<&Robot> {
        self.robots.get(id)
    }

    // ── Route maintenance ─────────────────────────────────────────────────

    /// Recompute one robot's path from its position to its target.
    pub fn recalculate_path(&mut self, id: &str) -> Option<Vec<Position>> {
        let now = self.clock.now();
        let grid = self.grid.read();
        let robot = self.robots.get_mut(id)?;
        recalculate(&self.router, &grid, robot, now);
        Some(robot.path.clone())
    }

    /// Recompute every robot's path.
    pub fn recalculate_all(&mut self) {
        let now = self.clock.now();
        let grid = self.grid.read();
        for robot in self.robots.iter_mut() {
            recalculate(&self.router, &grid, robot, now);
        }
    }

    /// Recompute the path of every robot that could be affected by a change
    /// at `(x, y)`: robots with no path, robots routed through the cell, and
    /// robots standing on or headed to it.
    ///
    /// Returns `true` if any robot was recalculated.
    pub fn recalculate_impacted_by_cell(&mut self, x: i32, y: i32) -> bool {
        let now = self.clock.now();
        let grid = self.grid.read();
        let cell = Position::new(x, y);
        let mut changed = false;
        for robot in self.robots.iter_mut() {
            if !robot.has_path() || robot.touches(cell) {
                recalculate(&self.router, &grid, robot, now);
                changed = true;
            }
        }
        debug!(%cell, changed, "impacted paths recalculated");
        changed
    }

    /// Assign a new target, restart the task clock, and recompute the path.
    pub fn update_robot_target(&mut self, id: &str, target: Position) -> Option<Vec<Position>> {
        let now = self.clock.now();
        let grid = self.grid.read();
        let robot = self.robots.get_mut(id)?;
        robot.target = target;
        robot.task_started_at = now;
        recalculate(&self.router, &grid, robot, now);
        debug!(robot = id, %target, path_len = robot.path.len(), "target updated");
        Some(robot.path.clone())
    }

    /// Change a robot's speed.  The path is left alone.
    pub fn update_robot_speed(&mut self, id: &str, speed: f64) -> Option<Robot> {
        let robot = self.robots.get_mut(id)?;
        robot.speed = speed;
        debug!(robot = id, speed, "speed updated");
        Some(robot.clone())
    }

    // ── Grid edits ────────────────────────────────────────────────────────

    /// Set an obstacle flag and recalculate the robots it affects, with no
    /// other operation able to observe the grid in between.
    pub fn set_obstacle(&mut self, x: i32, y: i32, obstacle: bool) -> CellEdit {
        let now = self.clock.now();
        let cell = self.grid.write().set_obstacle(x, y, obstacle, now);
        self.after_edit(x, y, cell)
    }

    /// Flip an obstacle flag; same contract as [`FleetState::set_obstacle`].
    pub fn toggle_obstacle(&mut self, x: i32, y: i32) -> CellEdit {
        let now = self.clock.now();
        let cell = self.grid.write().toggle_obstacle(x, y, now);
        self.after_edit(x, y, cell)
    }

    fn after_edit(&mut self, x: i32, y: i32, cell: Option<Cell>) -> CellEdit {
        let paths_changed = match cell {
            Some(_) => self.recalculate_impacted_by_cell(x, y),
            None => false,
        };
        CellEdit { cell, paths_changed }
    }

    // ── Views ─────────────────────────────────────────────────────────────

    /// Deep copies of every robot, in insertion order.
    pub fn serialize(&self) -> Vec<Robot> {
        self.robots.iter().cloned().collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.clock.now())
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            grid: self.grid.read().serialize(),
            robots: self.serialize(),
            metrics: self.metrics(),
        }
    }

    // ── Tick simulation ───────────────────────────────────────────────────

    /// Advance every robot by `delta_secs` of simulated time.
    ///
    /// Robots move in insertion order against an occupancy map that is
    /// updated after each step, so the outcome depends on that order.
    pub fn simulate_tick(&mut self, delta_secs: f64) -> TickOutcome {
        let now = self.clock.now();
        let grid = self.grid.read();

        // Occupancy at tick start: cell → slot of the robot holding it.
        let mut occupied: Map<Position, usize> = Map::default();
        for (slot, robot) in self.robots.iter().enumerate() {
            occupied.insert(robot.position, slot);
        }

        let mut ctx = TickContext {
            grid: &grid,
            router: &self.router,
            metrics: &mut self.metrics,
            occupied: &mut occupied,
            now,
            moved: false,
            metrics_changed: false,
        };

        for slot in 0..self.robots.len() {
            ctx.advance(slot, self.robots.slot_mut(slot), delta_secs);
        }

        let (moved, metrics_changed) = (ctx.moved, ctx.metrics_changed);
        TickOutcome {
            moved,
            metrics_changed,
            metrics: self.metrics.snapshot(now),
        }
    }
}

// ── Tick internals ────────────────────────────────────────────────────────────

/// Borrowed state shared by every robot's moves within one tick.
struct TickContext<'a, R: PathFinder> {
    grid:            &'a Grid,
    router:          &'a R,
    metrics:         &'a mut FleetMetrics,
    occupied:        &'a mut Map<Position, usize>,
    now:             Timestamp,
    moved:           bool,
    metrics_changed: bool,
}

impl<R: PathFinder> TickContext<'_, R> {
    /// Spend one robot's step budget for this tick.
    fn advance(&mut self, slot: usize, robot: &mut Robot, delta_secs: f64) {
        let budget = robot.speed * delta_secs + robot.movement_remainder;
        let steps = budget.floor();
        robot.movement_remainder = budget - steps;

        for _ in 0..steps as u64 {
            if robot.at_target() {
                break;
            }

            let Some(next) = self.next_step(robot) else {
                break;
            };

            if self.occupied.get(&next).is_some_and(|&holder| holder != slot) {
                self.metrics.record_block();
                self.metrics_changed = true;
                debug!(robot = %robot.id, from = %robot.position, to = %next, "move blocked");
                break;
            }

            self.occupied.remove(&robot.position);
            self.occupied.insert(next, slot);
            robot.step_to(next);
            self.moved = true;

            if robot.at_target() {
                self.complete_task(robot);
                break;
            }
        }
    }

    /// The waypoint to move to next, recalculating a missing path first.
    fn next_step(&self, robot: &mut Robot) -> Option<Position> {
        if !robot.has_path() {
            recalculate(self.router, self.grid, robot, self.now);
        }
        if let Some(next) = robot.next_waypoint() {
            return Some(next);
        }
        recalculate(self.router, self.grid, robot, self.now);
        robot.next_waypoint()
    }

    fn complete_task(&mut self, robot: &mut Robot) {
        let duration_ms = self.now.since(robot.task_started_at);
        self.metrics.record_completion(duration_ms);
        self.metrics_changed = true;
        robot.task_started_at = self.now;
        info!(robot = %robot.id, target = %robot.target, duration_ms, "task completed");

        // Start and goal coincide, so this leaves a one-cell path.
        recalculate(self.router, self.grid, robot, self.now);
    }
}

/// Recompute `robot`'s path against `grid`.  No route leaves the path empty.
fn recalculate<R: PathFinder>(router: &R, grid: &Grid, robot: &mut Robot, now: Timestamp) {
    let path = match router.find_path(grid, robot.position, robot.target) {
        Ok(path) => path,
        Err(e) => {
            debug!(robot = %robot.id, error = %e, "no path");
            Vec::new()
        }
    };
    robot.set_path(path, now);
}
