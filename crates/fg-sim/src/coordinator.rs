//! The `Coordinator`: commands in, fleet operations through the queue,
//! events out.

use tracing::{debug, info};

use fg_core::{Clock, FleetConfig, SimRng, SystemClock};
use fg_fleet::{CellEdit, FleetManager, FleetState, RobotSpec, TickOutcome};
use fg_spatial::{AStarPathFinder, Grid, PathFinder};

use crate::{Command, EventBus, EventReceiver, FleetEvent, SimResult};

/// Binds a [`FleetManager`] to an [`EventBus`].
///
/// Every method turns into one or more queued fleet operations followed by
/// zero or more published events:
///
/// | Input                           | Events                                  |
/// |---------------------------------|-----------------------------------------|
/// | `create-robot`                  | `fleet`                                 |
/// | `remove-robot` (known id)       | `fleet`                                 |
/// | `set-obstacle`, `toggle-obstacle` | `cell`, then `fleet` if paths changed |
/// | `set-robot-target` (known id)   | `fleet`                                 |
/// | `set-robot-speed`               | none                                    |
/// | [`Coordinator::tick`]           | `fleet` if anything moved or counted    |
/// | [`Coordinator::publish_state`]  | `state`                                 |
///
/// Events carrying robots are built inside the same queued job as the change
/// they report, so they never mix state from two operations.
pub struct Coordinator<R: PathFinder = AStarPathFinder, C: Clock = SystemClock> {
    fleet:  FleetManager<R, C>,
    events: EventBus,
}

impl<R: PathFinder, C: Clock> Clone for Coordinator<R, C> {
    fn clone(&self) -> Self {
        Self {
            fleet:  self.fleet.clone(),
            events: self.events.clone(),
        }
    }
}

impl Coordinator {
    /// An empty grid of the configured size with a fleet on the system clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &FleetConfig) -> SimResult<Self> {
        config.validate()?;
        let grid = Grid::new(config.grid_width, config.grid_height).into_shared();
        info!(
            width = config.grid_width,
            height = config.grid_height,
            "coordinator started"
        );
        Ok(Self::new(
            FleetManager::with_grid(grid),
            EventBus::new(config.event_capacity),
        ))
    }
}

impl<R: PathFinder, C: Clock> Coordinator<R, C> {
    pub fn new(fleet: FleetManager<R, C>, events: EventBus) -> Self {
        Self { fleet, events }
    }

    pub fn fleet(&self) -> &FleetManager<R, C> {
        &self.fleet
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Validate and run one command, publishing whatever it changed.
    pub async fn apply(&self, command: Command) -> SimResult<()> {
        command.validate()?;
        debug!(command = command.kind(), "applying command");

        match command {
            Command::CreateRobot { id, name, position, target, speed } => {
                let spec = RobotSpec { id, name, position, target, speed };
                let fleet = self
                    .fleet
                    .with_state(move |s| {
                        s.add_robot(spec);
                        fleet_event(s)
                    })
                    .await?;
                self.events.publish(fleet);
            }
            Command::RemoveRobot { id } => {
                let removed = self
                    .fleet
                    .with_state(move |s| s.remove_robot(id.as_str()).then(|| fleet_event(s)))
                    .await?;
                if let Some(fleet) = removed {
                    self.events.publish(fleet);
                }
            }
            Command::SetObstacle { x, y, obstacle } => {
                self.edit_cell(x, y, move |s| s.set_obstacle(x, y, obstacle)).await?;
            }
            Command::ToggleObstacle { x, y } => {
                self.edit_cell(x, y, move |s| s.toggle_obstacle(x, y)).await?;
            }
            Command::SetRobotTarget { id, target } => {
                let updated = self
                    .fleet
                    .with_state(move |s| {
                        s.update_robot_target(id.as_str(), target).map(|_| fleet_event(s))
                    })
                    .await?;
                if let Some(fleet) = updated {
                    self.events.publish(fleet);
                }
            }
            Command::SetRobotSpeed { id, speed } => {
                self.fleet.update_robot_speed(id, speed).await?;
            }
        }
        Ok(())
    }

    /// Decode a JSON command and [`apply`][Coordinator::apply] it.
    pub async fn apply_json(&self, text: &str) -> SimResult<()> {
        let command: Command = serde_json::from_str(text)?;
        self.apply(command).await
    }

    async fn edit_cell<F>(&self, x: i32, y: i32, edit: F) -> SimResult<CellEdit>
    where
        F: FnOnce(&mut FleetState<R, C>) -> CellEdit + Send + 'static,
    {
        let (outcome, fleet) = self
            .fleet
            .with_state(move |s| {
                let outcome = edit(s);
                let fleet = outcome.paths_changed.then(|| fleet_event(s));
                (outcome, fleet)
            })
            .await?;

        if let Some(cell) = outcome.cell {
            self.events.publish(FleetEvent::Cell { x, y, cell });
        }
        if let Some(fleet) = fleet {
            self.events.publish(fleet);
        }
        Ok(outcome)
    }

    // ── Periodic work ─────────────────────────────────────────────────────

    /// Advance the fleet by `delta_secs` and publish a `fleet` event if the
    /// tick moved a robot or changed a counter.
    pub async fn tick(&self, delta_secs: f64) -> SimResult<TickOutcome> {
        let (outcome, fleet) = self
            .fleet
            .with_state(move |s| {
                let outcome = s.simulate_tick(delta_secs);
                let changed = outcome.moved || outcome.metrics_changed;
                let fleet = changed.then(|| FleetEvent::Fleet {
                    robots:  s.serialize(),
                    metrics: outcome.metrics.clone(),
                });
                (outcome, fleet)
            })
            .await?;

        if let Some(fleet) = fleet {
            self.events.publish(fleet);
        }
        Ok(outcome)
    }

    /// Flip one uniformly chosen cell, as an external disturbance.
    pub async fn churn(&self, rng: &mut SimRng) -> SimResult<CellEdit> {
        let (width, height) = {
            let grid = self.fleet.grid();
            let grid = grid.read();
            (grid.width() as i32, grid.height() as i32)
        };
        if width == 0 || height == 0 {
            return Ok(CellEdit { cell: None, paths_changed: false });
        }
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        debug!(x, y, "churning cell");
        self.edit_cell(x, y, move |s| s.toggle_obstacle(x, y)).await
    }

    // ── State ─────────────────────────────────────────────────────────────

    /// A consistent `state` event without publishing it.
    pub async fn state(&self) -> SimResult<FleetEvent> {
        Ok(self.fleet.snapshot().await?.into())
    }

    /// Publish a `state` event to every subscriber.
    pub async fn publish_state(&self) -> SimResult<()> {
        let state = self.state().await?;
        self.events.publish(state);
        Ok(())
    }
}

fn fleet_event<R: PathFinder, C: Clock>(state: &FleetState<R, C>) -> FleetEvent {
    FleetEvent::Fleet {
        robots:  state.serialize(),
        metrics: state.metrics(),
    }
}
