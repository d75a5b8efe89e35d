//! Inbound commands.
//!
//! One JSON object per command, discriminated by `type`:
//!
//! | `type`             | Fields                                    |
//! |--------------------|-------------------------------------------|
//! | `create-robot`     | `id`, `name`, `position`, `target?`, `speed?` |
//! | `remove-robot`     | `id`                                      |
//! | `set-obstacle`     | `x`, `y`, `obstacle`                      |
//! | `toggle-obstacle`  | `x`, `y`                                  |
//! | `set-robot-target` | `id`, `target`                            |
//! | `set-robot-speed`  | `id`, `speed`                             |
//!
//! Positions are `{"x": .., "y": ..}` objects.

use serde::{Deserialize, Serialize};

use fg_core::{Position, RobotId};
use fg_fleet::RobotSpec;

use crate::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    CreateRobot {
        id:       RobotId,
        name:     String,
        position: Position,
        #[serde(default)]
        target:   Option<Position>,
        #[serde(default)]
        speed:    Option<f64>,
    },
    RemoveRobot {
        id: RobotId,
    },
    SetObstacle {
        x:        i32,
        y:        i32,
        obstacle: bool,
    },
    ToggleObstacle {
        x: i32,
        y: i32,
    },
    SetRobotTarget {
        id:     RobotId,
        target: Position,
    },
    SetRobotSpeed {
        id:    RobotId,
        speed: f64,
    },
}

impl Command {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateRobot { .. } => "create-robot",
            Command::RemoveRobot { .. } => "remove-robot",
            Command::SetObstacle { .. } => "set-obstacle",
            Command::ToggleObstacle { .. } => "toggle-obstacle",
            Command::SetRobotTarget { .. } => "set-robot-target",
            Command::SetRobotSpeed { .. } => "set-robot-speed",
        }
    }

    /// Reject input the fleet operations assume never reaches them.
    pub fn validate(&self) -> SimResult<()> {
        match self {
            Command::CreateRobot { id, speed, .. } => {
                check_id(id)?;
                if let Some(speed) = speed {
                    check_speed(*speed)?;
                }
                Ok(())
            }
            Command::RemoveRobot { id } | Command::SetRobotTarget { id, .. } => check_id(id),
            Command::SetRobotSpeed { id, speed } => {
                check_id(id)?;
                check_speed(*speed)
            }
            Command::SetObstacle { .. } | Command::ToggleObstacle { .. } => Ok(()),
        }
    }
}

impl From<RobotSpec> for Command {
    fn from(spec: RobotSpec) -> Self {
        Command::CreateRobot {
            id:       spec.id,
            name:     spec.name,
            position: spec.position,
            target:   spec.target,
            speed:    spec.speed,
        }
    }
}

fn check_id(id: &RobotId) -> SimResult<()> {
    if id.is_empty() {
        return Err(SimError::InvalidCommand("robot id must not be empty".to_owned()));
    }
    Ok(())
}

fn check_speed(speed: f64) -> SimResult<()> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(SimError::InvalidCommand(format!(
            "speed must be a positive number, got {speed}"
        )));
    }
    Ok(())
}
