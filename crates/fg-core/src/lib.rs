//! `fg-core` — foundational types for the `fleetgrid` robot-fleet coordinator.
//!
//! This crate is a dependency of every other `fg-*` crate.  It intentionally
//! has no `fg-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RobotId`                                             |
//! | [`geo`]         | `Position`, Manhattan distance                        |
//! | [`time`]        | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`    |
//! | [`rng`]         | `SimRng` (seeded, reproducible)                       |
//! | [`config`]      | `FleetConfig`                                         |
//! | [`error`]       | `FgError`, `FgResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `fg-sim`.                                      |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::FleetConfig;
pub use error::{FgError, FgResult};
pub use geo::Position;
pub use ids::RobotId;
pub use rng::SimRng;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
