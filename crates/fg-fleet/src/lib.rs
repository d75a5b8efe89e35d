//! `fg-fleet` — robot state, tick simulation, and serialized fleet access.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`robot`]   | `Robot`, `RobotSpec`: per-robot task and route state             |
//! | [`store`]   | `RobotStore`: insertion-ordered robot collection                 |
//! | [`metrics`] | `FleetMetrics` counters, `MetricsSnapshot` derived view           |
//! | [`fleet`]   | `FleetState<R, C>`: synchronous operations and the tick loop     |
//! | [`manager`] | `FleetManager<R, C>`: FIFO exclusive queue in front of the state |
//! | [`error`]   | `FleetError`, `FleetResult<T>`                                    |
//!
//! # Movement model (step budget)
//!
//! Each tick a robot earns `speed × Δt` cell-steps plus whatever fraction it
//! carried over from the previous tick.  Whole steps are spent walking the
//! stored route one cell at a time; the fractional part is carried forward.
//!
//! Robots are moved one after another in insertion order.  An occupancy map
//! taken at tick start is updated as each robot moves, so a robot processed
//! earlier can claim a cell and block a later one from entering it in the
//! same tick.  The blocked robot holds position for the rest of the tick and
//! the block is counted as an avoided collision.
//!
//! # Access discipline
//!
//! [`FleetState`] is plain synchronous code.  [`FleetManager`] moves it onto a
//! worker task and runs every operation as a job drained from one FIFO
//! channel, so no two operations ever interleave.

pub mod error;
pub mod fleet;
pub mod manager;
pub mod metrics;
pub mod robot;
pub mod store;


pub use error::{FleetError, FleetResult};
pub use fleet::{CellEdit, FleetSnapshot, FleetState, TickOutcome};
pub use manager::{FleetManager, Pending};
pub use metrics::{FleetMetrics, MetricsSnapshot};
pub use robot::{DEFAULT_SPEED, Robot, RobotSpec};
pub use store::RobotStore;

// ── Hash map selection ────────────────────────────────────────────────────────

#[cfg(feature = "fx-hash")]
pub(crate) type Map<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(not(feature = "fx-hash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;
