//! `fg-sim` — command dispatch, event broadcast, and the tick driver.
//!
//! # Data flow
//!
//! ```text
//! JSON / Command ──▶ Coordinator::apply ──▶ FleetManager queue ──▶ FleetState
//!                          │                                          │
//!                          └──────── FleetEvent ◀─────────────────────┘
//!                                       │
//!                                    EventBus ──▶ subscribers
//!
//! TickDriver ──(every tick_interval_ms)──▶ Coordinator::tick
//!            ──(every churn_interval_ms)─▶ Coordinator::churn
//! ```
//!
//! # Crate layout
//!
//! | Module          | Contents                                           |
//! |-----------------|----------------------------------------------------|
//! | [`command`]     | `Command`: inbound wire vocabulary                |
//! | [`event`]       | `FleetEvent`, `EventBus`, `EventReceiver`          |
//! | [`coordinator`] | `Coordinator`: command → operations → events      |
//! | [`driver`]      | `TickDriver`: real-time tick and churn loop       |
//! | [`config`]      | `load_config`: JSON config files                  |
//! | [`error`]       | `SimError`, `SimResult<T>`                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let config = fg_sim::load_config("fleet.json")?;
//! let coordinator = Coordinator::from_config(&config)?;
//! let mut events = coordinator.subscribe();
//!
//! let driver = TickDriver::new(coordinator.clone(), &config)?;
//! let stop = driver.shutdown_token();
//! tokio::spawn(driver.run());
//!
//! coordinator
//!     .apply_json(r#"{"type":"create-robot","id":"r1","name":"R1",
//!                    "position":{"x":0,"y":0},"target":{"x":9,"y":9}}"#)
//!     .await?;
//! ```

pub mod command;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod event;

#[cfg(test)]
mod tests;

pub use command::Command;
pub use config::load_config;
pub use coordinator::Coordinator;
pub use driver::TickDriver;
pub use error::{SimError, SimResult};
pub use event::{DEFAULT_EVENT_CAPACITY, EventBus, EventBusError, EventReceiver, FleetEvent};
