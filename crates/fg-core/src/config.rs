//! Top-level fleet configuration.
//!
//! Typically loaded from a JSON file by `fg_sim::load_config` and passed to
//! the coordinator and tick driver.  Every field has a default, so a config
//! file only needs to name what it overrides.

use crate::{FgError, FgResult};

/// Grid size, tick cadence and event-bus settings for one fleet run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleetConfig {
    /// Grid width in cells.  Default: 10.
    pub grid_width: u32,

    /// Grid height in cells.  Default: 10.
    pub grid_height: u32,

    /// Real time between two ticks of the driver loop.  Default: 500.
    pub tick_interval_ms: u64,

    /// Simulated seconds passed to `simulate_tick` per tick.  Default: 0.5.
    pub tick_delta_secs: f64,

    /// Flip one random cell every N milliseconds.  `None` disables churn.
    pub churn_interval_ms: Option<u64>,

    /// Seed for the churn RNG.  The same seed always churns the same cells.
    pub seed: u64,

    /// Buffered events per subscriber before the slowest one starts lagging.
    pub event_capacity: usize,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            grid_width:        10,
            grid_height:       10,
            tick_interval_ms:  500,
            tick_delta_secs:   0.5,
            churn_interval_ms: None,
            seed:              42,
            event_capacity:    1024,
            log_level:         "info".to_owned(),
        }
    }
}

impl FleetConfig {
    /// Reject values the fleet cannot run with.
    pub fn validate(&self) -> FgResult<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(FgError::Config(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.grid_width > i32::MAX as u32 || self.grid_height > i32::MAX as u32 {
            return Err(FgError::Config("grid dimensions exceed i32 range".to_owned()));
        }
        if self.tick_interval_ms == 0 {
            return Err(FgError::Config("tick_interval_ms must be positive".to_owned()));
        }
        if !self.tick_delta_secs.is_finite() || self.tick_delta_secs <= 0.0 {
            return Err(FgError::Config(format!(
                "tick_delta_secs must be a positive number, got {}",
                self.tick_delta_secs
            )));
        }
        if self.churn_interval_ms == Some(0) {
            return Err(FgError::Config("churn_interval_ms must be positive".to_owned()));
        }
        if self.event_capacity == 0 {
            return Err(FgError::Config("event_capacity must be positive".to_owned()));
        }
        Ok(())
    }
}
