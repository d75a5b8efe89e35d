//! The `TickDriver`: real-time cadence for ticks and obstacle churn.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fg_core::{Clock, FleetConfig, SimRng};
use fg_fleet::FleetError;
use fg_spatial::PathFinder;

use crate::{Coordinator, SimError, SimResult};

/// Runs [`Coordinator::tick`] every `tick_interval_ms` of real time and, if
/// configured, [`Coordinator::churn`] every `churn_interval_ms`.
///
/// Stops when its [`CancellationToken`] is cancelled or the fleet worker has
/// gone away.  A single failed operation is logged and skipped.
pub struct TickDriver<R: PathFinder, C: Clock> {
    coordinator:    Coordinator<R, C>,
    tick_interval:  Duration,
    delta_secs:     f64,
    churn_interval: Option<Duration>,
    rng:            SimRng,
    shutdown:       CancellationToken,
}

impl<R: PathFinder, C: Clock> TickDriver<R, C> {
    pub fn new(coordinator: Coordinator<R, C>, config: &FleetConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            coordinator,
            tick_interval:  Duration::from_millis(config.tick_interval_ms),
            delta_secs:     config.tick_delta_secs,
            churn_interval: config.churn_interval_ms.map(Duration::from_millis),
            rng:            SimRng::new(config.seed),
            shutdown:       CancellationToken::new(),
        })
    }

    /// Cancel this token (or a clone) to stop [`TickDriver::run`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run `n` ticks back to back, ignoring the real-time cadence.
    pub async fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.coordinator.tick(self.delta_secs).await?;
        }
        Ok(())
    }

    /// Drive the fleet until shutdown.
    pub async fn run(mut self) -> SimResult<()> {
        info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            delta_secs = self.delta_secs,
            churn_interval_ms = self.churn_interval.map(|d| d.as_millis() as u64),
            "tick driver started"
        );

        let mut ticks = interval(self.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut churn = self.churn_interval.map(|period| {
            let mut churn = interval(period);
            churn.set_missed_tick_behavior(MissedTickBehavior::Delay);
            churn
        });

        let result = loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let outcome = self.coordinator.tick(self.delta_secs).await;
                    if let Err(e) = check(outcome) {
                        break Err(e);
                    }
                }
                _ = next(&mut churn) => {
                    let outcome = self.coordinator.churn(&mut self.rng).await;
                    if let Err(e) = check(outcome) {
                        break Err(e);
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("shutdown signal received, stopping tick driver");
                    break Ok(());
                }
            }
        };

        info!("tick driver stopped");
        result
    }
}

/// Wait for the next tick of an optional interval; never fires for `None`.
async fn next(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Keep going after a failed operation; stop once the fleet is gone.
fn check<T>(outcome: SimResult<T>) -> SimResult<()> {
    match outcome {
        Ok(_) => Ok(()),
        Err(e @ SimError::Fleet(FleetError::QueueClosed)) => Err(e),
        Err(e) => {
            warn!(error = %e, "periodic fleet operation failed");
            Ok(())
        }
    }
}
