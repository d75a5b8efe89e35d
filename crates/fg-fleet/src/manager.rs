//! `FleetManager`: the exclusive FIFO operation queue.
//!
//! The manager owns no state of its own.  [`FleetManager::spawn`] moves a
//! [`FleetState`] onto a dedicated worker task and keeps only the sending half
//! of an unbounded job channel.  Each public method:
//!
//! 1. packages the operation as a job and sends it immediately, so admission
//!    order is call order, not first-poll order;
//! 2. returns a [`Pending`] future that resolves when the worker has run the
//!    job.
//!
//! The worker runs jobs one at a time, each to completion.  Jobs are plain
//! closures over `&mut FleetState`, so a running job cannot submit another and
//! the queue cannot deadlock on itself.  A job that panics is caught and
//! logged; its caller gets [`FleetError::OperationFailed`] and the next job
//! runs normally.  A job that never runs because the worker stopped first
//! resolves to [`FleetError::QueueClosed`].

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use fg_core::{Clock, Position, RobotId, SystemClock};
use fg_spatial::{AStarPathFinder, PathFinder, SharedGrid};

use crate::{
    CellEdit, FleetError, FleetResult, FleetSnapshot, FleetState, MetricsSnapshot, Robot,
    RobotSpec, TickOutcome,
};

/// One queued operation.  `run` returns `false` if the operation panicked.
struct Job<R: PathFinder, C: Clock> {
    op:  &'static str,
    run: Box<dyn FnOnce(&mut FleetState<R, C>) -> bool + Send>,
}

/// What the worker sends back: `None` marks a panicked operation.
type Reply<T> = Option<T>;

/// Cloneable handle to a fleet running on its own worker task.
///
/// All clones feed the same queue.  The worker exits once every handle has
/// been dropped and the queue has drained.
pub struct FleetManager<R: PathFinder = AStarPathFinder, C: Clock = SystemClock> {
    jobs: mpsc::UnboundedSender<Job<R, C>>,
    grid: SharedGrid,
}

impl<R: PathFinder, C: Clock> Clone for FleetManager<R, C> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            grid: self.grid.clone(),
        }
    }
}

impl FleetManager {
    /// A fleet over `grid` using A* and the system clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_grid(grid: SharedGrid) -> Self {
        Self::new(grid, AStarPathFinder, SystemClock)
    }
}

impl<R: PathFinder, C: Clock> FleetManager<R, C> {
    /// Build a fresh [`FleetState`] and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(grid: SharedGrid, router: R, clock: C) -> Self {
        Self::spawn(FleetState::new(grid, router, clock))
    }

    /// Move `state` onto a new worker task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(state: FleetState<R, C>) -> Self {
        let grid = state.grid.clone();
        let (jobs, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(state, rx));
        Self { jobs, grid }
    }

    /// The grid this fleet routes over.
    ///
    /// Editing it directly bypasses the queue; follow such an edit with
    /// [`FleetManager::recalculate_impacted_by_cell`], or use
    /// [`FleetManager::set_obstacle`] to do both as one operation.
    pub fn grid(&self) -> SharedGrid {
        self.grid.clone()
    }

    /// `false` once the worker has stopped.
    pub fn is_running(&self) -> bool {
        !self.jobs.is_closed()
    }

    // ── Queue ─────────────────────────────────────────────────────────────

    fn submit<T, F>(&self, op: &'static str, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FleetState<R, C>) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            op,
            run: Box::new(move |state: &mut FleetState<R, C>| {
                let reply: Reply<T> = panic::catch_unwind(AssertUnwindSafe(|| f(state))).ok();
                let completed = reply.is_some();
                // The caller may have dropped its future; that is not an error.
                let _ = reply_tx.send(reply);
                completed
            }),
        };
        let reply = self.jobs.send(job).is_ok().then_some(reply_rx);
        Pending { op, reply }
    }

    // ── Operations ────────────────────────────────────────────────────────

    pub fn add_robot(&self, spec: RobotSpec) -> Pending<Robot> {
        self.submit("add_robot", move |s| s.add_robot(spec))
    }

    pub fn remove_robot(&self, id: impl Into<RobotId>) -> Pending<bool> {
        let id = id.into();
        self.submit("remove_robot", move |s| s.remove_robot(id.as_str()))
    }

    pub fn robot(&self, id: impl Into<RobotId>) -> Pending<Option<Robot>> {
        let id = id.into();
        self.submit("robot", move |s| s.robot(id.as_str()).cloned())
    }

    pub fn recalculate_path(
        &self,
        id: impl Into<RobotId>,
    ) -> Pending<Option<Vec<Position>>> {
        let id = id.into();
        self.submit("recalculate_path", move |s| s.recalculate_path(id.as_str()))
    }

    pub fn recalculate_all(&self) -> Pending<()> {
        self.submit("recalculate_all", |s| s.recalculate_all())
    }

    pub fn recalculate_impacted_by_cell(&self, x: i32, y: i32) -> Pending<bool> {
        self.submit("recalculate_impacted_by_cell", move |s| s.recalculate_impacted_by_cell(x, y))
    }

    pub fn update_robot_target(
        &self,
        id: impl Into<RobotId>,
        target: Position,
    ) -> Pending<Option<Vec<Position>>> {
        let id = id.into();
        self.submit("update_robot_target", move |s| s.update_robot_target(id.as_str(), target))
    }

    pub fn update_robot_speed(
        &self,
        id: impl Into<RobotId>,
        speed: f64,
    ) -> Pending<Option<Robot>> {
        let id = id.into();
        self.submit("update_robot_speed", move |s| s.update_robot_speed(id.as_str(), speed))
    }

    pub fn set_obstacle(&self, x: i32, y: i32, obstacle: bool) -> Pending<CellEdit> {
        self.submit("set_obstacle", move |s| s.set_obstacle(x, y, obstacle))
    }

    pub fn toggle_obstacle(&self, x: i32, y: i32) -> Pending<CellEdit> {
        self.submit("toggle_obstacle", move |s| s.toggle_obstacle(x, y))
    }

    pub fn simulate_tick(&self, delta_secs: f64) -> Pending<TickOutcome> {
        self.submit("simulate_tick", move |s| s.simulate_tick(delta_secs))
    }

    pub fn serialize(&self) -> Pending<Vec<Robot>> {
        self.submit("serialize", |s| s.serialize())
    }

    pub fn get_metrics(&self) -> Pending<MetricsSnapshot> {
        self.submit("get_metrics", |s| s.metrics())
    }

    pub fn snapshot(&self) -> Pending<FleetSnapshot> {
        self.submit("snapshot", |s| s.snapshot())
    }

    /// Run an arbitrary closure as one exclusive operation.
    ///
    /// Useful for composite reads that must be mutually consistent.
    pub fn with_state<T, F>(&self, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut FleetState<R, C>) -> T + Send + 'static,
    {
        self.submit("with_state", f)
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

async fn run_worker<R: PathFinder, C: Clock>(
    mut state: FleetState<R, C>,
    mut jobs:  mpsc::UnboundedReceiver<Job<R, C>>,
) {
    debug!("fleet worker started");
    while let Some(job) = jobs.recv().await {
        execute(&mut state, job);
    }
    debug!("fleet worker stopped");
}

fn execute<R: PathFinder, C: Clock>(state: &mut FleetState<R, C>, Job { op, run }: Job<R, C>) {
    let _span = tracing::debug_span!("fleet_op", op).entered();
    if !run(state) {
        error!(op, "fleet operation panicked; continuing with next job");
    }
}

// ── Pending ───────────────────────────────────────────────────────────────────

/// Future for the result of a queued fleet operation.
///
/// The operation is already in the queue when this is created; dropping it
/// does not cancel the operation, only discards its result.
#[must_use = "the operation runs regardless, but its result is lost unless awaited"]
pub struct Pending<T> {
    op:    &'static str,
    /// `None` when the worker had already stopped at submission time.
    reply: Option<oneshot::Receiver<Reply<T>>>,
}

impl<T> Future for Pending<T> {
    type Output = FleetResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let op = self.op;
        match self.reply.as_mut() {
            None => Poll::Ready(Err(FleetError::QueueClosed)),
            Some(rx) => Pin::new(rx).poll(cx).map(|reply| match reply {
                Ok(Some(value)) => Ok(value),
                Ok(None) => Err(FleetError::OperationFailed(op)),
                // Sender dropped unsent: the job was discarded with the queue.
                Err(_) => Err(FleetError::QueueClosed),
            }),
        }
    }
}
