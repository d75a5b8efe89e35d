//! Path-finding trait and default A* implementation.
//!
//! # Pluggability
//!
//! `fg-fleet` calls routing via the [`PathFinder`] trait, so applications can
//! swap in custom implementations (jump-point search, reservation tables)
//! without touching the fleet core.  The default [`AStarPathFinder`] is the
//! reference behaviour.
//!
//! # Determinism
//!
//! Among routes of equal length, the one returned is fixed by two rules: the
//! frontier pops the lowest `f = g + h`, ties going to the entry discovered
//! first; and neighbours are discovered in the grid's east, west, south,
//! north order.  The same grid therefore always yields the same path, and
//! removing an obstacle restores exactly the path seen before it was added.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use fg_core::Position;

use crate::grid::Grid;
use crate::{SpatialError, SpatialResult};

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable shortest-path search over a [`Grid`].
///
/// # Thread safety
///
/// Implementations must be `Send + Sync + 'static` so they can live inside the
/// fleet worker task.
pub trait PathFinder: Send + Sync + 'static {
    /// Compute a route from `start` to `goal`, both endpoints inclusive.
    ///
    /// `start == goal` is a one-element route rather than an error.
    fn find_path(&self, grid: &Grid, start: Position, goal: Position) -> SpatialResult<Vec<Position>>;
}

// ── AStarPathFinder ───────────────────────────────────────────────────────────

/// A* with unit step cost and the Manhattan heuristic, which is admissible
/// and consistent on a 4-connected unit-cost grid.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarPathFinder;

impl PathFinder for AStarPathFinder {
    fn find_path(&self, grid: &Grid, start: Position, goal: Position) -> SpatialResult<Vec<Position>> {
        astar(grid, start, goal)
    }
}

/// Null-returning form of [`AStarPathFinder`]: `None` for out-of-bounds or
/// blocked endpoints and for unreachable goals alike.
pub fn find_path(grid: &Grid, start: Position, goal: Position) -> Option<Vec<Position>> {
    astar(grid, start, goal).ok()
}

// ── A* internals ──────────────────────────────────────────────────────────────

fn astar(grid: &Grid, start: Position, goal: Position) -> SpatialResult<Vec<Position>> {
    for endpoint in [start, goal] {
        match grid.cell_at(endpoint) {
            None => return Err(SpatialError::OutOfBounds(endpoint)),
            Some(cell) if cell.obstacle => return Err(SpatialError::BlockedEndpoint(endpoint)),
            Some(_) => {}
        }
    }

    // g[p] = best known step count from start to p.
    let mut g: HashMap<Position, u32> = HashMap::new();
    // came_from[p] = predecessor on the best known route to p.
    let mut came_from: HashMap<Position, Position> = HashMap::new();

    // Min-heap keyed by (f, seq).  `seq` increases with every push, so equal-f
    // entries pop in discovery order.
    let mut frontier: BinaryHeap<Reverse<(u32, u64, Position)>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    g.insert(start, 0);
    frontier.push(Reverse((0, seq, start)));

    while let Some(Reverse((f, _, current))) = frontier.pop() {
        if current == goal {
            return Ok(reconstruct(&came_from, start, goal));
        }

        let cost = g[&current];

        // Skip stale heap entries: a cheaper entry for this cell was already
        // expanded, and re-expanding this one cannot relax anything.
        if f > cost + current.manhattan(goal) {
            continue;
        }

        for next in grid.neighbors(current.x, current.y) {
            let new_cost = cost + 1;
            if g.get(&next).is_none_or(|&known| new_cost < known) {
                g.insert(next, new_cost);
                came_from.insert(next, current);
                seq += 1;
                frontier.push(Reverse((new_cost + next.manhattan(goal), seq, next)));
            }
        }
    }

    Err(SpatialError::NoRoute { from: start, to: goal })
}

fn reconstruct(came_from: &HashMap<Position, Position>, start: Position, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut cur = goal;
    while cur != start {
        match came_from.get(&cur) {
            Some(&prev) => {
                path.push(prev);
                cur = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
