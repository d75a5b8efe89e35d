//! Obstacle grid representation.
//!
//! # Data layout
//!
//! Cells are stored row-major in a single `Vec`:
//!
//! ```text
//! cells[ y * width + x ]
//! ```
//!
//! Dimensions are fixed at construction.  Every accessor takes signed
//! coordinates and bounds-checks them, so callers can probe `(-1, 0)` without
//! special-casing the edges.
//!
//! # Sharing
//!
//! The fleet and the command layer both need the grid: the fleet reads it for
//! every path search, the command layer edits it.  [`SharedGrid`] is the
//! shared handle.  Searches take a read guard for their whole duration so a
//! path is always computed against one consistent snapshot.

use std::sync::Arc;

use parking_lot::RwLock;

use fg_core::{Clock, Position, SystemClock, Timestamp};

/// Orthogonal step offsets in the order neighbours are reported:
/// east, west, south, north.
///
/// A* breaks f-score ties by discovery order, so this order decides which of
/// several equal-length routes is returned.  Changing it changes paths.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One grid square.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Cell {
    /// `true` when robots may not enter or route through this cell.
    pub obstacle: bool,

    /// Time of the last obstacle edit (or grid creation).
    pub updated_at: Timestamp,
}

impl Cell {
    #[inline]
    pub fn free(at: Timestamp) -> Self {
        Self { obstacle: false, updated_at: at }
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Shared, lock-protected grid handle.
pub type SharedGrid = Arc<RwLock<Grid>>;

/// Fixed-size rectangular obstacle map.
#[derive(Clone, Debug)]
pub struct Grid {
    width:  u32,
    height: u32,
    cells:  Vec<Cell>,
}

impl Grid {
    /// An obstacle-free `width × height` grid stamped with the system time.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_timestamp(width, height, SystemClock.now())
    }

    /// An obstacle-free grid whose cells all carry `created_at`.
    pub fn with_timestamp(width: u32, height: u32, created_at: Timestamp) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::free(created_at); len],
        }
    }

    /// Wrap `self` in a [`SharedGrid`].
    pub fn into_shared(self) -> SharedGrid {
        Arc::new(RwLock::new(self))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `true` if `(x, y)` addresses a cell of this grid.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Convenience for [`Grid::cell`] at a `Position`.
    #[inline]
    pub fn cell_at(&self, p: Position) -> Option<&Cell> {
        self.cell(p.x, p.y)
    }

    /// `true` only for in-bounds obstacle cells.
    #[inline]
    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|c| c.obstacle)
    }

    /// Set the obstacle flag at `(x, y)` and refresh its timestamp.
    ///
    /// Returns a copy of the updated cell, or `None` (and does nothing) when
    /// the coordinate is out of bounds.
    pub fn set_obstacle(&mut self, x: i32, y: i32, obstacle: bool, now: Timestamp) -> Option<Cell> {
        let i = self.index(x, y)?;
        let cell = &mut self.cells[i];
        cell.obstacle = obstacle;
        cell.updated_at = now;
        Some(*cell)
    }

    /// Flip the obstacle flag at `(x, y)`.  Same contract as
    /// [`Grid::set_obstacle`].
    pub fn toggle_obstacle(&mut self, x: i32, y: i32, now: Timestamp) -> Option<Cell> {
        let current = self.cell(x, y)?.obstacle;
        self.set_obstacle(x, y, !current, now)
    }

    /// Passable orthogonal neighbours of `(x, y)` in east, west, south, north
    /// order.  Out-of-bounds and obstacle cells are skipped, including
    /// offsets that would leave the `i32` range.
    pub fn neighbors(&self, x: i32, y: i32) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| Some(Position::new(x.checked_add(dx)?, y.checked_add(dy)?)))
            .filter(|p| self.cell(p.x, p.y).is_some_and(|c| !c.obstacle))
    }

    /// Number of obstacle cells.
    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| c.obstacle).count()
    }

    /// Deep copy of every cell as `rows[y][x]`, for transmission.
    pub fn serialize(&self) -> Vec<Vec<Cell>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height as usize];
        }
        self.cells
            .chunks(self.width as usize)
            .map(<[Cell]>::to_vec)
            .collect()
    }
}
