//! `fg-spatial` — obstacle grid and shortest-path search.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`grid`]    | `Grid`, `Cell`, `SharedGrid`                                |
//! | [`router`]  | `PathFinder` trait, `AStarPathFinder`, `find_path`          |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod grid;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use grid::{Cell, Grid, SharedGrid};
pub use router::{AStarPathFinder, PathFinder, find_path};
