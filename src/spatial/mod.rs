//! Spatial containers and route finding

pub mod grid;
pub mod pathfinding;

pub use grid::Grid;
pub use pathfinding::{find_path, nearest_walkable, try_find_path};
