//! Grid world: terrain, occupancy and procedural generation

pub mod blocking;
pub mod generation;
pub mod grid;

pub use blocking::{BlockingState, Footprint, Occupant};
pub use grid::{CellKind, CellUpdate, GridCell, GridWorld};
