//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation tick counter
pub type Tick = u64;

/// Sequence number of an oracle request; unique per `World`
pub type RequestId = u64;

/// Integer cell coordinate on the grid
///
/// Signed so that neighbour arithmetic at the border produces an
/// out-of-bounds position instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True when the two cells share an edge
    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.manhattan(other) == 1
    }

    /// Orthogonal neighbours in fixed order: north, east, south, west
    ///
    /// The order is part of the pathfinder's determinism.
    pub fn neighbors(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x, self.y - 1),
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x - 1, self.y),
        ]
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Worker identifier, allocated from 1 upward
    WorkerId,
    "worker"
);
entity_id!(
    /// Building identifier, allocated from 1 upward
    BuildingId,
    "building"
);
entity_id!(
    /// Resource identifier, allocated from 1 upward
    ResourceId,
    "resource"
);
entity_id!(
    /// Task identifier, allocated from 1 upward
    TaskId,
    "task"
);

/// Reference to any stored entity, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Worker(WorkerId),
    Building(BuildingId),
    Resource(ResourceId),
    Task(TaskId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Worker(id) => id.fmt(f),
            EntityRef::Building(id) => id.fmt(f),
            EntityRef::Resource(id) => id.fmt(f),
            EntityRef::Task(id) => id.fmt(f),
        }
    }
}
