//! Occupants, footprints and the rule deciding which cells they block

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, GridPos, ResourceId};

/// Entity covering one or more grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Building(BuildingId),
    Resource(ResourceId),
}

impl Occupant {
    /// Movement rule for the cells this occupant covers
    pub fn blocking(&self) -> BlockingState {
        match self {
            // Construction sites block too; workers build from the edge
            Occupant::Building(_) => BlockingState::Solid,
            // Workers stand on a resource to harvest it
            Occupant::Resource(_) => BlockingState::None,
        }
    }
}

/// Whether a covered cell can be traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockingState {
    Solid,
    #[default]
    None,
}

impl BlockingState {
    pub fn can_pass(&self) -> bool {
        matches!(self, BlockingState::None)
    }
}

/// Axis-aligned rectangle of cells, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub origin: GridPos,
    pub width: i32,
    pub height: i32,
}

impl Footprint {
    pub fn new(origin: GridPos, width: i32, height: i32) -> Self {
        Self {
            origin,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Single-cell footprint
    pub fn cell(pos: GridPos) -> Self {
        Self::new(pos, 1, 1)
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.origin.x
            && pos.y >= self.origin.y
            && pos.x < self.origin.x + self.width
            && pos.y < self.origin.y + self.height
    }

    /// Covered cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height).flat_map(move |dy| {
            (0..self.width).map(move |dx| GridPos::new(self.origin.x + dx, self.origin.y + dy))
        })
    }

    /// Cells sharing an edge with the footprint, outside it, in a fixed order
    pub fn perimeter(&self) -> Vec<GridPos> {
        let mut cells = Vec::with_capacity(2 * (self.width + self.height) as usize);
        let (x0, y0) = (self.origin.x, self.origin.y);
        let (x1, y1) = (x0 + self.width, y0 + self.height);
        for x in x0..x1 {
            cells.push(GridPos::new(x, y0 - 1));
        }
        for y in y0..y1 {
            cells.push(GridPos::new(x1, y));
        }
        for x in x0..x1 {
            cells.push(GridPos::new(x, y1));
        }
        for y in y0..y1 {
            cells.push(GridPos::new(x0 - 1, y));
        }
        cells
    }

    /// Manhattan distance from a cell to the nearest covered cell
    pub fn distance_to(&self, pos: GridPos) -> u32 {
        let cx = pos.x.clamp(self.origin.x, self.origin.x + self.width - 1);
        let cy = pos.y.clamp(self.origin.y, self.origin.y + self.height - 1);
        pos.manhattan(&GridPos::new(cx, cy))
    }
}
