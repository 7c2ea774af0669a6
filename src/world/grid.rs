//! The grid world: cell array, terrain and occupancy
//!
//! `GridWorld` is the single source of truth for which cells are covered and
//! whether they can be walked. Entity attributes live in the `EntityStore`,
//! which is the only caller of `place`/`clear`.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::GridPos;
use crate::spatial::grid::Grid;
use crate::world::blocking::{Footprint, Occupant};
use crate::world::generation;

/// Smallest accepted side for generated worlds
pub const MIN_DIMENSION: i32 = 10;
/// Largest accepted side for generated worlds
pub const MAX_DIMENSION: i32 = 100;

/// What a cell currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Terrain,
    Building,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub kind: CellKind,
    pub walkable: bool,
    pub elevation: i32,
    pub occupant: Option<Occupant>,
}

impl GridCell {
    fn terrain(pos: GridPos, elevation: i32) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            kind: CellKind::Terrain,
            walkable: true,
            elevation,
            occupant: None,
        }
    }

    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

/// Partial update for `GridWorld::set_cell`
#[derive(Debug, Clone, Copy, Default)]
pub struct CellUpdate {
    pub kind: Option<CellKind>,
    pub walkable: Option<bool>,
    pub elevation: Option<i32>,
    pub occupant: Option<Option<Occupant>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridWorld {
    seed: Option<i64>,
    cells: Grid<GridCell>,
}

impl GridWorld {
    /// Flat, empty world of any positive size
    pub fn flat(width: i32, height: i32) -> Self {
        Self {
            seed: None,
            cells: Grid::from_fn(width, height, |pos| GridCell::terrain(pos, 0)),
        }
    }

    /// Procedurally generated world; both sides must lie within 10..=100
    pub fn generate(width: i32, height: i32, seed: i64) -> Result<Self> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&width)
            || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&height)
        {
            return Err(SimError::InvalidDimensions { width, height });
        }
        let elevation = generation::elevation_map(width, height, seed);
        let cells = Grid::from_fn(width, height, |pos| {
            GridCell::terrain(pos, elevation.get(pos).copied().unwrap_or(0))
        });
        Ok(Self {
            seed: Some(seed),
            cells,
        })
    }

    pub fn width(&self) -> i32 {
        self.cells.width()
    }

    pub fn height(&self) -> i32 {
        self.cells.height()
    }

    pub fn seed(&self) -> Option<i64> {
        self.seed
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        self.cells.in_bounds(pos)
    }

    pub fn get(&self, pos: GridPos) -> Option<&GridCell> {
        self.cells.get(pos)
    }

    pub fn cell_at(&self, pos: GridPos) -> Result<&GridCell> {
        self.cells
            .get(pos)
            .ok_or(SimError::OutOfBounds { x: pos.x, y: pos.y })
    }

    /// Out-of-bounds cells are never walkable
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cells.get(pos).is_some_and(|c| c.walkable)
    }

    pub fn set_cell(&mut self, pos: GridPos, update: CellUpdate) -> Result<()> {
        let cell = self
            .cells
            .get_mut(pos)
            .ok_or(SimError::OutOfBounds { x: pos.x, y: pos.y })?;
        if let Some(kind) = update.kind {
            cell.kind = kind;
        }
        if let Some(walkable) = update.walkable {
            cell.walkable = walkable;
        }
        if let Some(elevation) = update.elevation {
            cell.elevation = elevation;
        }
        if let Some(occupant) = update.occupant {
            cell.occupant = occupant;
        }
        Ok(())
    }

    /// Check a footprint can be placed without touching the grid
    pub fn check_placement(&self, footprint: &Footprint, ignore: Option<Occupant>) -> Result<()> {
        for pos in footprint.cells() {
            let cell = self.cell_at(pos)?;
            if let Some(existing) = cell.occupant {
                if Some(existing) != ignore {
                    return Err(SimError::Occupied { x: pos.x, y: pos.y });
                }
            }
        }
        Ok(())
    }

    /// Mark every cell of `footprint` as covered by `occupant`
    ///
    /// All-or-nothing: bounds and overlap are checked before any cell changes.
    pub fn place(&mut self, occupant: Occupant, footprint: &Footprint) -> Result<()> {
        self.check_placement(footprint, None)?;
        let kind = match occupant {
            Occupant::Building(_) => CellKind::Building,
            Occupant::Resource(_) => CellKind::Resource,
        };
        let walkable = occupant.blocking().can_pass();
        for pos in footprint.cells() {
            self.set_cell(
                pos,
                CellUpdate {
                    kind: Some(kind),
                    walkable: Some(walkable),
                    occupant: Some(Some(occupant)),
                    ..CellUpdate::default()
                },
            )?;
        }
        Ok(())
    }

    /// Revert cells covered by `occupant` back to open terrain
    ///
    /// Cells held by a different occupant are left alone.
    pub fn clear(&mut self, occupant: Occupant, footprint: &Footprint) {
        for pos in footprint.cells() {
            if let Some(cell) = self.cells.get_mut(pos) {
                if cell.occupant == Some(occupant) {
                    cell.kind = CellKind::Terrain;
                    cell.walkable = true;
                    cell.occupant = None;
                }
            }
        }
    }

    /// Cells low enough to hold water
    pub fn water_cells(&self) -> Vec<GridPos> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.elevation < generation::WATER_LEVEL)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> + '_ {
        self.cells.iter().map(|(_, cell)| cell)
    }

    /// Compact text rendering: `.` open, `#` blocked, `*` resource
    pub fn ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width() + 1) * self.height()) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let ch = match self.get(GridPos::new(x, y)) {
                    Some(c) if !c.walkable => '#',
                    Some(c) if c.kind == CellKind::Resource => '*',
                    _ => '.',
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}
