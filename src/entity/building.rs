//! Buildings and construction progress

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, GridPos};
use crate::entity::resource::ResourceKind;
use crate::world::Footprint;

pub const PROGRESS_COMPLETE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    House,
    Workshop,
    Storehouse,
    Wall,
}

impl BuildingKind {
    /// Default footprint (width, height) in cells
    pub fn size(&self) -> (i32, i32) {
        match self {
            BuildingKind::House => (2, 2),
            BuildingKind::Workshop => (3, 2),
            BuildingKind::Storehouse => (3, 3),
            BuildingKind::Wall => (1, 1),
        }
    }

    /// Materials drawn from the stockpile when construction starts
    pub fn material_cost(&self) -> Vec<(ResourceKind, u32)> {
        match self {
            BuildingKind::House => vec![(ResourceKind::Wood, 20), (ResourceKind::Stone, 10)],
            BuildingKind::Workshop => vec![(ResourceKind::Wood, 30), (ResourceKind::Stone, 20)],
            BuildingKind::Storehouse => vec![(ResourceKind::Wood, 40), (ResourceKind::Stone, 30)],
            BuildingKind::Wall => vec![(ResourceKind::Stone, 15)],
        }
    }

    /// Whether workers can sleep here once it is complete
    pub fn is_shelter(&self) -> bool {
        matches!(self, BuildingKind::House)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Irreversible once set
    pub complete: bool,
    /// 0..=100, never decreases
    pub progress: f32,
    pub material_cost: Vec<(ResourceKind, u32)>,
    /// Set once `material_cost` has been drawn from the stockpile
    pub materials_paid: bool,
}

impl Building {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(GridPos::new(self.x, self.y), self.width, self.height)
    }

    /// Add construction progress; returns true when this call completed it
    pub fn advance(&mut self, amount: f32) -> bool {
        if self.complete {
            return false;
        }
        self.progress = (self.progress + amount.max(0.0)).min(PROGRESS_COMPLETE);
        if self.progress >= PROGRESS_COMPLETE {
            self.complete = true;
            return true;
        }
        false
    }
}

/// Input for `EntityStore::create_building`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBuilding {
    pub kind: BuildingKind,
    pub x: i32,
    pub y: i32,
    /// Defaults to the kind's size
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    /// Pre-seeded buildings start complete
    #[serde(default)]
    pub complete: bool,
    /// Defaults to the kind's cost
    #[serde(default)]
    pub material_cost: Option<Vec<(ResourceKind, u32)>>,
}

impl NewBuilding {
    pub fn new(kind: BuildingKind, pos: GridPos) -> Self {
        Self {
            kind,
            x: pos.x,
            y: pos.y,
            width: None,
            height: None,
            complete: false,
            material_cost: None,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }

    pub fn free(mut self) -> Self {
        self.material_cost = Some(Vec::new());
        self
    }
}

/// Partial update for `EntityStore::update_building`
#[derive(Debug, Clone, Default)]
pub struct BuildingUpdate {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub progress: Option<f32>,
    pub complete: Option<bool>,
}
