//! Harvestable resources

use serde::{Deserialize, Serialize};

use crate::core::types::{GridPos, ResourceId};
use crate::world::Footprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Stone,
    Wood,
    Berries,
    Water,
}

impl ResourceKind {
    /// Whether new resources of this kind regrow by default
    pub fn regenerates_by_default(&self) -> bool {
        matches!(self, ResourceKind::Berries | ResourceKind::Water)
    }
}

/// A single-cell resource node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub x: i32,
    pub y: i32,
    pub quantity: u32,
    /// Regrowth ceiling for regenerating resources
    pub capacity: u32,
    pub regenerates: bool,
}

impl Resource {
    pub fn position(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::cell(self.position())
    }

    pub fn is_depleted(&self) -> bool {
        self.quantity == 0
    }

    /// Remove up to `amount`, returning what was actually taken
    pub fn harvest(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.quantity);
        self.quantity -= taken;
        taken
    }

    pub fn regenerate(&mut self, amount: u32) {
        if self.regenerates {
            self.quantity = self.quantity.saturating_add(amount).min(self.capacity);
        }
    }
}

/// Input for `EntityStore::create_resource`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub kind: ResourceKind,
    pub x: i32,
    pub y: i32,
    pub quantity: u32,
    /// Defaults to the kind's usual behaviour
    #[serde(default)]
    pub regenerates: Option<bool>,
}

impl NewResource {
    pub fn new(kind: ResourceKind, pos: GridPos, quantity: u32) -> Self {
        Self {
            kind,
            x: pos.x,
            y: pos.y,
            quantity,
            regenerates: None,
        }
    }

    pub fn regenerating(mut self, regenerates: bool) -> Self {
        self.regenerates = Some(regenerates);
        self
    }
}

/// Partial update for `EntityStore::update_resource`
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub quantity: Option<u32>,
    pub regenerates: Option<bool>,
}
