//! Colony-wide store of harvested materials

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::entity::resource::ResourceKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    amounts: AHashMap<ResourceKind, u32>,
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.amounts.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        let entry = self.amounts.entry(kind).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn has_materials(&self, requirements: &[(ResourceKind, u32)]) -> bool {
        requirements
            .iter()
            .all(|(kind, amount)| self.get(*kind) >= *amount)
    }

    /// Remove all requirements at once, or nothing
    pub fn consume_materials(&mut self, requirements: &[(ResourceKind, u32)]) -> bool {
        if !self.has_materials(requirements) {
            return false;
        }
        for (kind, amount) in requirements {
            if let Some(entry) = self.amounts.get_mut(kind) {
                *entry -= *amount;
            }
        }
        true
    }

    /// Non-zero amounts sorted by kind
    pub fn totals(&self) -> Vec<(ResourceKind, u32)> {
        let mut totals: Vec<_> = self
            .amounts
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(kind, amount)| (*kind, *amount))
            .collect();
        totals.sort();
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut stockpile = Stockpile::new();
        assert_eq!(stockpile.get(ResourceKind::Wood), 0);
        stockpile.add(ResourceKind::Wood, 30);
        stockpile.add(ResourceKind::Wood, 5);
        assert_eq!(stockpile.get(ResourceKind::Wood), 35);
    }

    #[test]
    fn test_consume_is_all_or_nothing() {
        let mut stockpile = Stockpile::new();
        stockpile.add(ResourceKind::Wood, 50);
        stockpile.add(ResourceKind::Stone, 5);

        let house = [(ResourceKind::Wood, 20), (ResourceKind::Stone, 10)];
        assert!(!stockpile.consume_materials(&house));
        assert_eq!(stockpile.get(ResourceKind::Wood), 50);

        stockpile.add(ResourceKind::Stone, 5);
        assert!(stockpile.consume_materials(&house));
        assert_eq!(stockpile.get(ResourceKind::Wood), 30);
        assert_eq!(stockpile.get(ResourceKind::Stone), 0);
    }

    #[test]
    fn test_totals_are_sorted_and_skip_empty() {
        let mut stockpile = Stockpile::new();
        stockpile.add(ResourceKind::Wood, 3);
        stockpile.add(ResourceKind::Stone, 4);
        stockpile.add(ResourceKind::Berries, 0);
        assert_eq!(
            stockpile.totals(),
            vec![(ResourceKind::Stone, 4), (ResourceKind::Wood, 3)]
        );
    }
}
