//! Gather worker context for oracle prompts
//!
//! A `WorkerContext` is a plain snapshot: stats of one worker, what is near
//! it and what it remembers. It is built on the tick thread and moved into
//! the oracle request, so the oracle never touches the store.

use crate::core::error::Result;
use crate::core::types::{GridPos, Tick, WorkerId};
use crate::ecs::store::EntityStore;
use crate::entity::needs::Needs;

/// Entities further than this are left out of the prompt
pub const NEARBY_RADIUS: u32 = 10;
const MAX_LISTED: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerContext {
    pub worker_id: WorkerId,
    pub name: String,
    pub tick: Tick,
    pub position: GridPos,
    pub needs: Needs,
    pub health: f32,
    pub nearby_resources: Vec<String>,
    pub nearby_buildings: Vec<String>,
    pub nearby_workers: Vec<String>,
    pub stockpile: Vec<String>,
    pub memory: Vec<String>,
}

impl WorkerContext {
    pub fn gather(store: &EntityStore, worker_id: WorkerId, tick: Tick) -> Result<Self> {
        let worker = store.get_worker(worker_id)?;
        let here = worker.position;

        let mut resources: Vec<_> = store
            .get_all_resources()
            .filter(|r| r.quantity > 0)
            .map(|r| (r.position().manhattan(&here), r))
            .filter(|(d, _)| *d <= NEARBY_RADIUS)
            .collect();
        resources.sort_by_key(|(d, r)| (*d, r.id));
        let nearby_resources = resources
            .into_iter()
            .take(MAX_LISTED)
            .map(|(d, r)| format!("{:?} x{} ({} steps)", r.kind, r.quantity, d))
            .collect();

        let mut buildings: Vec<_> = store
            .get_all_buildings()
            .map(|b| (b.footprint().distance_to(here), b))
            .filter(|(d, _)| *d <= NEARBY_RADIUS)
            .collect();
        buildings.sort_by_key(|(d, b)| (*d, b.id));
        let nearby_buildings = buildings
            .into_iter()
            .take(MAX_LISTED)
            .map(|(d, b)| {
                let status = if b.complete {
                    "complete".to_string()
                } else {
                    format!("{:.0}% built", b.progress)
                };
                format!("{:?}, {} ({} steps)", b.kind, status, d)
            })
            .collect();

        let mut workers: Vec<_> = store
            .get_all_workers()
            .filter(|w| w.id != worker_id)
            .map(|w| (w.position.manhattan(&here), w))
            .filter(|(d, _)| *d <= NEARBY_RADIUS)
            .collect();
        workers.sort_by_key(|(d, w)| (*d, w.id));
        let nearby_workers = workers
            .into_iter()
            .take(MAX_LISTED)
            .map(|(d, w)| format!("{} ({} steps)", w.name, d))
            .collect();

        let stockpile = store
            .stockpile()
            .totals()
            .into_iter()
            .map(|(kind, qty)| format!("{kind:?} {qty}"))
            .collect();

        Ok(Self {
            worker_id,
            name: worker.name.clone(),
            tick,
            position: here,
            needs: worker.needs,
            health: worker.health,
            nearby_resources,
            nearby_buildings,
            nearby_workers,
            stockpile,
            memory: worker.memory.iter().cloned().collect(),
        })
    }

    /// Text summary sent as the user message
    pub fn prompt(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Worker: {}\n", self.name));
        s.push_str(&format!("Time: Tick {}\n", self.tick));
        s.push_str(&format!("Position: {}\n", self.position));
        s.push_str(&format!(
            "Hunger: {:.0}/100, Energy: {:.0}/100, Happiness: {:.0}/100, Health: {:.0}\n",
            self.needs.hunger, self.needs.energy, self.needs.happiness, self.health
        ));

        let sections = [
            ("Nearby resources", &self.nearby_resources),
            ("Nearby buildings", &self.nearby_buildings),
            ("Nearby workers", &self.nearby_workers),
            ("Stockpile", &self.stockpile),
            ("Recent memory", &self.memory),
        ];
        for (title, lines) in sections {
            if lines.is_empty() {
                continue;
            }
            s.push_str(&format!("\n{title}:\n"));
            for line in lines {
                s.push_str(&format!("- {line}\n"));
            }
        }
        s.push_str("\nWhat should this worker do next?");
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::building::{BuildingKind, NewBuilding};
    use crate::entity::resource::{NewResource, ResourceKind};
    use crate::entity::worker::NewWorker;
    use crate::world::GridWorld;

    #[test]
    fn test_context_lists_nearby_things() {
        let mut store = EntityStore::new(GridWorld::flat(30, 30));
        let ada = store.create_worker(NewWorker::new("Ada", GridPos::new(5, 5))).unwrap();
        store.create_worker(NewWorker::new("Bram", GridPos::new(6, 5))).unwrap();
        store.create_worker(NewWorker::new("Far", GridPos::new(29, 29))).unwrap();
        store
            .create_resource(NewResource::new(ResourceKind::Stone, GridPos::new(5, 8), 50))
            .unwrap();
        store
            .create_building(NewBuilding::new(BuildingKind::House, GridPos::new(8, 8)))
            .unwrap();
        store.stockpile_mut().add(ResourceKind::Wood, 12);

        let ctx = WorkerContext::gather(&store, ada, 17).unwrap();
        assert_eq!(ctx.nearby_workers, vec!["Bram (1 steps)".to_string()]);
        assert_eq!(ctx.nearby_resources, vec!["Stone x50 (3 steps)".to_string()]);
        assert_eq!(ctx.nearby_buildings.len(), 1);
        assert_eq!(ctx.stockpile, vec!["Wood 12".to_string()]);

        let prompt = ctx.prompt();
        assert!(prompt.contains("Worker: Ada"));
        assert!(prompt.contains("Tick 17"));
        assert!(prompt.contains("- Bram (1 steps)"));
        assert!(!prompt.contains("Far"));
    }

    #[test]
    fn test_unknown_worker() {
        let store = EntityStore::new(GridWorld::flat(10, 10));
        assert!(WorkerContext::gather(&store, WorkerId(1), 0).is_err());
    }
}
