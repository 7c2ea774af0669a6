//! Scenario files - a starting colony described in TOML
//!
//! ```toml
//! width = 20
//! height = 20
//! seed = 42
//! ticks = 40
//!
//! [config]
//! harvest_per_tick = 5
//!
//! [[workers]]
//! name = "Ada"
//! x = 5
//! y = 5
//!
//! [[resources]]
//! kind = "Stone"
//! x = 5
//! y = 8
//! quantity = 50
//!
//! [[tasks]]
//! kind = "MINING"
//! at = [5, 8]
//! assign_to = "Ada"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::GridPos;
use crate::ecs::world::World;
use crate::entity::building::NewBuilding;
use crate::entity::resource::{NewResource, ResourceKind};
use crate::entity::tasks::{NewTask, TaskKind, TaskPriority, TaskTarget};
use crate::entity::worker::NewWorker;
use crate::world::Occupant;

fn default_side() -> i32 {
    20
}

fn default_ticks() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_side")]
    pub width: i32,
    #[serde(default = "default_side")]
    pub height: i32,
    #[serde(default)]
    pub seed: i64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub config: SimulationConfig,
    #[serde(default)]
    pub workers: Vec<NewWorker>,
    #[serde(default)]
    pub buildings: Vec<NewBuilding>,
    #[serde(default)]
    pub resources: Vec<NewResource>,
    #[serde(default)]
    pub stockpile: Vec<StockEntry>,
    #[serde(default)]
    pub tasks: Vec<ScenarioTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub kind: ResourceKind,
    pub amount: u32,
}

/// A queued task, optionally aimed at a cell and handed to a named worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTask {
    pub kind: TaskKind,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Cell of the resource, building or bare location to work on
    #[serde(default)]
    pub at: Option<[i32; 2]>,
    #[serde(default)]
    pub assign_to: Option<String>,
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Generate the world and populate it in file order
    pub fn build_world(&self) -> Result<World> {
        let mut world = World::generate(self.width, self.height, self.seed, self.config.clone())?;

        for building in &self.buildings {
            world.store.create_building(building.clone())?;
        }
        for resource in &self.resources {
            world.store.create_resource(resource.clone())?;
        }
        for worker in &self.workers {
            world.store.create_worker(worker.clone())?;
        }
        for entry in &self.stockpile {
            world.store.stockpile_mut().add(entry.kind, entry.amount);
        }
        for task in &self.tasks {
            self.add_task(&mut world, task)?;
        }
        Ok(world)
    }

    fn add_task(&self, world: &mut World, task: &ScenarioTask) -> Result<()> {
        let worker_id = match &task.assign_to {
            Some(name) => Some(
                world
                    .store
                    .get_all_workers()
                    .find(|w| &w.name == name)
                    .map(|w| w.id)
                    .ok_or_else(|| SimError::InvalidConfig(format!("unknown worker '{name}'")))?,
            ),
            None => None,
        };

        let target = match task.at {
            Some([x, y]) => {
                let cell = GridPos::new(x, y);
                let from = match worker_id {
                    Some(id) => world.store.get_worker(id)?.position,
                    None => cell,
                };
                Some(match world.store.grid().cell_at(cell)?.occupant {
                    Some(Occupant::Resource(id)) => TaskTarget::resource(id, cell),
                    Some(Occupant::Building(id)) => {
                        let approach = world.store.approach_cell(id, from).ok_or_else(|| {
                            SimError::Unreachable {
                                from,
                                to: cell,
                            }
                        })?;
                        TaskTarget::building(id, approach)
                    }
                    None => TaskTarget::cell(cell),
                })
            }
            None => None,
        };

        let mut spec = NewTask::new(task.kind).with_priority(task.priority);
        if let Some(target) = target {
            spec = spec.with_target(target);
        }
        let task_id = world.store.create_task(spec)?;
        if let Some(worker_id) = worker_id {
            world.store.assign_task(task_id, worker_id)?;
        }
        Ok(())
    }
}
