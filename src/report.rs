//! End-of-run colony summary, printable as text or JSON

use std::fmt;

use serde::Serialize;

use crate::core::error::Result;
use crate::ecs::world::World;
use crate::entity::worker::WorkerState;

#[derive(Debug, Clone, Serialize)]
pub struct ColonyReport {
    pub tick: u64,
    pub workers: Vec<WorkerLine>,
    pub buildings: Vec<BuildingLine>,
    pub stockpile: Vec<(String, u32)>,
    /// Units left in the world's resource nodes
    pub resources_remaining: u32,
    pub open_tasks: usize,
    #[serde(skip)]
    map: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerLine {
    pub name: String,
    pub position: [i32; 2],
    pub state: String,
    pub task: Option<String>,
    pub hunger: f32,
    pub energy: f32,
    pub happiness: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingLine {
    pub kind: String,
    pub position: [i32; 2],
    pub complete: bool,
    pub progress: f32,
}

fn state_label(state: WorkerState) -> String {
    match state {
        WorkerState::Idle => "idle".into(),
        WorkerState::AwaitingDecision { request } => format!("awaiting oracle ({request})"),
        WorkerState::Moving => "moving".into(),
        WorkerState::Performing => "performing".into(),
    }
}

impl ColonyReport {
    pub fn from_world(world: &World) -> Self {
        let store = &world.store;
        let workers = store
            .get_all_workers()
            .map(|w| WorkerLine {
                name: w.name.clone(),
                position: [w.position.x, w.position.y],
                state: state_label(w.state),
                task: store.worker_task(w.id).map(|t| t.kind.to_string()),
                hunger: w.needs.hunger,
                energy: w.needs.energy,
                happiness: w.needs.happiness,
            })
            .collect();
        let buildings = store
            .get_all_buildings()
            .map(|b| BuildingLine {
                kind: format!("{:?}", b.kind),
                position: [b.x, b.y],
                complete: b.complete,
                progress: b.progress,
            })
            .collect();

        Self {
            tick: world.current_tick,
            workers,
            buildings,
            stockpile: store
                .stockpile()
                .totals()
                .into_iter()
                .map(|(kind, amount)| (format!("{kind:?}"), amount))
                .collect(),
            resources_remaining: store.get_all_resources().map(|r| r.quantity).sum(),
            open_tasks: store.open_tasks().len(),
            map: store.grid().ascii(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn map(&self) -> &str {
        &self.map
    }
}

impl fmt::Display for ColonyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Colony at tick {} ===", self.tick)?;
        writeln!(f, "Workers ({}):", self.workers.len())?;
        for w in &self.workers {
            writeln!(
                f,
                "  {:<12} ({:>3}, {:>3})  {:<20} hunger {:>5.1}  energy {:>5.1}  happiness {:>5.1}",
                w.name,
                w.position[0],
                w.position[1],
                match &w.task {
                    Some(task) => format!("{} [{}]", w.state, task),
                    None => w.state.clone(),
                },
                w.hunger,
                w.energy,
                w.happiness,
            )?;
        }
        if !self.buildings.is_empty() {
            writeln!(f, "Buildings:")?;
            for b in &self.buildings {
                let status = if b.complete {
                    "complete".to_string()
                } else {
                    format!("{:.0}%", b.progress)
                };
                writeln!(f, "  {:<10} at ({}, {})  {}", b.kind, b.position[0], b.position[1], status)?;
            }
        }
        write!(f, "Stockpile:")?;
        if self.stockpile.is_empty() {
            write!(f, " empty")?;
        }
        for (kind, amount) in &self.stockpile {
            write!(f, " {kind}={amount}")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Resources remaining: {}  Open tasks: {}",
            self.resources_remaining, self.open_tasks
        )?;
        write!(f, "{}", self.map)
    }
}
