//! Colony Sim - grid-based colony simulation with autonomous workers

pub mod core;
pub mod ecs;
pub mod entity;
pub mod llm;
pub mod report;
pub mod scenario;
pub mod simulation;
pub mod spatial;
pub mod world;

pub use crate::core::{GridPos, Result, SimError, SimulationConfig};
pub use crate::ecs::World;
pub use crate::report::ColonyReport;
pub use crate::scenario::Scenario;
pub use crate::simulation::{run_simulation_tick, run_ticks};
