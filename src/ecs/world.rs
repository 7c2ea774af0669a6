//! World - the explicitly constructed simulation context
//!
//! Everything a tick needs is reachable from here: the clock, the config,
//! the entity store (which owns the grid), the need RNG, the optional oracle
//! and the activity sinks. Independent worlds share nothing.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::ecs::store::EntityStore;
use crate::entity::needs::Needs;
use crate::llm::oracle::OracleDispatcher;
use crate::simulation::activity::{ActivityEvent, ActivityLog, ActivitySink};
use crate::world::GridWorld;

pub struct World {
    pub current_tick: Tick,
    pub config: SimulationConfig,
    pub store: EntityStore,
    pub activity: ActivityLog,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) oracle: Option<OracleDispatcher>,
    sinks: Vec<Box<dyn ActivitySink>>,
}

impl World {
    /// Wrap an existing grid; the need RNG is seeded from the grid seed
    pub fn new(grid: GridWorld, config: SimulationConfig) -> Self {
        let seed = grid.seed().unwrap_or(0) as u64;
        let store = EntityStore::new(grid).with_default_needs(Needs::from_config(&config));
        Self {
            current_tick: 0,
            activity: ActivityLog::new(config.activity_log_capacity),
            config,
            store,
            rng: ChaCha8Rng::seed_from_u64(seed),
            oracle: None,
            sinks: Vec::new(),
        }
    }

    /// Generate terrain and seed water resources
    pub fn generate(width: i32, height: i32, seed: i64, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let grid = GridWorld::generate(width, height, seed)?;
        let mut world = Self::new(grid, config);
        let water = world.store.seed_water();
        tracing::info!(width, height, seed, water, "world generated");
        Ok(world)
    }

    /// Flat, empty world; handy for tests
    pub fn flat(width: i32, height: i32, config: SimulationConfig) -> Self {
        Self::new(GridWorld::flat(width, height), config)
    }

    pub fn with_oracle(mut self, oracle: OracleDispatcher) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn set_oracle(&mut self, oracle: Option<OracleDispatcher>) {
        self.oracle = oracle;
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn add_sink(&mut self, sink: Box<dyn ActivitySink>) {
        self.sinks.push(sink);
    }

    /// Reseed the need RNG, e.g. to replay a run
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Hand a tick's events to the log, the sinks and worker memories
    pub(crate) fn publish(&mut self, events: &[ActivityEvent]) {
        let capacity = self.config.memory_capacity;
        for event in events {
            if event.is_memorable() {
                if let Ok(worker) = self.store.worker_mut(event.worker_id) {
                    worker.remember(format!("tick {}: {}", event.tick, event.detail), capacity);
                }
            }
            for sink in &mut self.sinks {
                sink.record(event);
            }
            self.activity.push(event.clone());
        }
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("current_tick", &self.current_tick)
            .field("workers", &self.store.worker_count())
            .field("oracle", &self.oracle)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
