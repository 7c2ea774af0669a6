//! Colony - headless runner
//!
//! Builds a colony from a scenario file (or a generated map with a random
//! starting population), runs the tick loop inside a tokio runtime so oracle
//! calls can complete between ticks, and prints a summary of the colony.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use colony_sim::core::error::Result;
use colony_sim::core::types::GridPos;
use colony_sim::entity::resource::{NewResource, ResourceKind};
use colony_sim::entity::tasks::{NewTask, TaskKind};
use colony_sim::entity::worker::NewWorker;
use colony_sim::llm::{LlmOracle, OracleDispatcher};
use colony_sim::simulation::{run_simulation_tick, TracingSink};
use colony_sim::spatial::nearest_walkable;
use colony_sim::{ColonyReport, Scenario, SimulationConfig, World};

const NAMES: &[&str] = &[
    "Ada", "Bram", "Cora", "Dov", "Edda", "Finn", "Gale", "Hale", "Iris", "Jory",
];

/// Colony simulation runner
#[derive(Parser, Debug)]
#[command(name = "colony")]
#[command(about = "Run a grid colony simulation and print a summary")]
struct Args {
    /// Scenario file (TOML); overrides the generated-map options
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Map width in cells
    #[arg(long, default_value_t = 40)]
    width: i32,

    /// Map height in cells
    #[arg(long, default_value_t = 40)]
    height: i32,

    /// Terrain seed
    #[arg(long, default_value_t = 42)]
    seed: i64,

    /// Workers to spawn on a generated map
    #[arg(long, default_value_t = 5)]
    workers: usize,

    /// Ticks to run (defaults to the scenario's count, or 100)
    #[arg(long)]
    ticks: Option<u64>,

    /// Simulation config file (TOML), replacing any scenario config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consult the LLM oracle for idle workers (reads LLM_API_KEY, LLM_API_URL, LLM_MODEL)
    #[arg(long)]
    oracle: bool,

    /// Wall-clock pause between ticks, in milliseconds
    #[arg(long, default_value_t = 0)]
    tick_ms: u64,

    /// Log filter, e.g. "colony_sim=debug"; falls back to RUST_LOG
    #[arg(long)]
    log: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("colony_sim=info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => Some(SimulationConfig::load(path)?),
        None => None,
    };

    let (mut world, scenario_ticks) = match &args.scenario {
        Some(path) => {
            let mut scenario = Scenario::load(path)?;
            if let Some(config) = config {
                scenario.config = config;
            }
            tracing::info!(path = %path.display(), "loading scenario");
            (scenario.build_world()?, Some(scenario.ticks))
        }
        None => {
            let mut world =
                World::generate(args.width, args.height, args.seed, config.unwrap_or_default())?;
            populate(&mut world, args.workers, args.seed)?;
            (world, None)
        }
    };
    let ticks = args.ticks.or(scenario_ticks).unwrap_or(100);

    let runtime = Runtime::new()?;

    if args.oracle {
        match LlmOracle::from_env() {
            Ok(oracle) => {
                let timeout = Duration::from_millis(world.config.oracle_timeout_ms);
                world.set_oracle(Some(OracleDispatcher::new(
                    Arc::new(oracle),
                    runtime.handle().clone(),
                    timeout,
                )));
                tracing::info!("oracle enabled");
            }
            Err(err) => {
                tracing::warn!(error = %err, "oracle unavailable, running without it");
            }
        }
    }
    world.add_sink(Box::new(TracingSink));

    tracing::info!(
        ticks,
        workers = world.store.worker_count(),
        oracle = world.has_oracle(),
        "simulation starting"
    );
    let pause = Duration::from_millis(args.tick_ms);
    runtime.block_on(async {
        for _ in 0..ticks {
            run_simulation_tick(&mut world);
            if pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(pause).await;
            }
        }
    });
    tracing::info!(tick = world.current_tick, "simulation finished");

    let report = ColonyReport::from_world(&world);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Scatter workers and a few resource nodes over a generated map and queue
/// one harvesting task per worker
fn populate(world: &mut World, workers: usize, seed: i64) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let (width, height) = (world.store.grid().width(), world.store.grid().height());
    let random_cell = |rng: &mut ChaCha8Rng| {
        GridPos::new(rng.gen_range(0..width), rng.gen_range(0..height))
    };

    let kinds = [ResourceKind::Wood, ResourceKind::Stone, ResourceKind::Berries];
    let mut placed = 0;
    for i in 0..workers * 3 {
        let Some(cell) = nearest_walkable(world.store.grid(), random_cell(&mut rng)) else {
            continue;
        };
        let kind = kinds[i % kinds.len()];
        let quantity = rng.gen_range(20..=60);
        if world.store.create_resource(NewResource::new(kind, cell, quantity)).is_ok() {
            placed += 1;
        }
    }

    for i in 0..workers {
        let name = match NAMES.get(i) {
            Some(name) => name.to_string(),
            None => format!("Worker {}", i + 1),
        };
        world.store.create_worker(NewWorker::new(name, random_cell(&mut rng)))?;
        let kind = if i % 2 == 0 {
            TaskKind::Woodcutting
        } else {
            TaskKind::Mining
        };
        world.store.create_task(NewTask::new(kind))?;
    }

    tracing::info!(workers, resources = placed, "population placed");
    Ok(())
}
