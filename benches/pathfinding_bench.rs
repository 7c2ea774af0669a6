//! A* and full-tick benchmarks
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use colony_sim::core::config::SimulationConfig;
use colony_sim::core::types::GridPos;
use colony_sim::ecs::world::World;
use colony_sim::entity::building::{BuildingKind, NewBuilding};
use colony_sim::entity::resource::{NewResource, ResourceKind};
use colony_sim::entity::tasks::{NewTask, TaskKind};
use colony_sim::entity::worker::NewWorker;
use colony_sim::simulation::tick::run_simulation_tick;
use colony_sim::spatial::pathfinding::find_path;
use colony_sim::world::GridWorld;

/// Serpentine walls with alternating gaps
fn maze(size: i32) -> World {
    let mut world = World::flat(size, size, SimulationConfig::default());
    for x in (2..size - 1).step_by(3) {
        let gap = if (x / 3) % 2 == 0 { size - 1 } else { 0 };
        for y in 0..size {
            if y != gap {
                let _ = world
                    .store
                    .create_building(NewBuilding::new(BuildingKind::Wall, GridPos::new(x, y)).free());
            }
        }
    }
    world
}

fn bench_find_path(c: &mut Criterion) {
    let open = GridWorld::generate(100, 100, 7).expect("valid dimensions");
    c.bench_function("find_path_open_100x100", |b| {
        b.iter(|| find_path(black_box(&open), GridPos::new(0, 0), GridPos::new(99, 99)))
    });

    let maze = maze(60);
    c.bench_function("find_path_maze_60x60", |b| {
        b.iter(|| {
            find_path(
                black_box(maze.store.grid()),
                GridPos::new(0, 0),
                GridPos::new(59, 59),
            )
        })
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut world = World::generate(100, 100, 11, SimulationConfig::default()).expect("valid world");
    for i in 0..100 {
        let pos = GridPos::new((i * 7) % 100, (i * 13) % 100);
        let _ = world.store.create_worker(NewWorker::new(format!("w{i}"), pos));
        let spot = GridPos::new((i * 31 + 5) % 100, (i * 17 + 3) % 100);
        let _ = world
            .store
            .create_resource(NewResource::new(ResourceKind::Wood, spot, 1_000));
        let _ = world.store.create_task(NewTask::new(TaskKind::Woodcutting));
    }

    c.bench_function("tick_100_workers", |b| {
        b.iter(|| run_simulation_tick(black_box(&mut world)))
    });
}

criterion_group!(benches, bench_find_path, bench_tick);
criterion_main!(benches);
