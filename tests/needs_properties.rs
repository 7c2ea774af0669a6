//! Property tests: bounded needs and grid consistency over random runs

use proptest::prelude::*;

use colony_sim::core::config::SimulationConfig;
use colony_sim::core::types::GridPos;
use colony_sim::ecs::world::World;
use colony_sim::entity::needs::Needs;
use colony_sim::entity::resource::{NewResource, ResourceKind};
use colony_sim::entity::tasks::{NewTask, TaskKind};
use colony_sim::entity::worker::NewWorker;
use colony_sim::simulation::tick::run_ticks;
use colony_sim::world::Occupant;

fn need() -> impl Strategy<Value = f32> {
    0.0f32..=100.0
}

fn needs() -> impl Strategy<Value = Needs> {
    (need(), need(), need()).prop_map(|(hunger, energy, happiness)| Needs {
        hunger,
        energy,
        happiness,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn needs_stay_in_range(
        seed in 0i64..10_000,
        ticks in 1u64..150,
        starts in prop::collection::vec(((0i32..20, 0i32..20), needs()), 1..6),
    ) {
        let mut world = World::generate(20, 20, seed, SimulationConfig::default()).unwrap();
        for (i, ((x, y), needs)) in starts.into_iter().enumerate() {
            world
                .store
                .create_worker(NewWorker::new(format!("w{i}"), GridPos::new(x, y)).with_needs(needs))
                .unwrap();
        }
        let _ = world
            .store
            .create_resource(NewResource::new(ResourceKind::Wood, GridPos::new(10, 10), 30));
        world.store.create_task(NewTask::new(TaskKind::Woodcutting)).unwrap();

        run_ticks(&mut world, ticks);

        for worker in world.store.get_all_workers() {
            for value in [worker.needs.hunger, worker.needs.energy, worker.needs.happiness] {
                prop_assert!((0.0..=100.0).contains(&value), "{} out of range", value);
            }
            prop_assert!(world.store.grid().is_walkable(worker.position));
        }
    }

    #[test]
    fn resource_cells_match_store(
        seed in 0i64..10_000,
        ticks in 1u64..80,
    ) {
        let mut world = World::generate(20, 20, seed, SimulationConfig::default()).unwrap();
        world.store.create_worker(NewWorker::new("Ada", GridPos::new(2, 2))).unwrap();
        world.store.create_worker(NewWorker::new("Bram", GridPos::new(17, 17))).unwrap();
        for (kind, pos) in [
            (ResourceKind::Stone, GridPos::new(4, 4)),
            (ResourceKind::Wood, GridPos::new(15, 15)),
        ] {
            let _ = world.store.create_resource(NewResource::new(kind, pos, 15));
        }
        world.store.create_task(NewTask::new(TaskKind::Mining)).unwrap();
        world.store.create_task(NewTask::new(TaskKind::Woodcutting)).unwrap();

        run_ticks(&mut world, ticks);

        for resource in world.store.get_all_resources() {
            let cell = world.store.grid().cell_at(resource.position()).unwrap();
            prop_assert_eq!(cell.occupant, Some(Occupant::Resource(resource.id)));
        }
        for cell in world.store.grid().cells() {
            if let Some(Occupant::Resource(id)) = cell.occupant {
                prop_assert!(world.store.get_resource(id).is_ok());
            }
        }
    }
}
