//! Oracle-driven planning through the full tick loop

use std::sync::Arc;
use std::time::Duration;

use colony_sim::core::config::SimulationConfig;
use colony_sim::core::types::{GridPos, WorkerId};
use colony_sim::ecs::world::World;
use colony_sim::entity::needs::Needs;
use colony_sim::entity::resource::{NewResource, ResourceKind};
use colony_sim::entity::tasks::{TaskKind, TaskSource};
use colony_sim::entity::worker::{NewWorker, WorkerState, WorkerUpdate};
use colony_sim::llm::{DecisionOracle, OracleDispatcher, ScriptedOracle};
use colony_sim::simulation::activity::{ActivityEvent, ActivityKind};
use colony_sim::simulation::tick::run_simulation_tick;

fn colony(oracle: impl DecisionOracle + 'static, timeout: Duration) -> (World, WorkerId) {
    let config = SimulationConfig {
        need_interval_ticks: 10_000,
        ..SimulationConfig::default()
    };
    let dispatcher = OracleDispatcher::on_current_runtime(Arc::new(oracle), timeout).unwrap();
    let mut world = World::flat(12, 12, config).with_oracle(dispatcher);
    let id = world
        .store
        .create_worker(NewWorker::new("Ada", GridPos::new(1, 1)))
        .unwrap();
    world
        .store
        .create_resource(NewResource::new(ResourceKind::Wood, GridPos::new(4, 1), 10))
        .unwrap();
    world
        .store
        .create_resource(NewResource::new(ResourceKind::Stone, GridPos::new(8, 8), 10))
        .unwrap();
    (world, id)
}

/// Tick with short pauses so in-flight requests can land
async fn run_until(
    world: &mut World,
    max_ticks: usize,
    mut done: impl FnMut(&World, &[ActivityEvent]) -> bool,
) -> Vec<ActivityEvent> {
    let mut events = Vec::new();
    for _ in 0..max_ticks {
        events.extend(run_simulation_tick(world));
        if done(world, &events) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    events
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oracle_choice_becomes_a_task() {
    let (mut world, id) = colony(
        ScriptedOracle::new([TaskKind::Woodcutting]),
        Duration::from_secs(1),
    );

    let events = run_until(&mut world, 100, |w, _| {
        w.store.stockpile().get(ResourceKind::Wood) >= 10
    })
    .await;

    assert_eq!(world.store.stockpile().get(ResourceKind::Wood), 10);
    let assigned = events
        .iter()
        .find(|e| e.worker_id == id && e.kind == ActivityKind::TaskAssigned)
        .unwrap();
    assert!(assigned.detail.contains("Woodcutting"));
    assert_eq!(assigned.location, Some(GridPos::new(4, 1)));
    assert!(events.iter().any(|e| e.kind == ActivityKind::TaskCompleted));
    // Finished oracle tasks do not linger
    assert!(world
        .store
        .get_all_tasks()
        .all(|t| t.source != TaskSource::Oracle));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_reply_after_critical_override_is_discarded() {
    let (mut world, id) = colony(
        ScriptedOracle::new([TaskKind::Mining]).with_delay(Duration::from_millis(200)),
        Duration::from_secs(1),
    );

    run_simulation_tick(&mut world);
    assert!(matches!(
        world.store.get_worker(id).unwrap().state,
        WorkerState::AwaitingDecision { .. }
    ));

    world
        .store
        .update_worker(
            id,
            WorkerUpdate {
                needs: Some(Needs {
                    hunger: 95.0,
                    energy: 100.0,
                    happiness: 80.0,
                }),
                ..WorkerUpdate::default()
            },
        )
        .unwrap();
    run_simulation_tick(&mut world);
    assert_eq!(world.store.worker_task(id).unwrap().kind, TaskKind::Eating);

    // Let the delayed Mining reply arrive, then apply it
    tokio::time::sleep(Duration::from_millis(400)).await;
    run_simulation_tick(&mut world);

    assert!(world
        .store
        .get_all_tasks()
        .all(|t| t.source != TaskSource::Oracle));
    assert_eq!(world.store.worker_task(id).unwrap().kind, TaskKind::Eating);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oracle_failure_leaves_worker_idle() {
    let (mut world, id) = colony(
        ScriptedOracle::default().then_fail("service unavailable"),
        Duration::from_secs(1),
    );

    let events = run_until(&mut world, 50, |_, events| {
        events.iter().any(|e| e.kind == ActivityKind::Failure)
    })
    .await;

    assert!(events.iter().any(|e| e.kind == ActivityKind::Failure));
    let worker = world.store.get_worker(id).unwrap();
    assert_eq!(worker.state, WorkerState::Idle);
    assert!(worker.task.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_oracle_times_out() {
    let (mut world, id) = colony(
        ScriptedOracle::new([TaskKind::Mining]).with_delay(Duration::from_secs(5)),
        Duration::from_millis(50),
    );

    let events = run_until(&mut world, 50, |_, events| {
        events.iter().any(|e| e.kind == ActivityKind::Failure)
    })
    .await;

    let failure = events
        .iter()
        .find(|e| e.kind == ActivityKind::Failure)
        .unwrap();
    assert!(failure.detail.contains("no reply"));
    assert!(world.store.get_worker(id).unwrap().task.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_free_text_reply_is_parsed() {
    let (mut world, _) = colony(
        ScriptedOracle::from_text(["I think a rest would do".to_string()]),
        Duration::from_secs(1),
    );

    let events = run_until(&mut world, 50, |_, events| {
        events.iter().any(|e| e.kind == ActivityKind::TaskAssigned)
    })
    .await;

    let assigned = events
        .iter()
        .find(|e| e.kind == ActivityKind::TaskAssigned)
        .unwrap();
    assert!(assigned.detail.contains("Sleeping"));
    // Nowhere to sleep, so in place
    assert_eq!(assigned.location, Some(GridPos::new(1, 1)));
    assert!(events.iter().all(|e| e.kind != ActivityKind::Failure));
}
