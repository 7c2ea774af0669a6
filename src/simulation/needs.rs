//! Need scheduler - need drift and critical-need overrides
//!
//! Drift runs on ticks that fall on `need_interval_ticks`. The critical check
//! runs every tick and forces at most one override per worker per tick; the
//! fixed check order (hunger, energy, happiness) picks which one.

use crate::core::error::Result;
use crate::core::types::{Tick, WorkerId};
use crate::ecs::store::EntityStore;
use crate::ecs::world::World;
use crate::entity::needs::{CriticalNeed, NeedActivity};
use crate::entity::tasks::{NewTask, TaskKind, TaskPriority, TaskSource};
use crate::entity::worker::{Worker, WorkerState};
use crate::simulation::activity::{ActivityEvent, ActivityKind};
use crate::simulation::planner::resolve_target;

/// How a worker's current occupation affects its needs
pub fn need_activity(store: &EntityStore, worker: &Worker) -> NeedActivity {
    let kind = store.worker_task(worker.id).map(|t| t.kind);
    match (worker.state, kind) {
        (WorkerState::Performing, Some(TaskKind::Sleeping)) => NeedActivity::Sleeping,
        (WorkerState::Performing, Some(TaskKind::Socializing)) => NeedActivity::Socializing,
        (WorkerState::Performing, Some(TaskKind::Idle)) => NeedActivity::Idle,
        (WorkerState::Moving | WorkerState::Performing, _) => NeedActivity::Active,
        _ => NeedActivity::Idle,
    }
}

pub fn update_needs(world: &mut World, events: &mut Vec<ActivityEvent>) {
    let tick = world.current_tick;
    let drift = tick % world.config.need_interval_ticks.max(1) == 0;

    for worker_id in world.store.worker_ids() {
        if drift {
            let Ok(worker) = world.store.get_worker(worker_id) else {
                continue;
            };
            let activity = need_activity(&world.store, worker);
            if let Ok(worker) = world.store.worker_mut(worker_id) {
                worker.needs.update(activity, &world.config, &mut world.rng);
            }
        }

        if let Err(err) = check_critical(world, worker_id, tick, events) {
            tracing::warn!(worker = %worker_id, error = %err, "critical need override failed");
        }
    }
}

/// Pre-empt the worker if one of its needs is critical
///
/// The override only happens when the need can be served from here; a lonely
/// worker keeps its current task instead of trading it for a Socializing task
/// with nobody to talk to.
fn check_critical(
    world: &mut World,
    worker_id: WorkerId,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<()> {
    let worker = world.store.get_worker(worker_id)?;
    if tick < worker.next_override_tick {
        return Ok(());
    }
    let Some(need) = worker.needs.critical(&world.config) else {
        return Ok(());
    };
    let override_kind = need.override_task();
    if world.store.worker_task(worker_id).map(|t| t.kind) == Some(override_kind) {
        return Ok(());
    }

    let level = match need {
        CriticalNeed::Hunger => worker.needs.hunger,
        CriticalNeed::Energy => worker.needs.energy,
        CriticalNeed::Happiness => worker.needs.happiness,
    };
    let was_waiting = matches!(worker.state, WorkerState::AwaitingDecision { .. });

    let radius = world.config.social_radius;
    let Some(target) = resolve_target(&world.store, worker_id, override_kind, radius) else {
        tracing::trace!(worker = %worker_id, ?need, level, "critical need has nothing to serve it");
        return Ok(());
    };

    let task_id = world.store.create_task(
        NewTask::new(override_kind)
            .with_target(target)
            .with_priority(TaskPriority::Critical)
            .with_source(TaskSource::CriticalNeed),
    )?;
    // Any previous task is released by the assignment
    world.store.assign_task(task_id, worker_id)?;

    let worker = world.store.get_worker(worker_id)?;
    tracing::info!(
        worker = %worker_id,
        name = %worker.name,
        ?need,
        level,
        was_waiting,
        "critical need override"
    );
    events.push(
        ActivityEvent::new(
            tick,
            worker,
            ActivityKind::CriticalNeed,
            format!("{need:?} critical ({level:.0}), switching to {override_kind}"),
        )
        .at(target.cell),
    );
    Ok(())
}
