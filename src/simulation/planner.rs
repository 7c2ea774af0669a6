//! Task planner - chooses a task and target for each idle worker
//!
//! Idle workers first take open tasks from the queue. With an oracle
//! configured, a worker that found nothing asks the oracle and waits in
//! `AwaitingDecision` until the reply is applied on a later tick. Assigned
//! tasks that still lack a target get one resolved here.

use crate::core::error::Result;
use crate::core::types::{TaskId, Tick, WorkerId};
use crate::ecs::store::EntityStore;
use crate::ecs::world::World;
use crate::entity::building::BuildingKind;
use crate::entity::resource::ResourceKind;
use crate::entity::tasks::{NewTask, TargetSubject, TaskKind, TaskSource, TaskTarget, TaskUpdate};
use crate::entity::worker::WorkerState;
use crate::llm::context::WorkerContext;
use crate::llm::oracle::OracleReply;
use crate::simulation::activity::{ActivityEvent, ActivityKind};

/// Pick the target for a task kind as seen from `worker_id`
///
/// Candidates are ranked by distance, then id. Eating and Sleeping fall back
/// to the worker's own cell; other kinds yield None when nothing qualifies.
pub fn resolve_target(
    store: &EntityStore,
    worker_id: WorkerId,
    kind: TaskKind,
    social_radius: u32,
) -> Option<TaskTarget> {
    let worker = store.get_worker(worker_id).ok()?;
    let here = worker.position;
    let in_place = TaskTarget::cell(here);

    let nearest_resource = |wanted: ResourceKind| {
        store
            .get_all_resources()
            .filter(|r| r.kind == wanted && r.quantity > 0)
            .min_by_key(|r| (r.position().manhattan(&here), r.id))
            .map(|r| TaskTarget::resource(r.id, r.position()))
    };

    match kind {
        TaskKind::Mining | TaskKind::Woodcutting => {
            kind.harvests().and_then(nearest_resource)
        }
        TaskKind::Building => store
            .get_all_buildings()
            .filter(|b| !b.complete)
            .filter(|b| b.materials_paid || store.stockpile().has_materials(&b.material_cost))
            .filter_map(|b| {
                let cell = store.approach_cell(b.id, here)?;
                Some((b.footprint().distance_to(here), b.id, cell))
            })
            .min_by_key(|(d, id, _)| (*d, *id))
            .map(|(_, id, cell)| TaskTarget::building(id, cell)),
        TaskKind::Socializing => store
            .get_all_workers()
            .filter(|w| w.id != worker_id)
            .map(|w| (w.position.manhattan(&here), w))
            .filter(|(d, _)| *d <= social_radius)
            .min_by_key(|(d, w)| (*d, w.id))
            .map(|(_, w)| TaskTarget::worker(w.id, w.position)),
        TaskKind::Eating => Some(nearest_resource(ResourceKind::Berries).unwrap_or(in_place)),
        TaskKind::Sleeping => Some(
            store
                .get_all_buildings()
                .filter(|b| b.complete && b.kind == BuildingKind::House)
                .filter_map(|b| {
                    let cell = store.approach_cell(b.id, here)?;
                    Some((b.footprint().distance_to(here), b.id, cell))
                })
                .min_by_key(|(d, id, _)| (*d, *id))
                .map(|(_, id, cell)| TaskTarget::building(id, cell))
                .unwrap_or(in_place),
        ),
        TaskKind::Idle => Some(in_place),
    }
}

/// Whether a preset target can still be worked for this kind
pub fn target_usable(store: &EntityStore, kind: TaskKind, target: &TaskTarget) -> bool {
    if !store.grid().is_walkable(target.cell) {
        return false;
    }
    match target.subject {
        TargetSubject::Resource(id) => store.get_resource(id).is_ok_and(|r| {
            r.quantity > 0 && kind.harvests().map_or(true, |wanted| wanted == r.kind)
        }),
        TargetSubject::Building(id) => store.get_building(id).is_ok_and(|b| match kind {
            TaskKind::Building => {
                !b.complete
                    && (b.materials_paid || store.stockpile().has_materials(&b.material_cost))
            }
            _ => true,
        }),
        TargetSubject::Worker(id) => store.get_worker(id).is_ok(),
        TargetSubject::Cell => !kind.requires_target(),
    }
}

pub fn plan_tasks(world: &mut World, events: &mut Vec<ActivityEvent>) {
    let tick = world.current_tick;
    fill_missing_targets(world, tick, events);

    let mut open = world.store.open_tasks();
    for worker_id in world.store.worker_ids() {
        let Ok(worker) = world.store.get_worker(worker_id) else {
            continue;
        };
        if worker.state != WorkerState::Idle || tick < worker.next_decision_tick {
            continue;
        }

        match take_queued_task(world, worker_id, &mut open, tick, events) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(worker = %worker_id, error = %err, "queued task assignment failed");
                continue;
            }
        }

        if world.oracle.is_some() {
            if let Err(err) = consult_oracle(world, worker_id, tick) {
                tracing::warn!(worker = %worker_id, error = %err, "oracle request failed");
            }
        }
    }
}

/// First open task this worker can resolve a target for
fn take_queued_task(
    world: &mut World,
    worker_id: WorkerId,
    open: &mut Vec<TaskId>,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<bool> {
    let radius = world.config.social_radius;
    let mut chosen = None;
    for (index, task_id) in open.iter().enumerate() {
        let task = world.store.get_task(*task_id)?;
        let target = match task.target {
            Some(target) if target_usable(&world.store, task.kind, &target) => Some(target),
            Some(_) => None,
            None => resolve_target(&world.store, worker_id, task.kind, radius),
        };
        if let Some(target) = target {
            chosen = Some((index, *task_id, target));
            break;
        }
    }
    let Some((index, task_id, target)) = chosen else {
        return Ok(false);
    };
    open.remove(index);

    world.store.update_task(
        task_id,
        TaskUpdate {
            target: Some(Some(target)),
            ..TaskUpdate::default()
        },
    )?;
    world.store.assign_task(task_id, worker_id)?;
    push_assigned(world, worker_id, task_id, tick, events)?;
    Ok(true)
}

fn push_assigned(
    world: &World,
    worker_id: WorkerId,
    task_id: TaskId,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<()> {
    let task = world.store.get_task(task_id)?;
    let worker = world.store.get_worker(worker_id)?;
    let mut event = ActivityEvent::new(
        tick,
        worker,
        ActivityKind::TaskAssigned,
        format!("took {} ({})", task.kind, task_id),
    );
    if let Some(target) = task.target {
        event = event.at(target.cell);
    }
    tracing::info!(worker = %worker_id, task = %task_id, kind = %task.kind, "task assigned");
    events.push(event);
    Ok(())
}

fn consult_oracle(world: &mut World, worker_id: WorkerId, tick: Tick) -> Result<()> {
    let prompt = WorkerContext::gather(&world.store, worker_id, tick)?.prompt();
    let cooldown = world.config.decision_cooldown_ticks;
    let Some(oracle) = world.oracle.as_mut() else {
        return Ok(());
    };
    let request = oracle.request(worker_id, prompt);
    let worker = world.store.worker_mut(worker_id)?;
    worker.state = WorkerState::AwaitingDecision { request };
    worker.next_decision_tick = tick + cooldown;
    tracing::debug!(worker = %worker_id, request, "oracle consulted");
    Ok(())
}

/// Resolve targets for assigned tasks that were queued without one
fn fill_missing_targets(world: &mut World, tick: Tick, events: &mut Vec<ActivityEvent>) {
    let radius = world.config.social_radius;
    let pending: Vec<_> = world
        .store
        .get_all_workers()
        .filter(|w| w.state == WorkerState::Moving)
        .filter_map(|w| {
            let task = world.store.worker_task(w.id)?;
            task.target.is_none().then_some((w.id, task.id, task.kind))
        })
        .collect();

    for (worker_id, task_id, kind) in pending {
        let result = match resolve_target(&world.store, worker_id, kind, radius) {
            Some(target) => world.store.update_task(
                task_id,
                TaskUpdate {
                    target: Some(Some(target)),
                    ..TaskUpdate::default()
                },
            ),
            None => abandon(world, worker_id, tick, format!("no target for {kind}"), events),
        };
        if let Err(err) = result {
            tracing::warn!(worker = %worker_id, task = %task_id, error = %err, "target resolution failed");
        }
    }
}

/// Give up the worker's current task and keep it out of planning briefly
pub(crate) fn abandon(
    world: &mut World,
    worker_id: WorkerId,
    tick: Tick,
    reason: String,
    events: &mut Vec<ActivityEvent>,
) -> Result<()> {
    let current = world.store.worker_task(worker_id).map(|t| (t.id, t.source));
    let was_override = matches!(current, Some((_, TaskSource::CriticalNeed)));
    if let Some((task_id, _)) = current {
        world.store.release_task(task_id)?;
    }
    let cooldown = world.config.abandon_cooldown_ticks;
    let worker = world.store.worker_mut(worker_id)?;
    worker.reset_to_idle();
    worker.next_decision_tick = tick + cooldown;
    if was_override {
        worker.next_override_tick = tick + cooldown;
    }
    tracing::info!(worker = %worker_id, %reason, "task abandoned");
    events.push(ActivityEvent::new(tick, worker, ActivityKind::TaskAbandoned, reason));
    Ok(())
}

/// Apply replies that are still wanted; the rest are dropped
pub fn apply_oracle_replies(world: &mut World, events: &mut Vec<ActivityEvent>) {
    let Some(oracle) = world.oracle.as_mut() else {
        return;
    };
    let replies = oracle.drain();
    let tick = world.current_tick;
    for reply in replies {
        if let Err(err) = apply_reply(world, reply, tick, events) {
            tracing::warn!(error = %err, "oracle reply could not be applied");
        }
    }
}

fn apply_reply(
    world: &mut World,
    reply: OracleReply,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<()> {
    let OracleReply {
        worker_id,
        request_id,
        result,
    } = reply;
    let worker = world.store.get_worker(worker_id)?;
    if worker.state != (WorkerState::AwaitingDecision { request: request_id }) {
        tracing::debug!(worker = %worker_id, request = request_id, "discarding stale oracle reply");
        return Ok(());
    }

    let kind = match result {
        Ok(kind) => kind,
        Err(err) => {
            tracing::warn!(worker = %worker_id, error = %err, "oracle failed, staying idle");
            let event = ActivityEvent::new(
                tick,
                worker,
                ActivityKind::Failure,
                format!("oracle unavailable: {err}"),
            );
            events.push(event);
            world.store.worker_mut(worker_id)?.state = WorkerState::Idle;
            return Ok(());
        }
    };

    world.store.worker_mut(worker_id)?.state = WorkerState::Idle;
    let radius = world.config.social_radius;
    let target = match kind {
        TaskKind::Idle => None,
        _ => resolve_target(&world.store, worker_id, kind, radius),
    };
    let Some(target) = target else {
        let worker = world.store.get_worker(worker_id)?;
        events.push(ActivityEvent::new(
            tick,
            worker,
            ActivityKind::OracleDecision,
            format!("considered {kind}, staying idle"),
        ));
        return Ok(());
    };

    let task_id = world.store.create_task(
        NewTask::new(kind)
            .with_target(target)
            .with_source(TaskSource::Oracle),
    )?;
    world.store.assign_task(task_id, worker_id)?;
    push_assigned(world, worker_id, task_id, tick, events)
}
