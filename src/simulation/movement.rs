//! Movement executor - requests paths and walks them one cell per tick
//!
//! Path requests for the whole tick are gathered first and solved together
//! (in parallel past `parallel_threshold`), since A* only reads the grid.
//! Results are then applied one worker at a time.

use rayon::prelude::*;

use crate::core::types::{GridPos, Tick, WorkerId};
use crate::ecs::world::World;
use crate::entity::tasks::TaskKind;
use crate::entity::worker::{Animation, WorkerState};
use crate::simulation::activity::{ActivityEvent, ActivityKind};
use crate::simulation::planner::abandon;
use crate::spatial::pathfinding::find_path;

#[derive(Debug, Clone, Copy)]
struct PathRequest {
    worker_id: WorkerId,
    start: GridPos,
    goal: GridPos,
}

pub fn advance_movement(world: &mut World, events: &mut Vec<ActivityEvent>) {
    let tick = world.current_tick;
    let requests = collect_requests(world, tick);
    if !requests.is_empty() {
        let grid = world.store.grid();
        let solve = |r: &PathRequest| (r.worker_id, find_path(grid, r.start, r.goal));
        let results: Vec<(WorkerId, Vec<GridPos>)> =
            if requests.len() >= world.config.parallel_threshold {
                requests.par_iter().map(solve).collect()
            } else {
                requests.iter().map(solve).collect()
            };
        for (worker_id, path) in results {
            apply_path(world, worker_id, path, tick, events);
        }
    }

    for worker_id in world.store.worker_ids() {
        step_worker(world, worker_id, tick, events);
    }
}

/// Moving workers with a target but no route, outside their retry cooldown
fn collect_requests(world: &World, tick: Tick) -> Vec<PathRequest> {
    world
        .store
        .get_all_workers()
        .filter(|w| w.state == WorkerState::Moving && w.path.is_empty())
        .filter(|w| tick >= w.path_retry_at)
        .filter_map(|w| {
            let target = world.store.worker_target(w.id)?;
            (target.cell != w.position).then_some(PathRequest {
                worker_id: w.id,
                start: w.position,
                goal: target.cell,
            })
        })
        .collect()
}

fn apply_path(
    world: &mut World,
    worker_id: WorkerId,
    path: Vec<GridPos>,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) {
    let retry_cooldown = world.config.path_retry_cooldown_ticks;
    let max_retries = world.config.max_path_retries;
    let Ok(worker) = world.store.worker_mut(worker_id) else {
        return;
    };

    if !path.is_empty() {
        worker.path = path.into();
        worker.path_failures = 0;
        return;
    }

    worker.path_failures += 1;
    worker.path_retry_at = tick + retry_cooldown;
    let failures = worker.path_failures;
    tracing::debug!(worker = %worker_id, failures, "no path to target");
    if failures >= max_retries {
        let reason = format!("target unreachable after {failures} attempts");
        if let Err(err) = abandon(world, worker_id, tick, reason, events) {
            tracing::warn!(worker = %worker_id, error = %err, "abandon failed");
        }
    }
}

fn step_worker(world: &mut World, worker_id: WorkerId, tick: Tick, events: &mut Vec<ActivityEvent>) {
    let target = world.store.worker_target(worker_id);
    let kind = world.store.worker_task(worker_id).map(|t| t.kind);
    let Ok(worker) = world.store.get_worker(worker_id) else {
        return;
    };
    if worker.state != WorkerState::Moving {
        return;
    }
    // Target filled in by the planner on a later tick
    let Some(target) = target else {
        return;
    };

    if let Some(&next) = worker.path.front() {
        if !world.store.grid().is_walkable(next) {
            // Something was built across the route; ask for a new one
            if let Ok(worker) = world.store.worker_mut(worker_id) {
                worker.path.clear();
            }
            tracing::debug!(worker = %worker_id, cell = %next, "route blocked");
            return;
        }
        let Ok(worker) = world.store.worker_mut(worker_id) else {
            return;
        };
        worker.path.pop_front();
        worker.step_to(next);
        events.push(
            ActivityEvent::new(tick, worker, ActivityKind::Moved, format!("moved to {next}")),
        );
    }

    let Ok(worker) = world.store.worker_mut(worker_id) else {
        return;
    };
    if worker.path.is_empty() && worker.position == target.cell {
        worker.state = WorkerState::Performing;
        worker.path_failures = 0;
        worker.ticks_on_task = 0;
        worker.animation = match kind {
            Some(TaskKind::Sleeping) => Animation::Sleeping,
            Some(TaskKind::Idle) => Animation::Idle,
            _ => Animation::Working,
        };
        let detail = match kind {
            Some(kind) => format!("arrived to start {kind}"),
            None => "arrived".to_string(),
        };
        events.push(ActivityEvent::new(tick, worker, ActivityKind::Arrived, detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::entity::building::{BuildingKind, NewBuilding};
    use crate::entity::tasks::{NewTask, TaskTarget};
    use crate::entity::worker::{Facing, NewWorker};

    fn walker(world: &mut World, from: GridPos, to: GridPos) -> WorkerId {
        let id = world
            .store
            .create_worker(NewWorker::new("Ada", from))
            .unwrap();
        let task = world
            .store
            .create_task(NewTask::new(TaskKind::Mining).with_target(TaskTarget::cell(to)))
            .unwrap();
        world.store.assign_task(task, id).unwrap();
        id
    }

    #[test]
    fn test_walks_one_cell_per_tick() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let id = walker(&mut world, GridPos::new(5, 5), GridPos::new(5, 8));
        let mut events = Vec::new();

        advance_movement(&mut world, &mut events);
        let w = world.store.get_worker(id).unwrap();
        assert_eq!(w.position, GridPos::new(5, 6));
        assert_eq!(w.facing, Facing::South);
        assert_eq!(w.animation, Animation::Moving);
        assert_eq!(w.path.len(), 2);

        advance_movement(&mut world, &mut events);
        advance_movement(&mut world, &mut events);
        let w = world.store.get_worker(id).unwrap();
        assert_eq!(w.position, GridPos::new(5, 8));
        assert_eq!(w.state, WorkerState::Performing);
        assert_eq!(w.animation, Animation::Working);
        assert_eq!(events.iter().filter(|e| e.kind == ActivityKind::Moved).count(), 3);
        assert_eq!(events.last().map(|e| e.kind), Some(ActivityKind::Arrived));
    }

    #[test]
    fn test_already_at_target_arrives_immediately() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let id = walker(&mut world, GridPos::new(2, 2), GridPos::new(2, 2));
        advance_movement(&mut world, &mut Vec::new());
        assert_eq!(world.store.get_worker(id).unwrap().state, WorkerState::Performing);
    }

    #[test]
    fn test_unreachable_target_is_abandoned_after_retries() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let id = walker(&mut world, GridPos::new(0, 0), GridPos::new(8, 8));
        // Wall the worker into the corner
        for pos in [GridPos::new(1, 0), GridPos::new(0, 1), GridPos::new(1, 1)] {
            world
                .store
                .create_building(NewBuilding::new(BuildingKind::Wall, pos).free())
                .unwrap();
        }

        let mut events = Vec::new();
        let mut abandoned_at = None;
        for tick in 0..20 {
            world.current_tick = tick;
            advance_movement(&mut world, &mut events);
            if world.store.get_worker(id).unwrap().state == WorkerState::Idle {
                abandoned_at = Some(tick);
                break;
            }
            assert_eq!(world.store.get_worker(id).unwrap().position, GridPos::new(0, 0));
        }

        // Attempts at ticks 0, 3 and 6
        assert_eq!(abandoned_at, Some(6));
        let w = world.store.get_worker(id).unwrap();
        assert!(w.task.is_none());
        assert_eq!(w.next_decision_tick, 6 + world.config.abandon_cooldown_ticks);
        assert!(events.iter().any(|e| e.kind == ActivityKind::TaskAbandoned));
    }

    #[test]
    fn test_parallel_requests_match_serial() {
        let config = SimulationConfig {
            parallel_threshold: 1,
            ..SimulationConfig::default()
        };
        let mut world = World::flat(20, 20, config);
        let ids: Vec<_> = (0..8)
            .map(|i| walker(&mut world, GridPos::new(i, 0), GridPos::new(19 - i, 19)))
            .collect();
        advance_movement(&mut world, &mut Vec::new());
        for (i, id) in ids.iter().enumerate() {
            let w = world.store.get_worker(*id).unwrap();
            let expected = find_path(
                world.store.grid(),
                GridPos::new(i as i32, 0),
                GridPos::new(19 - i as i32, 19),
            );
            assert_eq!(w.position, expected[0]);
            assert_eq!(w.path.len(), expected.len() - 1);
        }
    }

    #[test]
    fn test_blocked_route_is_dropped() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let id = walker(&mut world, GridPos::new(0, 5), GridPos::new(9, 5));
        advance_movement(&mut world, &mut Vec::new());
        let next = *world.store.get_worker(id).unwrap().path.front().unwrap();
        world
            .store
            .create_building(NewBuilding::new(BuildingKind::Wall, next).free())
            .unwrap();
        advance_movement(&mut world, &mut Vec::new());
        let w = world.store.get_worker(id).unwrap();
        assert_eq!(w.position, GridPos::new(1, 5));
        assert!(w.path.is_empty());
    }
}
