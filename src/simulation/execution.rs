//! Task execution - per-tick work for workers on site
//!
//! Runs for every worker in `Performing`. Harvesting and building mutate the
//! target entity; eating, sleeping and socializing run until the need they
//! serve is satisfied. A finished task returns its worker to Idle.

use crate::core::error::{Result, SimError};
use crate::core::types::{EntityRef, Tick, WorkerId};
use crate::ecs::world::World;
use crate::entity::resource::ResourceKind;
use crate::entity::tasks::{TargetSubject, Task, TaskKind};
use crate::entity::worker::WorkerState;
use crate::simulation::activity::{ActivityEvent, ActivityKind};
use crate::simulation::planner::abandon;

/// What a tick of work amounted to
enum Outcome {
    Continue,
    Done(String),
    Abandon(String),
}

pub fn execute_tasks(world: &mut World, events: &mut Vec<ActivityEvent>) {
    let tick = world.current_tick;
    for worker_id in world.store.worker_ids() {
        let performing = world
            .store
            .get_worker(worker_id)
            .is_ok_and(|w| w.state == WorkerState::Performing);
        if !performing {
            continue;
        }
        if let Err(err) = execute_one(world, worker_id, tick, events) {
            tracing::warn!(worker = %worker_id, error = %err, "task execution failed");
            if let Ok(worker) = world.store.get_worker(worker_id) {
                events.push(ActivityEvent::new(
                    tick,
                    worker,
                    ActivityKind::Failure,
                    format!("task failed: {err}"),
                ));
            }
            if let Err(err) = abandon(world, worker_id, tick, "task failed".into(), events) {
                tracing::warn!(worker = %worker_id, error = %err, "could not abandon failed task");
            }
        }
    }
}

fn execute_one(
    world: &mut World,
    worker_id: WorkerId,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<()> {
    let Some(task) = world.store.worker_task(worker_id).cloned() else {
        world.store.worker_mut(worker_id)?.reset_to_idle();
        return Ok(());
    };

    let worker = world.store.worker_mut(worker_id)?;
    worker.ticks_on_task += 1;
    let ticks_on_task = worker.ticks_on_task;
    let progress = task.progress + 1.0;
    world.store.task_mut(task.id)?.progress = progress;

    let outcome = match task.kind {
        TaskKind::Mining | TaskKind::Woodcutting => harvest(world, worker_id, &task, tick, events)?,
        TaskKind::Building => build(world, worker_id, &task, tick, events)?,
        TaskKind::Eating => eat(world, worker_id, &task)?,
        TaskKind::Sleeping => {
            let energy = world.store.get_worker(worker_id)?.needs.energy;
            if energy >= world.config.rested_energy {
                Outcome::Done(format!("woke rested ({energy:.0} energy)"))
            } else {
                Outcome::Continue
            }
        }
        TaskKind::Socializing => {
            let happiness = world.store.get_worker(worker_id)?.needs.happiness;
            if happiness >= world.config.content_happiness
                || ticks_on_task >= world.config.max_socialize_ticks
            {
                Outcome::Done(format!("finished socializing ({happiness:.0} happiness)"))
            } else {
                Outcome::Continue
            }
        }
        TaskKind::Idle => Outcome::Done("rested a moment".into()),
    };

    match outcome {
        Outcome::Continue => Ok(()),
        Outcome::Done(detail) => {
            world.store.complete_task(task.id)?;
            let worker = world.store.get_worker(worker_id)?;
            tracing::info!(worker = %worker_id, task = %task.id, kind = %task.kind, "task completed");
            events.push(ActivityEvent::new(tick, worker, ActivityKind::TaskCompleted, detail));
            Ok(())
        }
        Outcome::Abandon(reason) => abandon(world, worker_id, tick, reason, events),
    }
}

fn harvest(
    world: &mut World,
    worker_id: WorkerId,
    task: &Task,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<Outcome> {
    let Some(TargetSubject::Resource(resource_id)) = task.target.map(|t| t.subject) else {
        return Ok(Outcome::Abandon(format!("{} has no resource target", task.kind)));
    };
    let result = world
        .store
        .harvest_resource(resource_id, world.config.harvest_per_tick);
    let harvest = match result {
        Ok(harvest) => harvest,
        Err(SimError::NotFound(EntityRef::Resource(_))) => {
            return Ok(Outcome::Done("resource already gone".into()))
        }
        Err(err) => return Err(err),
    };

    if matches!(harvest.kind, ResourceKind::Stone | ResourceKind::Wood) {
        world.store.stockpile_mut().add(harvest.kind, harvest.taken);
    }
    let worker = world.store.get_worker(worker_id)?;
    events.push(ActivityEvent::new(
        tick,
        worker,
        ActivityKind::Harvested,
        format!("took {} {:?}, {} left", harvest.taken, harvest.kind, harvest.remaining),
    ));

    if harvest.remaining == 0 {
        let detail = if harvest.removed {
            format!("exhausted the {:?}", harvest.kind)
        } else {
            format!("emptied the {:?}", harvest.kind)
        };
        Ok(Outcome::Done(detail))
    } else {
        Ok(Outcome::Continue)
    }
}

fn build(
    world: &mut World,
    worker_id: WorkerId,
    task: &Task,
    tick: Tick,
    events: &mut Vec<ActivityEvent>,
) -> Result<Outcome> {
    let Some(TargetSubject::Building(building_id)) = task.target.map(|t| t.subject) else {
        return Ok(Outcome::Abandon("nothing to build".into()));
    };
    let building = match world.store.get_building(building_id) {
        Ok(building) => building,
        Err(_) => return Ok(Outcome::Done("construction site is gone".into())),
    };
    let kind = building.kind;
    if building.complete {
        return Ok(Outcome::Done(format!("{kind:?} already complete")));
    }

    if !building.materials_paid {
        let cost = building.material_cost.clone();
        if !world.store.stockpile_mut().consume_materials(&cost) {
            return Ok(Outcome::Abandon(format!("not enough materials for the {kind:?}")));
        }
        world.store.building_mut(building_id)?.materials_paid = true;
    }

    let rate = world.config.build_per_tick;
    let building = world.store.building_mut(building_id)?;
    let finished = building.advance(rate);
    let progress = building.progress;
    tracing::debug!(worker = %worker_id, building = %building_id, progress, "construction");

    if finished {
        let worker = world.store.get_worker(worker_id)?;
        events.push(ActivityEvent::new(
            tick,
            worker,
            ActivityKind::Constructed,
            format!("completed the {kind:?}"),
        ));
        Ok(Outcome::Done(format!("built the {kind:?}")))
    } else {
        Ok(Outcome::Continue)
    }
}

fn eat(world: &mut World, worker_id: WorkerId, task: &Task) -> Result<Outcome> {
    let food = match task.target.map(|t| t.subject) {
        Some(TargetSubject::Resource(id)) => match world.store.harvest_resource(id, 1) {
            Ok(h) => h.taken > 0,
            Err(SimError::NotFound(_)) => false,
            Err(err) => return Err(err),
        },
        // Foraging where they stand
        _ => true,
    };
    if !food {
        return Ok(Outcome::Done("ran out of food".into()));
    }

    let restore = world.config.eat_restore_per_tick;
    let sated = world.config.sated_hunger;
    let worker = world.store.worker_mut(worker_id)?;
    worker.needs.hunger = (worker.needs.hunger - restore).max(0.0);
    if worker.needs.hunger <= sated {
        Ok(Outcome::Done(format!("ate until full ({:.0} hunger)", worker.needs.hunger)))
    } else {
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::GridPos;
    use crate::entity::building::{BuildingKind, NewBuilding};
    use crate::entity::needs::Needs;
    use crate::entity::resource::NewResource;
    use crate::entity::tasks::{NewTask, TaskTarget};
    use crate::entity::worker::NewWorker;
    use crate::world::CellKind;

    fn on_site(world: &mut World, kind: TaskKind, target: TaskTarget, needs: Needs) -> WorkerId {
        let id = world
            .store
            .create_worker(NewWorker::new("Ada", target.cell).with_needs(needs))
            .unwrap();
        let task = world
            .store
            .create_task(NewTask::new(kind).with_target(target))
            .unwrap();
        world.store.assign_task(task, id).unwrap();
        world.store.worker_mut(id).unwrap().state = WorkerState::Performing;
        id
    }

    #[test]
    fn test_mining_until_exhausted() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let pos = GridPos::new(4, 4);
        let rock = world
            .store
            .create_resource(NewResource::new(ResourceKind::Stone, pos, 12))
            .unwrap();
        let id = on_site(&mut world, TaskKind::Mining, TaskTarget::resource(rock, pos), Needs::default());

        let mut events = Vec::new();
        execute_tasks(&mut world, &mut events);
        execute_tasks(&mut world, &mut events);
        assert_eq!(world.store.get_resource(rock).unwrap().quantity, 2);
        assert_eq!(world.store.get_worker(id).unwrap().state, WorkerState::Performing);

        execute_tasks(&mut world, &mut events);
        assert!(world.store.get_resource(rock).is_err());
        assert_eq!(world.store.grid().cell_at(pos).unwrap().kind, CellKind::Terrain);
        assert_eq!(world.store.stockpile().get(ResourceKind::Stone), 12);
        let worker = world.store.get_worker(id).unwrap();
        assert_eq!(worker.state, WorkerState::Idle);
        assert!(worker.task.is_none());
        assert_eq!(events.last().map(|e| e.kind), Some(ActivityKind::TaskCompleted));
    }

    #[test]
    fn test_building_pays_once_and_completes() {
        let mut world = World::flat(10, 10, SimulationConfig {
            build_per_tick: 25.0,
            ..SimulationConfig::default()
        });
        world.store.stockpile_mut().add(ResourceKind::Stone, 20);
        let wall = world
            .store
            .create_building(NewBuilding::new(BuildingKind::Wall, GridPos::new(5, 5)))
            .unwrap();
        let id = on_site(
            &mut world,
            TaskKind::Building,
            TaskTarget::building(wall, GridPos::new(4, 5)),
            Needs::default(),
        );

        let mut events = Vec::new();
        execute_tasks(&mut world, &mut events);
        assert_eq!(world.store.stockpile().get(ResourceKind::Stone), 5);
        assert_eq!(world.store.get_building(wall).unwrap().progress, 25.0);

        for _ in 0..3 {
            execute_tasks(&mut world, &mut events);
        }
        let building = world.store.get_building(wall).unwrap();
        assert!(building.complete);
        assert_eq!(world.store.stockpile().get(ResourceKind::Stone), 5);
        assert_eq!(world.store.get_worker(id).unwrap().state, WorkerState::Idle);
        assert!(events.iter().any(|e| e.kind == ActivityKind::Constructed));
    }

    #[test]
    fn test_building_without_materials_is_abandoned() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let wall = world
            .store
            .create_building(NewBuilding::new(BuildingKind::Wall, GridPos::new(5, 5)))
            .unwrap();
        let id = on_site(
            &mut world,
            TaskKind::Building,
            TaskTarget::building(wall, GridPos::new(4, 5)),
            Needs::default(),
        );
        let mut events = Vec::new();
        execute_tasks(&mut world, &mut events);
        assert_eq!(world.store.get_worker(id).unwrap().state, WorkerState::Idle);
        assert_eq!(world.store.get_building(wall).unwrap().progress, 0.0);
        assert!(events.iter().any(|e| e.kind == ActivityKind::TaskAbandoned));
    }

    #[test]
    fn test_eating_in_place() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let id = on_site(
            &mut world,
            TaskKind::Eating,
            TaskTarget::cell(GridPos::new(1, 1)),
            Needs {
                hunger: 40.0,
                ..Needs::default()
            },
        );
        execute_tasks(&mut world, &mut Vec::new());
        assert_eq!(world.store.get_worker(id).unwrap().needs.hunger, 25.0);
        execute_tasks(&mut world, &mut Vec::new());
        let worker = world.store.get_worker(id).unwrap();
        assert_eq!(worker.needs.hunger, 10.0);
        assert_eq!(worker.state, WorkerState::Idle);
    }

    #[test]
    fn test_eating_berries_consumes_them() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let pos = GridPos::new(3, 3);
        let bush = world
            .store
            .create_resource(NewResource::new(ResourceKind::Berries, pos, 1))
            .unwrap();
        let id = on_site(
            &mut world,
            TaskKind::Eating,
            TaskTarget::resource(bush, pos),
            Needs {
                hunger: 90.0,
                ..Needs::default()
            },
        );
        execute_tasks(&mut world, &mut Vec::new());
        assert_eq!(world.store.get_resource(bush).unwrap().quantity, 0);
        assert_eq!(world.store.get_worker(id).unwrap().needs.hunger, 75.0);

        // Bush is empty: the meal ends
        execute_tasks(&mut world, &mut Vec::new());
        assert_eq!(world.store.get_worker(id).unwrap().state, WorkerState::Idle);
        assert!(world.store.get_resource(bush).is_ok());
    }

    #[test]
    fn test_sleep_and_socialize_end_on_thresholds() {
        let mut world = World::flat(10, 10, SimulationConfig::default());
        let sleeper = on_site(
            &mut world,
            TaskKind::Sleeping,
            TaskTarget::cell(GridPos::new(1, 1)),
            Needs {
                energy: 95.0,
                ..Needs::default()
            },
        );
        let talker = on_site(
            &mut world,
            TaskKind::Socializing,
            TaskTarget::cell(GridPos::new(2, 2)),
            Needs {
                happiness: 10.0,
                ..Needs::default()
            },
        );
        execute_tasks(&mut world, &mut Vec::new());
        assert_eq!(world.store.get_worker(sleeper).unwrap().state, WorkerState::Idle);
        assert_eq!(world.store.get_worker(talker).unwrap().state, WorkerState::Performing);

        for _ in 1..world.config.max_socialize_ticks {
            execute_tasks(&mut world, &mut Vec::new());
        }
        assert_eq!(world.store.get_worker(talker).unwrap().state, WorkerState::Idle);
    }
}
