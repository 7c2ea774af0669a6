//! Tick system - orchestrates simulation updates
//!
//! One tick, in order:
//! 1. Apply oracle replies that arrived since the last tick
//! 2. Need drift and critical-need overrides
//! 3. Task planning for idle workers
//! 4. Path requests and one step of movement
//! 5. Work on site and task completion
//! 6. Resource regeneration
//! 7. Advance the tick counter
//!
//! Every stage finishes for all workers before the next begins, so no stage
//! sees a half-updated worker.

use crate::ecs::world::World;
use crate::simulation::activity::ActivityEvent;
use crate::simulation::execution::execute_tasks;
use crate::simulation::movement::advance_movement;
use crate::simulation::needs::update_needs;
use crate::simulation::planner::{apply_oracle_replies, plan_tasks};

/// Run a single simulation tick
///
/// Never fails: per-worker errors are logged and that worker is left Idle.
/// Returns the activity produced during the tick, which has also been
/// delivered to the world's sinks.
pub fn run_simulation_tick(world: &mut World) -> Vec<ActivityEvent> {
    let mut events = Vec::new();

    apply_oracle_replies(world, &mut events);
    update_needs(world, &mut events);
    plan_tasks(world, &mut events);
    advance_movement(world, &mut events);
    execute_tasks(world, &mut events);

    let regen = world.config.resource_regen_per_tick;
    if regen > 0 {
        world.store.regenerate_resources(regen);
    }

    tracing::debug!(tick = world.current_tick, events = events.len(), "tick complete");
    world.publish(&events);
    world.tick();
    events
}

/// Run `ticks` ticks, returning every event produced
pub fn run_ticks(world: &mut World, ticks: u64) -> Vec<ActivityEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(run_simulation_tick(world));
    }
    events
}
