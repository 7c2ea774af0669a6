//! Per-tick systems: needs, planning, movement and task execution

pub mod activity;
pub mod execution;
pub mod movement;
pub mod needs;
pub mod planner;
pub mod tick;

pub use activity::{ActivityEvent, ActivityKind, ActivityLog, ActivitySink, ChannelSink, TracingSink};
pub use planner::resolve_target;
pub use tick::{run_simulation_tick, run_ticks};
