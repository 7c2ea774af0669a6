//! Workers: position, needs, lifecycle and movement bookkeeping

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::types::{GridPos, RequestId, TaskId, Tick, WorkerId};
use crate::entity::needs::Needs;

pub const DEFAULT_HEALTH: f32 = 100.0;

/// Worker lifecycle
///
/// `AwaitingDecision` is the Idle sub-state held while an oracle request is
/// in flight; a critical need may still pre-empt it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    #[default]
    Idle,
    AwaitingDecision {
        request: RequestId,
    },
    Moving,
    Performing,
}

impl WorkerState {
    /// Idle, including while waiting on the oracle
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkerState::Idle | WorkerState::AwaitingDecision { .. })
    }
}

/// Eight-way facing, y grows southward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    North,
    NorthEast,
    East,
    SouthEast,
    #[default]
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Facing {
    /// Facing for a movement delta, or None when there is no movement
    ///
    /// Diagonals are chosen only when the two axes are of comparable size
    /// (neither more than twice the other).
    pub fn from_delta(dx: i32, dy: i32) -> Option<Facing> {
        if dx == 0 && dy == 0 {
            return None;
        }
        let (ax, ay) = (dx.unsigned_abs(), dy.unsigned_abs());
        let horizontal = if ax > 2 * ay { dx.signum() } else { 0 };
        let vertical = if ay > 2 * ax { dy.signum() } else { 0 };
        let (sx, sy) = match (horizontal, vertical) {
            (0, 0) => (dx.signum(), dy.signum()),
            (h, 0) => (h, 0),
            (_, v) => (0, v),
        };
        Some(match (sx, sy) {
            (0, -1) => Facing::North,
            (1, -1) => Facing::NorthEast,
            (1, 0) => Facing::East,
            (1, 1) => Facing::SouthEast,
            (0, 1) => Facing::South,
            (-1, 1) => Facing::SouthWest,
            (-1, 0) => Facing::West,
            _ => Facing::NorthWest,
        })
    }
}

/// Animation hint for the rendering layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    #[default]
    Idle,
    Moving,
    Working,
    Sleeping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub position: GridPos,
    pub needs: Needs,
    pub health: f32,
    /// The worker's only link to its assignment; the target lives on the task
    pub task: Option<TaskId>,
    /// Remaining cells to walk, start exclusive, goal inclusive
    pub path: VecDeque<GridPos>,
    pub facing: Facing,
    pub animation: Animation,
    pub state: WorkerState,
    /// Consecutive failed path requests for the current task
    pub path_failures: u32,
    /// No path request before this tick
    pub path_retry_at: Tick,
    /// No planning or oracle consultation before this tick
    pub next_decision_tick: Tick,
    /// No critical-need override before this tick
    pub next_override_tick: Tick,
    /// Ticks spent working on site for the current task
    pub ticks_on_task: u32,
    /// Recent activity, newest last
    pub memory: VecDeque<String>,
}

impl Worker {
    pub fn new(id: WorkerId, name: String, position: GridPos, needs: Needs) -> Self {
        Self {
            id,
            name,
            position,
            needs,
            health: DEFAULT_HEALTH,
            task: None,
            path: VecDeque::new(),
            facing: Facing::default(),
            animation: Animation::Idle,
            state: WorkerState::Idle,
            path_failures: 0,
            path_retry_at: 0,
            next_decision_tick: 0,
            next_override_tick: 0,
            ticks_on_task: 0,
            memory: VecDeque::new(),
        }
    }

    /// Drop the current assignment and return to Idle
    pub fn reset_to_idle(&mut self) {
        self.task = None;
        self.path.clear();
        self.state = WorkerState::Idle;
        self.animation = Animation::Idle;
        self.path_failures = 0;
        self.path_retry_at = 0;
        self.ticks_on_task = 0;
    }

    /// Step onto an adjacent cell, updating facing and animation
    pub fn step_to(&mut self, next: GridPos) {
        if let Some(facing) = Facing::from_delta(next.x - self.position.x, next.y - self.position.y) {
            self.facing = facing;
        }
        self.position = next;
        self.animation = Animation::Moving;
    }

    pub fn remember(&mut self, line: impl Into<String>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.memory.push_back(line.into());
        while self.memory.len() > capacity {
            self.memory.pop_front();
        }
    }
}

/// Input for `EntityStore::create_worker`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorker {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// Defaults to the configured starting needs
    #[serde(default)]
    pub needs: Option<Needs>,
}

impl NewWorker {
    pub fn new(name: impl Into<String>, pos: GridPos) -> Self {
        Self {
            name: name.into(),
            x: pos.x,
            y: pos.y,
            needs: None,
        }
    }

    pub fn with_needs(mut self, needs: Needs) -> Self {
        self.needs = Some(needs);
        self
    }
}

/// Partial update for `EntityStore::update_worker`
#[derive(Debug, Clone, Default)]
pub struct WorkerUpdate {
    pub name: Option<String>,
    pub position: Option<GridPos>,
    pub needs: Option<Needs>,
    pub health: Option<f32>,
    pub facing: Option<Facing>,
}
