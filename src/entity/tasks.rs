//! Task records and the fixed task-kind vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::types::{BuildingId, GridPos, ResourceId, TaskId, WorkerId};
use crate::entity::resource::ResourceKind;

/// Every activity a worker can be assigned
///
/// This is the only vocabulary accepted from the decision oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    #[default]
    Idle,
    Mining,
    Woodcutting,
    Building,
    Socializing,
    Eating,
    Sleeping,
}

impl TaskKind {
    pub const ALL: [TaskKind; 7] = [
        TaskKind::Idle,
        TaskKind::Mining,
        TaskKind::Woodcutting,
        TaskKind::Building,
        TaskKind::Socializing,
        TaskKind::Eating,
        TaskKind::Sleeping,
    ];

    /// Resource harvested by this kind, if any
    pub fn harvests(&self) -> Option<ResourceKind> {
        match self {
            TaskKind::Mining => Some(ResourceKind::Stone),
            TaskKind::Woodcutting => Some(ResourceKind::Wood),
            _ => None,
        }
    }

    /// Kinds that cannot run without a target
    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            TaskKind::Mining | TaskKind::Woodcutting | TaskKind::Building | TaskKind::Socializing
        )
    }

    /// Kinds that may fall back to acting in place
    pub fn can_act_in_place(&self) -> bool {
        matches!(self, TaskKind::Eating | TaskKind::Sleeping)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Idle => "Idle",
            TaskKind::Mining => "Mining",
            TaskKind::Woodcutting => "Woodcutting",
            TaskKind::Building => "Building",
            TaskKind::Socializing => "Socializing",
            TaskKind::Eating => "Eating",
            TaskKind::Sleeping => "Sleeping",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = ();

    /// Case-insensitive match on the kind name or its verb form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        let kind = match word.as_str() {
            "idle" | "wait" => TaskKind::Idle,
            "mining" | "mine" => TaskKind::Mining,
            "woodcutting" | "chop" | "woodcut" => TaskKind::Woodcutting,
            "building" | "build" | "construct" => TaskKind::Building,
            "socializing" | "socialising" | "socialize" | "socialise" | "talk" => {
                TaskKind::Socializing
            }
            "eating" | "eat" => TaskKind::Eating,
            "sleeping" | "sleep" | "rest" => TaskKind::Sleeping,
            _ => return Err(()),
        };
        Ok(kind)
    }
}

/// Task priority levels with explicit ordering values
///
/// Higher numeric value = higher priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TaskPriority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Where a task came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSource {
    /// Queued through the store by the UI or a scenario
    #[default]
    Queued,
    /// Forced by a critical need
    CriticalNeed,
    /// Chosen by the decision oracle
    Oracle,
}

/// Entity a task is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSubject {
    Resource(ResourceId),
    Building(BuildingId),
    Worker(WorkerId),
    /// A bare location with no entity behind it
    Cell,
}

/// Target entity plus the cell a worker must stand on to act on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskTarget {
    pub subject: TargetSubject,
    pub cell: GridPos,
}

impl TaskTarget {
    pub fn resource(id: ResourceId, cell: GridPos) -> Self {
        Self {
            subject: TargetSubject::Resource(id),
            cell,
        }
    }

    pub fn building(id: BuildingId, cell: GridPos) -> Self {
        Self {
            subject: TargetSubject::Building(id),
            cell,
        }
    }

    pub fn worker(id: WorkerId, cell: GridPos) -> Self {
        Self {
            subject: TargetSubject::Worker(id),
            cell,
        }
    }

    pub fn cell(cell: GridPos) -> Self {
        Self {
            subject: TargetSubject::Cell,
            cell,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub target: Option<TaskTarget>,
    pub priority: TaskPriority,
    pub assigned_worker: Option<WorkerId>,
    pub completed: bool,
    /// Ticks of work performed on site
    pub progress: f32,
    pub required_materials: Vec<(ResourceKind, u32)>,
    pub source: TaskSource,
}

impl Task {
    /// Waiting in the queue for a worker
    pub fn is_open(&self) -> bool {
        !self.completed && self.assigned_worker.is_none()
    }
}

/// Input for `EntityStore::create_task`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub kind: TaskKind,
    #[serde(default)]
    pub target: Option<TaskTarget>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub required_materials: Vec<(ResourceKind, u32)>,
    #[serde(default)]
    pub source: TaskSource,
}

impl NewTask {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: TaskTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_source(mut self, source: TaskSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_materials(mut self, materials: Vec<(ResourceKind, u32)>) -> Self {
        self.required_materials = materials;
        self
    }
}

/// Partial update for `EntityStore::update_task`
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub target: Option<Option<TaskTarget>>,
    pub priority: Option<TaskPriority>,
    pub progress: Option<f32>,
    pub completed: Option<bool>,
}
