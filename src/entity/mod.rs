pub mod building;
pub mod needs;
pub mod resource;
pub mod stockpile;
pub mod tasks;
pub mod worker;

pub use building::{Building, BuildingKind, BuildingUpdate, NewBuilding};
pub use needs::{CriticalNeed, NeedActivity, Needs};
pub use resource::{NewResource, Resource, ResourceKind, ResourceUpdate};
pub use stockpile::Stockpile;
pub use tasks::{
    NewTask, TargetSubject, Task, TaskKind, TaskPriority, TaskSource, TaskTarget, TaskUpdate,
};
pub use worker::{Animation, Facing, NewWorker, Worker, WorkerState, WorkerUpdate};
