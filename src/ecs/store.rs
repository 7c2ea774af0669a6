//! Entity store - authoritative workers, buildings, resources and tasks
//!
//! The store owns the `GridWorld` so that every create, move or removal of a
//! building or resource updates occupancy in the same call. Ids are allocated
//! per kind, monotonically, starting at 1, and are never reused. Collections
//! are ordered by id so iteration is deterministic.

use std::collections::BTreeMap;

use crate::core::error::{Result, SimError};
use crate::core::types::{BuildingId, EntityRef, GridPos, ResourceId, TaskId, WorkerId};
use crate::entity::building::{Building, BuildingUpdate, NewBuilding};
use crate::entity::needs::Needs;
use crate::entity::resource::{NewResource, Resource, ResourceKind, ResourceUpdate};
use crate::entity::stockpile::Stockpile;
use crate::entity::tasks::{NewTask, TargetSubject, Task, TaskSource, TaskTarget, TaskUpdate};
use crate::entity::worker::{NewWorker, Worker, WorkerState, WorkerUpdate};
use crate::spatial::pathfinding::nearest_walkable;
use crate::world::{Footprint, GridWorld, Occupant};

/// Quantity given to water cells found at generation time
pub const WATER_QUANTITY: u32 = 100;

/// Outcome of taking from a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Harvest {
    pub kind: ResourceKind,
    pub taken: u32,
    pub remaining: u32,
    /// The resource was depleted and removed from the grid
    pub removed: bool,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    grid: GridWorld,
    workers: BTreeMap<WorkerId, Worker>,
    buildings: BTreeMap<BuildingId, Building>,
    resources: BTreeMap<ResourceId, Resource>,
    tasks: BTreeMap<TaskId, Task>,
    stockpile: Stockpile,
    default_needs: Needs,
    next_worker: u32,
    next_building: u32,
    next_resource: u32,
    next_task: u32,
}

impl EntityStore {
    pub fn new(grid: GridWorld) -> Self {
        Self {
            grid,
            workers: BTreeMap::new(),
            buildings: BTreeMap::new(),
            resources: BTreeMap::new(),
            tasks: BTreeMap::new(),
            stockpile: Stockpile::new(),
            default_needs: Needs::default(),
            next_worker: 1,
            next_building: 1,
            next_resource: 1,
            next_task: 1,
        }
    }

    /// Needs given to workers created without explicit ones
    pub fn with_default_needs(mut self, needs: Needs) -> Self {
        self.default_needs = needs.clamped();
        self
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn stockpile(&self) -> &Stockpile {
        &self.stockpile
    }

    pub fn stockpile_mut(&mut self) -> &mut Stockpile {
        &mut self.stockpile
    }

    /// Turn every free low-lying cell into a regenerating water resource
    pub fn seed_water(&mut self) -> usize {
        let cells: Vec<GridPos> = self
            .grid
            .water_cells()
            .into_iter()
            .filter(|pos| self.grid.get(*pos).is_some_and(|c| c.occupant.is_none()))
            .collect();
        let mut created = 0;
        for pos in cells {
            let spec = NewResource::new(ResourceKind::Water, pos, WATER_QUANTITY).regenerating(true);
            if self.create_resource(spec).is_ok() {
                created += 1;
            }
        }
        created
    }

    // === WORKERS ===

    /// Spawn a worker; a blocked start cell is moved to the nearest open one
    pub fn create_worker(&mut self, spec: NewWorker) -> Result<WorkerId> {
        let requested = GridPos::new(spec.x, spec.y);
        self.grid.cell_at(requested)?;
        let position = nearest_walkable(&self.grid, requested).unwrap_or(requested);

        let id = WorkerId(self.next_worker);
        self.next_worker += 1;
        let needs = spec.needs.map(Needs::clamped).unwrap_or(self.default_needs);
        self.workers
            .insert(id, Worker::new(id, spec.name, position, needs));
        Ok(id)
    }

    pub fn get_worker(&self, id: WorkerId) -> Result<&Worker> {
        self.workers
            .get(&id)
            .ok_or(SimError::NotFound(EntityRef::Worker(id)))
    }

    pub(crate) fn worker_mut(&mut self, id: WorkerId) -> Result<&mut Worker> {
        self.workers
            .get_mut(&id)
            .ok_or(SimError::NotFound(EntityRef::Worker(id)))
    }

    pub fn get_all_workers(&self) -> impl Iterator<Item = &Worker> + '_ {
        self.workers.values()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.keys().copied().collect()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn update_worker(&mut self, id: WorkerId, update: WorkerUpdate) -> Result<()> {
        if let Some(pos) = update.position {
            self.grid.cell_at(pos)?;
        }
        let worker = self.worker_mut(id)?;
        if let Some(name) = update.name {
            worker.name = name;
        }
        if let Some(pos) = update.position {
            worker.position = pos;
            // The remaining route started somewhere else
            worker.path.clear();
        }
        if let Some(needs) = update.needs {
            worker.needs = needs.clamped();
        }
        if let Some(health) = update.health {
            worker.health = health.clamp(0.0, 100.0);
        }
        if let Some(facing) = update.facing {
            worker.facing = facing;
        }
        Ok(())
    }

    // === BUILDINGS ===

    pub fn create_building(&mut self, spec: NewBuilding) -> Result<BuildingId> {
        let (default_w, default_h) = spec.kind.size();
        let id = BuildingId(self.next_building);
        let building = Building {
            id,
            kind: spec.kind,
            x: spec.x,
            y: spec.y,
            width: spec.width.unwrap_or(default_w).max(1),
            height: spec.height.unwrap_or(default_h).max(1),
            complete: spec.complete,
            progress: if spec.complete { 100.0 } else { 0.0 },
            material_cost: spec
                .material_cost
                .unwrap_or_else(|| spec.kind.material_cost()),
            materials_paid: spec.complete,
        };
        let footprint = building.footprint();
        self.grid.place(Occupant::Building(id), &footprint)?;
        self.next_building += 1;
        self.buildings.insert(id, building);
        self.evict_workers(&footprint);
        Ok(id)
    }

    pub fn get_building(&self, id: BuildingId) -> Result<&Building> {
        self.buildings
            .get(&id)
            .ok_or(SimError::NotFound(EntityRef::Building(id)))
    }

    pub(crate) fn building_mut(&mut self, id: BuildingId) -> Result<&mut Building> {
        self.buildings
            .get_mut(&id)
            .ok_or(SimError::NotFound(EntityRef::Building(id)))
    }

    pub fn get_all_buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.buildings.values()
    }

    /// Partial update; footprint changes are re-placed on the grid
    ///
    /// Progress only grows and completion cannot be undone, so lower values
    /// in the update are ignored.
    pub fn update_building(&mut self, id: BuildingId, update: BuildingUpdate) -> Result<()> {
        let current = self.get_building(id)?.clone();
        let mut next = current.clone();
        if let Some(x) = update.x {
            next.x = x;
        }
        if let Some(y) = update.y {
            next.y = y;
        }
        if let Some(w) = update.width {
            next.width = w.max(1);
        }
        if let Some(h) = update.height {
            next.height = h.max(1);
        }

        let old_fp = current.footprint();
        let new_fp = next.footprint();
        if old_fp != new_fp {
            let occupant = Occupant::Building(id);
            self.grid.check_placement(&new_fp, Some(occupant))?;
            self.grid.clear(occupant, &old_fp);
            if let Err(err) = self.grid.place(occupant, &new_fp) {
                self.restore_footprint(occupant, &old_fp);
                return Err(err);
            }
            self.evict_workers(&new_fp);
        }

        if let Some(progress) = update.progress {
            next.advance(progress - next.progress);
        }
        if update.complete == Some(true) && !next.complete {
            next.progress = 100.0;
            next.complete = true;
        }
        self.buildings.insert(id, next);
        Ok(())
    }

    pub fn remove_building(&mut self, id: BuildingId) -> Result<Building> {
        let building = self
            .buildings
            .remove(&id)
            .ok_or(SimError::NotFound(EntityRef::Building(id)))?;
        self.grid.clear(Occupant::Building(id), &building.footprint());
        Ok(building)
    }

    /// Nearest open cell next to a building's footprint, as seen from `from`
    pub fn approach_cell(&self, id: BuildingId, from: GridPos) -> Option<GridPos> {
        let building = self.buildings.get(&id)?;
        building
            .footprint()
            .perimeter()
            .into_iter()
            .filter(|p| self.grid.is_walkable(*p))
            .min_by_key(|p| p.manhattan(&from))
    }

    // === RESOURCES ===

    pub fn create_resource(&mut self, spec: NewResource) -> Result<ResourceId> {
        let id = ResourceId(self.next_resource);
        let resource = Resource {
            id,
            kind: spec.kind,
            x: spec.x,
            y: spec.y,
            quantity: spec.quantity,
            capacity: spec.quantity,
            regenerates: spec
                .regenerates
                .unwrap_or_else(|| spec.kind.regenerates_by_default()),
        };
        self.grid
            .place(Occupant::Resource(id), &resource.footprint())?;
        self.next_resource += 1;
        self.resources.insert(id, resource);
        Ok(id)
    }

    pub fn get_resource(&self, id: ResourceId) -> Result<&Resource> {
        self.resources
            .get(&id)
            .ok_or(SimError::NotFound(EntityRef::Resource(id)))
    }

    pub fn get_all_resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.resources.values()
    }

    pub fn update_resource(&mut self, id: ResourceId, update: ResourceUpdate) -> Result<()> {
        let current = self.get_resource(id)?.clone();
        let mut next = current.clone();
        if let Some(x) = update.x {
            next.x = x;
        }
        if let Some(y) = update.y {
            next.y = y;
        }
        if let Some(quantity) = update.quantity {
            next.quantity = quantity;
            next.capacity = next.capacity.max(quantity);
        }
        if let Some(regenerates) = update.regenerates {
            next.regenerates = regenerates;
        }

        if next.position() != current.position() {
            let occupant = Occupant::Resource(id);
            self.grid
                .check_placement(&next.footprint(), Some(occupant))?;
            self.grid.clear(occupant, &current.footprint());
            if let Err(err) = self.grid.place(occupant, &next.footprint()) {
                self.restore_footprint(occupant, &current.footprint());
                return Err(err);
            }
        }
        self.resources.insert(id, next);
        Ok(())
    }

    pub fn remove_resource(&mut self, id: ResourceId) -> Result<Resource> {
        let resource = self
            .resources
            .remove(&id)
            .ok_or(SimError::NotFound(EntityRef::Resource(id)))?;
        self.grid
            .clear(Occupant::Resource(id), &resource.footprint());
        Ok(resource)
    }

    /// Take up to `amount`; a depleted non-regenerating resource leaves the grid
    pub fn harvest_resource(&mut self, id: ResourceId, amount: u32) -> Result<Harvest> {
        let resource = self
            .resources
            .get_mut(&id)
            .ok_or(SimError::NotFound(EntityRef::Resource(id)))?;
        let taken = resource.harvest(amount);
        let mut harvest = Harvest {
            kind: resource.kind,
            taken,
            remaining: resource.quantity,
            removed: false,
        };
        if resource.is_depleted() && !resource.regenerates {
            self.remove_resource(id)?;
            harvest.removed = true;
        }
        Ok(harvest)
    }

    pub fn regenerate_resources(&mut self, amount: u32) {
        for resource in self.resources.values_mut() {
            resource.regenerate(amount);
        }
    }

    // === TASKS ===

    pub fn create_task(&mut self, spec: NewTask) -> Result<TaskId> {
        if let Some(target) = &spec.target {
            self.check_target(target)?;
        }
        let id = TaskId(self.next_task);
        self.next_task += 1;
        self.tasks.insert(
            id,
            Task {
                id,
                kind: spec.kind,
                target: spec.target,
                priority: spec.priority,
                assigned_worker: None,
                completed: false,
                progress: 0.0,
                required_materials: spec.required_materials,
                source: spec.source,
            },
        );
        Ok(id)
    }

    pub fn get_task(&self, id: TaskId) -> Result<&Task> {
        self.tasks
            .get(&id)
            .ok_or(SimError::NotFound(EntityRef::Task(id)))
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .get_mut(&id)
            .ok_or(SimError::NotFound(EntityRef::Task(id)))
    }

    pub fn get_all_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.values()
    }

    pub fn update_task(&mut self, id: TaskId, update: TaskUpdate) -> Result<()> {
        if let Some(Some(target)) = &update.target {
            self.check_target(target)?;
        }
        let task = self.task_mut(id)?;
        if let Some(target) = update.target {
            task.target = target;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(progress) = update.progress {
            task.progress = progress.max(task.progress);
        }
        let finished = update.completed == Some(true) && !task.completed;
        if finished {
            self.complete_task(id)?;
        }
        Ok(())
    }

    /// Hand a task to a worker
    ///
    /// Fails with `NotFound` if either id is unknown (completed tasks count
    /// as unknown). The worker's previous task goes back to the queue and
    /// the task's previous worker becomes Idle.
    pub fn assign_task(&mut self, task_id: TaskId, worker_id: WorkerId) -> Result<()> {
        let task = self.get_task(task_id)?;
        if task.completed {
            return Err(SimError::NotFound(EntityRef::Task(task_id)));
        }
        let previous_worker = task.assigned_worker;
        let previous_task = self.get_worker(worker_id)?.task;

        if let Some(old) = previous_task.filter(|t| *t != task_id) {
            self.release_task(old)?;
        }
        if let Some(other) = previous_worker.filter(|w| *w != worker_id) {
            if let Some(w) = self.workers.get_mut(&other) {
                w.reset_to_idle();
            }
        }

        self.task_mut(task_id)?.assigned_worker = Some(worker_id);
        let worker = self.worker_mut(worker_id)?;
        worker.reset_to_idle();
        worker.task = Some(task_id);
        worker.state = WorkerState::Moving;
        Ok(())
    }

    /// Detach a task from its worker
    ///
    /// Queued tasks return to the open queue. Need overrides and oracle
    /// tasks only make sense for the worker they were made for, so they are
    /// dropped from the table.
    pub fn release_task(&mut self, task_id: TaskId) -> Result<()> {
        let task = self.task_mut(task_id)?;
        let worker = task.assigned_worker.take();
        if let Some(worker_id) = worker {
            self.idle_worker_on(worker_id, task_id);
        }
        self.retire_transient(task_id);
        Ok(())
    }

    /// Mark a task done and return its worker to Idle
    ///
    /// Finished queued tasks stay readable; transient ones are dropped.
    pub fn complete_task(&mut self, task_id: TaskId) -> Result<()> {
        let task = self.task_mut(task_id)?;
        task.completed = true;
        if let Some(worker_id) = task.assigned_worker {
            self.idle_worker_on(worker_id, task_id);
        }
        self.retire_transient(task_id);
        Ok(())
    }

    fn idle_worker_on(&mut self, worker_id: WorkerId, task_id: TaskId) {
        if let Some(w) = self.workers.get_mut(&worker_id) {
            if w.task == Some(task_id) {
                w.reset_to_idle();
            }
        }
    }

    /// Drop a need-override or oracle task once nobody holds it
    fn retire_transient(&mut self, task_id: TaskId) {
        let transient = self
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.source != TaskSource::Queued);
        if transient {
            self.tasks.remove(&task_id);
        }
    }

    /// Unassigned, incomplete tasks: highest priority first, then oldest
    pub fn open_tasks(&self) -> Vec<TaskId> {
        let mut open: Vec<&Task> = self.tasks.values().filter(|t| t.is_open()).collect();
        open.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        open.into_iter().map(|t| t.id).collect()
    }

    /// Current task of a worker, if any
    pub fn worker_task(&self, worker_id: WorkerId) -> Option<&Task> {
        let task_id = self.workers.get(&worker_id)?.task?;
        self.tasks.get(&task_id)
    }

    /// Cell the worker is heading for, derived from its task
    pub fn worker_target(&self, worker_id: WorkerId) -> Option<TaskTarget> {
        self.worker_task(worker_id)?.target
    }

    fn check_target(&self, target: &TaskTarget) -> Result<()> {
        self.grid.cell_at(target.cell)?;
        match target.subject {
            TargetSubject::Resource(id) => self.get_resource(id).map(|_| ()),
            TargetSubject::Building(id) => self.get_building(id).map(|_| ()),
            TargetSubject::Worker(id) => self.get_worker(id).map(|_| ()),
            TargetSubject::Cell => Ok(()),
        }
    }

    /// Put an occupant back on the cells it held before a failed move
    fn restore_footprint(&mut self, occupant: Occupant, footprint: &Footprint) {
        if let Err(err) = self.grid.place(occupant, footprint) {
            tracing::error!(?occupant, error = %err, "footprint rollback failed, grid occupancy out of sync");
        }
    }

    /// Move workers standing inside a new footprint to open ground
    fn evict_workers(&mut self, footprint: &Footprint) {
        let grid = &self.grid;
        for worker in self.workers.values_mut() {
            if footprint.contains(worker.position) {
                if let Some(exit) = nearest_walkable(grid, worker.position) {
                    tracing::debug!(worker = %worker.id, from = %worker.position, to = %exit, "evicted from footprint");
                    worker.position = exit;
                    worker.path.clear();
                }
            }
        }
    }
}
