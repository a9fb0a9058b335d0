//! # World
//!
//! Owns every object, the simulation clock, the physics kernel and the map.
//!
//! ## Tick
//!
//! ```text
//! update(dt)
//!   ├─ no map? return
//!   ├─ clock += dt, kernel.set_globals(clock, dt)
//!   ├─ snapshot ids (creation order)
//!   └─ for each id
//!        ├─ take the object out (gone? it was deleted this tick, skip)
//!        ├─ object.update(ctx)          ctx may delete / spawn / emit
//!        └─ put it back, or release it if it deleted itself
//! ```
//!
//! Taking the object out of the set while it updates lets it borrow the
//! rest of the world mutably through [`TickContext`].

use std::collections::BTreeMap;

use trench_core::{SpatialMap, Vec3};

use crate::character::Character;
use crate::event::WorldEvent;
use crate::grenade::Grenade;
use crate::kernel::PhysicsKernel;
use crate::object::{Object, ObjectId, Spawn, WorldId};

/// Objects of one world, ordered by id.
#[derive(Debug)]
pub struct ObjectSet {
    world: WorldId,
    next_id: u64,
    objects: BTreeMap<ObjectId, Object>,
}

impl ObjectSet {
    fn new(world: WorldId) -> Self {
        Self {
            world,
            next_id: 0,
            objects: BTreeMap::new(),
        }
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if there are no live objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns true if `id` is live.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Looks up an object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Looks up an object mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Looks up a character.
    #[must_use]
    pub fn character(&self, id: ObjectId) -> Option<&Character> {
        self.get(id).and_then(Object::as_character)
    }

    /// Looks up a character mutably.
    pub fn character_mut(&mut self, id: ObjectId) -> Option<&mut Character> {
        self.get_mut(id).and_then(Object::as_character_mut)
    }

    /// Looks up a grenade.
    #[must_use]
    pub fn grenade(&self, id: ObjectId) -> Option<&Grenade> {
        self.get(id).and_then(Object::as_grenade)
    }

    /// Looks up a grenade mutably.
    pub fn grenade_mut(&mut self, id: ObjectId) -> Option<&mut Grenade> {
        self.get_mut(id).and_then(Object::as_grenade_mut)
    }

    /// Live objects in update order.
    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Live characters in update order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.iter().filter_map(Object::as_character)
    }

    /// Ids of the live objects, in update order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Builds and inserts an object.
    pub(crate) fn spawn(&mut self, kernel: &mut dyn PhysicsKernel, spawn: Spawn) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let object = match spawn {
            Spawn::Character(spawn) => Object::Character(Character::new(id, self.world, kernel, spawn)),
            Spawn::Grenade(spawn) => Object::Grenade(Grenade::new(id, self.world, kernel, spawn)),
        };
        tracing::debug!(world = %self.world, object = %id, kind = ?object.kind(), "object created");
        self.objects.insert(id, object);
        id
    }

    /// Removes an object and releases its body.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not live.
    pub(crate) fn remove(&mut self, kernel: &mut dyn PhysicsKernel, id: ObjectId) {
        let Some(object) = self.objects.remove(&id) else {
            panic!("object {id} is not in {}", self.world);
        };
        tracing::debug!(world = %self.world, object = %id, kind = ?object.kind(), "object deleted");
        object.release(kernel);
    }

    fn take(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    fn restore(&mut self, object: Object) {
        self.objects.insert(object.id(), object);
    }
}

/// Everything an object may touch while it updates.
pub struct TickContext<'w> {
    current: ObjectId,
    current_deleted: bool,
    time: f64,
    dt: f32,
    kernel: &'w mut dyn PhysicsKernel,
    map: &'w dyn SpatialMap,
    objects: &'w mut ObjectSet,
    events: &'w mut Vec<WorldEvent>,
}

impl TickContext<'_> {
    /// The object being updated.
    #[must_use]
    pub const fn current(&self) -> ObjectId {
        self.current
    }

    /// True once the current object has deleted itself.
    #[must_use]
    pub const fn current_deleted(&self) -> bool {
        self.current_deleted
    }

    /// Simulation clock after this tick's advance.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Step of this tick (seconds).
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// The map being simulated.
    #[must_use]
    pub fn map(&self) -> &dyn SpatialMap {
        self.map
    }

    /// The physics kernel.
    pub fn kernel(&mut self) -> &mut dyn PhysicsKernel {
        &mut *self.kernel
    }

    /// Kernel and map together, for stepping a body.
    pub fn physics(&mut self) -> (&mut dyn PhysicsKernel, &dyn SpatialMap) {
        (&mut *self.kernel, self.map)
    }

    /// Every other live object. The current one is not in the set.
    #[must_use]
    pub fn objects(&self) -> &ObjectSet {
        &*self.objects
    }

    /// Every other live object, mutably.
    pub fn objects_mut(&mut self) -> &mut ObjectSet {
        &mut *self.objects
    }

    /// Deletes an object. Deleting the current object takes effect once its
    /// update returns; any other object is removed immediately and will not
    /// be updated later in this tick.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not live.
    pub fn delete(&mut self, id: ObjectId) {
        if id == self.current {
            assert!(!self.current_deleted, "object {id} deleted twice");
            self.current_deleted = true;
            return;
        }
        self.objects.remove(&mut *self.kernel, id);
    }

    /// Creates an object. It is first updated on the next tick.
    pub fn spawn(&mut self, spawn: impl Into<Spawn>) -> ObjectId {
        self.objects.spawn(&mut *self.kernel, spawn.into())
    }

    /// Queues an event for [`World::drain_events`].
    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }
}

/// Borrowed pieces of a [`World`], for work between ticks that needs the
/// kernel and an object at once.
pub struct WorldParts<'a> {
    /// Live objects.
    pub objects: &'a mut ObjectSet,
    /// The physics kernel.
    pub kernel: &'a mut dyn PhysicsKernel,
    /// The current map, if any.
    pub map: Option<&'a dyn SpatialMap>,
}

/// The simulation.
pub struct World {
    id: WorldId,
    objects: ObjectSet,
    time: f64,
    map: Option<Box<dyn SpatialMap>>,
    kernel: Box<dyn PhysicsKernel>,
    events: Vec<WorldEvent>,
}

impl World {
    /// Creates an empty world with no map.
    #[must_use]
    pub fn new(kernel: Box<dyn PhysicsKernel>) -> Self {
        let id = WorldId::next();
        Self {
            id,
            objects: ObjectSet::new(id),
            time: 0.0,
            map: None,
            kernel,
            events: Vec::new(),
        }
    }

    /// Creates an empty world simulating `map`.
    #[must_use]
    pub fn with_map(kernel: Box<dyn PhysicsKernel>, map: Box<dyn SpatialMap>) -> Self {
        let mut world = Self::new(kernel);
        world.map = Some(map);
        world
    }

    /// This world's id.
    #[must_use]
    pub const fn id(&self) -> WorldId {
        self.id
    }

    /// Simulation clock (seconds).
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Replaces the map. Without one, [`World::update`] does nothing.
    pub fn set_map(&mut self, map: Option<Box<dyn SpatialMap>>) {
        self.map = map;
    }

    /// The current map.
    #[must_use]
    pub fn map(&self) -> Option<&dyn SpatialMap> {
        self.map.as_deref()
    }

    /// The current map, mutably.
    pub fn map_mut(&mut self) -> Option<&mut dyn SpatialMap> {
        match self.map.as_mut() {
            Some(map) => Some(map.as_mut()),
            None => None,
        }
    }

    /// The physics kernel.
    #[must_use]
    pub fn kernel(&self) -> &dyn PhysicsKernel {
        self.kernel.as_ref()
    }

    /// Live objects.
    #[must_use]
    pub const fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    /// Live objects, mutably.
    pub fn objects_mut(&mut self) -> &mut ObjectSet {
        &mut self.objects
    }

    /// Splits the world into independently borrowable parts.
    pub fn parts(&mut self) -> WorldParts<'_> {
        WorldParts {
            objects: &mut self.objects,
            kernel: self.kernel.as_mut(),
            map: self.map.as_deref(),
        }
    }

    /// Creates an object from a spawn description.
    pub fn create_object(&mut self, spawn: impl Into<Spawn>) -> ObjectId {
        self.objects.spawn(self.kernel.as_mut(), spawn.into())
    }

    /// Deletes an object and releases its physics body.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in this world.
    pub fn delete(&mut self, id: ObjectId) {
        self.objects.remove(self.kernel.as_mut(), id);
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, WorldEvent> {
        self.events.drain(..)
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let Some(map) = self.map.as_deref() else {
            return;
        };

        self.time += f64::from(dt);
        self.kernel.set_globals(self.time, dt);

        for id in self.objects.ids() {
            // Deleted earlier in this tick
            let Some(mut object) = self.objects.take(id) else {
                continue;
            };

            let mut ctx = TickContext {
                current: id,
                current_deleted: false,
                time: self.time,
                dt,
                kernel: self.kernel.as_mut(),
                map,
                objects: &mut self.objects,
                events: &mut self.events,
            };
            object.update(&mut ctx);

            if ctx.current_deleted {
                tracing::debug!(world = %self.id, object = %id, kind = ?object.kind(), "object deleted itself");
                object.release(self.kernel.as_mut());
            } else {
                self.objects.restore(object);
            }
        }
    }

    /// Positions of every live character, in update order.
    #[must_use]
    pub fn character_positions(&self) -> Vec<(ObjectId, Vec3)> {
        self.objects.characters().map(|c| (c.id(), c.position())).collect()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("objects", &self.objects.len())
            .field("has_map", &self.map.is_some())
            .finish_non_exhaustive()
    }
}
