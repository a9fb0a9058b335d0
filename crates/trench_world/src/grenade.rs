//! # Grenade
//!
//! A thrown grenade: bounces under the kernel until its fuse runs out, then
//! fires its detonation callback once and removes itself.

use std::fmt;

use trench_core::{SpatialMap, Vec3};

use crate::event::{BlastHit, WorldEvent};
use crate::kernel::{GrenadeBody, PhysicsKernel};
use crate::object::{GrenadeSpawn, ObjectId, WorldId};
use crate::world::{ObjectSet, TickContext};

/// Longest look-ahead of [`Grenade::predict_collision`] (seconds).
pub const MAX_PREDICTION: f32 = 5.0;

/// Blast reach along each axis (units).
pub const BLAST_RANGE: f32 = 16.0;

/// Damage at distance `d` is `BLAST_SCALE / d²`.
const BLAST_SCALE: f32 = 4096.0;

/// Damage to a target sitting exactly on the grenade.
const POINT_BLANK_DAMAGE: f32 = 100.0;

/// Called once when the fuse runs out.
pub type DetonateCallback = Box<dyn FnOnce(&Grenade, &mut TickContext<'_>)>;

/// Result of [`Grenade::predict_collision`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// Seconds until the stop, counting the step that collided. A grenade
    /// that hits on its first step reports `dt`, never zero.
    pub eta: f32,
    /// Where the grenade is when it stops.
    pub position: Vec3,
}

/// A thrown grenade.
pub struct Grenade {
    id: ObjectId,
    world: WorldId,
    body: GrenadeBody,
    fuse: f32,
    on_detonate: Option<DetonateCallback>,
}

impl Grenade {
    pub(crate) fn new(
        id: ObjectId,
        world: WorldId,
        kernel: &mut dyn PhysicsKernel,
        spawn: GrenadeSpawn,
    ) -> Self {
        let velocity = spawn.velocity + spawn.orientation.unwrap_or(Vec3::ZERO);
        Self {
            id,
            world,
            body: kernel.create_grenade(spawn.position, velocity),
            fuse: spawn.fuse,
            on_detonate: spawn.on_detonate,
        }
    }

    pub(crate) fn into_body(self) -> GrenadeBody {
        self.body
    }

    /// This grenade's id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// The owning world.
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Moves the grenade.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.body.position = Vec3::new(x, y, z);
    }

    /// Velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    /// Overwrites the velocity.
    pub fn set_velocity(&mut self, x: f32, y: f32, z: f32) {
        self.body.velocity = Vec3::new(x, y, z);
    }

    /// Seconds left on the fuse.
    #[must_use]
    pub const fn fuse(&self) -> f32 {
        self.fuse
    }

    /// Resets the fuse.
    pub fn set_fuse(&mut self, fuse: f32) {
        self.fuse = fuse;
    }

    /// Steps a copy of this grenade with `dt` until it hits something or
    /// [`MAX_PREDICTION`] seconds pass, and reports where it stopped.
    ///
    /// `eta` is a whole number of steps and includes the colliding one. The
    /// grenade and the kernel's globals are left as they were. Returns `None`
    /// for a grenade at rest or a non-positive `dt`.
    pub fn predict_collision(
        &self,
        kernel: &mut dyn PhysicsKernel,
        map: &dyn SpatialMap,
        dt: f32,
    ) -> Option<Collision> {
        if self.body.velocity.is_zero() || dt <= 0.0 {
            return None;
        }

        let (time, step) = kernel.globals();
        kernel.set_globals(time, dt);

        let mut scratch = self.body;
        let mut eta = 0.0;
        loop {
            eta += dt;
            if kernel.move_grenade(&mut scratch, map) || eta > MAX_PREDICTION {
                break;
            }
        }

        kernel.set_globals(time, step);
        Some(Collision {
            eta,
            position: scratch.position,
        })
    }

    /// Blast damage dealt to `target`.
    ///
    /// Zero unless the target is within [`BLAST_RANGE`] on every axis and
    /// in line of sight.
    #[must_use]
    pub fn damage(&self, map: &dyn SpatialMap, target: Vec3) -> f32 {
        let position = self.position();
        let d = target - position;
        if d.x.abs() >= BLAST_RANGE || d.y.abs() >= BLAST_RANGE || d.z.abs() >= BLAST_RANGE {
            return 0.0;
        }
        if !map.can_see(position, target) {
            return 0.0;
        }
        let distance_sq = d.length_squared();
        if distance_sq == 0.0 {
            POINT_BLANK_DAMAGE
        } else {
            BLAST_SCALE / distance_sq
        }
    }

    /// Damage to every living character in `objects`, skipping those out of
    /// reach.
    #[must_use]
    pub fn blast_hits(&self, map: &dyn SpatialMap, objects: &ObjectSet) -> Vec<BlastHit> {
        objects
            .characters()
            .filter(|c| c.alive())
            .filter_map(|c| {
                let damage = self.damage(map, c.position());
                (damage > 0.0).then_some(BlastHit {
                    object: c.id(),
                    damage,
                })
            })
            .collect()
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_>) {
        self.fuse -= ctx.dt();
        if self.fuse > 0.0 {
            let (kernel, map) = ctx.physics();
            kernel.move_grenade(&mut self.body, map);
            return;
        }

        tracing::debug!(object = %self.id, position = ?self.body.position, "grenade detonated");
        if let Some(on_detonate) = self.on_detonate.take() {
            on_detonate(self, ctx);
        }
        if !ctx.current_deleted() {
            ctx.delete(self.id);
        }
    }
}

impl fmt::Debug for Grenade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grenade")
            .field("id", &self.id)
            .field("body", &self.body)
            .field("fuse", &self.fuse)
            .field("on_detonate", &self.on_detonate.is_some())
            .finish()
    }
}

/// Detonation callback that reports the blast as a
/// [`WorldEvent::Detonated`], with the damage to every character in reach.
#[must_use]
pub fn emit_detonation() -> DetonateCallback {
    Box::new(|grenade: &Grenade, ctx: &mut TickContext<'_>| {
        let hits = grenade.blast_hits(ctx.map(), ctx.objects());
        ctx.emit(WorldEvent::Detonated {
            grenade: grenade.id(),
            position: grenade.position(),
            hits,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic::KinematicKernel;
    use crate::object::CharacterSpawn;
    use crate::world::World;
    use trench_core::VoxelMap;

    fn world() -> World {
        World::with_map(
            Box::new(KinematicKernel::default()),
            Box::new(VoxelMap::flat(64, 64, 64, 60)),
        )
    }

    fn grenade_at(world: &mut World, position: Vec3, velocity: Vec3, fuse: f32) -> ObjectId {
        world.create_object(GrenadeSpawn::new(position, velocity, fuse))
    }

    #[test]
    fn test_damage_falloff() {
        let mut world = world();
        let origin = Vec3::new(20.5, 20.5, 40.5);
        let id = grenade_at(&mut world, origin, Vec3::ZERO, 3.0);
        let grenade = world.objects().grenade(id).unwrap();
        let map = world.map().unwrap();

        assert_eq!(grenade.damage(map, origin), 100.0);
        assert_eq!(grenade.damage(map, origin + Vec3::new(8.0, 0.0, 0.0)), 64.0);
        assert_eq!(grenade.damage(map, origin + Vec3::new(20.0, 0.0, 0.0)), 0.0);
        assert_eq!(grenade.damage(map, origin + Vec3::new(0.0, 16.0, 0.0)), 0.0);
    }

    #[test]
    fn test_damage_needs_line_of_sight() {
        let mut world = world();
        let origin = Vec3::new(20.5, 20.5, 40.5);
        let id = grenade_at(&mut world, origin, Vec3::ZERO, 3.0);
        if let Some(map) = world.map_mut() {
            map.set_solid(24, 20, 40, true);
        }
        let grenade = world.objects().grenade(id).unwrap();
        let map = world.map().unwrap();

        assert_eq!(grenade.damage(map, origin + Vec3::new(8.0, 0.0, 0.0)), 0.0);
        assert_eq!(grenade.damage(map, origin - Vec3::new(8.0, 0.0, 0.0)), 64.0);
    }

    #[test]
    fn test_orientation_adds_to_velocity() {
        let mut world = world();
        let id = world.create_object(
            GrenadeSpawn::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(1.0, 0.0, 0.0), 3.0)
                .with_orientation(Vec3::new(0.0, 2.0, 0.0)),
        );
        let grenade = world.objects().grenade(id).unwrap();
        assert_eq!(grenade.velocity(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_predict_collision_leaves_state_unchanged() {
        let mut world = world();
        world.update(0.05);
        let start = Vec3::new(10.5, 10.5, 50.5);
        let id = grenade_at(&mut world, start, Vec3::new(0.0, 0.0, 1.0), 3.0);

        let parts = world.parts();
        let grenade = parts.objects.grenade(id).unwrap();
        let map = parts.map.unwrap();
        let collision = grenade.predict_collision(parts.kernel, map, 0.01).unwrap();

        assert!(collision.eta > 0.0 && collision.eta <= MAX_PREDICTION + 0.01);
        assert!(collision.position.z > 59.0 && collision.position.z < 60.0);
        assert_eq!(grenade.position(), start);
        assert_eq!(grenade.velocity(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(parts.kernel.globals(), (f64::from(0.05_f32), 0.05_f32));
    }

    #[test]
    fn test_predict_collision_first_step_counts() {
        let mut world = world();
        let start = Vec3::new(10.5, 10.5, 59.5);
        let id = grenade_at(&mut world, start, Vec3::new(0.0, 0.0, 20.0), 3.0);

        let parts = world.parts();
        let grenade = parts.objects.grenade(id).unwrap();
        let collision = grenade.predict_collision(parts.kernel, parts.map.unwrap(), 0.1).unwrap();

        assert_eq!(collision.eta, 0.1);
        assert_eq!(collision.position, start);
    }

    #[test]
    fn test_predict_collision_at_rest() {
        let mut world = world();
        let id = grenade_at(&mut world, Vec3::new(10.5, 10.5, 50.5), Vec3::ZERO, 3.0);
        let parts = world.parts();
        let grenade = parts.objects.grenade(id).unwrap();
        assert!(grenade.predict_collision(parts.kernel, parts.map.unwrap(), 0.01).is_none());
    }

    #[test]
    fn test_detonation_reports_hits_and_removes_grenade() {
        let mut world = world();
        let near = world.create_object(CharacterSpawn::new(Vec3::new(24.5, 20.5, 40.5)));
        let far = world.create_object(CharacterSpawn::new(Vec3::new(50.5, 20.5, 40.5)));
        let id = world.create_object(
            GrenadeSpawn {
                on_detonate: Some(emit_detonation()),
                ..GrenadeSpawn::new(Vec3::new(20.5, 20.5, 40.5), Vec3::ZERO, 0.05)
            },
        );

        world.update(0.1);

        assert!(!world.objects().contains(id));
        let events: Vec<_> = world.drain_events().collect();
        let [WorldEvent::Detonated { grenade, hits, .. }] = events.as_slice() else {
            panic!("expected one detonation, got {events:?}");
        };
        assert_eq!(*grenade, id);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, near);
        assert!(hits.iter().all(|h| h.object != far));
    }

    #[test]
    fn test_grenade_without_callback_still_removed() {
        let mut world = world();
        let id = grenade_at(&mut world, Vec3::new(20.5, 20.5, 40.5), Vec3::ZERO, 0.05);
        world.update(0.03);
        assert!(world.objects().contains(id));
        world.update(0.03);
        assert!(!world.objects().contains(id));
        assert_eq!(world.drain_events().count(), 0);
    }
}
