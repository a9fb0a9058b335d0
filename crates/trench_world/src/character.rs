//! # Character
//!
//! A player's body in the world.
//!
//! Position, velocity and orientation are views into the [`PlayerBody`] the
//! character owns: setters write straight into it, and what the kernel
//! writes during a tick is what the getters return.

use std::fmt;

use trench_core::{SpatialMap, Vec3, VoxelCoord};

use crate::event::WorldEvent;
use crate::kernel::{basis, PhysicsKernel, PlayerBody, PlayerInputs};
use crate::object::{CharacterSpawn, ObjectId, WorldId};
use crate::world::TickContext;

/// How far the eye drops when crouching (units, `+z`).
pub const CROUCH_OFFSET: f32 = 0.9;

/// Lateral-to-forward ratio under which a hit counts as head-on.
const ALIGNED_RATIO: f32 = 0.25;

/// Called with the fall magnitude after a hard landing.
pub type FallCallback = Box<dyn FnMut(&mut TickContext<'_>, f32)>;

/// Side a shot came from, relative to where the victim is looking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitDirection {
    /// Straight ahead (or straight behind).
    Aligned,
    /// From the left.
    Left,
    /// From the right.
    Right,
    /// From above.
    Up,
    /// From below.
    Down,
}

/// Body part a hit claims to have struck.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyPart {
    /// Torso.
    Torso,
    /// Head.
    Head,
    /// Arms.
    Arms,
    /// Legs.
    Legs,
    /// Melee strike.
    Melee,
}

impl BodyPart {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Torso),
            1 => Some(Self::Head),
            2 => Some(Self::Arms),
            3 => Some(Self::Legs),
            4 => Some(Self::Melee),
            _ => None,
        }
    }

    /// Distance below the eye the part is checked at.
    #[must_use]
    pub const fn anchor_offset(self) -> f32 {
        match self {
            Self::Head => 0.0,
            Self::Torso | Self::Arms | Self::Melee => 0.9,
            Self::Legs => 1.8,
        }
    }
}

/// A player's body.
pub struct Character {
    id: ObjectId,
    world: WorldId,
    body: PlayerBody,
    on_fall: Option<FallCallback>,
}

impl Character {
    pub(crate) fn new(
        id: ObjectId,
        world: WorldId,
        kernel: &mut dyn PhysicsKernel,
        spawn: CharacterSpawn,
    ) -> Self {
        let mut body = kernel.create_player();
        body.position = spawn.position;
        kernel.reorient_player(&mut body, spawn.orientation);
        Self {
            id,
            world,
            body,
            on_fall: spawn.on_fall,
        }
    }

    pub(crate) fn into_body(self) -> PlayerBody {
        self.body
    }

    /// This character's id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// The owning world.
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// The physics body.
    #[must_use]
    pub const fn body(&self) -> &PlayerBody {
        &self.body
    }

    /// Eye position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Moves the character. With `reset`, also stops it and drops every
    /// held movement, fire, jump and crouch input.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32, reset: bool) {
        self.body.position = Vec3::new(x, y, z);
        if reset {
            self.body.velocity = Vec3::ZERO;
            let inputs = &mut self.body.inputs;
            inputs.clear_movement();
            inputs.clear_fire();
            inputs.jump = false;
            inputs.crouch = false;
        }
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

    /// Unit aim direction.
    #[must_use]
    pub const fn orientation(&self) -> Vec3 {
        self.body.forward
    }

    /// Aims along `(x, y, z)`. A zero vector is ignored.
    pub fn set_orientation(&mut self, kernel: &mut dyn PhysicsKernel, x: f32, y: f32, z: f32) {
        let orientation = Vec3::new(x, y, z).normalize_or_zero();
        kernel.reorient_player(&mut self.body, orientation);
    }

    /// True while not standing on anything.
    #[must_use]
    pub const fn airborne(&self) -> bool {
        self.body.airborne
    }

    /// True while the feet are in water.
    #[must_use]
    pub const fn wade(&self) -> bool {
        self.body.wade
    }

    /// False once dead.
    #[must_use]
    pub const fn alive(&self) -> bool {
        self.body.alive
    }

    /// Control flags.
    #[must_use]
    pub const fn inputs(&self) -> &PlayerInputs {
        &self.body.inputs
    }

    /// Sets the walk flags.
    pub fn set_walk(&mut self, up: bool, down: bool, left: bool, right: bool) {
        let inputs = &mut self.body.inputs;
        inputs.up = up;
        inputs.down = down;
        inputs.left = left;
        inputs.right = right;
    }

    /// Sets the stance flags. Toggling crouch moves the eye by
    /// [`CROUCH_OFFSET`].
    pub fn set_animation(&mut self, jump: bool, crouch: bool, sneak: bool, sprint: bool) {
        if crouch != self.body.inputs.crouch {
            if crouch {
                self.body.position.z += CROUCH_OFFSET;
            } else {
                self.body.position.z -= CROUCH_OFFSET;
            }
        }
        let inputs = &mut self.body.inputs;
        inputs.jump = jump;
        inputs.crouch = crouch;
        inputs.sneak = sneak;
        inputs.sprint = sprint;
    }

    /// Sets the fire flags.
    pub fn set_fire(&mut self, primary: bool, secondary: bool) {
        self.body.inputs.primary_fire = primary;
        self.body.inputs.secondary_fire = secondary;
    }

    /// Selects the primary weapon (or not).
    pub fn set_weapon(&mut self, primary: bool) {
        self.body.inputs.weapon = primary;
    }

    /// Kills or revives. Either way every held input except jump and the
    /// weapon selection is dropped.
    pub fn set_dead(&mut self, dead: bool) {
        self.body.alive = !dead;
        let inputs = &mut self.body.inputs;
        inputs.clear_movement();
        inputs.clear_fire();
        inputs.crouch = false;
        inputs.sneak = false;
        inputs.sprint = false;
    }

    /// Returns true if nothing solid lies between the eye and `(x, y, z)`.
    #[must_use]
    pub fn can_see(&self, map: &dyn SpatialMap, x: f32, y: f32, z: f32) -> bool {
        map.can_see(self.position(), Vec3::new(x, y, z))
    }

    /// First solid voxel along the aim, within `max_length`.
    #[must_use]
    pub fn cast_ray(&self, map: &dyn SpatialMap, max_length: f32) -> Option<VoxelCoord> {
        map.cast_ray(self.position(), self.orientation(), max_length)
    }

    /// Returns true if a crouching character has room to stand.
    #[must_use]
    pub fn can_uncrouch(&self, kernel: &dyn PhysicsKernel, map: &dyn SpatialMap) -> bool {
        kernel.can_uncrouch(&self.body, map)
    }

    /// Side `target` lies on, as seen by this character.
    #[must_use]
    pub fn hit_direction(&self, target: Vec3) -> HitDirection {
        let o = self.orientation().normalize_or_zero();
        let d = target - self.position();
        let lat = (o.x * o.x + o.y * o.y).sqrt();
        let fd = d.dot(o);

        let (x2, y2) = if fd == 0.0 || lat == 0.0 {
            (0.0, 0.0)
        } else {
            let (side, up) = basis(o);
            (d.dot(side) / fd, d.dot(up) / fd)
        };

        if x2.abs() < ALIGNED_RATIO && y2.abs() < ALIGNED_RATIO {
            return HitDirection::Aligned;
        }
        let behind = fd < 0.0;
        if x2.abs() >= y2.abs() {
            if (x2 > 0.0) != behind {
                HitDirection::Right
            } else {
                HitDirection::Left
            }
        } else if (y2 > 0.0) != behind {
            HitDirection::Up
        } else {
            HitDirection::Down
        }
    }

    /// Checks a claimed hit on `other` against this character's aim.
    ///
    /// Returns false for an unknown body part tag.
    #[must_use]
    pub fn validate_hit(
        &self,
        kernel: &dyn PhysicsKernel,
        other: &Self,
        body_part: u8,
        aim_tolerance: f32,
        dist_tolerance: f32,
    ) -> bool {
        let Some(part) = BodyPart::from_tag(body_part) else {
            return false;
        };
        let target = other.position() + Vec3::new(0.0, 0.0, part.anchor_offset());
        kernel.aim_check(
            self.position(),
            self.orientation(),
            target,
            aim_tolerance,
            dist_tolerance,
        )
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_>) {
        let (kernel, map) = ctx.physics();
        let magnitude = kernel.move_player(&mut self.body, map);
        if magnitude <= 0.0 {
            return;
        }
        tracing::debug!(object = %self.id, magnitude, "character landed hard");
        if let Some(on_fall) = self.on_fall.as_mut() {
            on_fall(ctx, magnitude);
        }
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("id", &self.id)
            .field("body", &self.body)
            .field("on_fall", &self.on_fall.is_some())
            .finish()
    }
}

/// Fall callback that reports the landing as a [`WorldEvent::Fell`].
#[must_use]
pub fn emit_fall() -> FallCallback {
    Box::new(|ctx: &mut TickContext<'_>, magnitude| {
        let object = ctx.current();
        ctx.emit(WorldEvent::Fell { object, magnitude });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic::KinematicKernel;
    use crate::world::World;
    use trench_core::VoxelMap;

    fn world_with(position: Vec3, orientation: Vec3) -> (World, ObjectId) {
        let mut world = World::with_map(
            Box::new(KinematicKernel::default()),
            Box::new(VoxelMap::flat(64, 64, 64, 60)),
        );
        let id = world.create_object(CharacterSpawn::new(position).with_orientation(orientation));
        (world, id)
    }

    fn direction_to(target: Vec3) -> HitDirection {
        let (world, id) = world_with(Vec3::ZERO, Vec3::X);
        world.objects().character(id).unwrap().hit_direction(target)
    }

    #[test]
    fn test_hit_direction_aligned_below_threshold() {
        // 0.24 sideways and 0.24 up per unit forward
        assert_eq!(direction_to(Vec3::new(1.0, 0.24, -0.24)), HitDirection::Aligned);
        assert_eq!(direction_to(Vec3::new(1.0, 0.0, 0.0)), HitDirection::Aligned);
    }

    #[test]
    fn test_hit_direction_sides() {
        // Facing east, +y (south) is to the right
        assert_eq!(direction_to(Vec3::new(1.0, 0.26, 0.0)), HitDirection::Right);
        assert_eq!(direction_to(Vec3::new(1.0, -0.26, 0.0)), HitDirection::Left);
    }

    #[test]
    fn test_hit_direction_behind_keeps_side() {
        // The ratio changes sign behind the victim and the flip undoes it
        assert_eq!(direction_to(Vec3::new(-1.0, 0.26, 0.0)), HitDirection::Right);
        assert_eq!(direction_to(Vec3::new(-1.0, -0.26, 0.0)), HitDirection::Left);
    }

    #[test]
    fn test_hit_direction_vertical() {
        // -z is up
        assert_eq!(direction_to(Vec3::new(1.0, 0.0, -0.5)), HitDirection::Up);
        assert_eq!(direction_to(Vec3::new(1.0, 0.0, 0.5)), HitDirection::Down);
        assert_eq!(direction_to(Vec3::new(-1.0, 0.0, -0.5)), HitDirection::Up);
    }

    #[test]
    fn test_hit_direction_looking_straight_down() {
        let (world, id) = world_with(Vec3::ZERO, Vec3::Z);
        let c = world.objects().character(id).unwrap();
        assert_eq!(c.hit_direction(Vec3::new(5.0, 5.0, 1.0)), HitDirection::Aligned);
    }

    #[test]
    fn test_crouch_moves_eye_once() {
        let (mut world, id) = world_with(Vec3::new(10.0, 10.0, 50.0), Vec3::X);
        let c = world.objects_mut().character_mut(id).unwrap();

        c.set_animation(false, true, false, false);
        assert!((c.position().z - 50.9).abs() < 1e-5);
        c.set_animation(false, true, false, false);
        assert!((c.position().z - 50.9).abs() < 1e-5);
        c.set_animation(false, false, false, false);
        assert!((c.position().z - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_dead_clears_inputs() {
        let (mut world, id) = world_with(Vec3::new(10.0, 10.0, 50.0), Vec3::X);
        let c = world.objects_mut().character_mut(id).unwrap();
        c.set_walk(true, false, true, false);
        c.set_animation(true, true, true, true);
        c.set_fire(true, true);
        c.set_weapon(true);

        c.set_dead(true);

        assert!(!c.alive());
        let inputs = c.inputs();
        assert!(!inputs.up && !inputs.left);
        assert!(!inputs.primary_fire && !inputs.secondary_fire);
        assert!(!inputs.crouch && !inputs.sneak && !inputs.sprint);
        assert!(inputs.jump);
        assert!(inputs.weapon);

        c.set_dead(false);
        assert!(c.alive());
    }

    #[test]
    fn test_set_position_reset() {
        let (mut world, id) = world_with(Vec3::new(10.0, 10.0, 50.0), Vec3::X);
        let c = world.objects_mut().character_mut(id).unwrap();
        c.set_velocity(1.0, 2.0, 3.0);
        c.set_walk(true, true, true, true);
        c.set_animation(true, true, false, true);

        c.set_position(20.0, 20.0, 40.0, false);
        assert_eq!(c.velocity(), Vec3::new(1.0, 2.0, 3.0));

        c.set_position(20.0, 20.0, 40.0, true);
        assert_eq!(c.position(), Vec3::new(20.0, 20.0, 40.0));
        assert_eq!(c.velocity(), Vec3::ZERO);
        assert!(!c.inputs().up && !c.inputs().jump && !c.inputs().crouch);
        assert!(c.inputs().sprint);
    }

    #[test]
    fn test_set_orientation_normalizes() {
        let (mut world, id) = world_with(Vec3::new(10.0, 10.0, 50.0), Vec3::X);
        let parts = world.parts();
        let c = parts.objects.character_mut(id).unwrap();
        c.set_orientation(parts.kernel, 0.0, 3.0, 0.0);
        assert_eq!(c.orientation(), Vec3::Y);
    }

    #[test]
    fn test_validate_hit_body_parts() {
        let mut world = World::with_map(
            Box::new(KinematicKernel::default()),
            Box::new(VoxelMap::flat(64, 64, 64, 60)),
        );
        let shooter = world.create_object(CharacterSpawn::new(Vec3::new(10.0, 10.0, 50.0)));
        let victim = world.create_object(CharacterSpawn::new(Vec3::new(30.0, 10.0, 49.1)));
        let objects = world.objects();
        let (a, b) = (objects.character(shooter).unwrap(), objects.character(victim).unwrap());
        let kernel = world.kernel();

        // Level aim lines up with the victim's torso, 0.9 below its eye
        assert!(a.validate_hit(kernel, b, 0, 0.5, 128.0));
        assert!(a.validate_hit(kernel, b, 2, 0.5, 128.0));
        assert!(!a.validate_hit(kernel, b, 1, 0.5, 128.0));
        assert!(!a.validate_hit(kernel, b, 3, 0.5, 128.0));
        assert!(!a.validate_hit(kernel, b, 9, 10.0, 128.0));
        assert!(!a.validate_hit(kernel, b, 0, 0.5, 10.0));
    }

    #[test]
    fn test_cast_ray_along_aim() {
        let (world, id) = world_with(Vec3::new(10.5, 10.5, 50.5), Vec3::Z);
        let c = world.objects().character(id).unwrap();
        let map = world.map().unwrap();
        assert_eq!(c.cast_ray(map, 32.0), Some([10, 10, 60]));
        assert_eq!(c.cast_ray(map, 5.0), None);
        assert!(c.can_see(map, 20.5, 20.5, 55.5));
    }
}
