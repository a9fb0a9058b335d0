//! # Kinematic Kernel
//!
//! Reference [`PhysicsKernel`]: a kinematic character controller with voxel
//! collision, and a bouncing point-mass grenade.
//!
//! Features:
//! - Gravity along `+z` (down) with terminal velocity
//! - AABB collision against the spatial map, resolved one axis at a time
//! - Ground and water detection
//! - Fall magnitude on hard landings

use trench_core::{SpatialMap, Vec3};

use crate::kernel::{basis, GrenadeBody, PhysicsKernel, PlayerBody};

/// Player hitbox half width (units).
pub const PLAYER_HALF_WIDTH: f32 = 0.45;
/// Hitbox extent above the eye (units).
pub const HEAD_CLEARANCE: f32 = 0.45;
/// Eye to feet, standing (units).
pub const STAND_HEIGHT: f32 = 2.25;
/// Eye to feet, crouching (units).
pub const CROUCH_HEIGHT: f32 = 1.35;

/// Gap kept between a resolved body and the voxel it was pushed out of.
const SKIN: f32 = 1e-4;

// ============================================================================
// AABB
// ============================================================================

/// Axis-Aligned Bounding Box for collision detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: [f32; 3],
    /// Maximum corner (x, y, z).
    pub max: [f32; 3],
}

impl Aabb {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Box of a player whose eye is at `eye`.
    #[must_use]
    pub fn player(eye: [f32; 3], height: f32) -> Self {
        Self {
            min: [
                eye[0] - PLAYER_HALF_WIDTH,
                eye[1] - PLAYER_HALF_WIDTH,
                eye[2] - HEAD_CLEARANCE,
            ],
            max: [
                eye[0] + PLAYER_HALF_WIDTH,
                eye[1] + PLAYER_HALF_WIDTH,
                eye[2] + height,
            ],
        }
    }

    /// Creates an AABB for a single voxel at integer coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_voxel(x: i32, y: i32, z: i32) -> Self {
        Self {
            min: [x as f32, y as f32, z as f32],
            max: [(x + 1) as f32, (y + 1) as f32, (z + 1) as f32],
        }
    }

    /// Checks if this AABB intersects another. Touching faces do not count.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] && self.max[i] > other.min[i])
    }

    /// Returns the overlap amount on each axis. Positive = overlap, Negative = gap.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> [f32; 3] {
        std::array::from_fn(|i| self.max[i].min(other.max[i]) - self.min[i].max(other.min[i]))
    }

    /// Center of the box along one axis.
    #[must_use]
    pub fn center(&self, axis: usize) -> f32 {
        (self.min[axis] + self.max[axis]) * 0.5
    }

    /// Every solid voxel overlapping the box.
    #[allow(clippy::cast_possible_truncation)]
    pub fn solid_voxels<'m>(
        &self,
        map: &'m dyn SpatialMap,
    ) -> impl Iterator<Item = [i32; 3]> + 'm {
        let min = self.min.map(|v| v.floor() as i32);
        let max = self.max.map(|v| v.ceil() as i32);
        (min[2]..max[2]).flat_map(move |z| {
            (min[1]..max[1]).flat_map(move |y| {
                (min[0]..max[0])
                    .filter(move |&x| map.is_solid(x, y, z))
                    .map(move |x| [x, y, z])
            })
        })
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tuning for [`KinematicKernel`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicConfig {
    /// Gravity acceleration (units per second squared, `+z`).
    pub gravity: f32,
    /// Terminal fall speed (units per second).
    pub terminal_velocity: f32,
    /// Jump take-off speed (units per second).
    pub jump_velocity: f32,
    /// Walking speed (units per second).
    pub walk_speed: f32,
    /// Speed multiplier while sprinting.
    pub sprint_multiplier: f32,
    /// Speed multiplier while crouching.
    pub crouch_multiplier: f32,
    /// Speed multiplier while sneaking.
    pub sneak_multiplier: f32,
    /// Speed multiplier while wading.
    pub wade_multiplier: f32,
    /// Landing speed that does no harm (units per second).
    pub safe_fall_speed: f32,
    /// Feet below this `z` are in water.
    pub water_level: f32,
    /// Fraction of grenade speed kept after a bounce.
    pub grenade_damping: f32,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            gravity: 32.0,
            terminal_velocity: 50.0,
            jump_velocity: 10.0,
            walk_speed: 6.0,
            sprint_multiplier: 1.3,
            crouch_multiplier: 0.3,
            sneak_multiplier: 0.5,
            wade_multiplier: 0.5,
            safe_fall_speed: 15.0,
            water_level: 62.0,
            grenade_damping: 0.36,
        }
    }
}

// ============================================================================
// KERNEL
// ============================================================================

/// Kinematic reference kernel.
#[derive(Clone, Debug, Default)]
pub struct KinematicKernel {
    config: KinematicConfig,
    time: f64,
    dt: f32,
}

impl KinematicKernel {
    /// Creates a kernel with the given tuning.
    #[must_use]
    pub const fn new(config: KinematicConfig) -> Self {
        Self {
            config,
            time: 0.0,
            dt: 0.0,
        }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &KinematicConfig {
        &self.config
    }

    /// Clock set by the last [`PhysicsKernel::set_globals`].
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Step set by the last [`PhysicsKernel::set_globals`].
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    fn body_height(body: &PlayerBody) -> f32 {
        if body.inputs.crouch {
            CROUCH_HEIGHT
        } else {
            STAND_HEIGHT
        }
    }

    fn walk_velocity(&self, body: &PlayerBody) -> Vec3 {
        let inputs = &body.inputs;
        let forward = Vec3::new(body.forward.x, body.forward.y, 0.0).normalize_or_zero();
        let strafe = body.strafe;

        let mut direction = Vec3::ZERO;
        if inputs.up {
            direction += forward;
        }
        if inputs.down {
            direction += -forward;
        }
        if inputs.right {
            direction += strafe;
        }
        if inputs.left {
            direction += -strafe;
        }

        let mut speed = self.config.walk_speed;
        if inputs.crouch {
            speed *= self.config.crouch_multiplier;
        } else if inputs.sneak {
            speed *= self.config.sneak_multiplier;
        } else if inputs.sprint {
            speed *= self.config.sprint_multiplier;
        }
        if body.wade {
            speed *= self.config.wade_multiplier;
        }

        direction.normalize_or_zero() * speed
    }

    /// Pushes the body out of every voxel it overlaps along one axis.
    /// Returns true if anything was hit.
    fn resolve_axis(pos: &mut [f32; 3], height: f32, axis: usize, map: &dyn SpatialMap) -> bool {
        let mut collided = false;
        let voxels: Vec<[i32; 3]> = Aabb::player(*pos, height).solid_voxels(map).collect();

        for [vx, vy, vz] in voxels {
            let aabb = Aabb::player(*pos, height);
            let voxel = Aabb::from_voxel(vx, vy, vz);
            if !aabb.intersects(&voxel) {
                continue;
            }
            collided = true;

            let overlap = aabb.overlap(&voxel)[axis] + SKIN;
            let push = if aabb.center(axis) < voxel.center(axis) {
                -overlap
            } else {
                overlap
            };
            pos[axis] += push;
        }

        collided
    }

    fn on_ground(pos: [f32; 3], height: f32, map: &dyn SpatialMap) -> bool {
        let feet = pos[2] + height;
        let probe = Aabb::new(
            [pos[0] - PLAYER_HALF_WIDTH, pos[1] - PLAYER_HALF_WIDTH, feet],
            [pos[0] + PLAYER_HALF_WIDTH, pos[1] + PLAYER_HALF_WIDTH, feet + 0.1],
        );
        probe.solid_voxels(map).next().is_some()
    }
}

impl PhysicsKernel for KinematicKernel {
    fn create_player(&mut self) -> PlayerBody {
        PlayerBody::default()
    }

    fn create_grenade(&mut self, position: Vec3, velocity: Vec3) -> GrenadeBody {
        GrenadeBody { position, velocity }
    }

    fn set_globals(&mut self, time: f64, dt: f32) {
        self.time = time;
        self.dt = dt;
    }

    fn globals(&self) -> (f64, f32) {
        (self.time, self.dt)
    }

    fn move_player(&mut self, body: &mut PlayerBody, map: &dyn SpatialMap) -> f32 {
        let dt = self.dt;
        if dt <= 0.0 {
            return 0.0;
        }
        let height = Self::body_height(body);

        let walk = self.walk_velocity(body);
        body.velocity.x = walk.x;
        body.velocity.y = walk.y;

        if body.inputs.jump && !body.airborne {
            body.velocity.z = -self.config.jump_velocity;
            body.airborne = true;
            body.inputs.jump = false;
        }

        body.velocity.z =
            (body.velocity.z + self.config.gravity * dt).min(self.config.terminal_velocity);

        let mut pos = body.position.to_array();
        let mut vel = body.velocity.to_array();
        let landing_speed = vel[2];
        let mut landed = false;

        // Sweep each axis separately for stable collision response
        for axis in 0..3 {
            let delta = vel[axis] * dt;
            if delta.abs() <= 0.0001 {
                continue;
            }
            pos[axis] += delta;
            if Self::resolve_axis(&mut pos, height, axis, map) {
                if axis == 2 && vel[2] > 0.0 {
                    landed = true;
                }
                vel[axis] = 0.0;
            }
        }

        body.position = Vec3::from(pos);
        body.velocity = Vec3::from(vel);
        body.airborne = !(landed || (vel[2] >= 0.0 && Self::on_ground(pos, height, map)));
        body.wade = pos[2] + height > self.config.water_level;

        if landed && landing_speed > self.config.safe_fall_speed {
            landing_speed - self.config.safe_fall_speed
        } else {
            0.0
        }
    }

    fn move_grenade(&mut self, body: &mut GrenadeBody, map: &dyn SpatialMap) -> bool {
        let dt = self.dt;
        if dt <= 0.0 {
            return false;
        }
        body.velocity.z =
            (body.velocity.z + self.config.gravity * dt).min(self.config.terminal_velocity);

        let next = body.position + body.velocity * dt;
        let target = next.voxel();
        if !map.is_solid(target[0], target[1], target[2]) {
            body.position = next;
            return false;
        }

        // Reflect every axis whose crossing alone lands in a solid voxel
        let current = body.position.voxel();
        let mut velocity = body.velocity.to_array();
        let mut reflected = false;
        for axis in 0..3 {
            if target[axis] == current[axis] {
                continue;
            }
            let mut probe = current;
            probe[axis] = target[axis];
            if map.is_solid(probe[0], probe[1], probe[2]) {
                velocity[axis] = -velocity[axis];
                reflected = true;
            }
        }
        if !reflected {
            velocity = velocity.map(|v| -v);
        }
        body.velocity = Vec3::from(velocity) * self.config.grenade_damping;
        true
    }

    fn reorient_player(&mut self, body: &mut PlayerBody, orientation: Vec3) {
        let forward = orientation.normalize_or_zero();
        if forward.is_zero() {
            return;
        }
        let (strafe, head) = basis(forward);
        body.forward = forward;
        body.strafe = strafe;
        body.head = head;
    }

    fn aim_check(
        &self,
        origin: Vec3,
        orientation: Vec3,
        target: Vec3,
        aim_tolerance: f32,
        dist_tolerance: f32,
    ) -> bool {
        let forward = orientation.normalize_or_zero();
        let offset = target - origin;
        if forward.is_zero() || offset.dot(forward) <= 0.0 {
            return false;
        }
        if offset.length() > dist_tolerance {
            return false;
        }
        let (strafe, head) = basis(forward);
        offset.dot(strafe).abs() < aim_tolerance && offset.dot(head).abs() < aim_tolerance
    }

    fn can_uncrouch(&self, body: &PlayerBody, map: &dyn SpatialMap) -> bool {
        if !body.inputs.crouch {
            return true;
        }
        let p = body.position;
        let standing = Aabb::player([p.x, p.y, p.z - (STAND_HEIGHT - CROUCH_HEIGHT)], STAND_HEIGHT);
        standing.solid_voxels(map).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trench_core::VoxelMap;

    const DT: f32 = 1.0 / 60.0;

    fn ground_map() -> VoxelMap {
        // Solid from z = 60 down
        VoxelMap::flat(32, 32, 64, 60)
    }

    fn kernel() -> KinematicKernel {
        let mut kernel = KinematicKernel::default();
        kernel.set_globals(0.0, DT);
        kernel
    }

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::new([0.5, 0.5, 0.5], [1.5, 1.5, 1.5]);
        let c = Aabb::new([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c), "touching faces are not an intersection");
    }

    #[test]
    fn test_player_lands_on_ground() {
        let map = ground_map();
        let mut kernel = kernel();
        let mut body = kernel.create_player();
        body.position = Vec3::new(16.5, 16.5, 40.0);

        let mut worst = 0.0f32;
        for _ in 0..600 {
            worst = worst.max(kernel.move_player(&mut body, &map));
        }

        assert!(!body.airborne);
        assert!((body.position.z + STAND_HEIGHT - 60.0).abs() < 0.01);
        assert!(worst > 0.0, "a 17 unit drop should hurt");
    }

    #[test]
    fn test_short_drop_is_harmless() {
        let map = ground_map();
        let mut kernel = kernel();
        let mut body = kernel.create_player();
        body.position = Vec3::new(16.5, 16.5, 60.0 - STAND_HEIGHT - 0.5);

        for _ in 0..120 {
            assert_eq!(kernel.move_player(&mut body, &map), 0.0);
        }
        assert!(!body.airborne);
    }

    #[test]
    fn test_walk_follows_forward() {
        let map = ground_map();
        let mut kernel = kernel();
        let mut body = kernel.create_player();
        body.position = Vec3::new(10.5, 16.5, 60.0 - STAND_HEIGHT - SKIN);
        kernel.reorient_player(&mut body, Vec3::Y);
        body.inputs.up = true;

        for _ in 0..60 {
            kernel.move_player(&mut body, &map);
        }

        assert!((body.position.x - 10.5).abs() < 0.01);
        assert!(body.position.y > 20.0);
    }

    #[test]
    fn test_wade_below_water_level() {
        let map = VoxelMap::flat(32, 32, 64, 63);
        let mut kernel = kernel();
        let mut body = kernel.create_player();
        body.position = Vec3::new(16.5, 16.5, 63.0 - STAND_HEIGHT - SKIN);

        kernel.move_player(&mut body, &map);
        assert!(body.wade);
    }

    #[test]
    fn test_grenade_bounces_off_floor() {
        let map = ground_map();
        let mut kernel = KinematicKernel::default();
        kernel.set_globals(0.0, 0.1);
        let mut body = kernel.create_grenade(Vec3::new(16.5, 16.5, 59.5), Vec3::new(0.0, 0.0, 10.0));

        assert!(kernel.move_grenade(&mut body, &map));
        assert_eq!(body.position, Vec3::new(16.5, 16.5, 59.5));
        assert!(body.velocity.z < 0.0);
        assert!((body.velocity.z + 13.2 * 0.36).abs() < 1e-4);
    }

    #[test]
    fn test_grenade_flies_in_open_air() {
        let map = ground_map();
        let mut kernel = kernel();
        let mut body = kernel.create_grenade(Vec3::new(16.5, 16.5, 30.0), Vec3::X);

        assert!(!kernel.move_grenade(&mut body, &map));
        assert!(body.position.x > 16.5);
        assert!(body.position.z > 30.0);
    }

    #[test]
    fn test_aim_check() {
        let kernel = kernel();
        let origin = Vec3::new(0.0, 0.0, 0.0);

        assert!(kernel.aim_check(origin, Vec3::X, Vec3::new(10.0, 0.5, 0.0), 1.0, 128.0));
        assert!(!kernel.aim_check(origin, Vec3::X, Vec3::new(10.0, 1.5, 0.0), 1.0, 128.0));
        assert!(!kernel.aim_check(origin, Vec3::X, Vec3::new(-10.0, 0.0, 0.0), 1.0, 128.0));
        assert!(!kernel.aim_check(origin, Vec3::X, Vec3::new(200.0, 0.0, 0.0), 1.0, 128.0));
    }

    #[test]
    fn test_cannot_uncrouch_under_ceiling() {
        let mut map = ground_map();
        let kernel = kernel();
        let mut body = PlayerBody::default();
        body.inputs.crouch = true;
        body.position = Vec3::new(16.5, 16.5, 60.0 - CROUCH_HEIGHT - SKIN);
        assert!(kernel.can_uncrouch(&body, &map));

        // Block right above the crouched head
        map.set_solid(16, 16, 57, true);
        assert!(!kernel.can_uncrouch(&body, &map));
    }
}
