//! # Physics Kernel
//!
//! The integrator the entity model drives once per tick.
//!
//! Bodies are plain data owned by the entities. The kernel never keeps a
//! pointer to them: every call borrows the body it works on, so whatever an
//! entity reads back is exactly what the last kernel call wrote.

use trench_core::{SpatialMap, Vec3};

/// Control flags the kernel reads while moving a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PlayerInputs {
    /// Walk forward.
    pub up: bool,
    /// Walk backward.
    pub down: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Jump requested.
    pub jump: bool,
    /// Crouching.
    pub crouch: bool,
    /// Sneaking (slow walk).
    pub sneak: bool,
    /// Sprinting.
    pub sprint: bool,
    /// Primary fire held.
    pub primary_fire: bool,
    /// Secondary fire held.
    pub secondary_fire: bool,
    /// Primary weapon selected.
    pub weapon: bool,
}

impl PlayerInputs {
    /// Clears the walk flags.
    pub fn clear_movement(&mut self) {
        self.up = false;
        self.down = false;
        self.left = false;
        self.right = false;
    }

    /// Clears both fire flags.
    pub fn clear_fire(&mut self) {
        self.primary_fire = false;
        self.secondary_fire = false;
    }
}

/// Kinematic state of one player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerBody {
    /// Eye position.
    pub position: Vec3,
    /// Velocity (units per second).
    pub velocity: Vec3,
    /// Unit aim direction.
    pub forward: Vec3,
    /// Unit vector to the right of `forward`, horizontal.
    pub strafe: Vec3,
    /// Unit vector above `forward` (negative `z` when level).
    pub head: Vec3,
    /// Control flags.
    pub inputs: PlayerInputs,
    /// True while not standing on anything.
    pub airborne: bool,
    /// True while the feet are in water.
    pub wade: bool,
    /// False once the player has died.
    pub alive: bool,
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::X,
            strafe: Vec3::Y,
            head: Vec3::new(0.0, 0.0, -1.0),
            inputs: PlayerInputs::default(),
            airborne: false,
            wade: false,
            alive: true,
        }
    }
}

/// Kinematic state of one grenade.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrenadeBody {
    /// Position.
    pub position: Vec3,
    /// Velocity (units per second).
    pub velocity: Vec3,
}

/// Movement integrator, collision and aim queries.
///
/// Calls never fail: the kernel clamps or ignores whatever it cannot use.
pub trait PhysicsKernel {
    /// Allocates a player body at rest.
    fn create_player(&mut self) -> PlayerBody;

    /// Allocates a grenade body.
    fn create_grenade(&mut self, position: Vec3, velocity: Vec3) -> GrenadeBody;

    /// Takes back a player body that will never be moved again.
    fn release_player(&mut self, _body: PlayerBody) {}

    /// Takes back a grenade body that will never be moved again.
    fn release_grenade(&mut self, _body: GrenadeBody) {}

    /// Sets the simulation clock and step for the calls that follow.
    fn set_globals(&mut self, time: f64, dt: f32);

    /// Clock and step last passed to [`PhysicsKernel::set_globals`].
    fn globals(&self) -> (f64, f32);

    /// Advances a player by one step.
    ///
    /// Returns the fall magnitude if the player landed hard this step, else
    /// `0.0`.
    fn move_player(&mut self, body: &mut PlayerBody, map: &dyn SpatialMap) -> f32;

    /// Advances a grenade by one step. Returns true if it hit something.
    fn move_grenade(&mut self, body: &mut GrenadeBody, map: &dyn SpatialMap) -> bool;

    /// Points a player along `orientation` and rebuilds its basis vectors.
    fn reorient_player(&mut self, body: &mut PlayerBody, orientation: Vec3);

    /// Returns true if a shot from `origin` along `orientation` passes
    /// within `aim_tolerance` of `target`, and `target` is in front and no
    /// further than `dist_tolerance`.
    fn aim_check(
        &self,
        origin: Vec3,
        orientation: Vec3,
        target: Vec3,
        aim_tolerance: f32,
        dist_tolerance: f32,
    ) -> bool;

    /// Returns true if a crouching player has room to stand up.
    fn can_uncrouch(&self, body: &PlayerBody, map: &dyn SpatialMap) -> bool;
}

/// Right and up vectors for a unit aim direction.
///
/// Straight up or down has no horizontal heading; `x` is used as right.
#[must_use]
pub fn basis(forward: Vec3) -> (Vec3, Vec3) {
    let lat = (forward.x * forward.x + forward.y * forward.y).sqrt();
    if lat < 1e-6 {
        let strafe = Vec3::X;
        return (strafe, forward.cross(strafe).normalize_or_zero());
    }
    let strafe = Vec3::new(-forward.y / lat, forward.x / lat, 0.0);
    let head = Vec3::new(
        forward.x * forward.z / lat,
        forward.y * forward.z / lat,
        -lat,
    );
    (strafe, head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_level_east() {
        let (strafe, head) = basis(Vec3::X);
        // Facing east, south is to the right and -z is up.
        assert_eq!(strafe, Vec3::Y);
        assert_eq!(head, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let forward = Vec3::new(0.3, -0.5, 0.4).normalize_or_zero();
        let (strafe, head) = basis(forward);
        assert!(forward.dot(strafe).abs() < 1e-5);
        assert!(forward.dot(head).abs() < 1e-5);
        assert!(strafe.dot(head).abs() < 1e-5);
        assert!((head.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_basis_vertical() {
        let (strafe, head) = basis(Vec3::Z);
        assert_eq!(strafe, Vec3::X);
        assert!((head.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clear_helpers() {
        let mut inputs = PlayerInputs {
            up: true,
            right: true,
            primary_fire: true,
            secondary_fire: true,
            jump: true,
            ..PlayerInputs::default()
        };
        inputs.clear_movement();
        inputs.clear_fire();
        assert_eq!(
            inputs,
            PlayerInputs {
                jump: true,
                ..PlayerInputs::default()
            }
        );
    }
}
