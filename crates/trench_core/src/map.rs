//! # Spatial Map
//!
//! Voxel volume queried by the simulation for collision, visibility and
//! ray casts.
//!
//! The simulation only sees the [`SpatialMap`] trait. [`VoxelMap`] is the
//! in-process reference volume: a dense grid of solid flags with the game's
//! `z`-down convention. Everything at or below `depth` counts as solid
//! ground, everything above `z = 0` is open sky.

use crate::math::{Vec3, VoxelCoord};

/// Queries the simulation needs from a voxel volume.
pub trait SpatialMap {
    /// Returns true if the voxel at the given coordinates blocks movement.
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool;

    /// Returns true if nothing solid lies between `origin` and `target`.
    fn can_see(&self, origin: Vec3, target: Vec3) -> bool;

    /// Casts a ray and returns the first solid voxel within `max_length`.
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_length: f32) -> Option<VoxelCoord>;

    /// Sets or clears a voxel. Coordinates outside the volume are ignored.
    fn set_solid(&mut self, x: i32, y: i32, z: i32, solid: bool);
}

/// Result of a raycast against the voxel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// The voxel coordinates that were hit.
    pub voxel: VoxelCoord,
    /// The face normal of the hit (-1, 0, or 1 for each axis).
    pub normal: VoxelCoord,
    /// Distance from ray origin to hit point.
    pub distance: f32,
}

/// Dense voxel grid.
#[derive(Clone, Debug)]
pub struct VoxelMap {
    width: i32,
    length: i32,
    depth: i32,
    solid: Vec<bool>,
}

impl VoxelMap {
    /// Number of voxels in a map of these dimensions, or `None` when the
    /// volume does not fit an `i32`. Negative dimensions count as zero.
    #[must_use]
    pub fn cells(width: i32, length: i32, depth: i32) -> Option<usize> {
        let volume = width
            .max(0)
            .checked_mul(length.max(0))?
            .checked_mul(depth.max(0))?;
        usize::try_from(volume).ok()
    }

    /// Creates an empty map (only the floor below `depth` is solid).
    ///
    /// # Panics
    ///
    /// Panics if the volume overflows, see [`VoxelMap::cells`].
    #[must_use]
    pub fn new(width: i32, length: i32, depth: i32) -> Self {
        let Some(cells) = Self::cells(width, length, depth) else {
            panic!("map volume {width}x{length}x{depth} overflows");
        };
        Self {
            width: width.max(0),
            length: length.max(0),
            depth: depth.max(0),
            solid: vec![false; cells],
        }
    }

    /// Creates a map whose voxels are solid from `ground_z` downwards.
    ///
    /// # Panics
    ///
    /// Panics if the volume overflows, see [`VoxelMap::cells`].
    #[must_use]
    pub fn flat(width: i32, length: i32, depth: i32, ground_z: i32) -> Self {
        let mut map = Self::new(width, length, depth);
        for z in ground_z.max(0)..map.depth {
            for y in 0..map.length {
                for x in 0..map.width {
                    map.set_solid(x, y, z, true);
                }
            }
        }
        map
    }

    /// Map extent along `x`.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map extent along `y`.
    #[must_use]
    pub const fn length(&self) -> i32 {
        self.length
    }

    /// Map extent along `z`.
    #[must_use]
    pub const fn depth(&self) -> i32 {
        self.depth
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if x < 0 || y < 0 || z < 0 || x >= self.width || y >= self.length || z >= self.depth {
            return None;
        }
        usize::try_from((z * self.length + y) * self.width + x).ok()
    }

    /// Performs a raycast using DDA (Digital Differential Analyzer).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let len = direction.length();
        if len < 0.0001 {
            return None;
        }
        let dir = [direction.x / len, direction.y / len, direction.z / len];
        let origin = origin.to_array();

        let mut voxel = [
            origin[0].floor() as i32,
            origin[1].floor() as i32,
            origin[2].floor() as i32,
        ];
        let step = dir.map(|d| if d >= 0.0 { 1 } else { -1 });
        let t_delta = dir.map(|d| if d.abs() < 0.0001 { f32::MAX } else { (1.0 / d).abs() });

        // Distance to first voxel boundary
        let mut t_max = [0.0f32; 3];
        for axis in 0..3 {
            t_max[axis] = if dir[axis] >= 0.0 {
                ((voxel[axis] + 1) as f32 - origin[axis]) / dir[axis].max(0.0001)
            } else {
                (voxel[axis] as f32 - origin[axis]) / dir[axis].min(-0.0001)
            };
        }

        let mut distance = 0.0;
        let mut last_normal = [0, 0, 0];

        while distance < max_distance {
            if self.is_solid(voxel[0], voxel[1], voxel[2]) {
                return Some(RaycastHit {
                    voxel,
                    normal: last_normal,
                    distance,
                });
            }

            let axis = if t_max[0] < t_max[1] && t_max[0] < t_max[2] {
                0
            } else if t_max[1] < t_max[2] {
                1
            } else {
                2
            };
            distance = t_max[axis];
            t_max[axis] += t_delta[axis];
            voxel[axis] += step[axis];
            last_normal = [0, 0, 0];
            last_normal[axis] = -step[axis];
        }

        None
    }
}

impl SpatialMap for VoxelMap {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        if z >= self.depth {
            return true;
        }
        self.index(x, y, z).is_some_and(|i| self.solid[i])
    }

    fn can_see(&self, origin: Vec3, target: Vec3) -> bool {
        let offset = target - origin;
        let distance = offset.length();
        if distance == 0.0 {
            let [x, y, z] = origin.voxel();
            return !self.is_solid(x, y, z);
        }
        match self.raycast(origin, offset, distance) {
            None => true,
            Some(hit) => hit.voxel == target.voxel() && hit.distance > 0.0,
        }
    }

    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_length: f32) -> Option<VoxelCoord> {
        self.raycast(origin, direction, max_length).map(|hit| hit.voxel)
    }

    fn set_solid(&mut self, x: i32, y: i32, z: i32, solid: bool) {
        if let Some(i) = self.index(x, y, z) {
            self.solid[i] = solid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground_map() -> VoxelMap {
        VoxelMap::flat(32, 32, 64, 60)
    }

    #[test]
    fn test_cells_checks_volume() {
        assert_eq!(VoxelMap::cells(512, 512, 64), Some(512 * 512 * 64));
        assert_eq!(VoxelMap::cells(-4, 8, 8), Some(0));
        assert_eq!(VoxelMap::cells(65_536, 65_536, 1), None);
        assert_eq!(VoxelMap::cells(i32::MAX, 2, 1), None);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_oversized_map_panics() {
        let _ = VoxelMap::new(65_536, 65_536, 1);
    }

    #[test]
    fn test_raycast_hits_ground() {
        let map = ground_map();
        let hit = map
            .raycast(Vec3::new(4.5, 4.5, 10.0), Vec3::Z, 100.0)
            .expect("ray should hit the ground");
        assert_eq!(hit.voxel, [4, 4, 60]);
        assert_eq!(hit.normal, [0, 0, -1]);
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let map = ground_map();
        assert!(map.raycast(Vec3::new(4.5, 4.5, 10.0), Vec3::Z, 20.0).is_none());
    }

    #[test]
    fn test_below_depth_is_solid() {
        let map = VoxelMap::new(8, 8, 8);
        assert!(map.is_solid(3, 3, 8));
        assert!(!map.is_solid(3, 3, 7));
        assert!(!map.is_solid(-1, 3, 2));
    }

    #[test]
    fn test_can_see_blocked_by_wall() {
        let mut map = ground_map();
        let a = Vec3::new(2.5, 5.5, 50.5);
        let b = Vec3::new(10.5, 5.5, 50.5);
        assert!(map.can_see(a, b));

        map.set_solid(6, 5, 50, true);
        assert!(!map.can_see(a, b));
        assert!(!map.can_see(b, a));
    }

    #[test]
    fn test_cast_ray_horizontal_wall() {
        let mut map = ground_map();
        map.set_solid(9, 5, 50, true);
        let hit = map.cast_ray(Vec3::new(2.5, 5.5, 50.5), Vec3::X, 32.0);
        assert_eq!(hit, Some([9, 5, 50]));
    }
}
