// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Axis-aligned bounding volumes used by the native physics world and for ray queries.

use super::{Vec3, EPSILON};

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Defined by its minimum and maximum corner points. Used as the collision
/// shape of native bodies and as the target of the ray slab test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from two corner points, in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    /// The provided `half_extents` are made non-negative.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Calculates the center point of the `Aabb`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents of the `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Intersects a ray with the box using the slab method.
    ///
    /// Returns the time of impact along `dir` (in units of `dir`'s length) of the
    /// first contact within `[0, max_toi]`, or `None` if the ray misses.
    /// A ray starting inside the box hits at `0.0`.
    pub fn ray_intersection(&self, origin: Vec3, dir: Vec3, max_toi: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_toi;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < EPSILON {
                // Parallel to this slab: must already lie within it.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::from_min_max(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_aabb_from_min_max_swapped() {
        let aabb = Aabb::from_min_max(Vec3::new(4.0, 5.0, 6.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_aabb_from_center_half_extents() {
        let aabb =
            Aabb::from_center_half_extents(Vec3::new(10.0, 20.0, 30.0), Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(9.0, 18.0, 27.0));
        assert_eq!(aabb.max, Vec3::new(11.0, 22.0, 33.0));
        assert_eq!(aabb.center(), Vec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_ray_hits_front_face() {
        let toi = unit_box()
            .ray_intersection(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 100.0)
            .unwrap();
        assert_relative_eq!(toi, 4.0);
    }

    #[test]
    fn test_ray_respects_max_toi() {
        assert!(unit_box()
            .ray_intersection(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 3.0)
            .is_none());
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        assert!(unit_box()
            .ray_intersection(Vec3::new(-5.0, 0.0, 0.0), -Vec3::X, 100.0)
            .is_none());
    }

    #[test]
    fn test_parallel_ray_outside_slab_misses() {
        assert!(unit_box()
            .ray_intersection(Vec3::new(-5.0, 2.0, 0.0), Vec3::X, 100.0)
            .is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_at_zero() {
        let toi = unit_box()
            .ray_intersection(Vec3::ZERO, Vec3::Y, 10.0)
            .unwrap();
        assert_relative_eq!(toi, 0.0);
    }
}
