//! Axis-aligned boxes and rays

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
///
/// A box whose `min` exceeds its `max` on any axis is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3 {
    pub const EMPTY: BBox3 = BBox3 {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners, bottom face first in counter-clockwise order
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }
}

impl Default for BBox3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Half-line used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub origin: Vec3,
    /// Normalized direction
    pub direction: Vec3,
}

impl Ray3 {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the plane `dot(normal, p) = distance`
    pub fn intersect_plane(&self, normal: Vec3, distance: f32) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = (distance - self.origin.dot(normal)) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Intersection with the XY plane through the origin, as 2D coordinates
    pub fn intersect_xy_plane(&self) -> Option<Vec2> {
        self.intersect_plane(Vec3::Z, 0.0)
            .map(|t| self.point_at(t).truncate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box() {
        assert!(BBox3::EMPTY.is_empty());
        assert_eq!(BBox3::EMPTY.size(), Vec3::ZERO);
        let b = BBox3::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(!b.is_empty());
        assert_eq!(b.size(), Vec3::splat(2.0));
    }

    #[test]
    fn test_ray_plane_intersection() {
        let ray = Ray3::new(Vec3::new(2.0, 3.0, 10.0), Vec3::NEG_Z);
        assert_eq!(ray.intersect_xy_plane(), Some(Vec2::new(2.0, 3.0)));

        let away = Ray3::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert_eq!(away.intersect_xy_plane(), None);
    }
}
