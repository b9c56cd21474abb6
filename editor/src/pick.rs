//! Pick results
//!
//! Tools add hits to a [`PickResult`] during picking; drag handlers later
//! query it by hit type. Each tool registers its own hit types with
//! [`HitType::free_type`].

use glam::Vec3;
use std::ops::BitOr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Bit mask identifying the kind of object a hit refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitType(u64);

static NEXT_HIT_TYPE_BIT: AtomicU32 = AtomicU32::new(0);

impl HitType {
    pub const NONE: HitType = HitType(0);
    pub const ANY: HitType = HitType(u64::MAX);

    /// A hit type whose bit no other call has returned
    ///
    /// Allocation panics once all 64 bits are in use.
    pub fn free_type() -> HitType {
        let bit = NEXT_HIT_TYPE_BIT.fetch_add(1, Ordering::Relaxed);
        assert!(bit < u64::BITS, "out of hit types");
        HitType(1 << bit)
    }

    /// Whether this type shares a bit with `mask`
    pub fn matches(self, mask: HitType) -> bool {
        self.0 & mask.0 != 0
    }
}

impl BitOr for HitType {
    type Output = HitType;

    fn bitor(self, rhs: HitType) -> HitType {
        HitType(self.0 | rhs.0)
    }
}

/// Object a hit refers to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    None,
    /// Index of a handle, e.g. a texture boundary line
    Index(i32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub hit_type: HitType,
    /// Distance along the pick ray
    pub distance: f32,
    pub point: Vec3,
    pub target: HitTarget,
    /// How far the ray missed the exact handle, in world units
    pub error: f32,
}

impl Hit {
    pub fn new(hit_type: HitType, distance: f32, point: Vec3, target: HitTarget, error: f32) -> Self {
        Self {
            hit_type,
            distance,
            point,
            target,
            error,
        }
    }

    pub fn index(&self) -> Option<i32> {
        match self.target {
            HitTarget::Index(index) => Some(index),
            HitTarget::None => None,
        }
    }
}

/// Hits ordered by distance, then by error
#[derive(Debug, Clone, Default)]
pub struct PickResult {
    hits: Vec<Hit>,
}

impl PickResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hit(&mut self, hit: Hit) {
        let position = self.hits.partition_point(|h| {
            (h.distance, h.error) <= (hit.distance, hit.error)
        });
        self.hits.insert(position, hit);
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn all(&self) -> &[Hit] {
        &self.hits
    }

    /// Closest hit matching `mask`
    pub fn first(&self, mask: HitType) -> Option<&Hit> {
        self.hits.iter().find(|hit| hit.hit_type.matches(mask))
    }

    pub fn all_of(&self, mask: HitType) -> impl Iterator<Item = &Hit> {
        self.hits.iter().filter(move |hit| hit.hit_type.matches(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_types_are_distinct_bits() {
        let a = HitType::free_type();
        let b = HitType::free_type();
        assert_ne!(a, b);
        assert!(!a.matches(b));
        assert!(a.matches(a | b));
        assert!(a.matches(HitType::ANY));
        assert!(!a.matches(HitType::NONE));
    }

    #[test]
    fn test_hits_sorted_by_distance_and_error() {
        let a = HitType::free_type();
        let b = HitType::free_type();
        let mut result = PickResult::new();
        result.add_hit(Hit::new(a, 10.0, Vec3::ZERO, HitTarget::None, 0.0));
        result.add_hit(Hit::new(b, 5.0, Vec3::ZERO, HitTarget::Index(1), 2.0));
        result.add_hit(Hit::new(a, 5.0, Vec3::ZERO, HitTarget::Index(2), 1.0));

        let distances: Vec<f32> = result.all().iter().map(|h| h.distance).collect();
        assert_eq!(distances, vec![5.0, 5.0, 10.0]);
        assert_eq!(result.first(HitType::ANY).and_then(Hit::index), Some(2));
        assert_eq!(result.first(b).and_then(Hit::index), Some(1));
        assert_eq!(result.all_of(a).count(), 2);
    }
}
