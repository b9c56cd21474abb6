//! Geometry helpers for gizmos and overlays

use crate::gl::OpenGl;
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Points on an arc of a circle around the origin
///
/// A full circle yields `segments` points meant to be drawn as a line
/// loop; a partial arc yields `segments + 1` points including both ends.
pub fn circle_2d(radius: f32, start_angle: f32, angle_length: f32, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(1);
    let full = angle_length.abs() >= TAU - f32::EPSILON;
    let count = if full { segments } else { segments + 1 };
    let step = angle_length / segments as f32;
    (0..count)
        .map(|i| {
            let angle = start_angle + step * i as f32;
            Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// A closed disc in the XY plane as a triangle fan, center first
pub fn circle_3d(radius: f32, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    let mut vertices = Vec::with_capacity(segments + 2);
    vertices.push(Vec3::ZERO);
    for i in 0..=segments {
        let angle = TAU * i as f32 / segments as f32;
        vertices.push(Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0));
    }
    vertices
}

/// Side of a cylinder along +Z as a triangle strip, with outward normals
pub fn cylinder_3d(radius: f32, length: f32, segments: usize) -> (Vec<Vec3>, Vec<Vec3>) {
    let segments = segments.max(1);
    let mut positions = Vec::with_capacity(2 * (segments + 1));
    let mut normals = Vec::with_capacity(2 * (segments + 1));
    for i in 0..=segments {
        let angle = TAU * i as f32 / segments as f32;
        let normal = Vec3::new(angle.cos(), angle.sin(), 0.0);
        positions.push(normal * radius);
        positions.push(normal * radius + Vec3::Z * length);
        normals.push(normal);
        normals.push(normal);
    }
    (positions, normals)
}

/// Side of a cone along +Z, apex at `length`, as triangles with face normals
pub fn cone_3d(radius: f32, length: f32, segments: usize) -> (Vec<Vec3>, Vec<Vec3>) {
    let segments = segments.max(1);
    let apex = Vec3::Z * length;
    let mut positions = Vec::with_capacity(3 * segments);
    let mut normals = Vec::with_capacity(3 * segments);
    for i in 0..segments {
        let a0 = TAU * i as f32 / segments as f32;
        let a1 = TAU * (i + 1) as f32 / segments as f32;
        let p0 = Vec3::new(a0.cos(), a0.sin(), 0.0) * radius;
        let p1 = Vec3::new(a1.cos(), a1.sin(), 0.0) * radius;
        let normal = (p1 - p0).cross(apex - p0).normalize_or_zero();
        positions.extend([apex, p0, p1]);
        normals.extend([normal; 3]);
    }
    (positions, normals)
}

pub const fn rounded_rect_2d_vertex_count(corner_segments: usize) -> usize {
    18 + 12 * corner_segments
}

/// A rectangle with rounded corners, centered on the origin, as triangles
pub fn rounded_rect_2d(size: Vec2, corner_radius: f32, corner_segments: usize) -> Vec<Vec2> {
    let half = size / 2.0;
    let r = corner_radius.min(half.x).min(half.y).max(0.0);
    let mut vertices = Vec::with_capacity(rounded_rect_2d_vertex_count(corner_segments));

    let mut quad = |min: Vec2, max: Vec2| {
        vertices.extend([
            min,
            Vec2::new(max.x, min.y),
            max,
            min,
            max,
            Vec2::new(min.x, max.y),
        ]);
    };
    // Center column, then the left and right strips between the corners
    quad(Vec2::new(-half.x + r, -half.y), Vec2::new(half.x - r, half.y));
    quad(Vec2::new(-half.x, -half.y + r), Vec2::new(-half.x + r, half.y - r));
    quad(Vec2::new(half.x - r, -half.y + r), Vec2::new(half.x, half.y - r));

    let corners = [
        (Vec2::new(half.x - r, half.y - r), 0.0),
        (Vec2::new(-half.x + r, half.y - r), TAU / 4.0),
        (Vec2::new(-half.x + r, -half.y + r), TAU / 2.0),
        (Vec2::new(half.x - r, -half.y + r), 3.0 * TAU / 4.0),
    ];
    for (center, start) in corners {
        let arc = circle_2d(r, start, TAU / 4.0, corner_segments);
        for pair in arc.windows(2) {
            vertices.extend([center, center + pair[0], center + pair[1]]);
        }
    }
    vertices
}

/// Nudge subsequent depth values towards the viewer so edges win over faces
pub fn set_edge_offset(gl: &dyn OpenGl, offset: f32) {
    gl.depth_range(0.0, 1.0 - offset);
}

pub fn reset_edge_offset(gl: &dyn OpenGl) {
    gl.depth_range(0.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GlCall, RecordingGl};

    #[test]
    fn test_circle_2d_counts() {
        assert_eq!(circle_2d(1.0, 0.0, TAU, 16).len(), 16);
        assert_eq!(circle_2d(1.0, 0.0, TAU / 4.0, 4).len(), 5);
        let arc = circle_2d(2.0, 0.0, TAU / 4.0, 4);
        assert!((arc[4] - Vec2::new(0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_circle_3d_is_closed_fan() {
        let fan = circle_3d(1.0, 8);
        assert_eq!(fan.len(), 10);
        assert_eq!(fan[0], Vec3::ZERO);
        assert!((fan[1] - fan[9]).length() < 1e-5);
    }

    #[test]
    fn test_cylinder_and_cone_counts() {
        let (positions, normals) = cylinder_3d(1.0, 10.0, 8);
        assert_eq!(positions.len(), 18);
        assert_eq!(normals.len(), 18);
        assert_eq!(positions[1].z, 10.0);

        let (positions, normals) = cone_3d(2.0, 5.0, 8);
        assert_eq!(positions.len(), 24);
        assert!(normals.iter().all(|n| n.z > 0.0));
    }

    #[test]
    fn test_rounded_rect_vertex_count() {
        for segments in [1, 3, 6] {
            let rect = rounded_rect_2d(Vec2::new(40.0, 20.0), 3.0, segments);
            assert_eq!(rect.len(), rounded_rect_2d_vertex_count(segments));
            assert!(rect.iter().all(|v| v.x.abs() <= 20.0 + 1e-4 && v.y.abs() <= 10.0 + 1e-4));
        }
    }

    #[test]
    fn test_edge_offset() {
        let gl = RecordingGl::new();
        set_edge_offset(&gl, 0.25);
        reset_edge_offset(&gl);
        assert_eq!(
            gl.calls(),
            vec![GlCall::DepthRange(0.0, 0.75), GlCall::DepthRange(0.0, 1.0)]
        );
    }
}
