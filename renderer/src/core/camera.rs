//! Camera and viewport
//!
//! Provides perspective and orthographic cameras for the map views. The
//! world is Z-up; a camera is described by its position, a view direction
//! and an up vector which is kept orthogonal to the direction.

use super::bounds::Ray3;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Screen rectangle in window pixels, origin at the bottom left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the given rectangle overlaps this viewport
    pub fn contains(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let (vx, vy) = (self.x as f32, self.y as f32);
        let (vw, vh) = (self.width as f32, self.height as f32);
        x + width >= vx && x <= vx + vw && y + height >= vy && y <= vy + vh
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0, 1024, 768)
    }
}

/// Projection mode for the camera
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ProjectionMode {
    /// Perspective projection with the given vertical field of view
    Perspective { fov_y_degrees: f32 },
    /// Parallel projection; one world unit covers one pixel at zoom 1
    Orthographic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    right: Vec3,
    viewport: Viewport,
    projection_mode: ProjectionMode,
    z_near: f32,
    z_far: f32,
    zoom: f32,
}

impl Camera {
    pub const MIN_ZOOM: f32 = 0.02;
    pub const MAX_ZOOM: f32 = 100.0;

    /// Create a perspective camera looking along +Y
    pub fn perspective(fov_y_degrees: f32, z_near: f32, z_far: f32, viewport: Viewport) -> Self {
        Self::new(
            ProjectionMode::Perspective { fov_y_degrees },
            z_near,
            z_far,
            viewport,
        )
    }

    /// Create an orthographic camera looking along +Y
    pub fn orthographic(z_near: f32, z_far: f32, viewport: Viewport) -> Self {
        Self::new(ProjectionMode::Orthographic, z_near, z_far, viewport)
    }

    fn new(projection_mode: ProjectionMode, z_near: f32, z_far: f32, viewport: Viewport) -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Y,
            up: Vec3::Z,
            right: Vec3::X,
            viewport,
            projection_mode,
            z_near,
            z_far,
            zoom: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Index of the world axis closest to the view direction
    pub fn view_axis(&self) -> usize {
        let a = self.direction.abs();
        if a.x >= a.y && a.x >= a.z {
            0
        } else if a.y >= a.z {
            1
        } else {
            2
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
        trace!(position = ?self.position, "Camera moved");
    }

    /// Point the camera along `direction`, keeping `up` as close as possible
    pub fn set_direction(&mut self, direction: Vec3, up: Vec3) {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return;
        }
        let mut right = direction.cross(up).normalize_or_zero();
        if right == Vec3::ZERO {
            right = direction.cross(Vec3::Y).normalize_or_zero();
        }
        if right == Vec3::ZERO {
            right = Vec3::X;
        }
        self.direction = direction;
        self.right = right;
        self.up = right.cross(direction).normalize();
    }

    pub fn look_at(&mut self, point: Vec3, up: Vec3) {
        self.set_direction(point - self.position, up);
    }

    /// Rotate by yaw around world Z and pitch around the camera's right axis
    ///
    /// Pitch is ignored if it would turn the camera straight up or down.
    pub fn rotate(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        let yaw = Quat::from_rotation_z(yaw_degrees.to_radians());
        let pitch = Quat::from_axis_angle(self.right, pitch_degrees.to_radians());

        let mut direction = yaw * self.direction;
        let pitched = yaw * (pitch * self.direction);
        if pitched.dot(Vec3::Z).abs() < 0.999 {
            direction = pitched;
        }
        self.set_direction(direction, Vec3::Z);
    }

    /// Orbit around `center` by horizontal and vertical angles in degrees
    pub fn orbit(&mut self, center: Vec3, h_degrees: f32, v_degrees: f32) {
        let h = Quat::from_rotation_z(h_degrees.to_radians());
        let mut rotation = h;
        let v = Quat::from_axis_angle(self.right, v_degrees.to_radians());
        if ((h * v) * self.direction).dot(Vec3::Z).abs() < 0.999 {
            rotation = h * v;
        }

        let offset = rotation * (self.position - center);
        self.position = center + offset;
        self.set_direction(rotation * self.direction, Vec3::Z);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective { fov_y_degrees } => Mat4::perspective_rh_gl(
                (fov_y_degrees / self.zoom).clamp(1.0, 170.0).to_radians(),
                self.viewport.aspect_ratio(),
                self.z_near,
                self.z_far,
            ),
            ProjectionMode::Orthographic => {
                let half_width = self.viewport.width as f32 / 2.0 / self.zoom;
                let half_height = self.viewport.height as f32 / 2.0 / self.zoom;
                Mat4::orthographic_rh_gl(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.z_near,
                    self.z_far,
                )
            }
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction, self.up)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Signed distance of `point` from the camera plane
    pub fn perpendicular_distance_to(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.direction)
    }

    /// Project a world point to window coordinates; z is the depth in `[0, 1]`
    pub fn project(&self, point: Vec3) -> Vec3 {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        let ndc = if clip.w.abs() > f32::EPSILON {
            clip.xyz() / clip.w
        } else {
            clip.xyz()
        };
        let vp = &self.viewport;
        Vec3::new(
            vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
            vp.y as f32 + (ndc.y + 1.0) * 0.5 * vp.height as f32,
            (ndc.z + 1.0) * 0.5,
        )
    }

    /// Ray through the given window position
    pub fn pick_ray(&self, window: Vec2) -> Ray3 {
        let vp = &self.viewport;
        let ndc_x = (window.x - vp.x as f32) / vp.width.max(1) as f32 * 2.0 - 1.0;
        let ndc_y = (window.y - vp.y as f32) / vp.height.max(1) as f32 * 2.0 - 1.0;

        let inverse = self.view_projection_matrix().inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray3::new(near, far - near)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(90.0, 1.0, 8192.0, Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_orientation() {
        let camera = Camera::default();
        assert_vec_eq(camera.direction(), Vec3::Y);
        assert_vec_eq(camera.up(), Vec3::Z);
        assert_vec_eq(camera.right(), Vec3::X);
    }

    #[test]
    fn test_view_axis() {
        let mut camera = Camera::default();
        assert_eq!(camera.view_axis(), 1);
        camera.set_direction(Vec3::new(0.1, 0.2, -0.9).normalize(), Vec3::Y);
        assert_eq!(camera.view_axis(), 2);
        camera.set_direction(Vec3::new(-0.8, 0.3, 0.1).normalize(), Vec3::Z);
        assert_eq!(camera.view_axis(), 0);
    }

    #[test]
    fn test_viewport_contains_overlap() {
        let vp = Viewport::new(0, 0, 100, 100);
        assert!(vp.contains(10.0, 10.0, 5.0, 5.0));
        assert!(vp.contains(-4.0, -4.0, 5.0, 5.0));
        assert!(!vp.contains(-10.0, 10.0, 5.0, 5.0));
        assert!(!vp.contains(101.0, 10.0, 5.0, 5.0));
    }

    #[test]
    fn test_perpendicular_distance() {
        let mut camera = Camera::default();
        camera.move_to(Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(camera.perpendicular_distance_to(Vec3::new(5.0, 0.0, 3.0)), 10.0);
        assert!(camera.perpendicular_distance_to(Vec3::new(0.0, -20.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_project_center() {
        let camera = Camera::default();
        let screen = camera.project(Vec3::new(0.0, 100.0, 0.0));
        assert!((screen.x - 512.0).abs() < 1e-3);
        assert!((screen.y - 384.0).abs() < 1e-3);
        assert!(screen.z > 0.0 && screen.z < 1.0);
    }

    #[test]
    fn test_pick_ray_through_center() {
        let mut camera = Camera::default();
        camera.move_to(Vec3::new(0.0, -50.0, 0.0));
        let ray = camera.pick_ray(Vec2::new(512.0, 384.0));
        assert_vec_eq(ray.direction, Vec3::Y);
    }

    #[test]
    fn test_rotate_yaw() {
        let mut camera = Camera::default();
        camera.rotate(90.0, 0.0);
        assert_vec_eq(camera.direction(), Vec3::NEG_X);
        assert_vec_eq(camera.up(), Vec3::Z);
    }

    #[test]
    fn test_rotate_pitch_is_clamped_at_pole() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 90.0);
        assert!(camera.direction().dot(Vec3::Z).abs() < 0.999);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        camera.move_to(Vec3::new(0.0, -100.0, 0.0));
        camera.orbit(Vec3::ZERO, 90.0, 0.0);
        assert!((camera.position().length() - 100.0).abs() < 1e-3);
        assert_vec_eq(camera.direction(), (-camera.position()).normalize());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::orthographic(-1000.0, 1000.0, Viewport::default());
        camera.set_zoom(1000.0);
        assert_eq!(camera.zoom(), Camera::MAX_ZOOM);
        camera.set_zoom(0.0);
        assert_eq!(camera.zoom(), Camera::MIN_ZOOM);
    }
}
