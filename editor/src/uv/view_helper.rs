use crate::document::{Face, FaceId, MapDocument};
use crate::error::{EditorError, Result};
use glam::{Vec2, Vec3};
use renderer::core::{Camera, Ray3};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Distance of the UV camera from the face it shows
const CAMERA_DISTANCE: f32 = 256.0;

/// Coordinate conversions for the face shown in the UV view
///
/// Three coordinate systems are involved:
/// * world coordinates;
/// * face coordinates: texture coordinates without scale and offset,
///   i.e. world units along the rotated texture axes;
/// * texture coordinates: texels, including scale and offset.
///
/// The rotation origin is a world point on the face plane. Rotating and
/// scaling keep it at the same texture coordinates.
pub struct UvViewHelper {
    document: Weak<RefCell<MapDocument>>,
    camera: Rc<RefCell<Camera>>,
    face: Option<FaceId>,
    texture_size: Option<Vec2>,
    origin: Vec3,
}

impl UvViewHelper {
    /// `camera` should use an orthographic projection
    pub fn new(document: Weak<RefCell<MapDocument>>, camera: Rc<RefCell<Camera>>) -> Self {
        Self {
            document,
            camera,
            face: None,
            texture_size: None,
            origin: Vec3::ZERO,
        }
    }

    /// Whether there is a textured face to edit
    pub fn valid(&self) -> bool {
        self.texture_size.is_some() && self.face().is_some()
    }

    pub fn document(&self) -> Result<Rc<RefCell<MapDocument>>> {
        self.document.upgrade().ok_or(EditorError::DocumentUnavailable)
    }

    pub fn camera(&self) -> &Rc<RefCell<Camera>> {
        &self.camera
    }

    pub fn camera_zoom(&self) -> f32 {
        self.camera.borrow().zoom()
    }

    pub fn face_id(&self) -> Option<FaceId> {
        self.face
    }

    /// Current state of the shown face
    pub fn face(&self) -> Option<Face> {
        let id = self.face?;
        let document = self.document.upgrade()?;
        let face = document.borrow().face(id).cloned();
        face
    }

    /// Show `face`, moving the origin to its center and the camera in front of it
    pub fn set_face(&mut self, face: Option<FaceId>) {
        self.face = face;
        if let Some(face) = self.face() {
            self.origin = face.center();
            self.reset_camera(&face);
            debug!(face = ?self.face, "UV view shows face");
        }
    }

    pub fn texture_size(&self) -> Option<Vec2> {
        self.texture_size
    }

    pub fn set_texture_size(&mut self, size: Option<Vec2>) {
        self.texture_size = size.filter(|s| s.x > 0.0 && s.y > 0.0);
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Move the origin to the plane point closest to `point`
    pub fn set_origin(&mut self, point: Vec3) {
        self.origin = match self.face() {
            Some(face) => point - face.normal() * (point.dot(face.normal()) - face.distance()),
            None => point,
        };
    }

    pub fn origin_in_face_coords(&self, face: &Face) -> Vec2 {
        face.unscaled_tex_coords(self.origin)
    }

    pub fn origin_in_tex_coords(&self, face: &Face) -> Vec2 {
        face.tex_coords(self.origin)
    }

    pub fn face_to_tex(&self, face: &Face, point: Vec2) -> Vec2 {
        let attributes = face.attributes();
        point / safe(attributes.scale) + attributes.offset
    }

    pub fn tex_to_face(&self, face: &Face, point: Vec2) -> Vec2 {
        let attributes = face.attributes();
        (point - attributes.offset) * safe(attributes.scale)
    }

    /// World point of face coordinates `point`
    pub fn face_to_world(&self, face: &Face, point: Vec2) -> Vec3 {
        face.point_from_unscaled_tex_coords(point)
    }

    /// Where `ray` meets the face plane, in world coordinates
    pub fn pick_point(&self, face: &Face, ray: &Ray3) -> Option<Vec3> {
        face.intersect(ray).map(|distance| ray.point_at(distance))
    }

    fn reset_camera(&self, face: &Face) {
        let (_, y_axis) = face.texture_axes();
        let mut camera = self.camera.borrow_mut();
        camera.move_to(face.center() + face.normal() * CAMERA_DISTANCE);
        camera.set_direction(-face.normal(), -y_axis);
    }
}

fn safe(scale: Vec2) -> Vec2 {
    Vec2::new(
        if scale.x == 0.0 { 1.0 } else { scale.x },
        if scale.y == 0.0 { 1.0 } else { scale.y },
    )
}
