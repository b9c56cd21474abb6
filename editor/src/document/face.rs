use glam::{Quat, Vec2, Vec3};
use renderer::core::Ray3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub usize);

/// Texture placement on a face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    pub texture_name: String,
    /// Texture offset in texels
    pub offset: Vec2,
    /// World units per texel
    pub scale: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
}

impl Default for FaceAttributes {
    fn default() -> Self {
        Self {
            texture_name: String::new(),
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl FaceAttributes {
    pub fn new(texture_name: impl Into<String>) -> Self {
        Self {
            texture_name: texture_name.into(),
            ..Self::default()
        }
    }
}

/// One change of a [`ChangeFaceAttributesRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeChange {
    SetTexture(String),
    SetOffset(Vec2),
    AddOffset(Vec2),
    SetScale(Vec2),
    MulScale(Vec2),
    SetRotation(f32),
    AddRotation(f32),
}

impl AttributeChange {
    fn apply(&self, attributes: &mut FaceAttributes) {
        match self {
            Self::SetTexture(name) => attributes.texture_name.clone_from(name),
            Self::SetOffset(offset) => attributes.offset = *offset,
            Self::AddOffset(delta) => attributes.offset += *delta,
            Self::SetScale(scale) => attributes.scale = *scale,
            Self::MulScale(factor) => attributes.scale *= *factor,
            Self::SetRotation(angle) => attributes.rotation = *angle,
            Self::AddRotation(delta) => {
                attributes.rotation = (attributes.rotation + delta).rem_euclid(360.0)
            }
        }
    }
}

/// Ordered list of attribute changes applied to every selected face
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeFaceAttributesRequest {
    changes: Vec<AttributeChange>,
}

impl ChangeFaceAttributesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_texture(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(AttributeChange::SetTexture(name.into()))
    }

    pub fn set_offset(&mut self, offset: Vec2) -> &mut Self {
        self.push(AttributeChange::SetOffset(offset))
    }

    pub fn add_offset(&mut self, delta: Vec2) -> &mut Self {
        self.push(AttributeChange::AddOffset(delta))
    }

    pub fn set_scale(&mut self, scale: Vec2) -> &mut Self {
        self.push(AttributeChange::SetScale(scale))
    }

    pub fn mul_scale(&mut self, factor: Vec2) -> &mut Self {
        self.push(AttributeChange::MulScale(factor))
    }

    pub fn set_rotation(&mut self, angle: f32) -> &mut Self {
        self.push(AttributeChange::SetRotation(angle))
    }

    pub fn add_rotation(&mut self, delta: f32) -> &mut Self {
        self.push(AttributeChange::AddRotation(delta))
    }

    fn push(&mut self, change: AttributeChange) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn changes(&self) -> &[AttributeChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn evaluate(&self, attributes: &mut FaceAttributes) {
        for change in &self.changes {
            change.apply(attributes);
        }
    }

    /// Append the changes of `other`; applying the result equals applying both
    pub fn collate_with(&mut self, other: &ChangeFaceAttributesRequest) -> bool {
        self.changes.extend(other.changes.iter().cloned());
        true
    }
}

/// A planar convex polygon with texture attributes
///
/// Texture coordinates are computed by projecting onto the axis plane
/// closest to the face and rotating the projection axes by the face
/// rotation. Coordinates are in texels; "unscaled" coordinates skip the
/// scale and offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    vertices: Vec<Vec3>,
    normal: Vec3,
    distance: f32,
    attributes: FaceAttributes,
}

impl Face {
    /// A face through `vertices`, wound counter-clockwise around its normal
    pub fn new(vertices: Vec<Vec3>, attributes: FaceAttributes) -> Self {
        // Newell's method
        let mut normal = Vec3::ZERO;
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        let normal = normal.try_normalize().unwrap_or(Vec3::Z);
        let distance = vertices.first().map_or(0.0, |v| v.dot(normal));
        Self {
            vertices,
            normal,
            distance,
            attributes,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Plane distance from the origin along the normal
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn attributes(&self) -> &FaceAttributes {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: FaceAttributes) {
        self.attributes = attributes;
    }

    pub fn center(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }

    /// Distance along `ray` to the face plane
    pub fn intersect(&self, ray: &Ray3) -> Option<f32> {
        ray.intersect_plane(self.normal, self.distance)
    }

    /// Unrotated texture axes and the projection axis
    fn base_axes(&self) -> (Vec3, Vec3, Vec3) {
        let n = self.normal.abs();
        if n.z >= n.x && n.z >= n.y {
            (Vec3::X, Vec3::NEG_Y, Vec3::Z)
        } else if n.x >= n.y {
            (Vec3::Y, Vec3::NEG_Z, Vec3::X)
        } else {
            (Vec3::X, Vec3::NEG_Z, Vec3::Y)
        }
    }

    /// Texture axes rotated by `rotation` degrees
    pub fn texture_axes_for(&self, rotation: f32) -> (Vec3, Vec3) {
        let (x, y, axis) = self.base_axes();
        let rotate = Quat::from_axis_angle(axis, -rotation.to_radians());
        (rotate * x, rotate * y)
    }

    pub fn texture_axes(&self) -> (Vec3, Vec3) {
        self.texture_axes_for(self.attributes.rotation)
    }

    /// Texture coordinates of `point` under the given placement
    pub fn to_tex_coords(&self, point: Vec3, offset: Vec2, scale: Vec2, rotation: f32) -> Vec2 {
        let (x, y) = self.texture_axes_for(rotation);
        let scale = safe_scale(scale);
        Vec2::new(point.dot(x) / scale.x, point.dot(y) / scale.y) + offset
    }

    /// Point on the face plane with texture coordinates `tex`
    pub fn from_tex_coords(&self, tex: Vec2, offset: Vec2, scale: Vec2, rotation: f32) -> Vec3 {
        let (x, y) = self.texture_axes_for(rotation);
        let (_, _, axis) = self.base_axes();
        let unscaled = (tex - offset) * safe_scale(scale);
        let in_axis_plane = x * unscaled.x + y * unscaled.y;
        let lift = (self.distance - self.normal.dot(in_axis_plane)) / self.normal.dot(axis);
        in_axis_plane + axis * lift
    }

    /// Texture coordinates of `point` under the face's own attributes
    pub fn tex_coords(&self, point: Vec3) -> Vec2 {
        let a = &self.attributes;
        self.to_tex_coords(point, a.offset, a.scale, a.rotation)
    }

    /// Rotated texture coordinates of `point` without scale or offset
    pub fn unscaled_tex_coords(&self, point: Vec3) -> Vec2 {
        self.to_tex_coords(point, Vec2::ZERO, Vec2::ONE, self.attributes.rotation)
    }

    pub fn point_from_unscaled_tex_coords(&self, tex: Vec2) -> Vec3 {
        self.from_tex_coords(tex, Vec2::ZERO, Vec2::ONE, self.attributes.rotation)
    }
}

fn safe_scale(scale: Vec2) -> Vec2 {
    Vec2::new(
        if scale.x == 0.0 { 1.0 } else { scale.x },
        if scale.y == 0.0 { 1.0 } else { scale.y },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> Face {
        Face::new(
            vec![
                Vec3::new(0.0, 0.0, 16.0),
                Vec3::new(64.0, 0.0, 16.0),
                Vec3::new(64.0, 64.0, 16.0),
                Vec3::new(0.0, 64.0, 16.0),
            ],
            FaceAttributes::new("base/floor"),
        )
    }

    #[test]
    fn test_plane_from_vertices() {
        let face = floor();
        assert_eq!(face.normal(), Vec3::Z);
        assert_eq!(face.distance(), 16.0);
        assert_eq!(face.center(), Vec3::new(32.0, 32.0, 16.0));
    }

    #[test]
    fn test_tex_coords_apply_scale_and_offset() {
        let mut face = floor();
        let mut attributes = face.attributes().clone();
        attributes.scale = Vec2::new(2.0, 0.5);
        attributes.offset = Vec2::new(8.0, 1.0);
        face.set_attributes(attributes);

        let tex = face.tex_coords(Vec3::new(32.0, 16.0, 16.0));
        assert_eq!(tex, Vec2::new(24.0, -31.0));
    }

    #[test]
    fn test_tex_coords_invert_back_to_plane() {
        let face = Face::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 64.0, 16.0),
                Vec3::new(0.0, 64.0, 80.0),
                Vec3::new(0.0, 0.0, 64.0),
            ],
            FaceAttributes::default(),
        );
        let point = Vec3::new(0.0, 20.0, 30.0);
        let offset = Vec2::new(3.0, -7.0);
        let scale = Vec2::new(0.5, 2.0);
        let tex = face.to_tex_coords(point, offset, scale, 30.0);
        let back = face.from_tex_coords(tex, offset, scale, 30.0);
        assert!((back - point).length() < 1e-3, "{back:?}");
    }

    #[test]
    fn test_request_applies_changes_in_order() {
        let mut request = ChangeFaceAttributesRequest::new();
        request
            .set_offset(Vec2::new(1.0, 2.0))
            .add_offset(Vec2::ONE)
            .add_rotation(350.0)
            .add_rotation(20.0)
            .mul_scale(Vec2::splat(2.0));

        let mut attributes = FaceAttributes::default();
        request.evaluate(&mut attributes);
        assert_eq!(attributes.offset, Vec2::new(2.0, 3.0));
        assert!((attributes.rotation - 10.0).abs() < 1e-4);
        assert_eq!(attributes.scale, Vec2::splat(2.0));
    }

    #[test]
    fn test_collated_request_appends() {
        let mut a = ChangeFaceAttributesRequest::new();
        a.set_rotation(10.0);
        let mut b = ChangeFaceAttributesRequest::new();
        b.set_rotation(20.0);
        assert!(a.collate_with(&b));
        assert_eq!(a.changes().len(), 2);

        let mut attributes = FaceAttributes::default();
        a.evaluate(&mut attributes);
        assert_eq!(attributes.rotation, 20.0);
    }
}
