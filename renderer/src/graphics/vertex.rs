//! Vertex layouts
//!
//! Each vertex type is a `#[repr(C)]` plain-old-data struct whose memory
//! layout is described by a list of [`VertexAttribute`]s. Attributes are
//! bound to shader inputs by name.

use crate::gl::{ComponentType, GlComponent};
use crate::shaders::ShaderProgram;
use crate::error::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
    TexCoord0,
    User(&'static str),
}

impl AttributeKind {
    /// Name of the shader input this attribute feeds
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Position => "a_position",
            Self::Normal => "a_normal",
            Self::Color => "a_color",
            Self::TexCoord0 => "a_tex_coord",
            Self::User(name) => name,
        }
    }
}

/// One attribute of a vertex layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub kind: AttributeKind,
    pub components: i32,
    pub component_type: ComponentType,
    pub normalized: bool,
}

impl VertexAttribute {
    pub const fn position(components: i32) -> Self {
        Self::float(AttributeKind::Position, components)
    }

    /// Normals always have three components
    pub const fn normal() -> Self {
        Self::float(AttributeKind::Normal, 3)
    }

    pub const fn color(components: i32) -> Self {
        Self::float(AttributeKind::Color, components)
    }

    pub const fn tex_coord0(components: i32) -> Self {
        Self::float(AttributeKind::TexCoord0, components)
    }

    pub fn user<T: GlComponent>(name: &'static str, components: i32, normalized: bool) -> Self {
        Self {
            kind: AttributeKind::User(name),
            components,
            component_type: T::COMPONENT_TYPE,
            normalized,
        }
    }

    const fn float(kind: AttributeKind, components: i32) -> Self {
        Self {
            kind,
            components,
            component_type: ComponentType::Float,
            normalized: false,
        }
    }

    pub fn size(&self) -> usize {
        self.components as usize * self.component_type.size()
    }

    /// Point this attribute at `offset` within interleaved vertices of `stride` bytes
    pub fn setup(&self, program: &ShaderProgram, stride: usize, offset: usize) -> Result<u32> {
        let location = program.enable_attribute(self.kind.shader_name())?;
        program.gl().vertex_attrib_pointer(
            location,
            self.components,
            self.component_type,
            self.normalized,
            stride as i32,
            offset,
        );
        Ok(location)
    }

    pub fn cleanup(&self, program: &ShaderProgram) -> Result<()> {
        program.disable_attribute(self.kind.shader_name())
    }
}

/// A vertex type with a known attribute layout
pub trait GlVertex: Pod {
    fn attributes() -> &'static [VertexAttribute];
}

/// Position only, in the plane
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexP2 {
    pub position: [f32; 2],
}

impl VertexP2 {
    pub fn new(position: Vec2) -> Self {
        Self {
            position: position.to_array(),
        }
    }
}

impl GlVertex for VertexP2 {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 1] = [VertexAttribute::position(2)];
        &ATTRIBUTES
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexP3 {
    pub position: [f32; 3],
}

impl VertexP3 {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
        }
    }
}

impl GlVertex for VertexP3 {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 1] = [VertexAttribute::position(3)];
        &ATTRIBUTES
    }
}

/// Position and normal, used for lit geometry
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexP3N {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexP3N {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

impl GlVertex for VertexP3N {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 2] =
            [VertexAttribute::position(3), VertexAttribute::normal()];
        &ATTRIBUTES
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexP3C4 {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl VertexP3C4 {
    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }
}

impl GlVertex for VertexP3C4 {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 2] =
            [VertexAttribute::position(3), VertexAttribute::color(4)];
        &ATTRIBUTES
    }
}

/// Position, texture coordinate and colour, used for text
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexP3T2C4 {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
}

impl VertexP3T2C4 {
    pub fn new(position: Vec3, tex_coord: Vec2, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            tex_coord: tex_coord.to_array(),
            color,
        }
    }
}

impl GlVertex for VertexP3T2C4 {
    fn attributes() -> &'static [VertexAttribute] {
        const ATTRIBUTES: [VertexAttribute; 3] = [
            VertexAttribute::position(3),
            VertexAttribute::tex_coord0(2),
            VertexAttribute::color(4),
        ];
        &ATTRIBUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stride<V: GlVertex>() -> usize {
        V::attributes().iter().map(VertexAttribute::size).sum()
    }

    #[test]
    fn test_layouts_match_struct_sizes() {
        assert_eq!(stride::<VertexP2>(), std::mem::size_of::<VertexP2>());
        assert_eq!(stride::<VertexP3>(), std::mem::size_of::<VertexP3>());
        assert_eq!(stride::<VertexP3N>(), std::mem::size_of::<VertexP3N>());
        assert_eq!(stride::<VertexP3C4>(), std::mem::size_of::<VertexP3C4>());
        assert_eq!(stride::<VertexP3T2C4>(), std::mem::size_of::<VertexP3T2C4>());
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(VertexAttribute::normal().components, 3);
        assert_eq!(AttributeKind::TexCoord0.shader_name(), "a_tex_coord");
        let user = VertexAttribute::user::<u8>("a_flags", 4, true);
        assert_eq!(user.kind.shader_name(), "a_flags");
        assert_eq!(user.size(), 4);
    }
}
