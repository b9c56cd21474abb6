//! Orientation gizmo
//!
//! The compass is drawn in the bottom left corner of a view in its own
//! orthographic pass. It shows the world axes rotated by the inverse of the
//! camera rotation, so it turns with the view.

use crate::core::{Camera, Color};
use crate::error::Result;
use crate::gl::ClearMask;
use crate::graphics::{
    render_utils, IndexRangeMapBuilder, IndexRangeMapSize, IndexRangeRenderer, PrimType,
    VboManager, VertexArray, VertexP3, VertexP3N,
};
use crate::render::{RenderBatch, RenderState, Renderable};
use crate::shaders::{self, ActiveShader};
use glam::{Mat4, Vec3, Vec4};
use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;

pub const SEGMENTS: usize = 32;
pub const SHAFT_LENGTH: f32 = 28.0;
pub const SHAFT_RADIUS: f32 = 1.2;
pub const HEAD_LENGTH: f32 = 7.0;
pub const HEAD_RADIUS: f32 = 3.5;

/// Distance of the compass center from the bottom left corner, in pixels
const CORNER_OFFSET: f32 = 55.0;
const SCALE: f32 = 2.0;
const OUTLINE_WIDTH: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassKind {
    /// Three lit axes, for perspective views
    ThreeD,
    /// Outlined axes except the one pointing at the viewer, for map views
    TwoD,
}

pub struct Compass {
    kind: CompassKind,
    arrow: IndexRangeRenderer,
    background: VertexArray,
    background_outline: VertexArray,
}

impl Compass {
    pub fn new(kind: CompassKind) -> Self {
        let background = Self::background_vertices();
        Self {
            kind,
            arrow: Self::make_arrow().build(),
            background: VertexArray::new(&background),
            background_outline: VertexArray::new(&background),
        }
    }

    pub fn kind(&self) -> CompassKind {
        self.kind
    }

    /// Queue the compass for rendering in `batch`
    pub fn queue(compass: &Rc<RefCell<Self>>, batch: &mut RenderBatch) {
        batch.add(Rc::clone(compass) as Rc<RefCell<dyn Renderable>>);
    }

    pub(crate) fn make_arrow() -> IndexRangeMapBuilder<VertexP3N> {
        let shaft_offset = Vec3::new(0.0, 0.0, -(SHAFT_LENGTH + HEAD_LENGTH) / 2.0 + 2.0);
        let head_offset = Vec3::new(0.0, 0.0, SHAFT_LENGTH) + shaft_offset;

        let (shaft, shaft_normals) = render_utils::cylinder_3d(SHAFT_RADIUS, SHAFT_LENGTH, SEGMENTS);
        let (head, head_normals) = render_utils::cone_3d(HEAD_RADIUS, HEAD_LENGTH, SEGMENTS);
        let shaft_cap = render_utils::circle_3d(SHAFT_RADIUS, SEGMENTS);
        let head_cap = render_utils::circle_3d(HEAD_RADIUS, SEGMENTS);

        let with_normals = |positions: &[Vec3], normals: &[Vec3], offset: Vec3| -> Vec<VertexP3N> {
            positions
                .iter()
                .zip(normals)
                .map(|(p, n)| VertexP3N::new(*p + offset, *n))
                .collect()
        };
        let facing_down = |positions: &[Vec3], offset: Vec3| -> Vec<VertexP3N> {
            positions
                .iter()
                .map(|p| VertexP3N::new(*p + offset, Vec3::NEG_Z))
                .collect()
        };

        let mut size = IndexRangeMapSize::new();
        size.inc(PrimType::TriangleStrip, 1);
        size.inc(PrimType::TriangleFan, 2);
        size.inc(PrimType::Triangles, 1);

        let vertex_count = shaft.len() + head.len() + shaft_cap.len() + head_cap.len();
        let mut builder = IndexRangeMapBuilder::with_capacity(vertex_count, &size);
        builder.add_triangle_strip(&with_normals(&shaft, &shaft_normals, shaft_offset));
        builder.add_triangle_fan(&facing_down(&shaft_cap, shaft_offset));
        builder.add_triangle_fan(&facing_down(&head_cap, head_offset));
        builder.add_triangles(&with_normals(&head, &head_normals, head_offset));
        builder
    }

    pub(crate) fn background_vertices() -> Vec<VertexP3> {
        let radius = (SHAFT_LENGTH + HEAD_LENGTH) / 2.0 + 5.0;
        render_utils::circle_2d(radius, 0.0, TAU, SEGMENTS)
            .into_iter()
            .map(|p| VertexP3::new(p.extend(0.0)))
            .collect()
    }

    /// Inverse of the rotation taking the world axes to the camera frame
    fn camera_rotation(camera: &Camera) -> Mat4 {
        let rotation = Mat4::from_cols(
            camera.right().extend(0.0),
            camera.direction().extend(0.0),
            camera.up().extend(0.0),
            Vec4::W,
        );
        rotation.inverse()
    }

    /// Axis transforms and colours, Z first
    fn axes(&self, camera: &Camera, colors: &crate::config::ColorConfig) -> Vec<(Mat4, Color)> {
        let all = [
            (Mat4::IDENTITY, colors.z_axis, 2),
            (Mat4::from_rotation_y(FRAC_PI_2), colors.x_axis, 0),
            (Mat4::from_rotation_x(-FRAC_PI_2), colors.y_axis, 1),
        ];
        let view_axis = match self.kind {
            CompassKind::ThreeD => None,
            CompassKind::TwoD => Some(camera.view_axis()),
        };
        all.into_iter()
            .filter(|(_, _, axis)| Some(*axis) != view_axis)
            .map(|(transform, color, _)| (transform, color))
            .collect()
    }

    fn render_background(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        let colors = &state.context().config().colors;
        let (fill, outline) = (colors.compass_background, colors.compass_background_outline);
        state.with_multiplied_model_matrix(Mat4::from_rotation_x(FRAC_PI_2), |state| {
            let shader_manager = state.shader_manager();
            let shader =
                ActiveShader::new(shader_manager, state.transformation(), &shaders::COMPASS_BACKGROUND)?;
            shader.set("u_color", &fill)?;
            self.background.render(shader_manager, PrimType::TriangleFan)?;
            shader.set("u_color", &outline)?;
            self.background_outline.render(shader_manager, PrimType::LineLoop)
        })
    }

    fn render_solid_axis(
        &mut self,
        state: &mut RenderState<'_>,
        transform: Mat4,
        color: Color,
    ) -> Result<()> {
        state.with_multiplied_model_matrix(transform, |state| {
            let shader_manager = state.shader_manager();
            let shader = ActiveShader::new(shader_manager, state.transformation(), &shaders::COMPASS)?;
            shader.set("u_camera_position", &Vec3::new(0.0, 500.0, 0.0))?;
            shader.set("u_light_direction", &Vec3::new(0.0, 0.5, 1.0).normalize())?;
            shader.set("u_light_diffuse", &Color::WHITE)?;
            shader.set("u_light_specular", &Color::new(0.3, 0.3, 0.3, 1.0))?;
            shader.set("u_global_ambient", &Color::new(0.2, 0.2, 0.2, 1.0))?;
            shader.set("u_material_shininess", &32.0f32)?;
            shader.set("u_material_diffuse", &color)?;
            shader.set("u_material_ambient", &color)?;
            shader.set("u_material_specular", &color)?;
            self.arrow.render(shader_manager)
        })
    }

    fn render_axis_outline(
        &mut self,
        state: &mut RenderState<'_>,
        transform: Mat4,
        color: Color,
    ) -> Result<()> {
        let gl = state.gl();
        gl.depth_mask(false);
        gl.line_width(OUTLINE_WIDTH);
        let result = state.with_multiplied_model_matrix(transform, |state| {
            let shader_manager = state.shader_manager();
            let shader =
                ActiveShader::new(shader_manager, state.transformation(), &shaders::COMPASS_OUTLINE)?;
            shader.set("u_color", &color)?;
            self.arrow.render(shader_manager)
        });
        gl.line_width(1.0);
        gl.depth_mask(true);
        result
    }

    fn render_axes(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        let colors = state.context().config().colors.clone();
        let axes = self.axes(state.camera(), &colors);
        if self.kind == CompassKind::TwoD {
            for (transform, _) in &axes {
                self.render_axis_outline(state, *transform, colors.compass_axis_outline)?;
            }
        }
        for (transform, color) in axes {
            self.render_solid_axis(state, transform, color)?;
        }
        Ok(())
    }
}

impl Renderable for Compass {
    fn prepare_vertices(&mut self, vbos: &VboManager) -> Result<()> {
        self.arrow.prepare(vbos)?;
        self.background.prepare(vbos)?;
        self.background_outline.prepare(vbos)
    }

    fn render(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        let camera = state.camera();
        let viewport = camera.viewport();
        let (width, height) = (viewport.width as f32, viewport.height as f32);

        let projection = Mat4::orthographic_rh_gl(
            -width / 2.0,
            width / 2.0,
            -height / 2.0,
            height / 2.0,
            0.0,
            1000.0,
        );
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::Y, Vec3::Z)
            * Mat4::from_translation(500.0 * Vec3::Y);
        let placement = Mat4::from_translation(Vec3::new(
            -width / 2.0 + CORNER_OFFSET,
            0.0,
            -height / 2.0 + CORNER_OFFSET,
        )) * Mat4::from_scale(Vec3::splat(SCALE));
        let rotation = Self::camera_rotation(camera);

        state.with_replaced_transformation(projection, view, |state| {
            state.with_multiplied_model_matrix(placement, |state| {
                state.gl().clear(ClearMask::DEPTH);
                self.render_background(state)?;
                state.gl().clear(ClearMask::DEPTH);
                state.with_multiplied_model_matrix(rotation, |state| self.render_axes(state))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_geometry() {
        let builder = Compass::make_arrow();
        let ranges = builder.ranges();
        assert_eq!(ranges.ranges(PrimType::TriangleStrip), vec![(0, 66)]);
        assert_eq!(ranges.ranges(PrimType::TriangleFan), vec![(66, 34), (100, 34)]);
        assert_eq!(ranges.ranges(PrimType::Triangles), vec![(134, 96)]);
        assert_eq!(builder.vertices().len(), 230);
    }

    #[test]
    fn test_background_radius() {
        let vertices = Compass::background_vertices();
        assert_eq!(vertices.len(), SEGMENTS);
        let radius = Vec3::from(vertices[0].position).length();
        assert!((radius - 22.5).abs() < 1e-4);
    }

    #[test]
    fn test_camera_rotation_of_default_camera_is_identity() {
        let rotation = Compass::camera_rotation(&Camera::default());
        assert!(rotation.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }
}
