//! Screen-space labels
//!
//! Labels are anchored in the world, laid out in window pixels and drawn
//! over a rounded background in an orthographic pass. Labels fade out as
//! they approach the view distance (3D) or the minimum zoom (2D); labels
//! rendered "on top" ignore both limits and the depth buffer.

use super::font::{FontDescriptor, TextureFont};
use super::text_anchor::TextAnchor;
use crate::core::Color;
use crate::error::Result;
use crate::gl::Capability;
use crate::graphics::{render_utils, PrimType, VboManager, VertexArray, VertexP3C4, VertexP3T2C4};
use crate::render::{RenderState, Renderable};
use crate::shaders::{self, ActiveShader};
use glam::{Mat4, Vec2, Vec3};
use std::rc::Rc;
use tracing::trace;

/// Distance over which labels fade out before the maximum view distance
pub const FADE_DISTANCE: f32 = 128.0;
/// Zoom range over which labels fade out above the minimum zoom factor
pub const FADE_ZOOM: f32 = 0.3;

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    size: Vec2,
    /// Bottom left corner in window pixels and window depth
    offset: Vec3,
    text_color: Color,
    background_color: Color,
}

#[derive(Default)]
struct EntryCollection {
    entries: Vec<Entry>,
    text_array: Option<VertexArray>,
    rect_array: Option<VertexArray>,
}

impl EntryCollection {
    fn clear(&mut self) {
        self.entries.clear();
        self.text_array = None;
        self.rect_array = None;
    }
}

pub struct TextRenderer {
    font_descriptor: FontDescriptor,
    font: Option<Rc<TextureFont>>,
    max_view_distance: f32,
    min_zoom_factor: f32,
    inset: Vec2,
    corner_radius: f32,
    corner_segments: usize,
    entries: EntryCollection,
    entries_on_top: EntryCollection,
}

impl TextRenderer {
    pub fn new(font_descriptor: FontDescriptor) -> Self {
        Self {
            font_descriptor,
            font: None,
            max_view_distance: 768.0,
            min_zoom_factor: 0.5,
            inset: Vec2::new(4.0, 4.0),
            corner_radius: 3.0,
            corner_segments: 3,
            entries: EntryCollection::default(),
            entries_on_top: EntryCollection::default(),
        }
    }

    /// A renderer using the font and text parameters of the render config
    pub fn from_config(config: &crate::config::RenderConfig) -> Self {
        Self::new(config.font.clone())
            .with_limits(config.text.max_view_distance, config.text.min_zoom_factor)
            .with_background(config.text.inset, config.text.corner_radius, config.text.corner_segments)
    }

    pub fn with_limits(mut self, max_view_distance: f32, min_zoom_factor: f32) -> Self {
        self.max_view_distance = max_view_distance;
        self.min_zoom_factor = min_zoom_factor;
        self
    }

    pub fn with_background(mut self, inset: Vec2, corner_radius: f32, corner_segments: usize) -> Self {
        self.inset = inset;
        self.corner_radius = corner_radius;
        self.corner_segments = corner_segments;
        self
    }

    pub fn pending(&self) -> usize {
        self.entries.entries.len() + self.entries_on_top.entries.len()
    }

    pub fn render_string(
        &mut self,
        state: &RenderState<'_>,
        text_color: Color,
        background_color: Color,
        text: &str,
        anchor: &dyn TextAnchor,
    ) -> Result<()> {
        self.add_entry(state, text_color, background_color, text, anchor, false)
    }

    pub fn render_string_on_top(
        &mut self,
        state: &RenderState<'_>,
        text_color: Color,
        background_color: Color,
        text: &str,
        anchor: &dyn TextAnchor,
    ) -> Result<()> {
        self.add_entry(state, text_color, background_color, text, anchor, true)
    }

    fn add_entry(
        &mut self,
        state: &RenderState<'_>,
        text_color: Color,
        background_color: Color,
        text: &str,
        anchor: &dyn TextAnchor,
        on_top: bool,
    ) -> Result<()> {
        let font = match &self.font {
            Some(font) => Rc::clone(font),
            None => {
                let font = state.context().font_manager().font(&self.font_descriptor)?;
                self.font = Some(Rc::clone(&font));
                font
            }
        };

        let size = font.measure(text) + 2.0 * self.inset;
        if !self.is_visible(state, anchor, size, on_top) {
            return Ok(());
        }

        let alpha = if on_top {
            1.0
        } else {
            self.alpha(state, anchor)
        };
        let camera = state.camera();
        let offset = anchor.offset(camera, size);
        let depth = camera.project(anchor.position(camera)).z;

        let entry = Entry {
            text: text.to_string(),
            size,
            offset: offset.extend(depth),
            text_color: text_color.with_alpha(text_color.a * alpha),
            background_color: background_color.with_alpha(background_color.a * alpha),
        };
        if on_top {
            self.entries_on_top.entries.push(entry);
        } else {
            self.entries.entries.push(entry);
        }
        Ok(())
    }

    fn is_visible(
        &self,
        state: &RenderState<'_>,
        anchor: &dyn TextAnchor,
        size: Vec2,
        on_top: bool,
    ) -> bool {
        let camera = state.camera();
        let position = anchor.position(camera);
        let distance = camera.perpendicular_distance_to(position);
        if state.render_3d() && distance <= 0.0 {
            return false;
        }
        if !on_top {
            if state.render_3d() && distance > self.max_view_distance {
                return false;
            }
            if state.render_2d() && camera.zoom() < self.min_zoom_factor {
                return false;
            }
        }
        let offset = anchor.offset(camera, size);
        camera.viewport().contains(offset.x, offset.y, size.x, size.y)
    }

    fn alpha(&self, state: &RenderState<'_>, anchor: &dyn TextAnchor) -> f32 {
        let camera = state.camera();
        let alpha = if state.render_3d() {
            let distance = camera.perpendicular_distance_to(anchor.position(camera));
            (self.max_view_distance - distance) / FADE_DISTANCE
        } else {
            (camera.zoom() - self.min_zoom_factor) / FADE_ZOOM
        };
        alpha.clamp(0.0, 1.0)
    }

    fn prepare_collection(&self, collection: &mut EntryCollection, vbos: &VboManager) -> Result<()> {
        let Some(font) = &self.font else {
            return Ok(());
        };
        if collection.entries.is_empty() {
            return Ok(());
        }

        let rect_vertex_count = render_utils::rounded_rect_2d_vertex_count(self.corner_segments);
        let mut text_vertices = Vec::new();
        let mut rect_vertices = Vec::with_capacity(collection.entries.len() * rect_vertex_count);

        for entry in &collection.entries {
            let origin = entry.offset.truncate();
            // Window depth d maps to eye z -d under the label projection
            let z = -entry.offset.z;

            for (position, tex_coord) in font.quads(&entry.text, origin + self.inset) {
                text_vertices.push(VertexP3T2C4::new(
                    position.extend(z),
                    tex_coord,
                    entry.text_color.to_array(),
                ));
            }

            let center = origin + entry.size / 2.0;
            for corner in
                render_utils::rounded_rect_2d(entry.size, self.corner_radius, self.corner_segments)
            {
                rect_vertices.push(VertexP3C4::new(
                    (center + corner).extend(z),
                    entry.background_color.to_array(),
                ));
            }
        }

        let mut text_array = VertexArray::new(&text_vertices);
        let mut rect_array = VertexArray::new(&rect_vertices);
        text_array.prepare(vbos)?;
        rect_array.prepare(vbos)?;
        collection.text_array = Some(text_array);
        collection.rect_array = Some(rect_array);
        Ok(())
    }

    fn render_collection(&self, collection: &mut EntryCollection, state: &RenderState<'_>) -> Result<()> {
        let (Some(text_array), Some(rect_array), Some(font)) = (
            collection.text_array.as_mut(),
            collection.rect_array.as_mut(),
            self.font.as_ref(),
        ) else {
            return Ok(());
        };
        let shader_manager = state.shader_manager();
        {
            let _shader =
                ActiveShader::new(shader_manager, state.transformation(), &shaders::TEXT_BACKGROUND)?;
            rect_array.render(shader_manager, PrimType::Triangles)?;
        }
        {
            let shader =
                ActiveShader::new(shader_manager, state.transformation(), &shaders::COLORED_TEXT)?;
            shader.set("u_texture", &0i32)?;
            font.activate()?;
            let result = text_array.render(shader_manager, PrimType::Triangles);
            font.deactivate();
            result?;
        }
        Ok(())
    }
}

impl Renderable for TextRenderer {
    fn prepare_vertices(&mut self, vbos: &VboManager) -> Result<()> {
        let mut entries = std::mem::take(&mut self.entries);
        let mut entries_on_top = std::mem::take(&mut self.entries_on_top);
        let result = self
            .prepare_collection(&mut entries, vbos)
            .and_then(|_| self.prepare_collection(&mut entries_on_top, vbos));
        self.entries = entries;
        self.entries_on_top = entries_on_top;
        result
    }

    fn render(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        if self.pending() == 0 {
            return Ok(());
        }
        trace!(labels = self.pending(), "Rendering labels");

        let viewport = *state.camera().viewport();
        let projection = Mat4::orthographic_rh_gl(
            viewport.x as f32,
            (viewport.x + viewport.width) as f32,
            viewport.y as f32,
            (viewport.y + viewport.height) as f32,
            0.0,
            1.0,
        );

        let mut entries = std::mem::take(&mut self.entries);
        let mut entries_on_top = std::mem::take(&mut self.entries_on_top);
        let config = state.context().config().text.clone();

        let result = state.with_replaced_transformation(projection, Mat4::IDENTITY, |state| {
            let gl = state.gl();
            gl.enable(Capability::Blend);
            gl.blend_func(config.blend_src, config.blend_dst);
            gl.depth_mask(false);

            let regular = self.render_collection(&mut entries, state);

            gl.disable(Capability::DepthTest);
            let on_top = self.render_collection(&mut entries_on_top, state);
            gl.enable(Capability::DepthTest);

            gl.depth_mask(true);
            gl.disable(Capability::Blend);
            regular.and(on_top)
        });

        entries.clear();
        entries_on_top.clear();
        self.entries = entries;
        self.entries_on_top = entries_on_top;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::core::{Camera, Viewport};
    use crate::gl::RecordingGl;
    use crate::render::{RenderContext, RenderMode};
    use crate::widgets::{GridFontFactory, PointTextAnchor};

    fn context() -> RenderContext {
        RenderContext::new(
            Rc::new(RecordingGl::new()),
            RenderConfig::default(),
            Box::new(GridFontFactory),
        )
    }

    #[test]
    fn test_alpha_fades_towards_view_distance() {
        let context = context();
        let camera = Camera::default();
        let state = RenderState::new(RenderMode::ThreeD, &camera, &context);
        let mut text = TextRenderer::from_config(context.config());

        let anchor = PointTextAnchor::new(Vec3::new(0.0, 704.0, 0.0));
        text.render_string(&state, Color::WHITE, Color::BLACK, "x", &anchor)
            .unwrap();
        let entry = &text.entries.entries[0];
        assert!((entry.text_color.a - 0.5).abs() < 1e-5);
        assert!((entry.background_color.a - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_alpha_fades_towards_min_zoom() {
        let context = context();
        let mut camera = Camera::orthographic(-1000.0, 1000.0, Viewport::new(0, 0, 800, 600));
        camera.set_zoom(0.65);
        let state = RenderState::new(RenderMode::TwoD, &camera, &context);
        let mut text = TextRenderer::from_config(context.config());

        let anchor = PointTextAnchor::new(Vec3::ZERO);
        text.render_string(&state, Color::WHITE, Color::BLACK, "x", &anchor)
            .unwrap();
        text.render_string_on_top(&state, Color::WHITE, Color::BLACK, "x", &anchor)
            .unwrap();
        assert!((text.entries.entries[0].text_color.a - 0.5).abs() < 1e-5);
        assert_eq!(text.entries_on_top.entries[0].text_color.a, 1.0);
    }

    #[test]
    fn test_offscreen_labels_are_dropped() {
        let context = context();
        let camera = Camera::default();
        let state = RenderState::new(RenderMode::ThreeD, &camera, &context);
        let mut text = TextRenderer::from_config(context.config());

        // Far to the side of a 90 degree frustum
        let anchor = PointTextAnchor::new(Vec3::new(500.0, 10.0, 0.0));
        text.render_string_on_top(&state, Color::WHITE, Color::BLACK, "x", &anchor)
            .unwrap();
        assert_eq!(text.pending(), 0);
    }
}
