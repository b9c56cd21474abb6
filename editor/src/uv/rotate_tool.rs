use super::UvViewHelper;
use crate::document::{ChangeFaceAttributesRequest, Face, MapDocument};
use crate::error::Result;
use crate::input::InputState;
use crate::pick::{Hit, HitTarget, HitType, PickResult};
use crate::preferences::UvPreferences;
use crate::tool::{DragTracker, Tool, ToolController};
use glam::{Vec2, Vec3};
use once_cell::sync::Lazy;
use renderer::graphics::{render_utils, PrimType, VertexArray, VertexP3};
use renderer::render::{RenderBatch, RenderState};
use renderer::widgets::{
    DirectEdgeRenderer, EdgeRenderer, PointTextAnchor, TextAlignment, TextRenderer,
};
use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use tracing::debug;
use winit::event::MouseButton;

pub static ANGLE_HANDLE_HIT_TYPE: Lazy<HitType> = Lazy::new(HitType::free_type);

const RING_SEGMENTS: usize = 64;

/// Rotates the texture of the selected faces around the UV origin
///
/// The handle is a ring around the origin. Dragging it sets the texture
/// rotation to the angle of the mouse, snapped to the configured step,
/// and shifts the offset so the origin keeps its texture coordinates.
pub struct UvRotateTool {
    tool: Tool,
    helper: Rc<RefCell<UvViewHelper>>,
    preferences: UvPreferences,
}

impl UvRotateTool {
    pub fn new(helper: Rc<RefCell<UvViewHelper>>, preferences: UvPreferences) -> Self {
        Self {
            tool: Tool::new(true),
            helper,
            preferences,
        }
    }
}

impl ToolController for UvRotateTool {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    fn pick(&self, input: &InputState, pick_result: &mut PickResult) {
        let helper = self.helper.borrow();
        if !helper.valid() {
            return;
        }
        let Some(face) = helper.face() else {
            return;
        };
        let ray = input.pick_ray();
        let Some(distance) = face.intersect(ray) else {
            return;
        };
        let point = ray.point_at(distance);
        let zoom = helper.camera_zoom();
        let error = (self.preferences.rotate_handle_radius / zoom - point.distance(helper.origin())).abs();
        if error <= self.preferences.rotate_handle_width / zoom {
            pick_result.add_hit(Hit::new(
                *ANGLE_HANDLE_HIT_TYPE,
                distance,
                point,
                HitTarget::None,
                error,
            ));
        }
    }

    fn accept_mouse_drag(&mut self, input: &InputState) -> Option<Box<dyn DragTracker>> {
        if !input.only_mouse_button(MouseButton::Left) || !input.modifiers().is_empty() {
            return None;
        }
        let hit = input.pick_result().first(*ANGLE_HANDLE_HIT_TYPE)?;
        let helper = self.helper.borrow();
        let face = helper.face()?;
        let document = helper.document().ok()?;

        let initial_angle = measure_angle(&face, helper.origin(), hit.point) - face.attributes().rotation;
        document.borrow_mut().start_transaction("Rotate Texture");
        debug!(initial_angle, "Started texture rotation");

        Some(Box::new(RotateDragTracker {
            helper: Rc::clone(&self.helper),
            document,
            initial_angle,
            snap_step: self.preferences.rotate_snap_step,
            snap_tolerance: self.preferences.rotate_snap_tolerance,
        }))
    }

    fn render(
        &self,
        input: &InputState,
        state: &RenderState<'_>,
        batch: &mut RenderBatch,
    ) -> renderer::Result<()> {
        let helper = self.helper.borrow();
        if !helper.valid() {
            return Ok(());
        }
        let Some(face) = helper.face() else {
            return Ok(());
        };
        let colors = &state.context().config().colors;
        let highlight = input.pick_result().first(*ANGLE_HANDLE_HIT_TYPE).is_some();
        let color = if highlight { colors.selected_edge } else { colors.edge };

        let radius = self.preferences.rotate_handle_radius / helper.camera_zoom();
        let center = unrotated_coords(&face, helper.origin());
        let ring: Vec<VertexP3> = render_utils::circle_2d(radius, 0.0, TAU, RING_SEGMENTS)
            .into_iter()
            .map(|p| VertexP3::new(from_unrotated_coords(&face, center + p)))
            .collect();
        DirectEdgeRenderer::new(VertexArray::new(&ring), PrimType::LineLoop)
            .render_on_top_colored(batch, color, 1.0, 0.0);

        let rotation = face.attributes().rotation;
        let handle = center + Vec2::from_angle(rotation.to_radians()) * radius;
        let handle = from_unrotated_coords(&face, handle);
        let spoke = [VertexP3::new(helper.origin()), VertexP3::new(handle)];
        DirectEdgeRenderer::new(VertexArray::new(&spoke), PrimType::Lines)
            .render_on_top_colored(batch, color, 2.0, 0.0);

        let mut text = TextRenderer::from_config(state.context().config());
        let anchor = PointTextAnchor::with_alignment(handle, TextAlignment::Bottom, Vec2::new(0.0, 4.0));
        text.render_string_on_top(
            state,
            colors.info_overlay_text,
            colors.info_overlay_background,
            &format_angle(rotation),
            &anchor,
        )?;
        batch.add_one_shot(Box::new(text));
        Ok(())
    }

    fn cancel(&mut self) -> bool {
        false
    }
}

struct RotateDragTracker {
    helper: Rc<RefCell<UvViewHelper>>,
    document: Rc<RefCell<MapDocument>>,
    /// Angle of the grabbed handle point relative to the texture rotation
    initial_angle: f32,
    snap_step: f32,
    snap_tolerance: f32,
}

impl DragTracker for RotateDragTracker {
    fn drag(&mut self, input: &InputState) -> Result<bool> {
        let helper = self.helper.borrow();
        let Some(face) = helper.face() else {
            return Ok(false);
        };
        let Some(point) = helper.pick_point(&face, input.pick_ray()) else {
            return Ok(true);
        };

        let angle = measure_angle(&face, helper.origin(), point) - self.initial_angle;
        let angle = snap_angle(angle.rem_euclid(360.0), self.snap_step, self.snap_tolerance);
        let angle = round4(angle).rem_euclid(360.0);
        let origin_before = helper.origin_in_face_coords(&face);

        let mut request = ChangeFaceAttributesRequest::new();
        request.set_rotation(angle);
        self.document.borrow_mut().set_face_attributes(request)?;

        let Some(face) = helper.face() else {
            return Ok(false);
        };
        let origin_after = helper.origin_in_face_coords(&face);
        let scale = face.attributes().scale;
        let delta = (origin_before - origin_after) / Vec2::new(nonzero(scale.x), nonzero(scale.y));
        if delta != Vec2::ZERO {
            let mut request = ChangeFaceAttributesRequest::new();
            request.add_offset(delta);
            self.document.borrow_mut().set_face_attributes(request)?;
        }
        Ok(true)
    }

    fn end(&mut self, _input: &InputState) -> Result<()> {
        self.document.borrow_mut().commit_transaction()
    }

    fn cancel(&mut self) -> Result<()> {
        self.document.borrow_mut().rollback_transaction()
    }
}

/// Face coordinates ignoring the texture rotation
fn unrotated_coords(face: &Face, point: Vec3) -> Vec2 {
    face.to_tex_coords(point, Vec2::ZERO, Vec2::ONE, 0.0)
}

fn from_unrotated_coords(face: &Face, point: Vec2) -> Vec3 {
    face.from_tex_coords(point, Vec2::ZERO, Vec2::ONE, 0.0)
}

/// Angle of `point` around `origin` in degrees, in `[0, 360)`
fn measure_angle(face: &Face, origin: Vec3, point: Vec3) -> f32 {
    let v = unrotated_coords(face, point) - unrotated_coords(face, origin);
    v.y.atan2(v.x).to_degrees().rem_euclid(360.0)
}

fn snap_angle(angle: f32, step: f32, tolerance: f32) -> f32 {
    if step <= 0.0 {
        return angle;
    }
    let snapped = (angle / step).round() * step;
    if (angle - snapped).abs() <= tolerance {
        snapped
    } else {
        angle
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

fn nonzero(value: f32) -> f32 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

fn format_angle(angle: f32) -> String {
    let text = format!("{angle:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
