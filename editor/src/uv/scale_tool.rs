use super::UvViewHelper;
use crate::document::{ChangeFaceAttributesRequest, Face, MapDocument};
use crate::error::Result;
use crate::input::InputState;
use crate::pick::{Hit, HitTarget, HitType, PickResult};
use crate::preferences::UvPreferences;
use crate::tool::{Tool, ToolController};
use glam::{BVec2, IVec2, Vec2};
use once_cell::sync::Lazy;
use renderer::graphics::{PrimType, VertexArray, VertexP3};
use renderer::render::{RenderBatch, RenderState};
use renderer::widgets::{DirectEdgeRenderer, EdgeRenderer};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};
use winit::event::MouseButton;

pub static X_HANDLE_HIT_TYPE: Lazy<HitType> = Lazy::new(HitType::free_type);
pub static Y_HANDLE_HIT_TYPE: Lazy<HitType> = Lazy::new(HitType::free_type);

/// Scales the texture of the selected faces by dragging texture boundaries
///
/// The handles are the lines where one texture tile ends and the next
/// begins. Dragging a handle rescales the texture so the handle follows
/// the mouse while the UV origin keeps its texture coordinates. Handles
/// snap to face vertices.
pub struct UvScaleTool {
    tool: Tool,
    helper: Rc<RefCell<UvViewHelper>>,
    preferences: UvPreferences,
    drag: Option<ScaleDrag>,
}

struct ScaleDrag {
    document: Rc<RefCell<MapDocument>>,
    /// Boundary index of the dragged handle per axis, in texture tiles
    handle: IVec2,
    /// Which axes are being scaled
    selector: BVec2,
    /// In face coordinates, i.e. non-scaled and non-translated
    last_hit_point: Vec2,
}

impl UvScaleTool {
    pub fn new(helper: Rc<RefCell<UvViewHelper>>, preferences: UvPreferences) -> Self {
        Self {
            tool: Tool::new(true),
            helper,
            preferences,
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Handles to draw: the dragged one, or those under the mouse
    fn visible_handles(&self, input: &InputState) -> (IVec2, BVec2) {
        if let Some(drag) = &self.drag {
            return (drag.handle, drag.selector);
        }
        let x = input.pick_result().first(*X_HANDLE_HIT_TYPE).and_then(Hit::index);
        let y = input.pick_result().first(*Y_HANDLE_HIT_TYPE).and_then(Hit::index);
        (
            IVec2::new(x.unwrap_or(0), y.unwrap_or(0)),
            BVec2::new(x.is_some(), y.is_some()),
        )
    }
}

impl ToolController for UvScaleTool {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    fn pick(&self, input: &InputState, pick_result: &mut PickResult) {
        let helper = self.helper.borrow();
        let (Some(face), Some(texture_size)) = (helper.face(), helper.texture_size()) else {
            return;
        };
        let ray = input.pick_ray();
        let Some(distance) = face.intersect(ray) else {
            return;
        };
        let point = ray.point_at(distance);
        let tex = helper.face_to_tex(&face, face.unscaled_tex_coords(point));
        let scale = face.attributes().scale;
        let max_error = self.preferences.scale_handle_width / helper.camera_zoom();

        let hit_types = [*X_HANDLE_HIT_TYPE, *Y_HANDLE_HIT_TYPE];
        for axis in 0..2 {
            let index = (tex[axis] / texture_size[axis]).round();
            let error = (tex[axis] - index * texture_size[axis]).abs() * scale[axis].abs();
            if error <= max_error {
                pick_result.add_hit(Hit::new(
                    hit_types[axis],
                    distance,
                    point,
                    HitTarget::Index(index as i32),
                    error,
                ));
            }
        }
    }

    fn start_mouse_drag(&mut self, input: &InputState) -> Result<bool> {
        if !input.only_mouse_button(MouseButton::Left) || !input.modifiers().is_empty() {
            return Ok(false);
        }
        let pick_result = input.pick_result();
        let x_hit = pick_result.first(*X_HANDLE_HIT_TYPE);
        let y_hit = pick_result.first(*Y_HANDLE_HIT_TYPE);
        let Some(hit) = x_hit.or(y_hit) else {
            return Ok(false);
        };

        let helper = self.helper.borrow();
        let Some(face) = helper.face() else {
            return Ok(false);
        };
        let document = helper.document()?;

        let handle = IVec2::new(
            x_hit.and_then(Hit::index).unwrap_or(0),
            y_hit.and_then(Hit::index).unwrap_or(0),
        );
        let selector = BVec2::new(x_hit.is_some(), y_hit.is_some());
        document.borrow_mut().start_transaction("Scale Texture");
        debug!(?handle, ?selector, "Started texture scaling");

        self.drag = Some(ScaleDrag {
            document,
            handle,
            selector,
            last_hit_point: face.unscaled_tex_coords(hit.point),
        });
        Ok(true)
    }

    fn mouse_drag(&mut self, input: &InputState) -> Result<bool> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(false);
        };
        let helper = self.helper.borrow();
        let (Some(face), Some(texture_size)) = (helper.face(), helper.texture_size()) else {
            return Ok(false);
        };
        let Some(point) = helper.pick_point(&face, input.pick_ray()) else {
            return Ok(true);
        };

        let current = face.unscaled_tex_coords(point);
        let drag_delta = current - drag.last_hit_point;

        let handle_tex = drag.handle.as_vec2() * texture_size;
        let handle_face = helper.tex_to_face(&face, handle_tex) + drag_delta;
        let snapped = snap_to_vertices(
            &face,
            handle_face,
            self.preferences.vertex_snap_distance / helper.camera_zoom(),
        );

        let origin_face = helper.origin_in_face_coords(&face);
        let origin_tex = helper.origin_in_tex_coords(&face);
        let new_distance_face = snapped - origin_face;
        let current_distance_tex = handle_tex - origin_tex;

        let mut new_scale = face.attributes().scale;
        for axis in 0..2 {
            if drag.selector.test(axis) {
                let value = new_distance_face[axis] / current_distance_tex[axis];
                if value.is_finite() && value != 0.0 {
                    new_scale[axis] = value;
                }
            }
        }
        let new_scale = round4(new_scale);
        trace!(?new_scale, "Scaling texture");

        let mut request = ChangeFaceAttributesRequest::new();
        request.set_scale(new_scale);
        drag.document.borrow_mut().set_face_attributes(request)?;

        let Some(face) = helper.face() else {
            return Ok(false);
        };
        let origin_delta = origin_tex - round4(helper.origin_in_tex_coords(&face));
        if origin_delta != Vec2::ZERO {
            let mut request = ChangeFaceAttributesRequest::new();
            request.add_offset(origin_delta);
            drag.document.borrow_mut().set_face_attributes(request)?;
        }

        drag.last_hit_point += drag_delta - handle_face + snapped;
        Ok(true)
    }

    fn end_mouse_drag(&mut self, _input: &InputState) -> Result<()> {
        match self.drag.take() {
            Some(drag) => drag.document.borrow_mut().commit_transaction(),
            None => Ok(()),
        }
    }

    fn cancel_mouse_drag(&mut self) -> Result<()> {
        match self.drag.take() {
            Some(drag) => drag.document.borrow_mut().rollback_transaction(),
            None => Ok(()),
        }
    }

    fn render(
        &self,
        input: &InputState,
        state: &RenderState<'_>,
        batch: &mut RenderBatch,
    ) -> renderer::Result<()> {
        let helper = self.helper.borrow();
        let (Some(face), Some(texture_size)) = (helper.face(), helper.texture_size()) else {
            return Ok(());
        };
        let (handle, selector) = self.visible_handles(input);
        if !selector.any() {
            return Ok(());
        }

        let camera = state.camera();
        let viewport = camera.viewport();
        let half_length = viewport.width.max(viewport.height) as f32 / camera.zoom();
        let center = face.unscaled_tex_coords(camera.position());
        let handle_face = helper.tex_to_face(&face, handle.as_vec2() * texture_size);
        let colors = &state.context().config().colors;

        let lines = [
            (selector.x, colors.x_axis, Vec2::new(handle_face.x, center.y), Vec2::Y),
            (selector.y, colors.y_axis, Vec2::new(center.x, handle_face.y), Vec2::X),
        ];
        for (selected, color, through, along) in lines {
            if !selected {
                continue;
            }
            let vertices = [
                VertexP3::new(helper.face_to_world(&face, through - along * half_length)),
                VertexP3::new(helper.face_to_world(&face, through + along * half_length)),
            ];
            DirectEdgeRenderer::new(VertexArray::new(&vertices), PrimType::Lines)
                .render_on_top_colored(batch, color, 2.0, 0.0);
        }
        Ok(())
    }

    fn cancel(&mut self) -> bool {
        false
    }
}

/// Move each component of `point` onto the closest face vertex within `max_distance`
fn snap_to_vertices(face: &Face, point: Vec2, max_distance: f32) -> Vec2 {
    let mut result = point;
    for axis in 0..2 {
        let closest = face
            .vertices()
            .iter()
            .map(|v| face.unscaled_tex_coords(*v)[axis])
            .min_by(|a, b| (a - point[axis]).abs().total_cmp(&(b - point[axis]).abs()));
        if let Some(value) = closest {
            if (value - point[axis]).abs() < max_distance {
                result[axis] = value;
            }
        }
    }
    result
}

fn round4(v: Vec2) -> Vec2 {
    (v * 10_000.0).round() / 10_000.0
}
