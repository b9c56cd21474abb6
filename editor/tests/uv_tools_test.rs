//! UV rotate and scale tools driven through picking and dragging

use editor::document::{Face, FaceAttributes, FaceId, MapDocument};
use editor::input::InputState;
use editor::pick::PickResult;
use editor::preferences::UvPreferences;
use editor::tool::ToolController;
use editor::uv::{
    UvRotateTool, UvScaleTool, UvViewHelper, ANGLE_HANDLE_HIT_TYPE, X_HANDLE_HIT_TYPE,
    Y_HANDLE_HIT_TYPE,
};
use glam::{Vec2, Vec3};
use renderer::config::RenderConfig;
use renderer::core::{Camera, Ray3, Viewport};
use renderer::gl::{GlCall, RecordingGl};
use renderer::graphics::PrimType;
use renderer::render::{RenderBatch, RenderContext, RenderMode, RenderState};
use renderer::widgets::GridFontFactory;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use winit::event::{ElementState, MouseButton};

struct Fixture {
    document: Rc<RefCell<MapDocument>>,
    helper: Rc<RefCell<UvViewHelper>>,
    face: FaceId,
}

fn fixture() -> Fixture {
    let document = Rc::new(RefCell::new(MapDocument::new(Duration::from_secs(1))));
    let face = document.borrow_mut().add_face(Face::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(64.0, 0.0, 0.0),
            Vec3::new(64.0, 64.0, 0.0),
            Vec3::new(0.0, 64.0, 0.0),
        ],
        FaceAttributes::new("base/floor"),
    ));
    document.borrow_mut().select_faces([face]);

    let camera = Rc::new(RefCell::new(Camera::orthographic(
        1.0,
        1024.0,
        Viewport::new(0, 0, 400, 400),
    )));
    let mut helper = UvViewHelper::new(Rc::downgrade(&document), camera);
    helper.set_face(Some(face));
    helper.set_texture_size(Some(Vec2::new(64.0, 64.0)));

    Fixture {
        document,
        helper: Rc::new(RefCell::new(helper)),
        face,
    }
}

impl Fixture {
    fn attributes(&self) -> FaceAttributes {
        self.document
            .borrow()
            .face(self.face)
            .map(|f| f.attributes().clone())
            .expect("face")
    }
}

/// Input with the mouse over `point` on the floor and the left button down
fn input_at(tool: &dyn ToolController, point: Vec3) -> InputState {
    let mut input = InputState::new();
    input.set_pick_ray(Ray3::new(point + Vec3::Z * 100.0, Vec3::NEG_Z));
    let mut hits = PickResult::new();
    tool.pick(&input, &mut hits);
    input.set_pick_result(hits);
    input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
    input
}

fn move_to(input: &mut InputState, point: Vec3) {
    input.set_pick_ray(Ray3::new(point + Vec3::Z * 100.0, Vec3::NEG_Z));
}

fn assert_close(a: Vec2, b: Vec2) {
    assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
}

#[test]
fn test_rotate_handle_is_picked_on_the_ring_only() {
    let fixture = fixture();
    let tool = UvRotateTool::new(Rc::clone(&fixture.helper), UvPreferences::default());

    let on_ring = input_at(&tool, Vec3::new(64.0, 32.0, 0.0));
    let hit = on_ring.pick_result().first(*ANGLE_HANDLE_HIT_TYPE).expect("ring hit");
    assert!((hit.distance - 100.0).abs() < 1e-3);
    assert!(hit.error < 1e-3);

    let inside = input_at(&tool, Vec3::new(40.0, 32.0, 0.0));
    assert!(inside.pick_result().is_empty());
}

#[test]
fn test_rotate_drag_snaps_and_keeps_origin_fixed() {
    let fixture = fixture();
    let mut tool = UvRotateTool::new(Rc::clone(&fixture.helper), UvPreferences::default());
    let origin_tex = {
        let helper = fixture.helper.borrow();
        helper.origin_in_tex_coords(&helper.face().expect("face"))
    };

    let mut input = input_at(&tool, Vec3::new(64.0, 32.0, 0.0));
    let mut tracker = tool.accept_mouse_drag(&input).expect("rotate tracker");
    assert!(fixture.document.borrow().processor().is_in_transaction());

    // 88 degrees from the grab point snaps to 90
    move_to(&mut input, Vec3::new(33.0, 0.0, 0.0));
    assert!(tracker.drag(&input).unwrap());
    assert_eq!(fixture.attributes().rotation, 90.0);

    {
        let helper = fixture.helper.borrow();
        let face = helper.face().expect("face");
        assert_close(helper.origin_in_tex_coords(&face), origin_tex);
    }

    tracker.end(&input).unwrap();
    let mut document = fixture.document.borrow_mut();
    assert!(!document.processor().is_in_transaction());
    assert!(document.can_undo());
    document.undo().unwrap();
    drop(document);
    assert_eq!(fixture.attributes(), FaceAttributes::new("base/floor"));
}

#[test]
fn test_rotate_cancel_rolls_back() {
    let fixture = fixture();
    let mut tool = UvRotateTool::new(Rc::clone(&fixture.helper), UvPreferences::default());

    let mut input = input_at(&tool, Vec3::new(64.0, 32.0, 0.0));
    let mut tracker = tool.accept_mouse_drag(&input).expect("rotate tracker");
    move_to(&mut input, Vec3::new(40.0, 0.0, 0.0));
    tracker.drag(&input).unwrap();
    assert_ne!(fixture.attributes().rotation, 0.0);

    tracker.cancel().unwrap();
    assert_eq!(fixture.attributes(), FaceAttributes::new("base/floor"));
    assert!(!fixture.document.borrow().can_undo());
    assert_eq!(fixture.document.borrow().modification_count(), 0);
}

#[test]
fn test_scale_handle_hits_texture_boundaries() {
    let fixture = fixture();
    let tool = UvScaleTool::new(Rc::clone(&fixture.helper), UvPreferences::default());

    let input = input_at(&tool, Vec3::new(63.0, 20.0, 0.0));
    let x = input.pick_result().first(*X_HANDLE_HIT_TYPE).expect("x handle");
    assert_eq!(x.index(), Some(1));
    assert!((x.error - 1.0).abs() < 1e-3);
    assert!(input.pick_result().first(*Y_HANDLE_HIT_TYPE).is_none());

    let corner = input_at(&tool, Vec3::new(64.0, 64.0, 0.0));
    assert_eq!(corner.pick_result().first(*X_HANDLE_HIT_TYPE).and_then(|h| h.index()), Some(1));
    assert_eq!(corner.pick_result().first(*Y_HANDLE_HIT_TYPE).and_then(|h| h.index()), Some(-1));
}

#[test]
fn test_scale_drag_moves_handle_with_mouse() {
    let fixture = fixture();
    let mut tool = UvScaleTool::new(Rc::clone(&fixture.helper), UvPreferences::default());

    let mut input = input_at(&tool, Vec3::new(64.0, 20.0, 0.0));
    assert!(tool.start_mouse_drag(&input).unwrap());
    assert!(tool.is_dragging());

    move_to(&mut input, Vec3::new(96.0, 20.0, 0.0));
    assert!(tool.mouse_drag(&input).unwrap());

    let attributes = fixture.attributes();
    assert_close(attributes.scale, Vec2::new(2.0, 1.0));
    assert_close(attributes.offset, Vec2::new(16.0, 0.0));

    tool.end_mouse_drag(&input).unwrap();
    assert!(!tool.is_dragging());
    assert!(fixture.document.borrow().can_undo());
    assert_eq!(fixture.document.borrow().modification_count(), 2);
}

#[test]
fn test_scale_cancel_restores_attributes() {
    let fixture = fixture();
    let mut tool = UvScaleTool::new(Rc::clone(&fixture.helper), UvPreferences::default());

    let mut input = input_at(&tool, Vec3::new(64.0, 20.0, 0.0));
    tool.start_mouse_drag(&input).unwrap();
    move_to(&mut input, Vec3::new(96.0, 20.0, 0.0));
    tool.mouse_drag(&input).unwrap();
    tool.cancel_mouse_drag().unwrap();

    assert_eq!(fixture.attributes(), FaceAttributes::new("base/floor"));
    assert!(!fixture.document.borrow().can_undo());
}

#[test]
fn test_scale_drag_requires_a_handle() {
    let fixture = fixture();
    let mut tool = UvScaleTool::new(Rc::clone(&fixture.helper), UvPreferences::default());
    let input = input_at(&tool, Vec3::new(32.0, 32.0, 0.0));
    assert!(!tool.start_mouse_drag(&input).unwrap());
    assert!(!fixture.document.borrow().processor().is_in_transaction());
}

#[test]
fn test_uv_tools_render_handles() {
    let fixture = fixture();
    let recording = Rc::new(RecordingGl::new());
    let context = RenderContext::new(
        recording.clone(),
        RenderConfig::default(),
        Box::new(GridFontFactory),
    );
    let camera = *fixture.helper.borrow().camera().borrow();
    let mut state = RenderState::new(RenderMode::TwoD, &camera, &context);

    let rotate = UvRotateTool::new(Rc::clone(&fixture.helper), UvPreferences::default());
    let scale = UvScaleTool::new(Rc::clone(&fixture.helper), UvPreferences::default());
    let input = input_at(&scale, Vec3::new(64.0, 20.0, 0.0));

    let mut batch = RenderBatch::new();
    rotate.render(&input, &state, &mut batch).unwrap();
    scale.render(&input, &state, &mut batch).unwrap();
    batch.render(&mut state).unwrap();

    let draws: Vec<_> = recording
        .draw_calls()
        .into_iter()
        .filter_map(|call| match call {
            GlCall::DrawArrays { prim, count, .. } => Some((prim, count)),
            _ => None,
        })
        .collect();
    assert_eq!(draws[0], (PrimType::LineLoop, 64));
    assert_eq!(draws[1], (PrimType::Lines, 2));
    assert_eq!(draws.last(), Some(&(PrimType::Lines, 2)));
}
