//! Tests for transformation scopes and render flags of RenderState

use glam::{Mat4, Vec3};
use renderer::core::{Camera, Viewport};
use renderer::gl::{GlCall, RecordingGl, UniformData};
use renderer::render::{RenderContext, RenderMode, RenderState, SelectionGuide};
use renderer::shaders::{self, ActiveShader};
use renderer::widgets::GridFontFactory;
use renderer::config::RenderConfig;
use std::rc::Rc;

fn context(recording: &Rc<RecordingGl>) -> RenderContext {
    RenderContext::new(recording.clone(), RenderConfig::default(), Box::new(GridFontFactory))
}

fn model_of(recording: &RecordingGl, state: &RenderState<'_>) -> Option<UniformData> {
    let program = state.shader_manager().current_program()?;
    recording.uniform_value(program.id(), "u_model")
}

#[test]
fn test_model_scope_updates_and_restores_current_program() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let mut state = RenderState::new(RenderMode::ThreeD, &camera, &context);

    let shader =
        ActiveShader::new(state.shader_manager(), state.transformation(), &shaders::HANDLE).unwrap();
    let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    state
        .with_multiplied_model_matrix(translation, |state| {
            assert_eq!(*state.transformation().model(), translation);
            assert_eq!(
                model_of(&recording, state),
                Some(UniformData::Mat4(translation.to_cols_array()))
            );
            Ok(())
        })
        .unwrap();

    assert_eq!(*state.transformation().model(), Mat4::IDENTITY);
    assert_eq!(
        model_of(&recording, &state),
        Some(UniformData::Mat4(Mat4::IDENTITY.to_cols_array()))
    );
    drop(shader);
    assert!(state.shader_manager().current_program().is_none());
}

#[test]
fn test_nested_model_scopes_multiply() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let mut state = RenderState::new(RenderMode::ThreeD, &camera, &context);

    let a = Mat4::from_translation(Vec3::X);
    let b = Mat4::from_scale(Vec3::splat(2.0));
    state
        .with_multiplied_model_matrix(a, |state| {
            state.with_multiplied_model_matrix(b, |state| {
                assert_eq!(*state.transformation().model(), a * b);
                Ok(())
            })?;
            state.with_replaced_model_matrix(b, |state| {
                assert_eq!(*state.transformation().model(), b);
                Ok(())
            })?;
            assert_eq!(*state.transformation().model(), a);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_replaced_transformation_is_restored_after_error() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let mut state = RenderState::new(RenderMode::ThreeD, &camera, &context);
    let projection = *state.transformation().projection();

    let result: renderer::Result<()> =
        state.with_replaced_transformation(Mat4::IDENTITY, Mat4::IDENTITY, |state| {
            assert_eq!(*state.transformation().projection(), Mat4::IDENTITY);
            Err(renderer::RenderError::NoActiveProgram)
        });

    assert!(result.is_err());
    assert_eq!(*state.transformation().projection(), projection);
    assert_eq!(state.transformation().depth(), 1);
}

#[test]
fn test_mode_dependent_flags() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::orthographic(-1000.0, 1000.0, Viewport::new(0, 0, 640, 480));

    let mut state_2d = RenderState::new(RenderMode::TwoD, &camera, &context);
    state_2d.set_show_edges(false);
    assert!(state_2d.show_edges());
    assert!(!state_2d.show_faces());

    let mut state_3d = RenderState::new(RenderMode::ThreeD, &camera, &context);
    state_3d.set_show_edges(false);
    assert!(!state_3d.show_edges());
    assert!(state_3d.show_faces());
}

#[test]
fn test_initial_grid_and_bounds() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let mut state = RenderState::new(RenderMode::ThreeD, &camera, &context);

    assert_eq!(state.grid_size(), 4.0);
    assert!(state.soft_map_bounds().is_none());
    state.set_grid_size(16.0);
    assert_eq!(state.grid_size(), 16.0);
}

#[test]
fn test_selection_guide_forcing() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let mut state = RenderState::new(RenderMode::ThreeD, &camera, &context);

    assert_eq!(state.selection_guide(), SelectionGuide::Hide);
    state.set_show_selection_guide();
    assert!(state.show_selection_guide());

    state.set_force_hide_selection_guide();
    state.set_show_selection_guide();
    assert!(!state.show_selection_guide());

    state.set_force_show_selection_guide();
    state.set_hide_selection_guide();
    assert!(state.show_selection_guide());
}

#[test]
fn test_active_shader_uploads_camera_matrices() {
    let recording = Rc::new(RecordingGl::new());
    let context = context(&recording);
    let camera = Camera::default();
    let state = RenderState::new(RenderMode::ThreeD, &camera, &context);

    let shader =
        ActiveShader::new(state.shader_manager(), state.transformation(), &shaders::HANDLE).unwrap();
    let id = shader.program().id();
    assert_eq!(
        recording.uniform_value(id, "u_view"),
        Some(UniformData::Mat4(camera.view_matrix().to_cols_array()))
    );
    assert!(recording
        .calls()
        .iter()
        .any(|call| matches!(call, GlCall::UseProgram(Some(p)) if *p == id)));
}
