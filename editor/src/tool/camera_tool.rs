use super::{DragTracker, Tool, ToolController};
use crate::error::Result;
use crate::input::InputState;
use crate::pick::HitType;
use crate::preferences::CameraPreferences;
use glam::Vec3;
use renderer::core::Camera;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use winit::event::MouseButton;

/// Navigates the 3D view: fly, look, orbit and pan
pub struct CameraTool3D {
    tool: Tool,
    camera: Rc<RefCell<Camera>>,
    preferences: CameraPreferences,
}

impl CameraTool3D {
    pub fn new(camera: Rc<RefCell<Camera>>, preferences: CameraPreferences) -> Self {
        Self {
            tool: Tool::new(true),
            camera,
            preferences,
        }
    }

    pub fn preferences(&self) -> &CameraPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: CameraPreferences) {
        self.preferences = preferences;
    }

    fn speeds(&self) -> Speeds {
        Speeds::new(&self.preferences)
    }

    fn orbit_center(&self, input: &InputState) -> Vec3 {
        match input.pick_result().first(HitType::ANY) {
            Some(hit) => hit.point,
            None => {
                let camera = self.camera.borrow();
                camera.position() + camera.direction() * self.preferences.orbit_default_distance
            }
        }
    }
}

impl ToolController for CameraTool3D {
    fn tool(&self) -> &Tool {
        &self.tool
    }

    fn tool_mut(&mut self) -> &mut Tool {
        &mut self.tool
    }

    fn mouse_scroll(&mut self, input: &InputState) {
        let factor = if self.preferences.mouse_wheel_invert { -1.0 } else { 1.0 };
        let mut camera = self.camera.borrow_mut();
        let direction = if self.preferences.move_in_cursor_dir {
            input.pick_ray().direction
        } else {
            camera.direction()
        };
        let distance = input.scroll_y() * self.speeds().movement(false);
        camera.move_by(direction * (factor * distance));
    }

    fn mouse_up(&mut self, input: &InputState, button: MouseButton) -> bool {
        // Suppresses the context menu after looking around
        button == MouseButton::Right && input.moved_since_press()
    }

    fn accept_mouse_drag(&mut self, input: &InputState) -> Option<Box<dyn DragTracker>> {
        let camera = Rc::clone(&self.camera);
        let speeds = self.speeds();
        if input.only_mouse_button(MouseButton::Right) {
            if input.alt() {
                let center = self.orbit_center(input);
                debug!(?center, "Orbiting");
                Some(Box::new(OrbitDragTracker {
                    camera,
                    speeds,
                    center,
                }))
            } else {
                Some(Box::new(LookDragTracker { camera, speeds }))
            }
        } else if input.only_mouse_button(MouseButton::Middle) {
            if input.alt() {
                Some(Box::new(MoveDragTracker { camera, speeds }))
            } else {
                Some(Box::new(PanDragTracker { camera, speeds }))
            }
        } else {
            None
        }
    }

    fn cancel(&mut self) -> bool {
        false
    }
}

/// Per-pixel speeds derived from the preferences
#[derive(Debug, Clone, Copy)]
struct Speeds {
    look_h: f32,
    look_v: f32,
    pan_h: f32,
    pan_v: f32,
    movement: f32,
    alt_move_invert: bool,
}

impl Speeds {
    fn new(preferences: &CameraPreferences) -> Self {
        let look = (preferences.look_speed / -50.0).to_degrees();
        let sign = |invert: bool| if invert { -1.0 } else { 1.0 };
        Self {
            look_h: look * sign(preferences.look_invert_h),
            look_v: look * sign(preferences.look_invert_v),
            pan_h: preferences.pan_speed * sign(preferences.pan_invert_h),
            pan_v: preferences.pan_speed * sign(preferences.pan_invert_v),
            movement: preferences.move_speed * 20.0,
            alt_move_invert: preferences.alt_move_invert,
        }
    }

    fn movement(&self, alt_mode: bool) -> f32 {
        if alt_mode && self.alt_move_invert {
            -self.movement
        } else {
            self.movement
        }
    }
}

struct LookDragTracker {
    camera: Rc<RefCell<Camera>>,
    speeds: Speeds,
}

impl DragTracker for LookDragTracker {
    fn drag(&mut self, input: &InputState) -> Result<bool> {
        let delta = input.mouse_delta();
        self.camera
            .borrow_mut()
            .rotate(delta.x * self.speeds.look_h, delta.y * self.speeds.look_v);
        Ok(true)
    }

    fn end(&mut self, _input: &InputState) -> Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

struct OrbitDragTracker {
    camera: Rc<RefCell<Camera>>,
    speeds: Speeds,
    center: Vec3,
}

impl DragTracker for OrbitDragTracker {
    fn drag(&mut self, input: &InputState) -> Result<bool> {
        let delta = input.mouse_delta();
        self.camera.borrow_mut().orbit(
            self.center,
            delta.x * self.speeds.look_h,
            delta.y * self.speeds.look_v,
        );
        Ok(true)
    }

    fn end(&mut self, _input: &InputState) -> Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

struct PanDragTracker {
    camera: Rc<RefCell<Camera>>,
    speeds: Speeds,
}

impl DragTracker for PanDragTracker {
    fn drag(&mut self, input: &InputState) -> Result<bool> {
        let delta = input.mouse_delta();
        let mut camera = self.camera.borrow_mut();
        // Window y grows downwards
        let offset = camera.right() * (-delta.x * self.speeds.pan_h)
            + camera.up() * (delta.y * self.speeds.pan_v);
        camera.move_by(offset);
        Ok(true)
    }

    fn end(&mut self, _input: &InputState) -> Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

struct MoveDragTracker {
    camera: Rc<RefCell<Camera>>,
    speeds: Speeds,
}

impl DragTracker for MoveDragTracker {
    fn drag(&mut self, input: &InputState) -> Result<bool> {
        let delta = input.mouse_delta();
        let mut camera = self.camera.borrow_mut();
        let direction = camera.direction();
        camera.move_by(direction * (-delta.y * self.speeds.movement(true)));
        Ok(true)
    }

    fn end(&mut self, _input: &InputState) -> Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::{Hit, HitTarget, PickResult};
    use renderer::core::Viewport;
    use winit::event::ElementState;
    use winit::keyboard::ModifiersState;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    fn tool() -> (CameraTool3D, Rc<RefCell<Camera>>) {
        let camera = Rc::new(RefCell::new(Camera::perspective(
            90.0,
            1.0,
            8192.0,
            Viewport::new(0, 0, 800, 600),
        )));
        let tool = CameraTool3D::new(Rc::clone(&camera), CameraPreferences::default());
        (tool, camera)
    }

    #[test]
    fn test_scroll_moves_along_view_direction() {
        let (mut tool, camera) = tool();
        let mut input = InputState::new();
        input.set_scroll(0.0, 2.0);
        tool.mouse_scroll(&input);
        // move speed 0.3 * 20 per wheel step
        assert_vec_eq(camera.borrow().position(), Vec3::new(0.0, 12.0, 0.0));
    }

    #[test]
    fn test_inverted_wheel_moves_backwards() {
        let (mut tool, camera) = tool();
        let mut preferences = CameraPreferences::default();
        preferences.mouse_wheel_invert = true;
        tool.set_preferences(preferences);

        let mut input = InputState::new();
        input.set_scroll(0.0, 1.0);
        tool.mouse_scroll(&input);
        assert_vec_eq(camera.borrow().position(), Vec3::new(0.0, -6.0, 0.0));
    }

    #[test]
    fn test_right_release_after_movement_is_consumed() {
        let (mut tool, _) = tool();
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(!tool.mouse_up(&input, MouseButton::Right));

        input.set_mouse_position(10.0, 0.0);
        input.handle_mouse_button(MouseButton::Right, ElementState::Released);
        assert!(tool.mouse_up(&input, MouseButton::Right));
        assert!(!tool.mouse_up(&input, MouseButton::Left));
    }

    #[test]
    fn test_right_drag_looks_without_moving() {
        let (mut tool, camera) = tool();
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        let mut tracker = tool.accept_mouse_drag(&input).expect("look tracker");

        input.set_mouse_position(20.0, 0.0);
        assert!(tracker.drag(&input).unwrap());
        let camera = camera.borrow();
        assert_vec_eq(camera.position(), Vec3::ZERO);
        assert!(camera.direction().x.abs() > 0.01);
    }

    #[test]
    fn test_alt_right_drag_orbits_around_hit() {
        let (mut tool, camera) = tool();
        let mut input = InputState::new();
        let mut hits = PickResult::new();
        let center = Vec3::new(0.0, 100.0, 0.0);
        hits.add_hit(Hit::new(HitType::free_type(), 100.0, center, HitTarget::None, 0.0));
        input.set_pick_result(hits);
        input.set_modifiers(ModifiersState::ALT);
        input.handle_mouse_button(MouseButton::Right, ElementState::Pressed);

        let mut tracker = tool.accept_mouse_drag(&input).expect("orbit tracker");
        input.set_mouse_position(30.0, 0.0);
        tracker.drag(&input).unwrap();

        let camera = camera.borrow();
        assert!((camera.position().distance(center) - 100.0).abs() < 1e-2);
        assert!(camera.position().x.abs() > 1.0);
    }

    #[test]
    fn test_middle_drag_pans_in_view_plane() {
        let (mut tool, camera) = tool();
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Middle, ElementState::Pressed);
        let mut tracker = tool.accept_mouse_drag(&input).expect("pan tracker");

        input.set_mouse_position(10.0, 0.0);
        tracker.drag(&input).unwrap();
        let position = camera.borrow().position();
        assert_vec_eq(position, Vec3::new(-5.0, 0.0, 0.0));
    }

    #[test]
    fn test_alt_middle_drag_moves_forward() {
        let (mut tool, camera) = tool();
        let mut input = InputState::new();
        input.set_modifiers(ModifiersState::ALT);
        input.handle_mouse_button(MouseButton::Middle, ElementState::Pressed);
        let mut tracker = tool.accept_mouse_drag(&input).expect("move tracker");

        input.set_mouse_position(0.0, -1.0);
        tracker.drag(&input).unwrap();
        assert_vec_eq(camera.borrow().position(), Vec3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn test_left_drag_is_ignored() {
        let (mut tool, _) = tool();
        let mut input = InputState::new();
        input.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(tool.accept_mouse_drag(&input).is_none());
        assert!(!tool.cancel());
    }
}
