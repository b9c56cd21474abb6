//! Input state tracking for map views

use crate::pick::PickResult;
use glam::Vec2;
use renderer::core::{Camera, Ray3};
use std::collections::HashSet;
use tracing::trace;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::ModifiersState;

/// Mouse, modifier and picking state handed to the tools
#[derive(Debug, Clone)]
pub struct InputState {
    /// Mouse position in window coordinates, origin at the top left
    mouse_position: Vec2,
    /// Mouse movement since the last event
    mouse_delta: Vec2,
    /// Scroll distance of the last wheel event
    scroll: Vec2,
    mouse_buttons_pressed: HashSet<MouseButton>,
    modifiers: ModifiersState,
    /// Whether the mouse moved while a button was held since the last press
    moved_since_press: bool,
    pick_ray: Ray3,
    pick_result: PickResult,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_position: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            scroll: Vec2::ZERO,
            mouse_buttons_pressed: HashSet::new(),
            modifiers: ModifiersState::empty(),
            moved_since_press: false,
            pick_ray: Ray3::new(glam::Vec3::ZERO, glam::Vec3::Y),
            pick_result: PickResult::new(),
        }
    }

    /// Clear per-event data (mouse delta and scroll)
    pub fn clear_frame_data(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Move the mouse, accumulating the delta since the last clear
    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
        if !self.mouse_buttons_pressed.is_empty() && self.mouse_delta != Vec2::ZERO {
            self.moved_since_press = true;
        }
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll.y
    }

    pub fn set_scroll(&mut self, dx: f32, dy: f32) {
        self.scroll = Vec2::new(dx, dy);
        trace!("Scroll: ({}, {})", dx, dy);
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons_pressed.insert(button);
                self.moved_since_press = false;
                trace!("Mouse button pressed: {:?}", button);
            }
            ElementState::Released => {
                self.mouse_buttons_pressed.remove(&button);
                trace!("Mouse button released: {:?}", button);
            }
        }
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    /// Whether `button` is the only pressed button
    pub fn only_mouse_button(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.len() == 1 && self.is_mouse_button_pressed(button)
    }

    pub fn no_mouse_buttons(&self) -> bool {
        self.mouse_buttons_pressed.is_empty()
    }

    pub fn moved_since_press(&self) -> bool {
        self.moved_since_press
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    pub fn modifiers(&self) -> ModifiersState {
        self.modifiers
    }

    pub fn alt(&self) -> bool {
        self.modifiers.alt_key()
    }

    pub fn shift(&self) -> bool {
        self.modifiers.shift_key()
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.control_key()
    }

    pub fn pick_ray(&self) -> &Ray3 {
        &self.pick_ray
    }

    pub fn set_pick_ray(&mut self, ray: Ray3) {
        self.pick_ray = ray;
    }

    /// Recompute the pick ray through the mouse position
    pub fn update_pick_ray(&mut self, camera: &Camera) {
        let viewport = camera.viewport();
        let window = Vec2::new(
            self.mouse_position.x,
            (viewport.y + viewport.height) as f32 - self.mouse_position.y,
        );
        self.pick_ray = camera.pick_ray(window);
    }

    pub fn pick_result(&self) -> &PickResult {
        &self.pick_result
    }

    pub fn pick_result_mut(&mut self) -> &mut PickResult {
        &mut self.pick_result
    }

    pub fn set_pick_result(&mut self, pick_result: PickResult) {
        self.pick_result = pick_result;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::core::Viewport;

    #[test]
    fn test_input_state_mouse() {
        let mut state = InputState::new();

        state.set_mouse_position(100.0, 200.0);
        assert_eq!(state.mouse_position(), Vec2::new(100.0, 200.0));

        state.clear_frame_data();
        state.set_mouse_position(105.0, 197.0);
        assert_eq!(state.mouse_delta(), Vec2::new(5.0, -3.0));

        state.clear_frame_data();
        assert_eq!(state.mouse_delta(), Vec2::ZERO);

        state.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(state.is_mouse_button_pressed(MouseButton::Left));
        assert!(state.only_mouse_button(MouseButton::Left));

        state.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!state.is_mouse_button_pressed(MouseButton::Left));
        assert!(state.no_mouse_buttons());
    }

    #[test]
    fn test_moved_since_press() {
        let mut state = InputState::new();
        state.set_mouse_position(10.0, 10.0);
        state.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(!state.moved_since_press());

        state.clear_frame_data();
        state.set_mouse_position(12.0, 10.0);
        assert!(state.moved_since_press());

        // Releasing keeps the flag for the mouse-up handlers
        state.handle_mouse_button(MouseButton::Right, ElementState::Released);
        assert!(state.moved_since_press());

        state.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(!state.moved_since_press());
    }

    #[test]
    fn test_modifiers() {
        let mut state = InputState::new();
        assert!(!state.alt());
        state.set_modifiers(ModifiersState::ALT | ModifiersState::SHIFT);
        assert!(state.alt());
        assert!(state.shift());
        assert!(!state.ctrl());
    }

    #[test]
    fn test_pick_ray_through_window_center() {
        let camera = Camera::perspective(90.0, 1.0, 1000.0, Viewport::new(0, 0, 200, 100));
        let mut state = InputState::new();
        state.set_mouse_position(100.0, 50.0);
        state.update_pick_ray(&camera);
        assert!((state.pick_ray().direction - glam::Vec3::Y).length() < 1e-4);
    }
}
