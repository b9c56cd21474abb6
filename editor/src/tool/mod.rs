//! Tools react to input in a map view
//!
//! A [`ToolController`] receives input events for one [`Tool`]. Every
//! policy has a default that ignores the event, so a controller only
//! implements what it needs. Drags are handled either by returning a
//! [`DragTracker`] from [`ToolController::accept_mouse_drag`] or through
//! the `*_mouse_drag` methods.

mod camera_tool;

pub use camera_tool::CameraTool3D;

use crate::error::Result;
use crate::input::InputState;
use crate::pick::PickResult;
use renderer::render::{RenderBatch, RenderState};
use winit::event::MouseButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    active: bool,
}

impl Tool {
    pub fn new(initially_active: bool) -> Self {
        Self {
            active: initially_active,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

/// Follows the mouse while a button is held
pub trait DragTracker {
    /// Returns false to end the drag
    fn drag(&mut self, input: &InputState) -> Result<bool>;

    fn end(&mut self, input: &InputState) -> Result<()>;

    fn cancel(&mut self) -> Result<()>;
}

pub trait ToolController {
    fn tool(&self) -> &Tool;

    fn tool_mut(&mut self) -> &mut Tool;

    fn pick(&self, _input: &InputState, _pick_result: &mut PickResult) {}

    fn mouse_scroll(&mut self, _input: &InputState) {}

    /// Returns true if the release of `button` was consumed
    fn mouse_up(&mut self, _input: &InputState, _button: MouseButton) -> bool {
        false
    }

    fn accept_mouse_drag(&mut self, _input: &InputState) -> Option<Box<dyn DragTracker>> {
        None
    }

    /// Returns true if this controller takes over the drag
    fn start_mouse_drag(&mut self, _input: &InputState) -> Result<bool> {
        Ok(false)
    }

    fn mouse_drag(&mut self, _input: &InputState) -> Result<bool> {
        Ok(false)
    }

    fn end_mouse_drag(&mut self, _input: &InputState) -> Result<()> {
        Ok(())
    }

    fn cancel_mouse_drag(&mut self) -> Result<()> {
        Ok(())
    }

    fn render(
        &self,
        _input: &InputState,
        _state: &RenderState<'_>,
        _batch: &mut RenderBatch,
    ) -> renderer::Result<()> {
        Ok(())
    }

    /// Returns true if there was something to cancel
    fn cancel(&mut self) -> bool {
        false
    }
}
