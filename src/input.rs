//! Pointer tracking for the simulation.
//!
//! [`PointerInput`] turns raw winit cursor and button events into the
//! NDC pointer the force model consumes. Only the left button counts as a
//! press. While detached, events are ignored and the pointer reads as
//! released.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

/// Pointer position in NDC and whether it is pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub ndc: Vec2,
    pub pressed: bool,
}

#[derive(Debug, Clone)]
pub struct PointerInput {
    attached: bool,
    /// Last cursor position in physical pixels.
    position: Vec2,
    ndc: Vec2,
    pressed: bool,
    window_size: (u32, u32),
}

impl Default for PointerInput {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerInput {
    /// Create an attached tracker.
    pub fn new() -> Self {
        Self {
            attached: true,
            position: Vec2::ZERO,
            ndc: Vec2::ZERO,
            pressed: false,
            window_size: (800, 600),
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop listening. The pointer is released immediately.
    pub fn detach(&mut self) {
        self.attached = false;
        self.pressed = false;
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn state(&self) -> PointerState {
        PointerState {
            ndc: self.ndc,
            pressed: self.pressed,
        }
    }

    /// Update the size used to map pixels to NDC. Re-maps the last position.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.ndc = to_ndc(self.position, width, height);
    }

    /// Feed a window event. Returns the new state if the pointer changed.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<PointerState> {
        if !self.attached {
            return None;
        }
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.position = Vec2::new(position.x as f32, position.y as f32);
                let (w, h) = self.window_size;
                self.ndc = to_ndc(self.position, w, h);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.pressed = *state == ElementState::Pressed;
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                if !self.pressed {
                    return None;
                }
                self.pressed = false;
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            _ => return None,
        }
        Some(self.state())
    }
}

/// Map a pixel position (origin top-left, Y down) to NDC (Y up).
pub fn to_ndc(position: Vec2, width: u32, height: u32) -> Vec2 {
    let size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    Vec2::new(
        position.x / size.x * 2.0 - 1.0,
        1.0 - position.y / size.y * 2.0,
    )
}
