//! winit pointer adapter
//!
//! Folds touch and mouse events into one primary-pointer stream. Only the
//! first finger down is tracked; further fingers are ignored until it
//! lifts. The left mouse button behaves like a finger.

use cagebox_math::Vec2;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, TouchPhase};

/// Lifecycle of the primary pointer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One primary-pointer event in physical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Vec2,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Vec2) -> Self {
        Self { phase, position }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ActivePointer {
    Touch(u64),
    Mouse,
}

/// Picks the primary pointer out of raw winit events
#[derive(Debug, Default)]
pub struct PointerTracker {
    active: Option<ActivePointer>,
    cursor: Vec2,
}

fn to_vec2(location: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(location.x as f32, location.y as f32)
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pointer is currently down
    #[inline]
    pub fn is_down(&self) -> bool {
        self.active.is_some()
    }

    /// Last known cursor position
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Handle a `WindowEvent::Touch`
    pub fn touch(&mut self, id: u64, phase: TouchPhase, location: PhysicalPosition<f64>) -> Option<PointerEvent> {
        let position = to_vec2(location);
        match phase {
            TouchPhase::Started => {
                if self.active.is_some() {
                    log::trace!("Ignoring secondary touch {}", id);
                    return None;
                }
                self.active = Some(ActivePointer::Touch(id));
                Some(PointerEvent::new(PointerPhase::Down, position))
            }
            _ if self.active != Some(ActivePointer::Touch(id)) => None,
            TouchPhase::Moved => Some(PointerEvent::new(PointerPhase::Move, position)),
            TouchPhase::Ended => {
                self.active = None;
                Some(PointerEvent::new(PointerPhase::Up, position))
            }
            TouchPhase::Cancelled => {
                self.active = None;
                Some(PointerEvent::new(PointerPhase::Cancel, position))
            }
        }
    }

    /// Handle a `WindowEvent::CursorMoved`
    pub fn cursor_moved(&mut self, location: PhysicalPosition<f64>) -> Option<PointerEvent> {
        self.cursor = to_vec2(location);
        (self.active == Some(ActivePointer::Mouse)).then(|| PointerEvent::new(PointerPhase::Move, self.cursor))
    }

    /// Handle a `WindowEvent::MouseInput`
    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) -> Option<PointerEvent> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed if self.active.is_none() => {
                self.active = Some(ActivePointer::Mouse);
                Some(PointerEvent::new(PointerPhase::Down, self.cursor))
            }
            ElementState::Released if self.active == Some(ActivePointer::Mouse) => {
                self.active = None;
                Some(PointerEvent::new(PointerPhase::Up, self.cursor))
            }
            _ => None,
        }
    }

    /// Drop the active pointer, e.g. when the window loses focus
    pub fn cancel(&mut self) -> Option<PointerEvent> {
        self.active
            .take()
            .map(|_| PointerEvent::new(PointerPhase::Cancel, self.cursor))
    }
}
