//! Cage rotation gesture
//!
//! While cage-rotate mode is on, dragging a pointer around the viewport
//! centre turns the cage about Y by the swept angle.

use std::f32::consts::{PI, TAU};

use cagebox_math::Vec2;

use crate::gesture::Viewport;

/// Tracks the pointer angle around the viewport centre
#[derive(Clone, Copy, Debug, Default)]
pub struct CageRotateGesture {
    last_angle: Option<f32>,
}

impl CageRotateGesture {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.last_angle.is_some()
    }

    pub fn begin(&mut self, position: Vec2, viewport: Viewport) {
        self.last_angle = pointer_angle(position, viewport);
    }

    /// Angle swept since the previous event, wrapped to [-PI, PI]
    pub fn moved(&mut self, position: Vec2, viewport: Viewport) -> Option<f32> {
        let angle = pointer_angle(position, viewport)?;
        let last = self.last_angle.replace(angle)?;
        Some(wrap_angle(angle - last))
    }

    pub fn end(&mut self) {
        self.last_angle = None;
    }
}

fn pointer_angle(position: Vec2, viewport: Viewport) -> Option<f32> {
    if !viewport.is_valid() {
        return None;
    }
    let c = viewport.center();
    Some((position.y - c.y).atan2(position.x - c.x))
}

fn wrap_angle(mut delta: f32) -> f32 {
    if delta > PI {
        delta -= TAU;
    }
    if delta < -PI {
        delta += TAU;
    }
    delta
}
