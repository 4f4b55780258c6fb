//! Orbit controller for touch and mouse input
//!
//! Pointer deltas from orbit gestures accumulate here and are applied once
//! per frame to anything implementing [`CameraControl`]:
//! - Horizontal drag: yaw around the focus point
//! - Vertical drag: pitch around the focus point
//!
//! Input is dropped while disabled (during a drag) and while the camera is
//! in an eased transition.

use cagebox_math::Vec3;

/// Orbit controller state
pub struct OrbitController {
    enabled: bool,
    pending_yaw: f32,
    pending_pitch: f32,

    // Input smoothing state
    smooth_yaw: f32,
    smooth_pitch: f32,

    // Configuration
    /// Radians per pixel of pointer travel
    pub rotate_speed: f32,
    pub smoothing_half_life: f32, // Exponential smoothing half-life in seconds
    pub smoothing_enabled: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pending_yaw: 0.0,
            pending_pitch: 0.0,

            smooth_yaw: 0.0,
            smooth_pitch: 0.0,

            rotate_speed: 0.005,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
        }
    }

    /// Accumulate an orbit delta in pixels
    pub fn process_orbit(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.pending_yaw += dx;
        self.pending_pitch += dy;
    }

    /// Enable or disable input; disabling drops anything pending
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::debug!("Orbit input {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        if !enabled {
            self.reset();
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply accumulated input to the camera
    ///
    /// Returns the camera position for debug display.
    pub fn update<C: CameraControl>(&mut self, camera: &mut C, dt: f32) -> Vec3 {
        if !self.enabled || camera.is_transitioning() {
            self.reset();
            return camera.position();
        }

        let (yaw_input, pitch_input) = if self.smoothing_enabled && dt > 0.0 {
            // new = old * factor + input * (1 - factor), factor = 2^(-dt / half_life)
            let smooth_factor = 2.0f32.powf(-dt / self.smoothing_half_life);
            self.smooth_yaw = self.smooth_yaw * smooth_factor + self.pending_yaw * (1.0 - smooth_factor);
            self.smooth_pitch = self.smooth_pitch * smooth_factor + self.pending_pitch * (1.0 - smooth_factor);
            (self.smooth_yaw, self.smooth_pitch)
        } else {
            (self.pending_yaw, self.pending_pitch)
        };

        // Drag right swings the camera left around the focus; drag down raises it
        if yaw_input != 0.0 || pitch_input != 0.0 {
            camera.orbit(-yaw_input * self.rotate_speed, pitch_input * self.rotate_speed);
        }

        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;

        camera.position()
    }

    /// Whether any input is waiting to be applied
    pub fn has_pending(&self) -> bool {
        self.pending_yaw != 0.0 || self.pending_pitch != 0.0
    }

    /// Toggle input smoothing on/off
    pub fn toggle_smoothing(&mut self) -> bool {
        self.smoothing_enabled = !self.smoothing_enabled;
        self.smooth_yaw = 0.0;
        self.smooth_pitch = 0.0;
        self.smoothing_enabled
    }

    fn reset(&mut self) {
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.smooth_yaw = 0.0;
        self.smooth_pitch = 0.0;
    }

    /// Builder: set radians per pixel
    pub fn with_rotate_speed(mut self, speed: f32) -> Self {
        self.rotate_speed = speed;
        self
    }

    /// Builder: set smoothing half-life (lower = more responsive)
    pub fn with_smoothing_half_life(mut self, half_life: f32) -> Self {
        self.smoothing_half_life = half_life;
        self
    }

    /// Builder: enable or disable smoothing
    pub fn with_smoothing(mut self, enabled: bool) -> Self {
        self.smoothing_enabled = enabled;
        self
    }
}

/// Trait for camera control
/// Lets the controller drive different camera implementations
pub trait CameraControl {
    /// Rotate around the focus point at constant distance
    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32);
    /// Whether an eased transition currently owns the camera
    fn is_transitioning(&self) -> bool;
    fn position(&self) -> Vec3;
}
