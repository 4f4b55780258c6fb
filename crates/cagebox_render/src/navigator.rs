//! Smooth camera navigation between focus targets
//!
//! ```text
//! Idle (no target) --first focus--> Following <--done-- Transitioning
//!                                      |                     ^
//!                                      +---new target--------+
//! ```
//!
//! The camera's offset from its look-at point is kept in spherical form
//! ([`FocusState`]). Each transition re-measures that offset from the
//! camera's actual pose and re-applies it around the new target, so the
//! viewing angle a user orbited to survives the next selection.

use std::time::Duration;

use cagebox_input::CameraControl;
use cagebox_math::{Quat, Vec3};

use crate::camera::Camera;

/// Pitch limit short of the poles, in radians
pub const MAX_PITCH: f32 = 1.5;

/// Cubic ease-in-out on [0, 1]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Camera offset from its look-at point in spherical coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusState {
    pub distance: f32,
    /// Angle about +Y measured from +Z, in radians
    pub yaw: f32,
    /// Elevation above the target, in radians
    pub pitch: f32,
}

impl Default for FocusState {
    fn default() -> Self {
        Self {
            distance: 4.0,
            yaw: 0.0,
            pitch: 0.3,
        }
    }
}

impl FocusState {
    /// Measure the offset of `camera` from `target`
    ///
    /// `None` when the two coincide and no direction exists.
    pub fn from_positions(camera: Vec3, target: Vec3) -> Option<Self> {
        let offset = camera - target;
        let distance = offset.length();
        if !distance.is_finite() || distance < 1e-6 {
            return None;
        }
        Some(Self {
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
        })
    }

    /// Camera position this offset puts around `target`
    pub fn camera_position(&self, target: Vec3) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        target
            + Vec3::new(
                sin_yaw * self.distance * cos_pitch,
                sin_pitch * self.distance,
                cos_yaw * self.distance * cos_pitch,
            )
    }
}

/// Navigator tunables
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigatorConfig {
    pub transition: Duration,
    /// Exponential follow rate per second
    pub follow_rate: f32,
    /// Whether the Following phase moves the camera at all
    pub follow_enabled: bool,
    /// Offset used until the first measurement
    pub default_focus: FocusState,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_millis(2000),
            follow_rate: 5.0,
            follow_enabled: true,
            default_focus: FocusState::default(),
        }
    }
}

/// Navigation phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationPhase {
    /// No focus target yet
    #[default]
    Idle,
    /// Holding the focus offset around the target
    Following,
    /// Eased move to a new target
    Transitioning,
}

/// Transition bookkeeping
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub start_position: Vec3,
    pub end_position: Vec3,
    pub start_orientation: Quat,
    pub end_orientation: Quat,
    pub start_look_at: Vec3,
    pub end_look_at: Vec3,
    /// Seconds since the transition started
    pub elapsed: f32,
}

/// Owns the camera and moves it between focus targets
#[derive(Clone, Debug)]
pub struct CameraNavigator {
    camera: Camera,
    config: NavigatorConfig,
    phase: NavigationPhase,
    focus: FocusState,
    look_at: Vec3,
    target: Option<Vec3>,
    transition: Option<Transition>,
}

impl CameraNavigator {
    /// Navigator for `camera`, initially looking at `look_at`
    pub fn new(mut camera: Camera, look_at: Vec3, config: NavigatorConfig) -> Self {
        camera.look_at(look_at);
        Self {
            camera,
            config,
            phase: NavigationPhase::Idle,
            focus: config.default_focus,
            look_at,
            target: None,
            transition: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> NavigationPhase {
        self.phase
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    /// Point the camera is currently aimed at
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Move the focus to `new_target`
    ///
    /// The first focus ever is adopted in place: the camera stays where it
    /// is, aims at the target and records its offset. Later calls start an
    /// eased transition from the camera's actual pose.
    pub fn start_transition_to(&mut self, new_target: Vec3) {
        if !new_target.is_finite() {
            log::warn!("Ignoring non-finite focus target {:?}", new_target);
            return;
        }

        if self.target.is_none() {
            if let Some(focus) = FocusState::from_positions(self.camera.position, new_target) {
                self.focus = focus;
            }
            self.camera.look_at(new_target);
            self.look_at = new_target;
            self.target = Some(new_target);
            self.phase = NavigationPhase::Following;
            log::debug!("Adopted first focus {:?} at distance {:.2}", new_target, self.focus.distance);
            return;
        }

        // Zero distance keeps the previous offset
        if let Some(focus) = FocusState::from_positions(self.camera.position, self.look_at) {
            self.focus = focus;
        }
        let end_position = self.focus.camera_position(new_target);
        let end_orientation = Quat::look_rotation(new_target - end_position, Vec3::Y);

        self.transition = Some(Transition {
            start_position: self.camera.position,
            end_position,
            start_orientation: self.camera.orientation,
            end_orientation,
            start_look_at: self.look_at,
            end_look_at: new_target,
            elapsed: 0.0,
        });
        self.target = Some(new_target);
        self.phase = NavigationPhase::Transitioning;
        log::debug!(
            "Transition to {:?}: distance {:.2}, yaw {:.2}, pitch {:.2}",
            new_target,
            self.focus.distance,
            self.focus.yaw,
            self.focus.pitch
        );
    }

    /// Change the followed target without an eased transition
    ///
    /// Ignored while a transition is running.
    pub fn track(&mut self, target: Vec3) {
        match self.phase {
            NavigationPhase::Transitioning => {}
            NavigationPhase::Idle => self.start_transition_to(target),
            NavigationPhase::Following => self.target = Some(target),
        }
    }

    /// Forget the target and stop moving the camera
    pub fn clear_target(&mut self) {
        self.target = None;
        self.transition = None;
        self.phase = NavigationPhase::Idle;
    }

    /// Advance by one frame
    pub fn update(&mut self, dt: f32) {
        match self.phase {
            NavigationPhase::Idle => {}
            NavigationPhase::Transitioning => self.update_transition(dt),
            NavigationPhase::Following => self.update_follow(dt),
        }
    }

    fn update_transition(&mut self, dt: f32) {
        let Some(transition) = self.transition.as_mut() else {
            self.phase = NavigationPhase::Following;
            return;
        };
        transition.elapsed += dt.max(0.0);
        let duration = self.config.transition.as_secs_f32();
        let progress = if duration > 0.0 {
            (transition.elapsed / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            // Snap exactly to the end values
            self.camera.position = transition.end_position;
            self.camera.orientation = transition.end_orientation;
            self.look_at = transition.end_look_at;
            self.transition = None;
            self.phase = NavigationPhase::Following;
            log::debug!("Transition finished at {:?}", self.camera.position);
            return;
        }

        let eased = ease_in_out_cubic(progress);
        self.camera.position = transition.start_position.lerp(transition.end_position, eased);
        self.camera.orientation = transition.start_orientation.slerp(transition.end_orientation, eased);
        self.look_at = transition.start_look_at.lerp(transition.end_look_at, eased);
    }

    fn update_follow(&mut self, dt: f32) {
        let Some(target) = self.target else {
            return;
        };
        if !self.config.follow_enabled || dt <= 0.0 {
            return;
        }
        let desired = self.focus.camera_position(target);
        let factor = 1.0 - (-self.config.follow_rate * dt).exp();
        self.camera.position = self.camera.position.lerp(desired, factor);
        self.look_at = self.look_at.lerp(target, factor);
        self.camera.look_at(self.look_at);
    }

    /// Rotate around the look-at point at constant distance
    fn orbit_by(&mut self, delta_yaw: f32, delta_pitch: f32) {
        if self.phase == NavigationPhase::Transitioning {
            return;
        }
        let Some(mut focus) = FocusState::from_positions(self.camera.position, self.look_at) else {
            return;
        };
        focus.yaw += delta_yaw;
        focus.pitch = (focus.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.focus = focus;
        self.camera.position = focus.camera_position(self.look_at);
        self.camera.look_at(self.look_at);
    }
}

impl CameraControl for CameraNavigator {
    fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.orbit_by(delta_yaw, delta_pitch);
    }

    fn is_transitioning(&self) -> bool {
        self.phase == NavigationPhase::Transitioning
    }

    fn position(&self) -> Vec3 {
        self.camera.position
    }
}
