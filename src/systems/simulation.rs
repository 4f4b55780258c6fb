//! Sandbox simulation system
//!
//! Runs one frame in a fixed order:
//! 1. Fire due long-press timers
//! 2. Step physics and sync bodies into the scene graph
//! 3. Answer pending press/tap picks against this frame's scene
//! 4. Solve the active drag
//! 5. Apply orbit input
//! 6. Advance the camera navigator
//!
//! Pointer events arrive between frames through [`SimulationSystem::handle_pointer`].

use std::time::Instant;

use cagebox_core::{InstanceId, Vec3};
use cagebox_input::{
    CageRotateGesture, GestureIntent, GesturePhase, InteractionContext, OrbitController, PointerEvent, PointerPhase,
    PointerInteractionProtocol, Viewport,
};
use cagebox_render::{switch_highlight, CameraNavigator, NavigationPhase, SelectionHighlights};

use super::drag::{DragSolver, ScenePicker};
use crate::config::AppConfig;
use crate::scene::Sandbox;

/// Largest frame delta fed to the simulation, in seconds
const MAX_FRAME_DT: f32 = 0.25;

/// Result of a simulation update
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Frame delta actually simulated
    pub dt: f32,
    /// Fixed physics substeps taken
    pub substeps: u32,
    /// Where the dragged body was forced to, if anywhere
    pub dragged: Option<Vec3>,
}

/// Manages the sandbox frame loop and pointer routing
pub struct SimulationSystem {
    last_frame: Instant,
    viewport: Viewport,
    protocol: PointerInteractionProtocol,
    interaction: InteractionContext,
    orbit: OrbitController,
    cage_rotate: CageRotateGesture,
    cage_rotate_mode: bool,
    drag: DragSolver,
    highlights: SelectionHighlights,
    track_selection: bool,
}

impl SimulationSystem {
    /// Create a simulation system with default tuning
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            viewport: Viewport::default(),
            protocol: PointerInteractionProtocol::default(),
            interaction: InteractionContext::new(),
            orbit: OrbitController::new(),
            cage_rotate: CageRotateGesture::new(),
            cage_rotate_mode: false,
            drag: DragSolver::default(),
            highlights: SelectionHighlights::new(),
            track_selection: false,
        }
    }

    /// Create a simulation system tuned from config
    pub fn from_config(config: &AppConfig) -> Self {
        let orbit = OrbitController::new()
            .with_rotate_speed(config.input.orbit_rotate_speed)
            .with_smoothing_half_life(config.input.smoothing_half_life)
            .with_smoothing(config.input.smoothing_enabled);
        Self {
            protocol: PointerInteractionProtocol::new(config.input.to_pointer_config()),
            orbit,
            drag: DragSolver::new(config.input.to_drag_config()),
            track_selection: config.navigation.track_selection,
            ..Self::new()
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Track the surface size used to normalize pointer positions
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn interaction(&self) -> &InteractionContext {
        &self.interaction
    }

    pub fn protocol(&self) -> &PointerInteractionProtocol {
        &self.protocol
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    pub fn highlights(&self) -> &SelectionHighlights {
        &self.highlights
    }

    pub fn is_cage_rotate_mode(&self) -> bool {
        self.cage_rotate_mode
    }

    /// Whether a pointer gesture of any kind is in progress
    pub fn is_gesture_active(&self) -> bool {
        self.protocol.phase() != GesturePhase::Idle || self.cage_rotate.is_active()
    }

    /// Switch pointer input between camera/object gestures and cage rotation
    ///
    /// Any gesture in progress is cancelled first.
    pub fn toggle_cage_rotate(&mut self, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) -> bool {
        self.cancel_gesture(sandbox, navigator);
        self.cage_rotate_mode = !self.cage_rotate_mode;
        log::info!("Cage rotate mode: {}", if self.cage_rotate_mode { "ON" } else { "OFF" });
        self.cage_rotate_mode
    }

    /// Route one primary-pointer event
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        sandbox: &mut Sandbox,
        navigator: &mut CameraNavigator,
        now: Instant,
    ) {
        if self.cage_rotate_mode {
            match event.phase {
                PointerPhase::Down => self.cage_rotate.begin(event.position, self.viewport),
                PointerPhase::Move => {
                    if let Some(delta) = self.cage_rotate.moved(event.position, self.viewport) {
                        sandbox.rotate_cage(delta);
                    }
                }
                PointerPhase::Up | PointerPhase::Cancel => self.cage_rotate.end(),
            }
            return;
        }

        let ctx = &mut self.interaction;
        let intents = match event.phase {
            PointerPhase::Down => self.protocol.press(ctx, event.position, self.viewport, now),
            PointerPhase::Move => self.protocol.moved(ctx, event.position),
            PointerPhase::Up => self.protocol.release(ctx, event.position, now),
            PointerPhase::Cancel => self.protocol.cancel(ctx),
        };
        self.apply_intents(intents, sandbox, navigator);
    }

    /// Abort whatever gesture is in progress without selecting anything
    pub fn cancel_gesture(&mut self, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) {
        self.cage_rotate.end();
        let intents = self.protocol.cancel(&mut self.interaction);
        self.apply_intents(intents, sandbox, navigator);
        self.interaction.pending_tap = None;
    }

    /// Despawn every instance and drop the selection highlight
    pub fn clear_instances(&mut self, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) {
        self.cancel_gesture(sandbox, navigator);
        switch_highlight(&mut self.highlights, sandbox.scene.selected.as_ref(), None);
        sandbox.clear();
    }

    /// Run one frame using wall-clock time since the previous call
    pub fn update(&mut self, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) -> FrameReport {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f32();
        // The physics accumulator further subdivides into fixed substeps
        let dt = raw_dt.min(MAX_FRAME_DT);
        self.last_frame = now;
        self.frame(sandbox, navigator, now, dt)
    }

    /// Run one frame of `dt` seconds ending at `now`
    pub fn frame(
        &mut self,
        sandbox: &mut Sandbox,
        navigator: &mut CameraNavigator,
        now: Instant,
        dt: f32,
    ) -> FrameReport {
        // 1. Long-press timers
        let intents = self.protocol.poll(&mut self.interaction, now);
        self.apply_intents(intents, sandbox, navigator);

        // 2. Physics and binding sync
        let substeps = sandbox.step(dt);

        // 3. Press and tap picks see this frame's poses
        let intents = {
            let picker = ScenePicker::new(&sandbox.graph, navigator.camera());
            self.protocol.resolve_picks(&mut self.interaction, &picker)
        };
        self.apply_intents(intents, sandbox, navigator);

        // 4. Drag
        let dragged = self.drag.solve(&mut self.interaction, navigator.camera(), sandbox);

        // 5. Orbit
        self.orbit.update(navigator, dt);

        // 6. Camera
        if self.track_selection && navigator.phase() == NavigationPhase::Following {
            if let Some(position) = sandbox.scene.selected.as_ref().and_then(|id| sandbox.body_position(id)) {
                navigator.track(position);
            }
        }
        navigator.update(dt);
        self.highlights.update(dt);

        log::trace!("Frame: dt {:.4}, {} substeps", dt, substeps);
        FrameReport { dt, substeps, dragged }
    }

    fn apply_intents(&mut self, intents: Vec<GestureIntent>, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) {
        for intent in intents {
            match intent {
                GestureIntent::Orbit { dx, dy } => self.orbit.process_orbit(dx, dy),
                GestureIntent::Select { instance_id, point } => self.select(instance_id, point, sandbox, navigator),
                GestureIntent::DragStarted { .. } => self.orbit.set_enabled(false),
                GestureIntent::DragEnded { .. } => self.orbit.set_enabled(true),
            }
        }
    }

    fn select(&mut self, id: InstanceId, point: Vec3, sandbox: &mut Sandbox, navigator: &mut CameraNavigator) {
        let previous = sandbox.scene.selected.clone();
        if !sandbox.scene.select(Some(id.clone())) {
            return;
        }
        if let Some(material) = sandbox.scene.instance(&id).map(|i| i.material()) {
            switch_highlight(&mut self.highlights, previous.as_ref(), Some((&id, material)));
        }
        log::info!("Selected {}", id);
        navigator.start_transition_to(point);
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new()
    }
}
