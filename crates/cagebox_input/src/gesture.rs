//! Pointer gesture classification
//!
//! One gesture runs from press to release:
//!
//! ```text
//! Idle -> Pressed -> LongPressPending -> Dragging -> Idle
//!            |              |
//!            +--------------+--> Orbiting -> Idle   (moved past the threshold)
//!            +--> Idle, with a tap pick             (released in place)
//! ```
//!
//! Raycasts are never done inside an event callback. The protocol leaves
//! [`PendingPick`]s in the [`InteractionContext`] and the frame loop
//! answers them through [`PointerInteractionProtocol::resolve_picks`].

use std::time::{Duration, Instant};

use cagebox_core::InstanceId;
use cagebox_math::{Vec2, Vec3};

use crate::interaction::{InteractionContext, PendingPick};
use crate::timer::{DeferredTasks, TaskHandle};

/// Size of the surface pointer coordinates are measured in
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Pixel position to normalized device coordinates (+Y up)
    pub fn to_ndc(&self, position: Vec2) -> Option<Vec2> {
        if !self.is_valid() {
            return None;
        }
        Some(Vec2::new(
            position.x / self.width * 2.0 - 1.0,
            -(position.y / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Tunables for gesture classification
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerConfig {
    /// Movement in pixels beyond which a press becomes an orbit
    pub tap_threshold_px: f32,
    /// Hold time before a press over an object becomes a drag
    pub long_press: Duration,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            tap_threshold_px: 10.0,
            long_press: Duration::from_millis(1000),
        }
    }
}

/// Where the current gesture is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GesturePhase {
    #[default]
    Idle,
    /// Down, not moved, press pick not (yet) on an instance
    Pressed,
    /// Down over an instance, waiting for the long-press timer
    LongPressPending,
    /// Moved past the threshold; moves drive the camera
    Orbiting,
    Dragging,
}

/// Nearest instance under a pointer
#[derive(Clone, Debug, PartialEq)]
pub struct PickHit {
    pub instance_id: InstanceId,
    /// World-space hit point
    pub point: Vec3,
    pub distance: f32,
}

/// Scene query used to answer picks
pub trait PickScene {
    /// Nearest hit carrying an instance id at the given NDC position
    fn pick(&self, ndc: Vec2) -> Option<PickHit>;
}

/// What a gesture asks the rest of the application to do
#[derive(Clone, Debug, PartialEq)]
pub enum GestureIntent {
    /// Orbit the camera by a pointer delta in pixels
    Orbit { dx: f32, dy: f32 },
    /// Select an instance and focus the camera on `point`
    Select { instance_id: InstanceId, point: Vec3 },
    DragStarted { instance_id: InstanceId },
    DragEnded { instance_id: InstanceId },
}

/// Turns raw pointer events into taps, orbits and drags
#[derive(Debug)]
pub struct PointerInteractionProtocol {
    config: PointerConfig,
    phase: GesturePhase,
    /// Incremented on every press; timers carry the id they were armed for
    gesture: u64,
    viewport: Viewport,
    pressed_at: Option<Instant>,
    start: Vec2,
    current: Vec2,
    /// Position the last orbit delta was measured from
    orbit_anchor: Vec2,
    press_hit: Option<InstanceId>,
    long_press_elapsed: bool,
    long_press: Option<TaskHandle>,
    timers: DeferredTasks<u64>,
}

impl Default for PointerInteractionProtocol {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}

impl PointerInteractionProtocol {
    pub fn new(config: PointerConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            gesture: 0,
            viewport: Viewport::default(),
            pressed_at: None,
            start: Vec2::ZERO,
            current: Vec2::ZERO,
            orbit_anchor: Vec2::ZERO,
            press_hit: None,
            long_press_elapsed: false,
            long_press: None,
            timers: DeferredTasks::new(),
        }
    }

    pub fn config(&self) -> &PointerConfig {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Id of the current (or most recent) gesture
    #[inline]
    pub fn gesture_id(&self) -> u64 {
        self.gesture
    }

    /// Whether a long-press timer is armed
    pub fn long_press_armed(&self) -> bool {
        self.long_press.is_some_and(|h| self.timers.is_pending(h))
    }

    /// Pointer went down
    ///
    /// An unfinished previous gesture is closed first, so its timer can
    /// never fire into this one.
    pub fn press(&mut self, ctx: &mut InteractionContext, position: Vec2, viewport: Viewport, now: Instant) -> Vec<GestureIntent> {
        let intents = if self.phase != GesturePhase::Idle {
            log::debug!("Press while gesture {} is still active; closing it", self.gesture);
            self.finish_gesture(ctx)
        } else {
            Vec::new()
        };

        self.gesture += 1;
        self.viewport = viewport;
        self.pressed_at = Some(now);
        self.start = position;
        self.current = position;
        self.orbit_anchor = position;
        self.phase = GesturePhase::Pressed;
        self.long_press = Some(self.timers.schedule(now + self.config.long_press, self.gesture));

        match viewport.to_ndc(position) {
            Some(ndc) => ctx.pending_press = Some(PendingPick { gesture: self.gesture, ndc }),
            None => log::warn!("Press on an empty viewport {:?}; no pick issued", viewport),
        }
        log::trace!("Gesture {} pressed at ({}, {})", self.gesture, position.x, position.y);
        intents
    }

    /// Pointer moved while down
    pub fn moved(&mut self, ctx: &mut InteractionContext, position: Vec2) -> Vec<GestureIntent> {
        self.current = position;
        match self.phase {
            GesturePhase::Idle => Vec::new(),
            GesturePhase::Pressed | GesturePhase::LongPressPending => {
                if position.distance(self.start) <= self.config.tap_threshold_px {
                    return Vec::new();
                }
                self.cancel_long_press();
                ctx.pending_press = None;
                self.press_hit = None;
                self.phase = GesturePhase::Orbiting;
                log::debug!("Gesture {} reclassified as orbit", self.gesture);
                vec![self.orbit_delta(position)]
            }
            GesturePhase::Orbiting => vec![self.orbit_delta(position)],
            GesturePhase::Dragging => {
                if let Some(ndc) = self.viewport.to_ndc(position) {
                    ctx.update_drag_pointer(ndc);
                }
                Vec::new()
            }
        }
    }

    /// Pointer lifted
    ///
    /// A press that stayed within the threshold, released before the long
    /// press fired and without a drag, leaves a tap pick. All gesture state
    /// is cleared regardless.
    pub fn release(&mut self, ctx: &mut InteractionContext, position: Vec2, now: Instant) -> Vec<GestureIntent> {
        self.current = position;
        let held = self
            .pressed_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        let is_tap = matches!(self.phase, GesturePhase::Pressed | GesturePhase::LongPressPending)
            && !self.long_press_elapsed
            && held < self.config.long_press
            && position.distance(self.start) <= self.config.tap_threshold_px
            && !ctx.is_dragging();

        if is_tap {
            match self.viewport.to_ndc(position) {
                Some(ndc) => {
                    log::debug!("Gesture {} classified as tap", self.gesture);
                    ctx.pending_tap = Some(PendingPick { gesture: self.gesture, ndc });
                }
                None => log::warn!("Tap on an empty viewport ignored"),
            }
        }
        self.finish_gesture(ctx)
    }

    /// Gesture aborted by the platform; never produces a tap
    pub fn cancel(&mut self, ctx: &mut InteractionContext) -> Vec<GestureIntent> {
        self.finish_gesture(ctx)
    }

    /// Fire due long-press timers
    pub fn poll(&mut self, ctx: &mut InteractionContext, now: Instant) -> Vec<GestureIntent> {
        let mut intents = Vec::new();
        for gesture in self.timers.poll(now) {
            let live = matches!(self.phase, GesturePhase::Pressed | GesturePhase::LongPressPending);
            if gesture != self.gesture || !live {
                log::trace!("Dropping stale long press for gesture {}", gesture);
                continue;
            }
            self.long_press = None;
            self.long_press_elapsed = true;
            match self.try_start_drag(ctx) {
                Some(intent) => intents.push(intent),
                None => log::trace!("Long press for gesture {} has no target", gesture),
            }
        }
        intents
    }

    /// Answer the press and tap picks against the scene
    pub fn resolve_picks<S: PickScene + ?Sized>(&mut self, ctx: &mut InteractionContext, scene: &S) -> Vec<GestureIntent> {
        let mut intents = Vec::new();

        if let Some(pending) = ctx.pending_press.take() {
            if pending.gesture == self.gesture && self.phase == GesturePhase::Pressed {
                if let Some(hit) = scene.pick(pending.ndc) {
                    log::trace!("Gesture {} pressed on {}", self.gesture, hit.instance_id);
                    self.press_hit = Some(hit.instance_id);
                    self.phase = GesturePhase::LongPressPending;
                    intents.extend(self.try_start_drag(ctx));
                }
            }
        }

        if let Some(pending) = ctx.pending_tap.take() {
            match scene.pick(pending.ndc) {
                Some(hit) => intents.push(GestureIntent::Select {
                    instance_id: hit.instance_id,
                    point: hit.point,
                }),
                None => log::trace!("Tap for gesture {} hit nothing", pending.gesture),
            }
        }

        intents
    }

    fn try_start_drag(&mut self, ctx: &mut InteractionContext) -> Option<GestureIntent> {
        if !self.long_press_elapsed || self.phase != GesturePhase::LongPressPending {
            return None;
        }
        let instance_id = self.press_hit.clone()?;
        let ndc = self.viewport.to_ndc(self.current)?;
        match ctx.begin_drag(instance_id.clone(), ndc) {
            Ok(()) => {
                self.phase = GesturePhase::Dragging;
                log::debug!("Gesture {} dragging {}", self.gesture, instance_id);
                Some(GestureIntent::DragStarted { instance_id })
            }
            Err(e) => {
                log::warn!("Long press on {} ignored: {}", instance_id, e);
                None
            }
        }
    }

    fn orbit_delta(&mut self, position: Vec2) -> GestureIntent {
        let delta = position - self.orbit_anchor;
        self.orbit_anchor = position;
        GestureIntent::Orbit { dx: delta.x, dy: delta.y }
    }

    fn cancel_long_press(&mut self) {
        if let Some(handle) = self.long_press.take() {
            self.timers.cancel(handle);
        }
    }

    fn finish_gesture(&mut self, ctx: &mut InteractionContext) -> Vec<GestureIntent> {
        self.cancel_long_press();
        ctx.pending_press = None;
        let mut intents = Vec::new();
        if self.phase == GesturePhase::Dragging {
            if let Some(drag) = ctx.end_drag() {
                log::debug!("Gesture {} released {}", self.gesture, drag.instance_id);
                intents.push(GestureIntent::DragEnded { instance_id: drag.instance_id });
            }
        }
        self.phase = GesturePhase::Idle;
        self.pressed_at = None;
        self.press_hit = None;
        self.long_press_elapsed = false;
        intents
    }
}
