//! Integration tests for the interactive frame loop
//!
//! These drive a sandbox through `SimulationSystem` the way the binary does:
//! 1. Pointer events go through the gesture protocol between frames
//! 2. Each frame fires timers, steps physics, resolves picks and solves drags
//! 3. Selection feeds the camera navigator

use std::time::{Duration, Instant};

use cagebox::scene::{Sandbox, SandboxBuilder};
use cagebox::systems::{FrameReport, SimulationSystem};
use cagebox_core::{InstanceId, ShapeKind, Vec2, Vec3};
use cagebox_input::{GesturePhase, PointerEvent, PointerPhase};
use cagebox_render::{Camera, CameraNavigator, FocusState, NavigationPhase, NavigatorConfig};

const FRAME: f32 = 1.0 / 60.0;
const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;
/// Resting centre height of a unit box on the default cage floor
const REST_Y: f32 = -1.2;

fn vec_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).length() < eps
}

struct Harness {
    sim: SimulationSystem,
    sandbox: Sandbox,
    nav: CameraNavigator,
    clock: Instant,
}

impl Harness {
    /// Unit boxes at the given positions, camera looking down at the origin box
    fn new(boxes: &[(&str, Vec3)]) -> Self {
        let mut builder = SandboxBuilder::new();
        for (id, position) in boxes {
            builder = builder.add_shape(ShapeKind::Box, *position, 1.0, id);
        }
        let sandbox = builder.build().unwrap();

        let mut sim = SimulationSystem::new();
        sim.set_viewport(WIDTH, HEIGHT);
        let mut camera = Camera::new(Vec3::new(0.0, 3.0, 8.0));
        camera.set_viewport(WIDTH, HEIGHT);
        let nav = CameraNavigator::new(camera, Vec3::new(0.0, REST_Y, 0.0), NavigatorConfig::default());

        Self {
            sim,
            sandbox,
            nav,
            clock: Instant::now(),
        }
    }

    fn pointer(&mut self, phase: PointerPhase, x: f32, y: f32) {
        let event = PointerEvent::new(phase, Vec2::new(x, y));
        self.sim.handle_pointer(event, &mut self.sandbox, &mut self.nav, self.clock);
    }

    fn advance(&mut self) -> FrameReport {
        self.clock += Duration::from_secs_f32(FRAME);
        self.sim.frame(&mut self.sandbox, &mut self.nav, self.clock, FRAME)
    }

    fn run(&mut self, seconds: f32) {
        let frames = (seconds / FRAME).ceil() as usize;
        for _ in 0..frames {
            self.advance();
        }
    }

    fn position(&self, id: &str) -> Vec3 {
        self.sandbox.body_position(&InstanceId::new(id)).unwrap()
    }
}

fn origin_box() -> Harness {
    Harness::new(&[("box", Vec3::new(0.0, REST_Y, 0.0))])
}

// ==================== Tap vs Drag ====================

#[test]
fn test_quick_tap_selects() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.advance();
    h.run(0.2);
    h.pointer(PointerPhase::Up, 402.0, 301.0);
    h.advance();

    let id = InstanceId::new("box");
    assert_eq!(h.sandbox.scene.selected, Some(id.clone()));
    assert!(h.sim.highlights().is_highlighted(&id));
    assert!(!h.sim.interaction().is_dragging());
    assert!(h.nav.target().is_some());
    assert_eq!(h.nav.phase(), NavigationPhase::Following);
}

#[test]
fn test_tap_at_threshold_still_selects() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.advance();
    // 6-8-10 triangle: exactly 10 px
    h.pointer(PointerPhase::Move, 406.0, 308.0);
    h.pointer(PointerPhase::Up, 406.0, 308.0);
    h.advance();
    assert_eq!(h.sandbox.scene.selected, Some(InstanceId::new("box")));
}

#[test]
fn test_tap_on_empty_floor_selects_nothing() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 60.0, 560.0);
    h.advance();
    h.pointer(PointerPhase::Up, 60.0, 560.0);
    h.advance();
    assert!(h.sandbox.scene.selected.is_none());
    assert!(h.nav.target().is_none());
}

#[test]
fn test_long_press_drags_across_floor() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.advance();
    assert_eq!(h.sim.protocol().phase(), GesturePhase::LongPressPending);

    h.run(1.05);
    assert_eq!(h.sim.protocol().phase(), GesturePhase::Dragging);
    assert_eq!(h.sim.interaction().dragged_instance(), Some(&InstanceId::new("box")));
    assert!(!h.sim.orbit().is_enabled());

    h.pointer(PointerPhase::Move, 480.0, 300.0);
    let report = h.advance();
    let forced = report.dragged.unwrap();
    assert!(forced.x > 0.5);
    assert!((forced.y - REST_Y).abs() < 1e-3);
    assert!(vec_approx_eq(h.position("box"), forced, 1e-5));

    h.pointer(PointerPhase::Up, 480.0, 300.0);
    h.advance();
    assert!(!h.sim.interaction().is_dragging());
    assert!(h.sim.orbit().is_enabled());
    // A drag is never also a tap
    assert!(h.sandbox.scene.selected.is_none());
}

#[test]
fn test_dragged_body_stays_put_after_release() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.run(1.05);
    h.pointer(PointerPhase::Move, 480.0, 300.0);
    let forced = h.advance().dragged.unwrap();
    h.pointer(PointerPhase::Up, 480.0, 300.0);
    h.run(1.0);
    let settled = h.position("box");
    assert!((settled.x - forced.x).abs() < 0.05);
    assert!((settled.y - REST_Y).abs() < 0.05);
}

#[test]
fn test_moving_press_orbits_instead_of_dragging() {
    let mut h = origin_box();
    let camera_before = h.nav.camera().position;
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.advance();
    h.pointer(PointerPhase::Move, 440.0, 300.0);
    assert_eq!(h.sim.protocol().phase(), GesturePhase::Orbiting);

    h.run(1.5);
    assert!(!h.sim.interaction().is_dragging());
    assert!(!vec_approx_eq(h.nav.camera().position, camera_before, 1e-3));

    h.pointer(PointerPhase::Up, 440.0, 300.0);
    h.advance();
    assert!(h.sandbox.scene.selected.is_none());
}

#[test]
fn test_long_press_on_empty_space_never_drags() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 60.0, 560.0);
    h.run(1.5);
    assert!(!h.sim.interaction().is_dragging());
    h.pointer(PointerPhase::Up, 60.0, 560.0);
    h.advance();
    assert!(h.sandbox.scene.selected.is_none());
}

#[test]
fn test_one_drag_at_a_time() {
    let mut h = Harness::new(&[("box", Vec3::new(0.0, REST_Y, 0.0)), ("other", Vec3::new(6.0, REST_Y, 0.0))]);
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.run(1.05);
    assert_eq!(h.sim.interaction().dragged_instance(), Some(&InstanceId::new("box")));

    // A new press closes the running gesture before anything else happens
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    assert!(!h.sim.interaction().is_dragging());
    assert!(h.sim.orbit().is_enabled());

    for _ in 0..90 {
        h.advance();
        let dragged = h.sim.interaction().dragged_instance().cloned();
        assert!(dragged.is_none() || dragged == Some(InstanceId::new("box")));
    }
    assert_eq!(h.sim.interaction().dragged_instance(), Some(&InstanceId::new("box")));
}

#[test]
fn test_cancel_clears_drag() {
    let mut h = origin_box();
    h.pointer(PointerPhase::Down, 400.0, 300.0);
    h.run(1.05);
    assert!(h.sim.interaction().is_dragging());
    h.pointer(PointerPhase::Cancel, 400.0, 300.0);
    assert!(!h.sim.interaction().is_dragging());
    assert_eq!(h.sim.protocol().phase(), GesturePhase::Idle);
}

// ==================== Camera ====================

#[test]
fn test_transition_converges_exactly() {
    let mut h = origin_box();
    h.nav.start_transition_to(Vec3::new(0.0, REST_Y, 0.0));
    let b = Vec3::new(5.0, REST_Y, -2.0);
    h.nav.start_transition_to(b);
    let expected = h.nav.transition().unwrap().end_position;

    h.run(2.1);
    assert_eq!(h.nav.phase(), NavigationPhase::Following);
    assert!(vec_approx_eq(h.nav.camera().position, expected, 1e-5));
    assert!(vec_approx_eq(h.nav.look_at(), b, 1e-6));
}

#[test]
fn test_orbit_is_preserved_across_selection() {
    let mut h = origin_box();
    let a = Vec3::new(0.0, REST_Y, 0.0);
    h.nav.start_transition_to(a);

    // Orbit by dragging over empty space
    h.pointer(PointerPhase::Down, 100.0, 100.0);
    h.pointer(PointerPhase::Move, 160.0, 130.0);
    h.advance();
    h.pointer(PointerPhase::Up, 160.0, 130.0);
    h.run(0.5);
    let before = FocusState::from_positions(h.nav.camera().position, a).unwrap();

    let b = Vec3::new(4.0, REST_Y, 3.0);
    h.nav.start_transition_to(b);
    h.run(2.1);
    let after = FocusState::from_positions(h.nav.camera().position, b).unwrap();

    assert!((after.distance - before.distance).abs() < 1e-3);
    assert!((after.yaw - before.yaw).abs() < 1e-3);
    assert!((after.pitch - before.pitch).abs() < 1e-3);
}

#[test]
fn test_a_b_a_has_no_jump() {
    let mut h = origin_box();
    let a = Vec3::new(-3.0, REST_Y, 0.0);
    let b = Vec3::new(3.0, REST_Y, 0.0);
    h.nav.start_transition_to(a);
    h.nav.start_transition_to(b);

    let mut previous = h.nav.camera().position;
    let mut max_step: f32 = 0.0;
    for _ in 0..45 {
        h.advance();
        let p = h.nav.camera().position;
        max_step = max_step.max((p - previous).length());
        previous = p;
    }

    // Retarget mid-flight: the new transition starts where the camera is
    h.nav.start_transition_to(a);
    assert_eq!(h.nav.transition().unwrap().start_position, previous);

    for _ in 0..150 {
        h.advance();
        let p = h.nav.camera().position;
        max_step = max_step.max((p - previous).length());
        previous = p;
    }
    assert!(max_step < 0.25, "camera jumped {} in one frame", max_step);
    assert!(vec_approx_eq(h.nav.look_at(), a, 1e-5));
}

// ==================== Physics through the frame loop ====================

#[test]
fn test_spawned_box_settles_on_floor() {
    let mut h = Harness::new(&[("falling", Vec3::new(0.0, 5.0, 0.0))]);
    h.run(5.0);
    let id = InstanceId::new("falling");
    let body = h
        .sandbox
        .binding(&id)
        .and_then(|b| b.body(&h.sandbox.world))
        .unwrap();
    assert!((body.position.y - (h.sandbox.floor_top() + 0.5)).abs() < 0.05);
    assert!(body.linear_velocity.length() < 0.05);
}

#[test]
fn test_cage_rotation_leaves_bodies_alone() {
    let mut h = origin_box();
    h.sim.toggle_cage_rotate(&mut h.sandbox, &mut h.nav);
    h.pointer(PointerPhase::Down, 500.0, 300.0);
    h.pointer(PointerPhase::Move, 400.0, 400.0);
    h.pointer(PointerPhase::Up, 400.0, 400.0);
    h.run(0.5);
    assert!(h.sandbox.cage_angle() > 1.0);
    assert!(vec_approx_eq(h.position("box"), Vec3::new(0.0, REST_Y, 0.0), 0.05));
    assert!(h.sandbox.scene.selected.is_none());
}
