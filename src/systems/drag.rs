//! Drag solving and scene picking
//!
//! The pointer protocol only records where the finger is; the position of
//! the dragged body is solved here once per frame, after physics has run,
//! because it needs this frame's camera and scene graph.

use cagebox_core::{Plane, SceneGraph, Vec2, Vec3};
use cagebox_input::{InteractionContext, PickHit, PickScene};
use cagebox_render::Camera;

use crate::scene::Sandbox;

/// Drag tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragConfig {
    /// World units of lift per NDC unit of vertical pointer travel
    pub vertical_factor: f32,
    /// Camera elevation (radians below the horizon) under which lifting is allowed
    pub elevation_threshold: f32,
    /// Highest lift above the resting height
    pub max_lift: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            vertical_factor: 10.0,
            elevation_threshold: 0.35,
            max_lift: 10.0,
        }
    }
}

/// Moves the dragged body under the pointer
#[derive(Clone, Copy, Debug, Default)]
pub struct DragSolver {
    pub config: DragConfig,
}

impl DragSolver {
    pub fn new(config: DragConfig) -> Self {
        Self { config }
    }

    /// Solve the drag for this frame
    ///
    /// Returns the forced position, or `None` when nothing is dragged or the
    /// pointer ray misses the floor plane. A miss leaves the body untouched.
    pub fn solve(&self, ctx: &mut InteractionContext, camera: &Camera, sandbox: &mut Sandbox) -> Option<Vec3> {
        let drag = ctx.drag()?.clone();
        let binding = sandbox.binding(&drag.instance_id)?;
        if binding.is_static() {
            return None;
        }
        let node = binding.node()?;
        let key = binding.key()?;

        let floor_top = sandbox.floor_top();
        let ray = camera.ray_from_ndc(drag.current_pointer);
        let Some(t) = Plane::horizontal(floor_top).intersect_ray(&ray) else {
            log::trace!("Drag ray for {} misses the floor", drag.instance_id);
            return None;
        };
        let hit = ray.at(t);

        let half_height = sandbox.graph.world_bounds(node)?.half_extents().y;
        let rest_y = floor_top + half_height;
        let y = if camera.elevation() < self.config.elevation_threshold {
            let lift = (drag.current_pointer.y - drag.start_pointer.y) * self.config.vertical_factor;
            (rest_y + lift).clamp(rest_y, rest_y + self.config.max_lift)
        } else {
            rest_y
        };
        let position = Vec3::new(hit.x, y, hit.z);

        let body = sandbox.world.body_mut(key)?;
        if drag.start_world_position.is_none() {
            ctx.record_drag_origin(body.position);
        }
        body.set_position(position);
        body.clear_velocity();
        let orientation = body.orientation;
        sandbox.graph.set_world_pose(node, position, orientation);
        Some(position)
    }
}

/// Picks instances by casting camera rays into the scene graph
pub struct ScenePicker<'a> {
    pub graph: &'a SceneGraph,
    pub camera: &'a Camera,
}

impl<'a> ScenePicker<'a> {
    pub fn new(graph: &'a SceneGraph, camera: &'a Camera) -> Self {
        Self { graph, camera }
    }
}

impl PickScene for ScenePicker<'_> {
    fn pick(&self, ndc: Vec2) -> Option<PickHit> {
        let ray = self.camera.ray_from_ndc(ndc);
        let hit = self.graph.pick_instance(&ray)?;
        Some(PickHit {
            instance_id: hit.instance_id?,
            point: hit.point,
            distance: hit.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SandboxBuilder;
    use cagebox_core::{InstanceId, ShapeKind};

    fn sandbox_with_box() -> Sandbox {
        SandboxBuilder::new()
            .add_shape(ShapeKind::Box, Vec3::new(0.0, 3.0, 0.0), 1.0, "box")
            .build()
            .unwrap()
    }

    /// Camera high above the origin looking straight down
    fn top_down() -> Camera {
        let mut camera = Camera::new(Vec3::new(0.0, 20.0, 0.001));
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn dragging(id: &str, pointer: Vec2) -> InteractionContext {
        let mut ctx = InteractionContext::new();
        ctx.begin_drag(InstanceId::new(id), pointer).unwrap();
        ctx
    }

    #[test]
    fn test_no_drag_is_noop() {
        let mut sandbox = sandbox_with_box();
        let mut ctx = InteractionContext::new();
        assert!(DragSolver::default().solve(&mut ctx, &top_down(), &mut sandbox).is_none());
    }

    #[test]
    fn test_drag_pins_to_floor_and_clears_velocity() {
        let mut sandbox = sandbox_with_box();
        let id = InstanceId::new("box");
        let key = sandbox.binding(&id).unwrap().key().unwrap();
        sandbox.world.body_mut(key).unwrap().linear_velocity = Vec3::new(3.0, -4.0, 0.0);

        let mut ctx = dragging("box", Vec2::ZERO);
        let position = DragSolver::default().solve(&mut ctx, &top_down(), &mut sandbox).unwrap();

        let floor_top = sandbox.floor_top();
        assert!((position.y - (floor_top + 0.5)).abs() < 1e-3);
        assert!(position.x.abs() < 1e-2 && position.z.abs() < 1e-2);
        let body = sandbox.world.body(key).unwrap();
        assert_eq!(body.linear_velocity, Vec3::ZERO);
        assert_eq!(body.angular_velocity, Vec3::ZERO);
        assert_eq!(ctx.drag().unwrap().start_world_position, Some(Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_drag_origin_recorded_once() {
        let mut sandbox = sandbox_with_box();
        let mut ctx = dragging("box", Vec2::ZERO);
        let solver = DragSolver::default();
        solver.solve(&mut ctx, &top_down(), &mut sandbox).unwrap();
        ctx.update_drag_pointer(Vec2::new(0.5, 0.0));
        solver.solve(&mut ctx, &top_down(), &mut sandbox).unwrap();
        assert_eq!(ctx.drag().unwrap().start_world_position, Some(Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_ray_missing_floor_leaves_body_alone() {
        let mut sandbox = sandbox_with_box();
        let id = InstanceId::new("box");
        let key = sandbox.binding(&id).unwrap().key().unwrap();
        sandbox.world.body_mut(key).unwrap().linear_velocity = Vec3::new(1.0, 0.0, 0.0);

        // Level camera, pointer above the horizon
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0));
        camera.look_at(Vec3::new(0.0, 0.0, 0.0));
        let mut ctx = dragging("box", Vec2::new(0.0, 0.5));
        assert!(DragSolver::default().solve(&mut ctx, &camera, &mut sandbox).is_none());

        let body = sandbox.world.body(key).unwrap();
        assert_eq!(body.linear_velocity, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(body.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_low_camera_lifts_with_vertical_travel() {
        let mut sandbox = sandbox_with_box();
        let floor_top = sandbox.floor_top();
        // Slightly above the floor, looking across it
        let mut camera = Camera::new(Vec3::new(0.0, floor_top + 2.0, 10.0));
        camera.look_at(Vec3::new(0.0, floor_top, 0.0));
        assert!(camera.elevation() < 0.35);

        let mut ctx = dragging("box", Vec2::new(0.0, -0.5));
        ctx.update_drag_pointer(Vec2::new(0.0, -0.3));
        let position = DragSolver::default().solve(&mut ctx, &camera, &mut sandbox).unwrap();
        // 0.2 NDC of travel at factor 10
        assert!((position.y - (floor_top + 0.5 + 2.0)).abs() < 1e-3);
    }

    #[test]
    fn test_lift_is_clamped() {
        let mut sandbox = sandbox_with_box();
        let floor_top = sandbox.floor_top();
        let mut camera = Camera::new(Vec3::new(0.0, floor_top + 2.0, 10.0));
        camera.look_at(Vec3::new(0.0, floor_top, 0.0));

        let mut ctx = dragging("box", Vec2::new(0.0, -0.9));
        ctx.update_drag_pointer(Vec2::new(0.0, -0.1));
        let solver = DragSolver::new(DragConfig {
            vertical_factor: 100.0,
            ..DragConfig::default()
        });
        let position = solver.solve(&mut ctx, &camera, &mut sandbox).unwrap();
        assert!((position.y - (floor_top + 0.5 + 10.0)).abs() < 1e-3);

        // Dragging downward never sinks below the resting height
        ctx.update_drag_pointer(Vec2::new(0.0, -0.95));
        let position = solver.solve(&mut ctx, &camera, &mut sandbox).unwrap();
        assert!((position.y - (floor_top + 0.5)).abs() < 1e-3);
    }

    #[test]
    fn test_picker_finds_instance_under_center() {
        let sandbox = sandbox_with_box();
        let camera = top_down();
        let picker = ScenePicker::new(&sandbox.graph, &camera);
        let hit = picker.pick(Vec2::ZERO).unwrap();
        assert_eq!(hit.instance_id, InstanceId::new("box"));
        assert!((hit.point.y - 3.5).abs() < 1e-3);
        assert!(picker.pick(Vec2::new(0.9, 0.9)).is_none());
    }
}
