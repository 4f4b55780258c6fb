//! Cagebox - touch-driven physics sandbox
//!
//! Hosts the sandbox in a winit window. Drawing belongs to an external
//! renderer; this binary drives simulation, input and camera, and reports
//! state in the window title.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowId,
};

use cagebox::config::AppConfig;
use cagebox::input::{InputAction, InputMapper};
use cagebox::scene::{Sandbox, SandboxBuilder};
use cagebox::systems::{SimulationSystem, TitleStatus, WindowSystem};
use cagebox_core::{InstanceId, Object3DInstance, Scene, ShapeKind, Vec3};
use cagebox_input::{PointerEvent, PointerTracker};
use cagebox_render::CameraNavigator;

/// Colors cycled through by spawned shapes
const PALETTE: [&str; 5] = ["#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6"];

/// Main application state
struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    sandbox: Sandbox,
    navigator: CameraNavigator,
    simulation: SimulationSystem,
    pointer: PointerTracker,
    spawned: usize,
}

impl App {
    fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let physics = config.physics.to_physics_config();
        let builder = match SandboxBuilder::load(&config.scene.path) {
            Ok(builder) => builder,
            Err(e) => {
                log::warn!("Failed to load scene '{}': {}. Starting empty.", config.scene.path, e);
                SandboxBuilder::from_scene(Scene::new("sandbox").with_cage(config.cage.to_dimensions()))
            }
        };
        let sandbox = builder.with_physics(physics).build()?;

        let navigator = CameraNavigator::new(
            config.camera.to_camera(),
            config.camera.look_at(),
            config.navigation.to_navigator_config(),
        );
        let simulation = SimulationSystem::from_config(&config);

        Ok(Self {
            config,
            window: None,
            sandbox,
            navigator,
            simulation,
            pointer: PointerTracker::new(),
            spawned: 0,
        })
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.simulation.set_viewport(width, height);
        self.navigator.camera_mut().set_viewport(width, height);
    }

    fn pointer_event(&mut self, event: Option<PointerEvent>) {
        if let Some(event) = event {
            self.simulation
                .handle_pointer(event, &mut self.sandbox, &mut self.navigator, Instant::now());
        }
    }

    /// Drop the next shape in the cycle above the cage centre
    fn spawn_next(&mut self) {
        let kind = ShapeKind::ALL[self.spawned % ShapeKind::ALL.len()];
        let color = PALETTE[self.spawned % PALETTE.len()];
        let offset = (self.spawned % 5) as f32 - 2.0;
        self.spawned += 1;

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut instance = Object3DInstance::new(InstanceId::generate(now_ms), kind, Vec3::new(offset * 1.5, 5.0, 0.0), 1.0)
            .with_color(color);
        instance.created_at = now_ms;

        if let Err(e) = self.sandbox.spawn(instance) {
            log::warn!("Spawn failed: {}", e);
        }
    }

    fn handle_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::CancelGesture => {
                self.pointer.cancel();
                self.simulation.cancel_gesture(&mut self.sandbox, &mut self.navigator);
            }
            InputAction::ToggleCageRotate => {
                self.simulation.toggle_cage_rotate(&mut self.sandbox, &mut self.navigator);
            }
            InputAction::ClearInstances => {
                self.simulation.clear_instances(&mut self.sandbox, &mut self.navigator);
            }
            InputAction::Spawn => self.spawn_next(),
            InputAction::ToggleFullscreen => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            InputAction::ToggleSmoothing => {
                let enabled = self.simulation.orbit_mut().toggle_smoothing();
                log::info!("Orbit smoothing: {}", if enabled { "ON" } else { "OFF" });
            }
        }
    }

    fn title_status(&self) -> TitleStatus {
        TitleStatus {
            selected: self.sandbox.scene.selected.clone(),
            dragging: self.simulation.interaction().dragged_instance().cloned(),
            camera: self.navigator.camera().position,
            navigation: self.navigator.phase(),
            cage_rotate: self.simulation.is_cage_rotate_mode(),
            instances: self.sandbox.instance_count(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => {
                let (width, height) = window.size();
                self.window = Some(window);
                self.resize(width, height);
                log::info!("Window ready at {}x{}", width, height);
            }
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.resize(size.width as f32, size.height as f32);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    let gesture_active = self.simulation.is_gesture_active();
                    if let Some(action) = InputMapper::map_keyboard(key, event.state, gesture_active) {
                        self.handle_action(action, event_loop);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self.pointer.cursor_moved(position);
                self.pointer_event(event);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.pointer.mouse_button(button, state);
                self.pointer_event(event);
            }

            WindowEvent::Touch(touch) => {
                let event = self.pointer.touch(touch.id, touch.phase, touch.location);
                self.pointer_event(event);
            }

            WindowEvent::Focused(false) => {
                // The release for a pointer held across a focus change never arrives
                let event = self.pointer.cancel();
                self.pointer_event(event);
            }

            WindowEvent::RedrawRequested => {
                let report = self.simulation.update(&mut self.sandbox, &mut self.navigator);
                if let Some(position) = report.dragged {
                    log::trace!("Dragged to {:?}", position);
                }
                if let Some(window) = &self.window {
                    window.update_title(&self.title_status());
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    // RUST_LOG overrides the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()))
        .init();
    log::info!("Starting Cagebox");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
