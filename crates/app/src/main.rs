//! Ripples - Main Entry Point
//!
//! Opens a window and renders a checkerboard quad disturbed by randomly
//! spawned ripples. WASD/Q/E move the camera, the right mouse button looks
//! around and Escape quits.
//!
//! Environment overrides are listed on [`ripples_core::Config::from_lookup`].

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{debug, error, info};

use ripples_core::{Clock, Config, time_seed};
use ripples_platform::{
    ActiveEventLoop, ApplicationHandler, ControlFlow, EventLoop, InputState, KeyCode,
    MouseButton, PhysicalKey, Window, WindowEvent, WindowId,
};
use ripples_renderer::{FrameStatus, Renderer, Ubo};
use ripples_scene::{Camera, FpsController, RippleBuffer};

struct App {
    config: Config,
    // Declared before `window` so the renderer, and with it the surface,
    // is dropped while the window still exists.
    renderer: Option<Renderer>,
    window: Option<Window>,
    input: InputState,
    clock: Clock,
    ripples: RippleBuffer,
    camera: Camera,
    controller: FpsController,
    /// First fatal error; reported by `main` after the loop exits.
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(time_seed);
        info!("Ripple seed: {}", seed);

        let mut camera = Camera::new();
        camera.set_position(Vec3::from_array(config.camera.position));
        camera.set_perspective(
            config.camera.fov_y_degrees.to_radians(),
            config.aspect_ratio(),
            config.camera.near,
            config.camera.far,
        );

        Self {
            renderer: None,
            window: None,
            input: InputState::new(),
            clock: Clock::new(),
            ripples: RippleBuffer::new(seed),
            camera,
            controller: FpsController::new(),
            fatal: None,
            config,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(event_loop, &self.config.window)
            .context("failed to create window")?;
        let renderer =
            Renderer::new(&window, &self.config).context("failed to initialize renderer")?;

        self.camera.set_aspect(window.aspect_ratio());
        self.renderer = Some(renderer);
        self.window = Some(window);

        info!("Initialization complete, entering main loop");
        Ok(())
    }

    /// Advances the simulation by one frame and hands the result to the renderer.
    fn redraw(&mut self) -> Result<()> {
        let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) else {
            return Ok(());
        };
        if window.is_minimized() {
            return Ok(());
        }

        self.clock.advance();
        let delta_time = self.clock.delta_since_last_advance();

        let view_projection =
            self.controller
                .compute_view_projection(&mut self.camera, &self.input, delta_time);

        if let Some(spawn) = self.ripples.update(delta_time) {
            debug!(
                "Ripple spawned in slot {} at ({:.2}, {:.2}), next in {:.2}s",
                spawn.slot, spawn.origin.x, spawn.origin.y, spawn.next_interval
            );
        }

        let ubo = Ubo::new(view_projection, self.ripples.snapshot());
        match renderer.submit_frame(&ubo).context("frame submission failed")? {
            FrameStatus::Presented => {}
            FrameStatus::Retry => debug!("Swapchain still stale after retry, frame dropped"),
            FrameStatus::Recreated => debug!("Swapchain rebuilt after present"),
        }

        self.input.begin_frame();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.init(event_loop)
        {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().is_some_and(|w| w.id() != id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                    self.camera.set_aspect(window.aspect_ratio());
                }
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.input.clear(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        if key == KeyCode::Escape {
                            info!("Escape pressed, shutting down");
                            event_loop.exit();
                        }
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from(button);
                if state.is_pressed() {
                    self.input.on_mouse_pressed(button);
                } else {
                    self.input.on_mouse_released(button);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .on_mouse_moved(position.x as f32, position.y as f32);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    ripples_core::init_logging().context("failed to initialize logging")?;

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "Starting Ripples ({}x{}, validation {})",
        config.window.width,
        config.window.height,
        if config.validation { "on" } else { "off" }
    );

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // Drop GPU resources before the window.
    drop(app.renderer.take());

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
