//! Window creation and the winit event loop.

use std::sync::Arc;

use orrery_config::Config;
use orrery_render::SurfaceError;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::controls::Controls;
use crate::frame_clock::FrameClock;
use crate::setup::{Scene, SceneAssets, SetupError};

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

pub struct AppState {
    config: Config,
    window: Option<Arc<Window>>,
    scene: Option<Scene>,
    controls: Controls,
    clock: FrameClock,
    setup_error: Option<SetupError>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let clock = FrameClock::new(config.animation.max_dt);
        Self {
            config,
            window: None,
            scene: None,
            controls: Controls::new(),
            clock,
            setup_error: None,
        }
    }

    /// The fatal setup failure, if `resumed` hit one.
    pub fn take_setup_error(&mut self) -> Option<SetupError> {
        self.setup_error.take()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SetupError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let size = window.inner_size();
        info!(
            "Window created: {}x{} (scale: {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let assets = SceneAssets::load(&self.config.scene)?;
        let scene = Scene::new(window.clone(), &self.config, assets)?;

        self.scene = Some(scene);
        self.window = Some(window.clone());
        self.clock.reset();
        window.request_redraw();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = &mut self.scene else {
            return;
        };
        let dt = self.clock.tick();
        let input = self.controls.take_speed_input();
        let look = self.controls.take_look_delta();
        let movement = self.controls.movement_axes();

        match scene.render_frame(dt, input, look, movement) {
            Ok(()) => {}
            Err(SurfaceError::Lost) => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    scene.resize(size.width, size.height);
                }
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() || self.setup_error.is_some() {
            return;
        }
        if let Err(e) = self.initialize(event_loop) {
            error!("Setup failed: {e}");
            self.setup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(scene) = &mut self.scene {
                    scene.resize(size.width, size.height);
                    info!("Window resized to {}x{}", size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.controls.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                self.controls.process_event(&event);
                if self.controls.exit_requested() {
                    info!("Escape pressed, shutting down");
                    event_loop.exit();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.controls.on_mouse_button(button, state);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controls.on_mouse_motion(delta.0, delta.1);
        }
    }
}

/// Run the viewer until the window closes. Blocks.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), SetupError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config);
    event_loop.run_app(&mut app)?;
    match app.take_setup_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
