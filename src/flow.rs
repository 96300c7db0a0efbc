//! Flow control and application event loop.
//!
//! This module owns the winit lifecycle: window creation, input routing,
//! and the per-frame cycle of camera easing, wheel spin, environment
//! bookkeeping, and rendering.
//!
//! # Lifecycle
//!
//! Each redraw follows this pattern:
//! 1. Drain finished panorama loads, spawn any newly requested one
//! 2. Ease pending camera motion and upload the camera uniform
//! 3. Sync the ambient level with the active environment
//! 4. Advance the wheel spin and push dirty state to the GPU
//! 5. Record one render pass and present
//!
//! Option changes and exports run from key events between frames; the
//! panorama decode is the only work living off the event loop thread.

use std::{
    iter,
    sync::{mpsc, Arc},
    time::{Duration, Instant},
};

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    camera::Camera,
    config::{Configurator, BODY_COLOURS, RIM_COLOURS},
    context::{Context, MouseButtonState},
    data_structures::texture::Texture,
    environment::{self, PanoramaImage},
    render::SceneRenderer,
    snapshot::{self, ExportStamper},
};

pub struct AppState {
    pub(crate) ctx: Context,
    renderer: SceneRenderer,
    configurator: Configurator,
    stamper: ExportStamper,
    panorama_tx: mpsc::Sender<(u64, anyhow::Result<PanoramaImage>)>,
    panorama_rx: mpsc::Receiver<(u64, anyhow::Result<PanoramaImage>)>,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = Context::new(window).await;
        let ctx = match ctx {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let mut configurator = Configurator::new();
        let vehicle = configurator.build_vehicle();
        let part_count = vehicle.len();
        let renderer = SceneRenderer::new(&ctx.device, vehicle);
        info!(
            "scene ready: {} parts sharing {} meshes",
            part_count,
            renderer.mesh_count()
        );
        let (panorama_tx, panorama_rx) = mpsc::channel();
        Self {
            ctx,
            renderer,
            configurator,
            stamper: ExportStamper::new(),
            panorama_tx,
            panorama_rx,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(
        &mut self,
        async_runtime: &tokio::runtime::Runtime,
        dt: Duration,
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Finished panorama loads first, so a stale one never overwrites
        // the backdrop a later switch installed.
        while let Ok((generation, result)) = self.panorama_rx.try_recv() {
            self.configurator
                .environment_mut()
                .complete_panorama(generation, result);
        }
        if let Some(request) = self.configurator.environment_mut().take_request() {
            let tx = self.panorama_tx.clone();
            async_runtime.spawn(async move {
                let result = environment::load_panorama(request.file).await;
                let _ = tx.send((request.generation, result));
            });
        }

        // Update the camera
        self.ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera, dt);
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        // Ambient light follows the active environment.
        let ambient = self.configurator.environment().ambient();
        if (self.ctx.light.uniform.ambient() - ambient).abs() > f32::EPSILON {
            self.ctx.light.uniform.set_ambient(ambient);
            self.ctx.queue.write_buffer(
                &self.ctx.light.buffer,
                0,
                bytemuck::cast_slice(&[self.ctx.light.uniform]),
            );
        }

        let (vehicle, environment) = self.configurator.scene_mut();
        if let Some(vehicle) = vehicle {
            vehicle.advance_spin(dt);
            self.renderer.sync(&self.ctx, vehicle, environment);
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        self.renderer.draw(
            &self.ctx,
            &mut encoder,
            &view,
            &self.ctx.depth_texture.view,
            self.configurator.environment().clear_colour(),
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Digit1 => self.select_body_colour(0),
            KeyCode::Digit2 => self.select_body_colour(1),
            KeyCode::Digit3 => self.select_body_colour(2),
            KeyCode::Digit4 => self.select_body_colour(3),
            KeyCode::Digit5 => self.select_body_colour(4),
            KeyCode::Digit6 => self.select_body_colour(5),
            KeyCode::Digit7 => self.select_rim_colour(0),
            KeyCode::Digit8 => self.select_rim_colour(1),
            KeyCode::Digit9 => self.select_rim_colour(2),
            KeyCode::Digit0 => self.select_rim_colour(3),
            KeyCode::KeyW => self.configurator.cycle_wheel_style(),
            KeyCode::KeyE => self.configurator.cycle_environment(),
            KeyCode::KeyR => self.reset(),
            KeyCode::KeyS => self.export(),
            KeyCode::Escape => event_loop.exit(),
            _ => (),
        }
    }

    fn select_body_colour(&mut self, index: usize) {
        if let Err(err) = self.configurator.set_body_colour(BODY_COLOURS[index].colour) {
            warn!("{}", err);
        }
    }

    fn select_rim_colour(&mut self, index: usize) {
        if let Err(err) = self.configurator.set_rim_colour(RIM_COLOURS[index].colour) {
            warn!("{}", err);
        }
    }

    /// Return every option to its default and the camera to the home pose,
    /// dropping any orbit motion still easing in.
    fn reset(&mut self) {
        self.configurator.reset();
        self.ctx.camera.camera = Camera::home();
        self.ctx.camera.controller.reset();
    }

    fn export(&mut self) {
        let clear_colour = self.configurator.environment().clear_colour();
        match snapshot::capture(&self.ctx, &self.renderer, clear_colour, &mut self.stamper) {
            Ok(shot) => match std::fs::write(&shot.filename, &shot.png) {
                Ok(()) => info!("configuration saved to {}", shot.filename),
                Err(err) => error!("could not write {}: {}", shot.filename, err),
            },
            Err(err) => error!("export failed: {err:#}"),
        }
    }
}

pub struct ShowroomApp {
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    last_time: Instant,
}

impl ShowroomApp {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            state: None,
            last_time: Instant::now(),
        })
    }
}

impl ApplicationHandler for ShowroomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes().with_title("Vehicle Showroom");
        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let state = self.async_runtime.block_on(AppState::new(window));
        self.state = Some(state);
        self.last_time = Instant::now();
        info!(
            "controls: 1-6 body colour, 7-0 rim colour, W wheels, E environment, \
             R reset, S export, Esc quit"
        );
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.ctx.mouse.pressed != MouseButtonState::None {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if key_state == ElementState::Pressed && !repeat {
                    state.handle_key(event_loop, code);
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => state.ctx.mouse.pressed = MouseButtonState::Left,
                (MouseButton::Right, true) => state.ctx.mouse.pressed = MouseButtonState::Right,
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&self.async_runtime, dt) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = ShowroomApp::new()?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
