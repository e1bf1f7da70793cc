use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use corelib::camera::{Camera, Orbit};
use corelib::Vec3;
use renderer::{GpuState, pipeline::DirectionalLight};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::view::{self, View};
use crate::{RunConfig, Variant};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

/// Frames-per-second counter logged once a second.
struct FpsCounter {
    frames: u32,
    since: Instant,
}

impl FpsCounter {
    fn tick(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.duration_since(self.since).as_secs_f32();
        if elapsed >= 1.0 {
            log::info!("FPS: {:.1}", self.frames as f32 / elapsed);
            self.frames = 0;
            self.since = now;
        }
    }
}

/// Everything the render loop needs. Fields drop top to bottom: the view
/// before the GPU state it was created on, the GPU state before the window.
pub(crate) struct App {
    view: Option<View>,
    gpu: Option<GpuState>,
    window: Option<Arc<Window>>,

    config: RunConfig,
    camera: Camera,
    orbit: Option<Orbit>,
    light: DirectionalLight,
    last_frame: Instant,
    fps: Option<FpsCounter>,
    error: Option<anyhow::Error>,
}

impl App {
    pub(crate) fn new(config: RunConfig) -> Self {
        let aspect = config.width as f32 / config.height.max(1) as f32;
        let camera = view::default_camera(aspect);
        let orbit = (config.variant == Variant::Orbit).then(|| {
            let flat = Vec3::new(camera.eye.x, 0.0, camera.eye.z);
            Orbit::new(camera.target, flat.length(), camera.eye.y, 0.5)
        });
        let fps = config.show_fps.then(|| FpsCounter {
            frames: 0,
            since: Instant::now(),
        });

        Self {
            view: None,
            gpu: None,
            window: None,
            config,
            camera,
            orbit,
            light: DirectionalLight::default(),
            last_frame: Instant::now(),
            fps,
            error: None,
        }
    }

    pub(crate) fn into_result(mut self) -> anyhow::Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| anyhow!("Failed to create window: {e}"))?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(window.clone(), self.config.backends))?;
        log::info!(
            "Building {:?} view (vertex shader: {}, fragment shader: {})",
            self.config.variant,
            view::shader_label(self.config.vertex_shader.as_deref()),
            view::shader_label(self.config.fragment_shader.as_deref())
        );
        let view = View::build(&gpu, &self.config);

        self.camera = self.camera.with_aspect(gpu.aspect());
        self.view = Some(view);
        self.gpu = Some(gpu);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Some(orbit) = self.orbit.as_mut() {
            orbit.advance(dt);
            orbit.apply(&mut self.camera);
        }

        let (Some(gpu), Some(view)) = (self.gpu.as_mut(), self.view.as_ref()) else {
            return;
        };
        view.update(gpu, &self.camera, &self.light);

        let filter = self.config.name_filter.as_deref();
        match gpu.render_frame(CLEAR, |pass| view.render(pass, filter)) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated; reconfiguring.");
                gpu.recreate_surface();
            }
            Err(SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
                return;
            }
            Err(err) => log::warn!("Skipping frame: {err:?}"),
        }

        if let Some(fps) = self.fps.as_mut() {
            fps.tick(now);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err.context("Initialization failed"));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                    self.camera = self.camera.with_aspect(gpu.aspect());
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release in reverse order of acquisition.
        self.view = None;
        self.gpu = None;
        self.window = None;
        log::info!("GPU resources released.");
    }
}
