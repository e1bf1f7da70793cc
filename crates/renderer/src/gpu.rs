//! Window surface, device and depth target.

use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::{
    Adapter, Backends, Color, CommandEncoderDescriptor, Device, DeviceDescriptor, Extent3d,
    Features, Instance, InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference,
    PresentMode, Queue, RenderPass, RenderPassColorAttachment, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RequestAdapterOptions, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
};
use winit::window::Window;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Depth attachment sized to the surface; rebuilt on every resize.
struct DepthTarget {
    view: TextureView,
}

impl DepthTarget {
    fn new(device: &Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("Depth Target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&Default::default()),
        }
    }
}

/// Everything needed to draw into one window.
pub struct GpuState {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    device: Device,
    queue: Queue,
    depth: DepthTarget,
}

impl GpuState {
    /// Acquire adapter, device and a configured surface for `window`.
    pub async fn new(window: Arc<Window>, backends: Backends) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create window surface")?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No GPU adapter can present to this window")?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("Failed to open GPU device")?;

        // Validation errors outside an error scope are reported, not fatal.
        device.on_uncaptured_error(Box::new(|err| log::error!("wgpu error: {err}")));

        let config = surface_config(&surface, &adapter, width, height)?;
        surface.configure(&device, &config);
        log::debug!("Surface configured: {:?} {}x{}", config.format, width, height);

        let depth = DepthTarget::new(&device, width, height);
        Ok(Self {
            surface,
            config,
            device,
            queue,
            depth,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Reconfigure the surface and depth target. Zero sizes clamp to 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthTarget::new(&self.device, self.config.width, self.config.height);
    }

    /// Clear color and depth, let `draw` record into the pass, then present.
    pub fn render_frame(
        &mut self,
        clear: Color,
        draw: impl FnOnce(&mut RenderPass<'_>),
    ) -> Result<(), SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let target = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            draw(&mut pass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Lost or outdated surfaces recover by reconfiguring.
    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.config.width, self.config.height);
    }
}

/// Prefer an sRGB format so lighting output is gamma-correct.
fn surface_config(
    surface: &Surface<'_>,
    adapter: &Adapter,
    width: u32,
    height: u32,
) -> Result<SurfaceConfiguration> {
    let caps = surface.get_capabilities(adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .context("Surface reports no supported formats")?;
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    Ok(SurfaceConfiguration {
        usage: TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: PresentMode::AutoVsync,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}
