//! Platform layer: windowing, event loop and the per-frame loop.
//!
//! All per-run state lives in one [`app::App`] handed to winit; resources are
//! acquired on `resumed` and released in reverse order on exit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use winit::event_loop::{ControlFlow, EventLoop};

use asset::MeshRecord;

mod app;
pub mod view;

/// Which exercise to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Flat-colored triangle, no model.
    Triangle,
    /// Imported model, unlit material colors.
    Mesh,
    /// Imported model with materials and a directional light.
    Lit,
    /// As `Lit`, with the camera orbiting the model.
    Orbit,
}

impl Variant {
    pub fn needs_model(self) -> bool {
        !matches!(self, Variant::Triangle)
    }
}

pub struct RunConfig {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub variant: Variant,
    /// Meshes imported before the window opens.
    pub model: Vec<MeshRecord>,
    /// Draw only meshes whose name contains this string.
    pub name_filter: Option<String>,
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    pub show_fps: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            title: "Model Viewer".to_string(),
            variant: Variant::Triangle,
            model: Vec::new(),
            name_filter: None,
            vertex_shader: None,
            fragment_shader: None,
            show_fps: false,
        }
    }
}

/// Open the window and run the render loop until it is closed.
/// Window or GPU initialization failures are returned as errors.
pub fn run(config: RunConfig) -> Result<()> {
    let event_loop: EventLoop<()> = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::App::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    app.into_result()
}
