//! Renderer: GPU context, mesh/model resources, pipelines and shaders.
//! wgpu = 26.x, winit = 0.30.x

pub mod backend;
mod gpu;
pub mod mesh;
pub mod model;
pub mod pipeline;
pub mod shader;
pub mod triangle;

pub use backend::{Backend, DrawPass, Uploader, Wgpu};
pub use gpu::{DEPTH_FORMAT, GpuState};
pub use mesh::MeshResource;
pub use model::ModelResource;
