//! What gets drawn each frame for the selected [`Variant`].

use std::path::Path;

use corelib::{
    Mat4, Vec3,
    camera::Camera,
    transform::{Bounds, Transform},
};
use renderer::{
    GpuState, ModelResource, Wgpu,
    pipeline::{DirectionalLight, FlatPipeline, ModelPipeline, SceneUniform, ShaderSet},
    shader::{FLAT_WGSL, LIT_WGSL, compile_shader, resolve_source},
    triangle::Triangle,
};
use wgpu::RenderPass;

use asset::MeshRecord;

use crate::{RunConfig, Variant};

/// GPU objects for one variant. Field order is drop order: meshes go before
/// the pipeline whose layout they were created against.
pub enum View {
    Triangle {
        triangle: Triangle,
        pipeline: FlatPipeline,
    },
    Model {
        model: ModelResource<Wgpu>,
        pipeline: ModelPipeline,
        transform: Mat4,
    },
}

impl View {
    pub fn build(gpu: &GpuState, config: &RunConfig) -> Self {
        let device = gpu.device();
        let (builtin, fragment_entry) = match config.variant {
            Variant::Triangle => (FLAT_WGSL, "fs_main"),
            Variant::Mesh => (LIT_WGSL, "fs_unlit"),
            Variant::Lit | Variant::Orbit => (LIT_WGSL, "fs_main"),
        };

        let vs_src = resolve_source("vertex", config.vertex_shader.as_deref(), builtin);
        let fs_src = resolve_source("fragment", config.fragment_shader.as_deref(), builtin);
        let vertex = compile_shader(device, "vertex", &vs_src);
        let fragment = compile_shader(device, "fragment", &fs_src);
        let shaders = ShaderSet {
            vertex: &vertex,
            fragment: &fragment,
            fragment_entry,
        };

        match config.variant {
            Variant::Triangle => View::Triangle {
                triangle: Triangle::new(device),
                pipeline: FlatPipeline::new(device, gpu.surface_format(), &shaders),
            },
            Variant::Mesh | Variant::Lit | Variant::Orbit => {
                let pipeline = ModelPipeline::new(device, gpu.surface_format(), &shaders);
                let model = ModelResource::upload(&mut pipeline.uploader(device), &config.model);
                View::Model {
                    model,
                    pipeline,
                    transform: fit_transform(&config.model).matrix(),
                }
            }
        }
    }

    /// Push per-frame uniforms. Only model views have any.
    pub fn update(&self, gpu: &GpuState, camera: &Camera, light: &DirectionalLight) {
        if let View::Model {
            pipeline,
            transform,
            ..
        } = self
        {
            let scene = SceneUniform::new(camera.proj_view(), *transform, camera.eye, light);
            pipeline.update(gpu.queue(), &scene);
        }
    }

    pub fn render(&self, pass: &mut RenderPass<'_>, name_filter: Option<&str>) {
        match self {
            View::Triangle { triangle, pipeline } => triangle.render(pass, pipeline),
            View::Model {
                model, pipeline, ..
            } => {
                pipeline.bind(pass);
                match name_filter {
                    Some(filter) => model.render_filtered(pass, |name| name.contains(filter)),
                    None => model.render(pass),
                }
            }
        }
    }
}

/// Center the model at the origin and scale its largest extent to 2 units.
pub fn fit_transform(records: &[MeshRecord]) -> Transform {
    let points = records
        .iter()
        .flat_map(|r| &r.mesh.vertices)
        .map(|v| Vec3::from_array(v.position));
    Transform::fit(&Bounds::from_points(points), 2.0)
}

/// Default perspective camera looking at the origin.
pub fn default_camera(aspect: f32) -> Camera {
    Camera::looking_at(Vec3::new(0.0, 1.5, 4.0), Vec3::ZERO, aspect)
}

pub fn shader_label(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string())
}
