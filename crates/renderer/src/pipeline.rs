//! Render pipelines: flat (per-vertex color) and model (material + light).

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    DepthBiasState, DepthStencilState, Device, FragmentState, PipelineLayoutDescriptor, Queue,
    RenderPass, RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderStages,
    TextureFormat, VertexBufferLayout, VertexState, util::DeviceExt,
};

use crate::DEPTH_FORMAT;
use crate::backend::{MaterialUniform, WgpuUploader};
use crate::mesh::Vertex;

/// A light that shines uniformly along `direction`.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.5),
            color: Vec3::ONE,
            ambient: Vec3::splat(0.2),
        }
    }
}

/// Per-frame scene UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub light_ambient: [f32; 4],
}

impl SceneUniform {
    pub fn new(view_proj: Mat4, model: Mat4, camera_pos: Vec3, light: &DirectionalLight) -> Self {
        let normal_matrix = model.inverse().transpose();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            light_dir: light.direction.normalize_or_zero().extend(0.0).to_array(),
            light_color: light.color.extend(1.0).to_array(),
            light_ambient: light.ambient.extend(1.0).to_array(),
        }
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, &DirectionalLight::default())
    }
}

fn uniform_layout_entry(visibility: ShaderStages, size: usize) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn depth_state(write: bool) -> DepthStencilState {
    DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: if write {
            wgpu::CompareFunction::LessEqual
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: DepthBiasState::default(),
    }
}

/// Shader stage modules plus the fragment entry point to use.
pub struct ShaderSet<'a> {
    pub vertex: &'a ShaderModule,
    pub fragment: &'a ShaderModule,
    pub fragment_entry: &'a str,
}

#[allow(clippy::too_many_arguments)]
fn build_pipeline(
    device: &Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shaders: &ShaderSet<'_>,
    buffers: &[VertexBufferLayout<'_>],
    color_format: TextureFormat,
    blend: BlendState,
    depth_write: bool,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shaders.vertex,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: shaders.fragment,
            entry_point: Some(shaders.fragment_entry),
            targets: &[Some(ColorTargetState {
                format: color_format,
                blend: Some(blend),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(depth_state(depth_write)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Pipeline for imported models: scene UBO at group 0, material at group 1.
pub struct ModelPipeline {
    pipeline: RenderPipeline,
    scene_buf: Buffer,
    scene_bg: BindGroup,
    material_bgl: BindGroupLayout,
}

impl ModelPipeline {
    pub fn new(device: &Device, color_format: TextureFormat, shaders: &ShaderSet<'_>) -> Self {
        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[uniform_layout_entry(
                ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<SceneUniform>(),
            )],
        });
        let material_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Material BGL"),
            entries: &[uniform_layout_entry(
                ShaderStages::FRAGMENT,
                std::mem::size_of::<MaterialUniform>(),
            )],
        });

        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&SceneUniform::default()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Model PipelineLayout"),
            bind_group_layouts: &[&scene_bgl, &material_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = build_pipeline(
            device,
            "Model Pipeline",
            &layout,
            shaders,
            &[Vertex::LAYOUT],
            color_format,
            BlendState::ALPHA_BLENDING,
            true,
        );

        Self {
            pipeline,
            scene_buf,
            scene_bg,
            material_bgl,
        }
    }

    /// Uploader creating mesh resources compatible with this pipeline.
    pub fn uploader<'a>(&'a self, device: &'a Device) -> WgpuUploader<'a> {
        WgpuUploader {
            device,
            material_layout: &self.material_bgl,
        }
    }

    pub fn update(&self, queue: &Queue, scene: &SceneUniform) {
        queue.write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(scene));
    }

    pub fn bind(&self, pass: &mut RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.scene_bg, &[]);
    }
}

/// Vertex layouts of the flat pipeline: clip-space position and color, each
/// in its own buffer.
const FLAT_LAYOUTS: [VertexBufferLayout<'static>; 2] = [
    VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x4],
    },
    VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![1 => Float32x4],
    },
];

/// Pipeline for pre-transformed geometry with per-vertex colors.
pub struct FlatPipeline {
    pipeline: RenderPipeline,
}

impl FlatPipeline {
    pub fn new(device: &Device, color_format: TextureFormat, shaders: &ShaderSet<'_>) -> Self {
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Flat PipelineLayout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let pipeline = build_pipeline(
            device,
            "Flat Pipeline",
            &layout,
            shaders,
            &FLAT_LAYOUTS,
            color_format,
            BlendState::REPLACE,
            false,
        );
        Self { pipeline }
    }

    pub fn bind(&self, pass: &mut RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_uniform_size_is_16_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<SceneUniform>(), 3 * 64 + 4 * 16);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let u = SceneUniform::new(Mat4::IDENTITY, model, Vec3::ZERO, &DirectionalLight::default());
        assert!((u.normal_matrix[0][0] - 0.5).abs() < 1e-6);
        assert!((u.normal_matrix[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn light_direction_is_normalized() {
        let light = DirectionalLight {
            direction: Vec3::new(0.0, -4.0, 0.0),
            ..DirectionalLight::default()
        };
        let u = SceneUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, &light);
        assert_eq!(u.light_dir, [0.0, -1.0, 0.0, 0.0]);
    }
}
