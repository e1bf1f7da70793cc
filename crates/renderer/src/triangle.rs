//! Flat-colored triangle drawn straight in clip space.

use wgpu::{Buffer, BufferUsages, Device, RenderPass, util::DeviceExt};

use crate::pipeline::FlatPipeline;

pub const POSITIONS: [[f32; 4]; 3] = [
    [-0.5, -0.5, 0.0, 1.0],
    [0.0, 0.5, 0.0, 1.0],
    [0.5, -0.5, 0.0, 1.0],
];

pub const COLORS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
];

/// Position and color buffers, one vertex attribute each.
pub struct Triangle {
    position_buf: Buffer,
    color_buf: Buffer,
}

impl Triangle {
    pub fn new(device: &Device) -> Self {
        let position_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle VB"),
            contents: bytemuck::cast_slice(&POSITIONS),
            usage: BufferUsages::VERTEX,
        });
        let color_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle Colors"),
            contents: bytemuck::cast_slice(&COLORS),
            usage: BufferUsages::VERTEX,
        });
        Self {
            position_buf,
            color_buf,
        }
    }

    pub fn render(&self, pass: &mut RenderPass<'_>, pipeline: &FlatPipeline) {
        pipeline.bind(pass);
        pass.set_vertex_buffer(0, self.position_buf.slice(..));
        pass.set_vertex_buffer(1, self.color_buf.slice(..));
        pass.draw(0..POSITIONS.len() as u32, 0..1);
    }
}
