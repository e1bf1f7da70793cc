//! GPU seam used by mesh/model resources.
//!
//! [`Backend`] names the resource types, [`Uploader`] creates them and
//! [`DrawPass`] records draws with them. Resources release themselves on
//! drop, so a mesh that owns them frees each exactly once.

use bytemuck::{Pod, Zeroable};
use wgpu::{BindGroupLayout, BufferUsages, Device, RenderPass, util::DeviceExt};

use asset::Material;

/// Bind group index of the per-mesh material uniform.
pub const MATERIAL_GROUP: u32 = 1;

pub trait Backend {
    type Buffer;
    type MaterialBinding;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

pub trait Uploader<B: Backend> {
    fn create_buffer(&mut self, label: &str, kind: BufferKind, contents: &[u8]) -> B::Buffer;
    fn create_material(&mut self, label: &str, material: &MaterialUniform) -> B::MaterialBinding;
}

pub trait DrawPass<B: Backend> {
    /// Bind `vertices`/`indices`/`material` and draw `index_count` indices as
    /// a triangle list.
    fn draw_indexed_mesh(
        &mut self,
        vertices: &B::Buffer,
        indices: &B::Buffer,
        material: &B::MaterialBinding,
        index_count: u32,
    );
}

/// Material UBO (16-byte aligned rows).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 3],
    pub shininess: f32,
    pub diffuse: [f32; 3],
    pub opacity: f32,
    pub specular: [f32; 3],
    pub _pad: f32,
}

impl From<&Material> for MaterialUniform {
    fn from(m: &Material) -> Self {
        Self {
            ambient: m.ambient,
            shininess: m.shininess,
            diffuse: m.diffuse,
            opacity: m.opacity,
            specular: m.specular,
            _pad: 0.0,
        }
    }
}

/// wgpu implementation.
pub struct Wgpu;

/// Material uniform buffer plus the bind group exposing it at
/// [`MATERIAL_GROUP`].
pub struct MaterialBinding {
    #[allow(dead_code)]
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Backend for Wgpu {
    type Buffer = wgpu::Buffer;
    type MaterialBinding = MaterialBinding;
}

pub struct WgpuUploader<'a> {
    pub device: &'a Device,
    pub material_layout: &'a BindGroupLayout,
}

impl Uploader<Wgpu> for WgpuUploader<'_> {
    fn create_buffer(&mut self, label: &str, kind: BufferKind, contents: &[u8]) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::Vertex => BufferUsages::VERTEX,
            BufferKind::Index => BufferUsages::INDEX,
        };
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
    }

    fn create_material(&mut self, label: &str, material: &MaterialUniform) -> MaterialBinding {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(material),
                usage: BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        MaterialBinding { buffer, bind_group }
    }
}

impl DrawPass<Wgpu> for RenderPass<'_> {
    fn draw_indexed_mesh(
        &mut self,
        vertices: &wgpu::Buffer,
        indices: &wgpu::Buffer,
        material: &MaterialBinding,
        index_count: u32,
    ) {
        self.set_bind_group(MATERIAL_GROUP, &material.bind_group, &[]);
        self.set_vertex_buffer(0, vertices.slice(..));
        self.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..index_count, 0, 0..1);
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Counting backend for resource lifetime tests.

    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default, Debug)]
    pub struct Log {
        pub created: Vec<u32>,
        pub released: Vec<u32>,
        pub draws: Vec<(u32, u32)>,
        next: u32,
    }

    pub type SharedLog = Rc<RefCell<Log>>;

    /// Stand-in GPU object; records its release on drop.
    #[derive(Debug)]
    pub struct MockBuffer {
        pub id: u32,
        pub kind: Option<BufferKind>,
        pub bytes: usize,
        log: SharedLog,
    }

    impl Drop for MockBuffer {
        fn drop(&mut self) {
            self.log.borrow_mut().released.push(self.id);
        }
    }

    pub struct Mock;

    impl Backend for Mock {
        type Buffer = MockBuffer;
        type MaterialBinding = MockBuffer;
    }

    #[derive(Default)]
    pub struct MockDevice {
        pub log: SharedLog,
    }

    impl MockDevice {
        fn alloc(&mut self, kind: Option<BufferKind>, bytes: usize) -> MockBuffer {
            let mut log = self.log.borrow_mut();
            let id = log.next;
            log.next += 1;
            log.created.push(id);
            MockBuffer {
                id,
                kind,
                bytes,
                log: self.log.clone(),
            }
        }
    }

    impl Uploader<Mock> for MockDevice {
        fn create_buffer(&mut self, _label: &str, kind: BufferKind, contents: &[u8]) -> MockBuffer {
            self.alloc(Some(kind), contents.len())
        }

        fn create_material(&mut self, _label: &str, material: &MaterialUniform) -> MockBuffer {
            self.alloc(None, bytemuck::bytes_of(material).len())
        }
    }

    /// Records `(vertex buffer id, index count)` per draw.
    pub struct MockPass {
        pub log: SharedLog,
    }

    impl DrawPass<Mock> for MockPass {
        fn draw_indexed_mesh(
            &mut self,
            vertices: &MockBuffer,
            _indices: &MockBuffer,
            _material: &MockBuffer,
            index_count: u32,
        ) {
            self.log.borrow_mut().draws.push((vertices.id, index_count));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_uniform_layout_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn material_uniform_copies_all_fields() {
        let m = Material {
            ambient: [0.1, 0.2, 0.3],
            diffuse: [0.4, 0.5, 0.6],
            specular: [0.7, 0.8, 0.9],
            shininess: 16.0,
            opacity: 0.5,
        };
        let u = MaterialUniform::from(&m);
        assert_eq!(u.ambient, m.ambient);
        assert_eq!(u.diffuse, m.diffuse);
        assert_eq!(u.specular, m.specular);
        assert_eq!(u.shininess, 16.0);
        assert_eq!(u.opacity, 0.5);
    }
}
