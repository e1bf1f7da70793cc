//! GPU-resident mesh: vertex + index buffers and a material binding.

use bytemuck::{Pod, Zeroable};
use wgpu::{VertexBufferLayout, VertexStepMode};

use asset::{MeshData, MeshVertex};

use crate::backend::{Backend, BufferKind, DrawPass, MaterialUniform, Uploader};

/// Vertex: position + normal + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
        }
    }
}

/// One uploaded mesh. Buffers are written once at creation and released
/// when the resource is dropped.
pub struct MeshResource<B: Backend> {
    vertex_buf: B::Buffer,
    index_buf: B::Buffer,
    material: B::MaterialBinding,
    index_count: u32,
    translucent: bool,
}

impl<B: Backend> MeshResource<B> {
    pub fn new(uploader: &mut impl Uploader<B>, label: &str, data: &MeshData) -> Self {
        if !data.is_valid() {
            log::warn!("Mesh '{label}' has no vertices or indices; it will not be drawn");
        }
        let vertices: Vec<Vertex> = data.vertices.iter().map(Vertex::from).collect();
        let vertex_buf = uploader.create_buffer(
            &format!("{label} VB"),
            BufferKind::Vertex,
            bytemuck::cast_slice(&vertices),
        );
        let index_buf = uploader.create_buffer(
            &format!("{label} IB"),
            BufferKind::Index,
            bytemuck::cast_slice(&data.indices),
        );
        let material = uploader.create_material(
            &format!("{label} Material"),
            &MaterialUniform::from(&data.material),
        );

        Self {
            vertex_buf,
            index_buf,
            material,
            index_count: data.indices.len() as u32,
            translucent: data.material.opacity < 1.0,
        }
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Material opacity below 1; drawn after opaque meshes.
    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    /// Draw the full index range with this mesh's material.
    pub fn render(&self, pass: &mut impl DrawPass<B>) {
        if self.index_count == 0 {
            return;
        }
        pass.draw_indexed_mesh(
            &self.vertex_buf,
            &self.index_buf,
            &self.material,
            self.index_count,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{Mock, MockDevice, MockPass};
    use asset::Material;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![
                MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2],
        )
        .with_material(Material::default())
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::LAYOUT.attributes.len(), 3);
    }

    #[test]
    fn upload_writes_vertices_indices_and_material() {
        let mut device = MockDevice::default();
        let mesh: MeshResource<Mock> = MeshResource::new(&mut device, "tri", &triangle());

        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertex_buf.kind, Some(BufferKind::Vertex));
        assert_eq!(mesh.vertex_buf.bytes, 3 * 32);
        assert_eq!(mesh.index_buf.kind, Some(BufferKind::Index));
        assert_eq!(mesh.index_buf.bytes, 3 * 4);
        assert_eq!(mesh.material.bytes, 48);
        assert_eq!(device.log.borrow().created.len(), 3);
    }

    #[test]
    fn render_issues_one_draw_for_full_index_count() {
        let mut device = MockDevice::default();
        let mesh: MeshResource<Mock> = MeshResource::new(&mut device, "tri", &triangle());
        let mut pass = MockPass {
            log: device.log.clone(),
        };
        mesh.render(&mut pass);
        assert_eq!(device.log.borrow().draws, vec![(mesh.vertex_buf.id, 3)]);
    }

    #[test]
    fn empty_mesh_draws_nothing() {
        let mut device = MockDevice::default();
        let mesh: MeshResource<Mock> = MeshResource::new(&mut device, "empty", &MeshData::default());
        let mut pass = MockPass {
            log: device.log.clone(),
        };
        mesh.render(&mut pass);
        assert!(device.log.borrow().draws.is_empty());
    }

    #[test]
    fn opacity_below_one_is_translucent() {
        let mut device = MockDevice::default();
        let opaque: MeshResource<Mock> = MeshResource::new(&mut device, "tri", &triangle());
        let glass = triangle().with_material(Material {
            opacity: 0.4,
            ..Material::default()
        });
        let glass: MeshResource<Mock> = MeshResource::new(&mut device, "glass", &glass);
        assert!(!opaque.is_translucent());
        assert!(glass.is_translucent());
    }

    #[test]
    fn moving_a_mesh_does_not_release_it() {
        let mut device = MockDevice::default();
        let mesh: MeshResource<Mock> = MeshResource::new(&mut device, "tri", &triangle());
        let moved = vec![mesh];
        assert!(device.log.borrow().released.is_empty());
        drop(moved);
        let mut released = device.log.borrow().released.clone();
        released.sort_unstable();
        assert_eq!(released, vec![0, 1, 2]);
    }
}
