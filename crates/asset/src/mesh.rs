//! CPU-side mesh representation produced by the importers.

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Surface reflectance parameters consumed by the lit shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
}

impl Material {
    pub const DEFAULT_AMBIENT: [f32; 3] = [0.0, 0.0, 0.0];
    pub const DEFAULT_DIFFUSE: [f32; 3] = [0.6, 0.6, 0.6];
    pub const DEFAULT_SPECULAR: [f32; 3] = [0.0, 0.0, 0.0];
    pub const DEFAULT_SHININESS: f32 = 0.0;
    pub const DEFAULT_OPACITY: f32 = 1.0;
}

/// Properties missing from a source file resolve to these values.
impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Self::DEFAULT_AMBIENT,
            diffuse: Self::DEFAULT_DIFFUSE,
            specular: Self::DEFAULT_SPECULAR,
            shininess: Self::DEFAULT_SHININESS,
            opacity: Self::DEFAULT_OPACITY,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices and one material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    /// Number of whole triangles described by the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
