//! In-memory scene graph produced by the format readers.
//!
//! Readers (OBJ, glTF) only translate their file format into these types; the
//! flattening into named meshes lives in [`crate::import`].

use crate::mesh::Material;

/// One node of the hierarchy. Nodes reference meshes by index into
/// [`Scene::meshes`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub mesh_indices: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_meshes(mut self, mesh_indices: impl IntoIterator<Item = usize>) -> Self {
        self.mesh_indices.extend(mesh_indices);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Visit this node and its descendants depth-first, self before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Raw mesh as read from the file: pre-triangulated faces plus a material
/// reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<[u32; 3]>,
    pub material_index: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub root: Option<Node>,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<Material>,
}

impl Scene {
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        if let Some(root) = &self.root {
            root.walk(&mut |_| count += 1);
        }
        count
    }
}
