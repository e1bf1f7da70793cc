//! Scene import: read a model file and flatten its scene graph into named
//! meshes ready for upload.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;
use crate::mesh::{MeshData, MeshVertex};
use crate::scene::{Node, Scene};
use crate::{gltf_loader, obj};

/// What to do when two meshes resolve to the same node name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NameCollision {
    /// Keep both; later ones are keyed `name#1`, `name#2`, ...
    #[default]
    Suffix,
    /// The later mesh replaces the earlier one in place.
    Overwrite,
    /// Fail the import.
    Error,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImportOptions {
    pub name_collision: NameCollision,
}

/// One flattened mesh keyed by the name of the node that owns it.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRecord {
    pub name: String,
    pub mesh: MeshData,
}

/// Read `path` with the reader matching its extension and flatten the result.
pub fn import_scene(
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<Vec<MeshRecord>, ImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let scene = match extension.as_deref() {
        Some("obj") => obj::load_obj_from_path(path)?,
        Some("gltf") | Some("glb") => gltf_loader::load_gltf(path)?,
        _ => return Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    };

    let records = flatten(&scene, options)?;
    log::info!(
        "Imported '{}': {} nodes, {} meshes, {} materials -> {} mesh records",
        path.display(),
        scene.node_count(),
        scene.meshes.len(),
        scene.materials.len(),
        records.len()
    );
    Ok(records)
}

/// Walk the scene depth-first (node meshes before children) and build one
/// record per referenced mesh.
pub fn flatten(scene: &Scene, options: &ImportOptions) -> Result<Vec<MeshRecord>, ImportError> {
    let root = scene.root.as_ref().ok_or(ImportError::MissingRoot)?;
    let mut out = Records {
        policy: options.name_collision,
        records: Vec::new(),
        slots: HashMap::new(),
    };
    let mut visited = 0;
    visit(scene, root, &mut visited, &mut out)?;
    Ok(out.records)
}

struct Records {
    policy: NameCollision,
    records: Vec<MeshRecord>,
    slots: HashMap<String, usize>,
}

impl Records {
    fn insert(&mut self, name: String, mesh: MeshData) -> Result<(), ImportError> {
        let Some(&slot) = self.slots.get(&name) else {
            self.slots.insert(name.clone(), self.records.len());
            self.records.push(MeshRecord { name, mesh });
            return Ok(());
        };

        match self.policy {
            NameCollision::Error => Err(ImportError::DuplicateName(name)),
            NameCollision::Overwrite => {
                log::warn!("Mesh name '{name}' reused; replacing earlier mesh");
                self.records[slot].mesh = mesh;
                Ok(())
            }
            NameCollision::Suffix => {
                let unique = (1..)
                    .map(|n| format!("{name}#{n}"))
                    .find(|candidate| !self.slots.contains_key(candidate))
                    .unwrap_or_default();
                log::debug!("Mesh name '{name}' reused; keyed as '{unique}'");
                self.slots.insert(unique.clone(), self.records.len());
                self.records.push(MeshRecord { name: unique, mesh });
                Ok(())
            }
        }
    }
}

fn visit(
    scene: &Scene,
    node: &Node,
    visited: &mut usize,
    out: &mut Records,
) -> Result<(), ImportError> {
    let name = match &node.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("node{}", *visited),
    };
    *visited += 1;

    for &mesh_index in &node.mesh_indices {
        let mesh = build_mesh(scene, &name, mesh_index)?;
        log::debug!(
            "Node '{}': mesh {} with {} vertices, {} triangles",
            name,
            mesh_index,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        out.insert(name.clone(), mesh)?;
    }

    for child in &node.children {
        visit(scene, child, visited, out)?;
    }
    Ok(())
}

fn build_mesh(scene: &Scene, node_name: &str, mesh_index: usize) -> Result<MeshData, ImportError> {
    let source = scene.meshes.get(mesh_index).ok_or_else(|| {
        ImportError::Incomplete(format!(
            "node '{node_name}' references missing mesh {mesh_index}"
        ))
    })?;
    let material = scene
        .materials
        .get(source.material_index)
        .copied()
        .ok_or_else(|| {
            ImportError::Incomplete(format!(
                "mesh {mesh_index} references missing material {}",
                source.material_index
            ))
        })?;

    let normals = source.normals.as_deref().unwrap_or_default();
    let tex_coords = source.tex_coords.as_deref().unwrap_or_default();
    let vertices: Vec<MeshVertex> = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            MeshVertex::new(
                position,
                normals.get(i).copied().unwrap_or([0.0; 3]),
                tex_coords.get(i).copied().unwrap_or([0.0; 2]),
            )
        })
        .collect();

    let indices: Vec<u32> = source.faces.iter().flatten().copied().collect();
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(ImportError::IndexOutOfRange {
            name: node_name.to_string(),
            index,
            vertex_count: vertices.len(),
        });
    }

    Ok(MeshData::new(vertices, indices).with_material(material))
}
