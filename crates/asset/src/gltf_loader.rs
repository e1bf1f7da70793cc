//! glTF 2.0 reader producing a [`Scene`].

use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;
use crate::mesh::Material;
use crate::scene::{Node, Scene, SceneMesh};

/// Load a glTF 2.0 file (.gltf or .glb).
pub fn load_gltf(path: &Path) -> Result<Scene, ImportError> {
    let (document, buffers, _images) =
        gltf::import(path).map_err(|e| ImportError::Gltf(path.to_path_buf(), e))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("gltf");
    convert(&document, &buffers, name)
}

/// Load a glTF document held in memory. External buffer URIs are not allowed.
pub fn load_gltf_from_slice(bytes: &[u8], name: &str) -> Result<Scene, ImportError> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|e| ImportError::Gltf(name.into(), e))?;
    convert(&document, &buffers, name)
}

fn convert(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Result<Scene, ImportError> {
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ImportError::NoScene)?;

    // Slot 0 holds the default material for primitives without one.
    let mut materials = vec![Material::default()];
    materials.extend(document.materials().map(|m| {
        let [r, g, b, a] = m.pbr_metallic_roughness().base_color_factor();
        Material {
            diffuse: [r, g, b],
            opacity: a,
            ..Material::default()
        }
    }));

    let mut converter = Converter {
        buffers,
        meshes: Vec::new(),
        converted: HashMap::new(),
    };
    let mut root = Node::named(name);
    for node in gltf_scene.nodes() {
        root.children.push(converter.node(&node)?);
    }

    log::debug!(
        "glTF '{}': {} meshes, {} materials",
        name,
        converter.meshes.len(),
        materials.len() - 1
    );

    Ok(Scene {
        root: Some(root),
        meshes: converter.meshes,
        materials,
    })
}

struct Converter<'a> {
    buffers: &'a [gltf::buffer::Data],
    meshes: Vec<SceneMesh>,
    /// glTF mesh index -> scene mesh indices (one per primitive).
    converted: HashMap<usize, Vec<usize>>,
}

impl Converter<'_> {
    fn node(&mut self, node: &gltf::Node<'_>) -> Result<Node, ImportError> {
        let mut out = Node {
            name: node.name().map(str::to_string),
            ..Node::default()
        };
        if let Some(mesh) = node.mesh() {
            out.mesh_indices = self.mesh(&mesh)?;
        }
        for child in node.children() {
            out.children.push(self.node(&child)?);
        }
        Ok(out)
    }

    fn mesh(&mut self, mesh: &gltf::Mesh<'_>) -> Result<Vec<usize>, ImportError> {
        if let Some(indices) = self.converted.get(&mesh.index()) {
            return Ok(indices.clone());
        }

        let buffers = self.buffers;
        let mut indices = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh '{}' ({:?})",
                    primitive.index(),
                    mesh.name().unwrap_or("unnamed"),
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .ok_or_else(|| {
                    ImportError::Incomplete(format!(
                        "primitive {} of mesh {} has no POSITION attribute",
                        primitive.index(),
                        mesh.index()
                    ))
                })?;
            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
            let tex_coords: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect());

            let flat: Vec<u32> = match reader.read_indices() {
                Some(idx) => idx.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let (faces, dropped) = split_triangles(&flat);
            if dropped > 0 {
                log::warn!(
                    "Primitive {} of mesh '{}': dropping {} trailing indices that do not form a triangle",
                    primitive.index(),
                    mesh.name().unwrap_or("unnamed"),
                    dropped
                );
            }

            let material_index = primitive.material().index().map_or(0, |i| i + 1);

            indices.push(self.meshes.len());
            self.meshes.push(SceneMesh {
                positions,
                normals,
                tex_coords,
                faces,
                material_index,
            });
        }

        self.converted.insert(mesh.index(), indices.clone());
        Ok(indices)
    }
}

/// Group a triangle-list index stream into faces, returning the faces and the
/// number of leftover indices.
fn split_triangles(indices: &[u32]) -> (Vec<[u32; 3]>, usize) {
    let chunks = indices.chunks_exact(3);
    let dropped = chunks.remainder().len();
    (chunks.map(|tri| [tri[0], tri[1], tri[2]]).collect(), dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ImportOptions, flatten};

    // One red, half transparent triangle shared by a parent and a child node.
    const TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "body", "mesh": 0, "children": [1] },
            { "name": "wheel", "mesh": 0 }
        ],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 0.5] } }],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    #[test]
    fn reads_hierarchy_and_shares_meshes() {
        let scene = load_gltf_from_slice(TRIANGLE.as_bytes(), "car").expect("load");
        assert_eq!(scene.meshes.len(), 1);

        let root = scene.root.as_ref().expect("root");
        assert_eq!(root.name.as_deref(), Some("car"));
        let body = &root.children[0];
        assert_eq!(body.mesh_indices, vec![0]);
        assert_eq!(body.children[0].mesh_indices, vec![0]);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert!(mesh.normals.is_none());
    }

    #[test]
    fn base_color_maps_to_diffuse_and_opacity() {
        let scene = load_gltf_from_slice(TRIANGLE.as_bytes(), "car").expect("load");
        let records = flatten(&scene, &ImportOptions::default()).expect("flatten");
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["body", "wheel"]);

        let material = records[0].mesh.material;
        assert_eq!(material.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(material.opacity, 0.5);
        assert_eq!(material.specular, Material::DEFAULT_SPECULAR);
        assert_eq!(material.shininess, Material::DEFAULT_SHININESS);
        assert!(records[0].mesh.vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn trailing_indices_are_reported_not_kept() {
        let (faces, dropped) = split_triangles(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(faces, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(dropped, 2);

        let (faces, dropped) = split_triangles(&[0, 1, 2]);
        assert_eq!(faces, vec![[0, 1, 2]]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn document_without_scene_is_rejected() {
        let json = r#"{ "asset": { "version": "2.0" } }"#;
        let err = load_gltf_from_slice(json.as_bytes(), "empty").unwrap_err();
        assert!(matches!(err, ImportError::NoScene));
    }
}
