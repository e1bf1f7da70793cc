//! OBJ/MTL reader producing a [`Scene`].
//!
//! Supports positions, normals, texture coordinates, polygon faces (fan
//! triangulated), `o`/`g` groups as child nodes and `usemtl`/`mtllib`
//! materials. Faces before the first group belong to the root node.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::error::ImportError;
use crate::mesh::Material;
use crate::scene::{Node, Scene, SceneMesh};

type Result<T> = std::result::Result<T, ImportError>;

/// Load an OBJ scene from a file path. Material libraries are resolved
/// relative to the file's directory.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ImportError::Io(path.to_path_buf(), e))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("obj")
        .to_string();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_obj(BufReader::new(file), name, |lib| {
        let lib_path = base_dir.join(lib);
        let file = File::open(&lib_path).map_err(|e| ImportError::Io(lib_path.clone(), e))?;
        parse_mtl(BufReader::new(file)).map_err(|err| match err {
            ImportError::Parse { line, message } => ImportError::MaterialLibrary {
                path: lib_path.clone(),
                line,
                message,
            },
            other => other,
        })
    })
}

/// Convenience helper to parse an OBJ string literal. `mtllib` libraries are
/// treated as unreadable since there is no directory to resolve them against.
pub fn load_obj_from_str(contents: &str) -> Result<Scene> {
    parse_obj(io::Cursor::new(contents), "obj".to_string(), |lib| {
        Err(ImportError::Io(
            PathBuf::from(lib),
            io::Error::new(io::ErrorKind::NotFound, "no base directory for a string source"),
        ))
    })
}

/// Parse an MTL material library from a string.
pub fn load_mtl_from_str(contents: &str) -> Result<Vec<(String, Material)>> {
    parse_mtl(io::Cursor::new(contents))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Key(usize, Option<usize>, Option<usize>);

/// Mesh under construction: one per (group, material) run.
#[derive(Default)]
struct MeshBuilder {
    unique: HashMap<Key, u32>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    has_normals: bool,
    has_tex_coords: bool,
    faces: Vec<[u32; 3]>,
}

impl MeshBuilder {
    fn finish(self, material_index: usize) -> Option<SceneMesh> {
        if self.faces.is_empty() {
            return None;
        }
        Some(SceneMesh {
            positions: self.positions,
            normals: self.has_normals.then_some(self.normals),
            tex_coords: self.has_tex_coords.then_some(self.tex_coords),
            faces: self.faces,
            material_index,
        })
    }
}

struct ObjState {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,

    materials: Vec<Material>,
    material_names: HashMap<String, usize>,
    missing_library: bool,

    meshes: Vec<SceneMesh>,
    root: Node,
    /// Index into `root.children` of the open group, `None` for the root.
    group: Option<usize>,
    material: usize,
    current: MeshBuilder,
}

impl ObjState {
    fn new(name: String) -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            // Slot 0 is used by faces that precede any `usemtl`.
            materials: vec![Material::default()],
            material_names: HashMap::new(),
            missing_library: false,
            meshes: Vec::new(),
            root: Node::named(name),
            group: None,
            material: 0,
            current: MeshBuilder::default(),
        }
    }

    fn flush_mesh(&mut self) {
        let builder = std::mem::take(&mut self.current);
        if let Some(mesh) = builder.finish(self.material) {
            let index = self.meshes.len();
            self.meshes.push(mesh);
            let node = match self.group {
                Some(i) => &mut self.root.children[i],
                None => &mut self.root,
            };
            node.mesh_indices.push(index);
        }
    }

    fn open_group(&mut self, name: &str) {
        self.flush_mesh();
        self.root.children.push(Node::named(name));
        self.group = Some(self.root.children.len() - 1);
    }

    fn use_material(&mut self, name: &str, line_no: usize) -> Result<()> {
        let index = match self.material_names.get(name) {
            Some(&index) => index,
            None if self.missing_library => {
                log::warn!(
                    "Unknown material '{}' on line {}; using default",
                    name,
                    line_no + 1
                );
                0
            }
            None => {
                return Err(ImportError::Incomplete(format!(
                    "material '{}' used on line {} is not defined",
                    name,
                    line_no + 1
                )));
            }
        };
        if index != self.material {
            self.flush_mesh();
            self.material = index;
        }
        Ok(())
    }

    fn add_library(&mut self, entries: Vec<(String, Material)>) {
        for (name, material) in entries {
            self.material_names.insert(name, self.materials.len());
            self.materials.push(material);
        }
    }

    fn face(&mut self, parts: std::str::SplitWhitespace<'_>, line_no: usize) -> Result<()> {
        let mut face_indices: Vec<u32> = Vec::new();
        for part in parts {
            let (vi, vti, vni) = parse_face_vertex(
                part,
                self.positions.len(),
                self.texcoords.len(),
                self.normals.len(),
                line_no,
            )?;
            let key = Key(vi, vti, vni);
            let mesh = &mut self.current;
            let index = match mesh.unique.get(&key) {
                Some(&idx) => idx,
                None => {
                    let position = self.positions[vi];
                    let uv = vti.map(|i| self.texcoords[i]);
                    let normal = vni.map(|i| self.normals[i]);

                    let idx = u32::try_from(mesh.positions.len()).map_err(|_| {
                        ImportError::parse(line_no, format!("too many vertices (>{})", u32::MAX))
                    })?;
                    mesh.positions.push(position);
                    mesh.normals.push(normal.unwrap_or([0.0; 3]));
                    mesh.tex_coords.push(uv.unwrap_or([0.0; 2]));
                    mesh.has_normals |= normal.is_some();
                    mesh.has_tex_coords |= uv.is_some();
                    mesh.unique.insert(key, idx);
                    idx
                }
            };
            face_indices.push(index);
        }

        if face_indices.len() < 3 {
            log::warn!("Skipping degenerate face on line {}", line_no + 1);
            return Ok(());
        }
        // Triangulate fan
        for tri in 1..(face_indices.len() - 1) {
            self.current
                .faces
                .push([face_indices[0], face_indices[tri], face_indices[tri + 1]]);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Scene> {
        self.flush_mesh();
        if self.meshes.is_empty() {
            return Err(ImportError::Incomplete("OBJ contained no triangles".into()));
        }
        Ok(Scene {
            root: Some(self.root),
            meshes: self.meshes,
            materials: self.materials,
        })
    }
}

fn parse_obj<R, L>(reader: R, name: String, mut load_library: L) -> Result<Scene>
where
    R: BufRead,
    L: FnMut(&str) -> Result<Vec<(String, Material)>>,
{
    let mut state = ObjState::new(name);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ImportError::parse(line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                state.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                state.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                state.normals.push([nx, ny, nz]);
            }
            "f" => state.face(parts, line_no)?,
            "o" | "g" => {
                let group = rest_of_line(trimmed, tag);
                state.open_group(if group.is_empty() { "default" } else { group });
            }
            "usemtl" => state.use_material(rest_of_line(trimmed, tag), line_no)?,
            "mtllib" => {
                for lib in parts {
                    match load_library(lib) {
                        Ok(entries) => {
                            log::debug!("Loaded {} materials from '{}'", entries.len(), lib);
                            state.add_library(entries);
                        }
                        // Unreadable libraries degrade to the default material.
                        Err(ImportError::Io(path, err)) => {
                            log::warn!(
                                "Material library '{}' unavailable: {}",
                                path.display(),
                                err
                            );
                            state.missing_library = true;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            _ => {
                // Ignore other directives (s/l/p/etc.)
            }
        }
    }

    state.finish()
}

fn parse_mtl<R: BufRead>(reader: R) -> Result<Vec<(String, Material)>> {
    let mut out: Vec<(String, Material)> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ImportError::parse(line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        if tag == "newmtl" {
            out.push((rest_of_line(trimmed, tag).to_string(), Material::default()));
            continue;
        }

        let Some((_, material)) = out.last_mut() else {
            // Properties before the first `newmtl` have nothing to attach to.
            continue;
        };
        match tag {
            "Ka" => material.ambient = parse_color(parts, line_no)?,
            "Kd" => material.diffuse = parse_color(parts, line_no)?,
            "Ks" => material.specular = parse_color(parts, line_no)?,
            "Ns" => material.shininess = parse_f32(parts.next(), line_no, "shininess")?,
            "d" => material.opacity = parse_f32(parts.next(), line_no, "dissolve")?,
            "Tr" => material.opacity = 1.0 - parse_f32(parts.next(), line_no, "transparency")?,
            _ => {}
        }
    }

    Ok(out)
}

fn rest_of_line<'a>(line: &'a str, tag: &str) -> &'a str {
    line[tag.len()..].trim()
}

/// `K? r [g b]`; a single component is replicated.
fn parse_color(mut parts: std::str::SplitWhitespace<'_>, line_no: usize) -> Result<[f32; 3]> {
    let r = parse_f32(parts.next(), line_no, "red component")?;
    match parts.next() {
        None => Ok([r, r, r]),
        Some(g) => {
            let g = parse_f32(Some(g), line_no, "green component")?;
            let b = parse_f32(parts.next(), line_no, "blue component")?;
            Ok([r, g, b])
        }
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| ImportError::parse(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|e| ImportError::parse(line_no, format!("failed to parse {what}: {e}")))
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>, Option<usize>)> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .ok_or_else(|| ImportError::parse(line_no, format!("malformed face element '{token}'")))?;
    let pos_idx = resolve_index(pos, pos_count, line_no)?;

    let tex_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let norm_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    Ok((pos_idx, tex_idx, norm_idx))
}

fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| ImportError::parse(line_no, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Err(ImportError::parse(line_no, "OBJ indices are 1-based; found 0"));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(ImportError::parse(
            line_no,
            format!("index {raw} resolved out of bounds (len={len})"),
        ));
    }

    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ImportOptions, flatten};

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let scene = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(3));
        assert_eq!(scene.root.as_ref().map(|r| r.mesh_indices.clone()), Some(vec![0]));
    }

    #[test]
    fn quads_are_fan_triangulated_and_shared_vertices_deduplicated() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            f 1 2 3 4
            f -4 -2 -1
        ";
        let scene = load_obj_from_str(src).expect("parse quad");
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3], [0, 2, 3]]);
        assert!(mesh.normals.is_none());
    }

    #[test]
    fn groups_and_materials_split_meshes() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            o body
            f 1 2 3
            o wheel
            f 1 2 3
        ";
        let scene = load_obj_from_str(src).expect("parse groups");
        let root = scene.root.as_ref().expect("root");
        assert!(root.mesh_indices.is_empty());
        let children: Vec<_> = root
            .children
            .iter()
            .map(|c| (c.name.clone().unwrap_or_default(), c.mesh_indices.clone()))
            .collect();
        assert_eq!(
            children,
            vec![("body".to_string(), vec![0]), ("wheel".to_string(), vec![1])]
        );

        let records = flatten(&scene, &ImportOptions::default()).expect("flatten");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.mesh.indices.len() == 3));
    }

    #[test]
    fn unknown_material_without_library_is_incomplete() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            usemtl paint
            f 1 2 3
        ";
        let err = load_obj_from_str(src).unwrap_err();
        assert!(matches!(err, ImportError::Incomplete(_)));
    }

    #[test]
    fn unresolvable_library_falls_back_to_default_material() {
        let src = "
            mtllib car.mtl
            v 0 0 0
            v 1 0 0
            v 0 1 0
            usemtl paint
            f 1 2 3
        ";
        let scene = load_obj_from_str(src).expect("parse");
        assert_eq!(scene.meshes[0].material_index, 0);
        assert_eq!(scene.materials[0], Material::default());
    }

    #[test]
    fn mtl_properties_and_defaults() {
        let src = "
            newmtl paint
            Ka 0.1 0.1 0.1
            Kd 0.8 0.0 0.0
            Ks 0.5
            Ns 64
            newmtl glass
            Tr 0.75
        ";
        let lib = load_mtl_from_str(src).expect("parse mtl");
        assert_eq!(lib.len(), 2);
        let (name, paint) = &lib[0];
        assert_eq!(name, "paint");
        assert_eq!(paint.ambient, [0.1, 0.1, 0.1]);
        assert_eq!(paint.diffuse, [0.8, 0.0, 0.0]);
        assert_eq!(paint.specular, [0.5, 0.5, 0.5]);
        assert_eq!(paint.shininess, 64.0);
        assert_eq!(paint.opacity, 1.0);

        let (_, glass) = &lib[1];
        assert_eq!(glass.diffuse, Material::DEFAULT_DIFFUSE);
        assert!((glass.opacity - 0.25).abs() < 1e-6);
    }

    /// Fresh directory under the system temp dir, unique per test.
    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("obj-{}-{}", name, std::process::id()))
            .join("models");
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    const CAR_OBJ: &str = "\
mtllib car.mtl trim.mtl
v 0 0 0
v 1 0 0
v 0 1 0
o body
usemtl paint
f 1 2 3
o window
usemtl glass
f 1 2 3
o bumper
usemtl chrome
f 1 2 3
";

    #[test]
    fn libraries_resolve_next_to_the_obj_file() {
        let dir = scratch_dir("libs");
        std::fs::write(dir.join("car.obj"), CAR_OBJ).expect("write obj");
        std::fs::write(
            dir.join("car.mtl"),
            "newmtl paint\nKd 1 0 0\nNs 32\nnewmtl glass\nKd 0.2 0.3 0.4\nd 0.5\n",
        )
        .expect("write mtl");
        std::fs::write(dir.join("trim.mtl"), "newmtl chrome\nKs 0.9 0.9 0.9\n")
            .expect("write mtl");

        let records = crate::import::import_scene(dir.join("car.obj"), &ImportOptions::default())
            .expect("import car");
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["body", "window", "bumper"]);

        let paint = records[0].mesh.material;
        assert_eq!(paint.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(paint.shininess, 32.0);
        assert_eq!(paint.opacity, 1.0);

        let glass = records[1].mesh.material;
        assert_eq!(glass.diffuse, [0.2, 0.3, 0.4]);
        assert_eq!(glass.opacity, 0.5);

        let chrome = records[2].mesh.material;
        assert_eq!(chrome.specular, [0.9, 0.9, 0.9]);
        assert_eq!(chrome.diffuse, Material::DEFAULT_DIFFUSE);

        std::fs::remove_dir_all(dir.parent().unwrap_or(&dir)).ok();
    }

    #[test]
    fn malformed_library_fails_with_its_path_and_line() {
        let dir = scratch_dir("malformed");
        std::fs::write(dir.join("car.obj"), CAR_OBJ).expect("write obj");
        std::fs::write(
            dir.join("car.mtl"),
            "newmtl paint\nKd 1 0 0\nnewmtl chrome\nKs 0.9 0.9\n",
        )
        .expect("write mtl");

        let err = load_obj_from_path(dir.join("car.obj")).unwrap_err();
        match &err {
            ImportError::MaterialLibrary { path, line, .. } => {
                assert!(path.ends_with("car.mtl"));
                assert_eq!(*line, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("car.mtl"));

        std::fs::remove_dir_all(dir.parent().unwrap_or(&dir)).ok();
    }

    #[test]
    fn missing_library_on_disk_falls_back_to_defaults() {
        let dir = scratch_dir("missing");
        std::fs::write(dir.join("car.obj"), CAR_OBJ).expect("write obj");

        let scene = load_obj_from_path(dir.join("car.obj")).expect("parse");
        assert_eq!(scene.materials, vec![Material::default()]);
        assert!(scene.meshes.iter().all(|m| m.material_index == 0));

        std::fs::remove_dir_all(dir.parent().unwrap_or(&dir)).ok();
    }

    #[test]
    fn zero_index_is_rejected() {
        let err = load_obj_from_str("v 0 0 0\nf 0 1 1\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse { line: 2, .. }));
    }

    #[test]
    fn empty_source_has_no_triangles() {
        assert!(load_obj_from_str("# nothing\n").is_err());
    }
}
