//! Asset loading/parsers (scene graphs, meshes, materials, shaders).
//! OBJ/MTL and glTF readers build a scene graph; `import` flattens it into
//! named meshes for upload.

pub mod error;
pub mod gltf_loader;
pub mod import;
pub mod mesh;
pub mod obj;
pub mod scene;
pub mod shader;

pub use error::{ImportError, ShaderError};
pub use import::{ImportOptions, MeshRecord, NameCollision, import_scene};
pub use mesh::{Material, MeshData, MeshVertex};
