use std::path::PathBuf;

/// Errors raised while turning a model file into mesh records.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unsupported model format '{0}' (expected .obj, .gltf or .glb)")]
    UnsupportedFormat(PathBuf),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("material library '{path}' line {line}: {message}")]
    MaterialLibrary {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to load glTF file '{0}': {1}")]
    Gltf(PathBuf, #[source] gltf::Error),

    #[error("model contains no scene")]
    NoScene,

    #[error("scene has no root node")]
    MissingRoot,

    #[error("incomplete scene: {0}")]
    Incomplete(String),

    #[error("duplicate mesh name '{0}'")]
    DuplicateName(String),

    #[error("mesh '{name}' has index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        name: String,
        index: u32,
        vertex_count: usize,
    },
}

impl ImportError {
    pub(crate) fn parse(line_no: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line: line_no + 1,
            message: message.into(),
        }
    }
}

/// Errors raised while reading shader source text.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{0}' is empty")]
    Empty(PathBuf),
}
