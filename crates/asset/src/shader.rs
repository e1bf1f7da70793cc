//! Shader source loading.

use std::path::Path;

use crate::error::ShaderError;

/// Read a shader source file as text.
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if source.trim().is_empty() {
        return Err(ShaderError::Empty(path.to_path_buf()));
    }
    log::debug!("Loaded shader {:?} ({} bytes)", path, source.len());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_shader_source("does/not/exist.wgsl").unwrap_err();
        assert!(matches!(err, ShaderError::Read { .. }));
        assert!(err.to_string().contains("does/not/exist.wgsl"));
    }

    #[test]
    fn reads_existing_file() {
        let path = std::env::temp_dir().join(format!("shader-{}.wgsl", std::process::id()));
        std::fs::write(&path, "@vertex fn vs_main() {}").expect("write temp shader");
        let source = load_shader_source(&path).expect("read shader");
        assert!(source.contains("vs_main"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn blank_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("blank-{}.wgsl", std::process::id()));
        std::fs::write(&path, "  \n").expect("write temp shader");
        let err = load_shader_source(&path).unwrap_err();
        assert!(matches!(err, ShaderError::Empty(_)));
        std::fs::remove_file(&path).ok();
    }
}
