//! WGSL loading and compilation with non-fatal diagnostics.

use std::path::Path;

use wgpu::{CompilationMessageType, Device, ShaderModule, ShaderModuleDescriptor, ShaderSource};

pub const FLAT_WGSL: &str = include_str!("../../../res/shaders/flat.wgsl");
pub const LIT_WGSL: &str = include_str!("../../../res/shaders/lit.wgsl");

/// Read the shader at `path`, or fall back to `builtin` when there is no path
/// or it cannot be read.
pub fn resolve_source(stage: &str, path: Option<&Path>, builtin: &'static str) -> String {
    let Some(path) = path else {
        return builtin.to_string();
    };
    match asset::shader::load_shader_source(path) {
        Ok(source) => source,
        Err(err) => {
            log::error!("{stage} shader: {err}; using built-in source");
            builtin.to_string()
        }
    }
}

/// Compile `source` for `stage`. Compiler and validation errors are logged
/// with the stage name and do not abort; the returned module is then invalid
/// and draws with it produce no meaningful output.
pub fn compile_shader(device: &Device, stage: &str, source: &str) -> ShaderModule {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(stage),
        source: ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    for message in &info.messages {
        let position = message
            .location
            .as_ref()
            .map(|loc| format!("{}:{}", loc.line_number, loc.line_position))
            .unwrap_or_else(|| "?".to_string());
        match message.message_type {
            CompilationMessageType::Error => {
                log::error!("{stage} shader compile error at {position}: {}", message.message)
            }
            CompilationMessageType::Warning => {
                log::warn!("{stage} shader warning at {position}: {}", message.message)
            }
            _ => {
                log::debug!("{stage} shader: {}", message.message)
            }
        }
    }

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        log::error!("{stage} shader failed validation:\n{err}");
    }
    module
}
