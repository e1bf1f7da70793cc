//! Entry point: CLI, logging, model import, then the render loop.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum, ValueHint};

use asset::{ImportOptions, NameCollision};
use platform::{RunConfig, Variant};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum VariantArg {
    Triangle,
    Mesh,
    Lit,
    Orbit,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Triangle => Variant::Triangle,
            VariantArg::Mesh => Variant::Mesh,
            VariantArg::Lit => Variant::Lit,
            VariantArg::Orbit => Variant::Orbit,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum GpuBackend {
    Auto,
    #[value(alias = "vk")]
    Vulkan,
    #[value(alias = "d3d12")]
    Dx12,
    #[value(alias = "mtl")]
    Metal,
    #[value(alias = "opengl", alias = "gles")]
    Gl,
}

impl From<GpuBackend> for wgpu::Backends {
    fn from(b: GpuBackend) -> Self {
        match b {
            GpuBackend::Auto => wgpu::Backends::all(),
            GpuBackend::Vulkan => wgpu::Backends::VULKAN,
            GpuBackend::Dx12 => wgpu::Backends::DX12,
            GpuBackend::Metal => wgpu::Backends::METAL,
            GpuBackend::Gl => wgpu::Backends::GL,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum CollisionArg {
    Suffix,
    Overwrite,
    Error,
}

impl From<CollisionArg> for NameCollision {
    fn from(c: CollisionArg) -> Self {
        match c {
            CollisionArg::Suffix => NameCollision::Suffix,
            CollisionArg::Overwrite => NameCollision::Overwrite,
            CollisionArg::Error => NameCollision::Error,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Incremental wgpu model viewer")]
struct Cli {
    /// Exercise to run; defaults to `lit` with a model, `triangle` without
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,
    /// Model file (.obj, .gltf, .glb)
    #[arg(long, value_hint = ValueHint::FilePath)]
    model: Option<PathBuf>,
    /// Draw only meshes whose node name contains this text
    #[arg(long, value_name = "TEXT")]
    only: Option<String>,
    /// WGSL file providing `vs_main`
    #[arg(long, value_hint = ValueHint::FilePath)]
    vertex_shader: Option<PathBuf>,
    /// WGSL file providing the fragment entry point
    #[arg(long, value_hint = ValueHint::FilePath)]
    fragment_shader: Option<PathBuf>,
    /// Window size
    #[arg(long, default_value = "1280x720", value_parser = parse_size, value_name = "WxH")]
    size: (u32, u32),
    #[arg(long, value_enum, default_value_t = GpuBackend::Auto)]
    gpu_backend: GpuBackend,
    /// How to key meshes whose node names repeat
    #[arg(long, value_enum, default_value_t = CollisionArg::Suffix)]
    name_collision: CollisionArg,
    /// Log frames per second once a second
    #[arg(long)]
    show_fps: bool,
    /// Logging filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;
    Ok((w.max(1), h.max(1)))
}

impl Cli {
    fn variant(&self) -> Variant {
        match (self.variant, &self.model) {
            (Some(v), _) => v.into(),
            (None, Some(_)) => Variant::Lit,
            (None, None) => Variant::Triangle,
        }
    }

    fn into_config(self) -> Result<RunConfig> {
        let variant = self.variant();
        let model = match (&self.model, variant.needs_model()) {
            (Some(path), true) => {
                let options = ImportOptions {
                    name_collision: self.name_collision.into(),
                };
                asset::import_scene(path, &options)
                    .with_context(|| format!("Failed to import model {}", path.display()))?
            }
            (None, true) => bail!("--model is required for the {variant:?} variant"),
            (Some(path), false) => {
                log::warn!("Ignoring --model {} for the triangle variant", path.display());
                Vec::new()
            }
            (None, false) => Vec::new(),
        };

        let (width, height) = self.size;
        Ok(RunConfig {
            backends: self.gpu_backend.into(),
            width,
            height,
            title: format!("Model Viewer ({variant:?})"),
            variant,
            model,
            name_filter: self.only,
            vertex_shader: self.vertex_shader,
            fragment_shader: self.fragment_shader,
            show_fps: self.show_fps,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_filter))
        .init();

    log::info!(
        "Starting viewer. Backend: {:?}, variant={:?}, show_fps={}, window_size={}x{}",
        cli.gpu_backend,
        cli.variant(),
        cli.show_fps,
        cli.size.0,
        cli.size.1
    );

    let config = cli.into_config()?;
    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_either_separator() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert_eq!(parse_size("0x0"), Ok((1, 1)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("ax600").is_err());
    }

    #[test]
    fn variant_defaults_follow_model_presence() {
        let cli = Cli::try_parse_from(["viewer"]).expect("parse");
        assert_eq!(cli.variant(), Variant::Triangle);

        let cli = Cli::try_parse_from(["viewer", "--model", "car.obj"]).expect("parse");
        assert_eq!(cli.variant(), Variant::Lit);

        let cli = Cli::try_parse_from(["viewer", "--model", "car.obj", "--variant", "orbit"])
            .expect("parse");
        assert_eq!(cli.variant(), Variant::Orbit);
    }

    #[test]
    fn backend_aliases_resolve() {
        let cli = Cli::try_parse_from(["viewer", "--gpu-backend", "vk"]).expect("parse");
        assert_eq!(wgpu::Backends::from(cli.gpu_backend), wgpu::Backends::VULKAN);
        let cli = Cli::try_parse_from(["viewer", "--gpu-backend", "opengl"]).expect("parse");
        assert_eq!(wgpu::Backends::from(cli.gpu_backend), wgpu::Backends::GL);
    }

    #[test]
    fn model_variants_require_a_model() {
        let cli = Cli::try_parse_from(["viewer", "--variant", "mesh"]).expect("parse");
        let err = cli.into_config().err().expect("missing model must fail");
        assert!(err.to_string().contains("--model"));
    }

    #[test]
    fn missing_model_file_is_fatal() {
        let cli = Cli::try_parse_from(["viewer", "--model", "no/such/car.obj"]).expect("parse");
        let err = cli.into_config().err().expect("import must fail");
        assert!(format!("{err:#}").contains("no/such/car.obj"));
    }

    #[test]
    fn triangle_config_has_no_meshes() {
        let cli = Cli::try_parse_from(["viewer", "--size", "640x480", "--only", "wheel"])
            .expect("parse");
        let config = cli.into_config().expect("config");
        assert_eq!(config.variant, Variant::Triangle);
        assert!(config.model.is_empty());
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.name_filter.as_deref(), Some("wheel"));
    }
}
