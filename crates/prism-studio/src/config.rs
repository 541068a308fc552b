//! Studio configuration, read from an optional RON file.

use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use winit::dpi::LogicalSize;

use prism_engine::assets::CUBE_FACES;
use prism_engine::fx::PipelineConfig;
use prism_engine::scene::{CameraConfig, DirectionalLight};
use prism_engine::window::RuntimeConfig;

pub const DEFAULT_CONFIG_PATH: &str = "prism.ron";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub max_pixel_density: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            title: runtime.title,
            width: runtime.initial_size.width,
            height: runtime.initial_size.height,
            max_pixel_density: runtime.max_pixel_density,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub model: PathBuf,
    /// Directory holding the six environment faces.
    pub environment: PathBuf,
    /// Face file names in px, nx, py, ny, pz, nz order.
    pub environment_faces: [String; 6],
    pub normal_map: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            model: "static/models/DamagedHelmet/glTF/DamagedHelmet.gltf".into(),
            environment: "static/textures/environmentMaps/0".into(),
            environment_faces: CUBE_FACES.map(|face| format!("{face}.jpg")),
            normal_map: "static/textures/interfaceNormalMap.png".into(),
        }
    }
}

/// How the loaded model is placed and lit.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub scale: f32,
    /// Radians around +Y.
    pub rotation_y: f32,
    pub env_map_intensity: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { scale: 2.0, rotation_y: FRAC_PI_2, env_map_intensity: 2.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub window: WindowConfig,
    pub assets: AssetPaths,
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub orbit_damping: f32,
    pub light: DirectionalLight,
    pub pipeline: PipelineConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetPaths::default(),
            model: ModelConfig::default(),
            camera: CameraConfig::default(),
            orbit_damping: 0.05,
            light: DirectionalLight::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Reads `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no config at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
        log::info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.clone(),
            initial_size: LogicalSize::new(self.window.width, self.window.height),
            max_pixel_density: self.window.max_pixel_density,
        }
    }
}

/// First CLI argument, or [`DEFAULT_CONFIG_PATH`].
pub fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(StudioConfig::parse("()").unwrap(), StudioConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = StudioConfig::parse(
            "(
                window: (title: \"bench\"),
                pipeline: (exposure: 2.0, bloom: (enabled: true)),
                model: (scale: 1.0),
            )",
        )
        .unwrap();

        assert_eq!(config.window.title, "bench");
        assert_eq!(config.window.width, 1280.0);
        assert_eq!(config.pipeline.exposure, 2.0);
        assert!(config.pipeline.bloom.enabled);
        assert_eq!(config.pipeline.bloom.threshold, 0.6);
        assert!(config.pipeline.rgb_shift.enabled);
        assert_eq!(config.model.scale, 1.0);
        assert_eq!(config.model.env_map_intensity, 2.5);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(StudioConfig::parse("(window: (width: \"wide\"))").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = StudioConfig::load(Path::new("definitely/not/here.ron")).unwrap();
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn documented_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.window.title, "prism");
        assert_eq!(config.window.max_pixel_density, 2.0);
        assert_eq!(config.orbit_damping, 0.05);
        assert_eq!(config.light.intensity, 3.0);
        assert_eq!(config.assets.environment_faces[1], "nx.jpg");
        assert_eq!(config.camera.fov_degrees, 75.0);
    }

    #[test]
    fn path_from_first_argument() {
        let args = ["prism", "scene.ron"].map(String::from).into_iter();
        assert_eq!(config_path(args), PathBuf::from("scene.ron"));
        let args = ["prism"].map(String::from).into_iter();
        assert_eq!(config_path(args), PathBuf::from(DEFAULT_CONFIG_PATH));
    }
}
