use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::occluder::generator::DEFAULT_MAX_CELLS;
use crate::occluder::{DebugSettings, GenerationConfig, ParameterLimits};
use crate::renderer::camera::OrbitCamera;
use crate::viewer::{SceneSettings, ViewerOptions};

/// Occluder viewer command line.
#[derive(Parser, Debug)]
#[command(
    name = "occluder-viewer",
    about = "Voxel occluder generation viewer",
    version
)]
pub struct Args {
    /// TOML file with viewer settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model shown at startup (cube, column, sphere, torus).
    #[arg(long)]
    pub model: Option<String>,

    /// Start with depth testing enabled.
    #[arg(long)]
    pub depth_test: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Occluder Viewer".into(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub eye_height: f32,
    pub eye_distance: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = OrbitCamera::default();
        Self {
            fov_degrees: camera.fov_degrees,
            eye_height: camera.eye_height,
            eye_distance: camera.eye_distance,
            near: camera.near,
            far: camera.far,
        }
    }
}

/// Viewer settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub initial_model: String,
    pub depth_test: bool,
    /// `[min, max]` accepted voxel sizes.
    pub voxel_size_range: [f32; 2],
    pub tint: [f32; 3],
    pub mesh_alpha: f32,
    pub occluder_color: [f32; 4],
    pub clear_color: [f32; 4],
    /// Radians per frame.
    pub rotation_step: f32,
    pub debug_voxel_scale: f32,
    /// Grids above this many voxels are rejected by the generator.
    pub max_voxel_cells: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let scene = SceneSettings::default();
        let limits = ParameterLimits::default();
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            initial_model: "cube".into(),
            depth_test: false,
            voxel_size_range: [limits.voxel_size_min, limits.voxel_size_max],
            tint: scene.tint,
            mesh_alpha: scene.mesh_alpha,
            occluder_color: scene.occluder_color,
            clear_color: scene.clear_color,
            rotation_step: 0.01,
            debug_voxel_scale: DebugSettings::default().voxel_scale,
            max_voxel_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `--config` if given and applies the remaining flags on top.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };

        if let Some(model) = &args.model {
            config.initial_model = model.clone();
        }
        config.depth_test |= args.depth_test;
        Ok(config)
    }

    /// Falls back to the default range when the configured one is unusable.
    pub fn limits(&self) -> ParameterLimits {
        let [min, max] = self.voxel_size_range;
        if min > 0.0 && min <= max {
            ParameterLimits {
                voxel_size_min: min,
                voxel_size_max: max,
            }
        } else {
            log::warn!("Ignoring voxel size range [{}, {}]", min, max);
            ParameterLimits::default()
        }
    }

    pub fn viewer_options(&self) -> ViewerOptions {
        let camera = OrbitCamera {
            fov_degrees: self.camera.fov_degrees,
            near: self.camera.near,
            far: self.camera.far,
            eye_height: self.camera.eye_height,
            eye_distance: self.camera.eye_distance,
            ..OrbitCamera::default()
        };

        let mut generation = GenerationConfig::default();
        generation.debug.voxel_scale = self.debug_voxel_scale.clamp(0.0, 1.0);

        ViewerOptions {
            initial_model: self.initial_model.clone(),
            scene: SceneSettings {
                camera,
                tint: self.tint,
                mesh_alpha: self.mesh_alpha.clamp(0.0, 1.0),
                occluder_color: self.occluder_color,
                clear_color: self.clear_color,
            },
            limits: self.limits(),
            generation,
        }
    }
}
