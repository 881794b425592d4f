//! Demo configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the values it
//! overrides. Defaults reproduce the reference scene: a swaying model in front
//! of a wall plane, lit by one shadow-casting directional light.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwayError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub sway: SwayConfig,
    pub model: ModelConfig,
    pub ground: GroundConfig,
    pub render: RenderConfig,
}

impl DemoConfig {
    /// Loads a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SwayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sway".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Keep orbiting briefly after the mouse is released.
    pub damping: bool,
    pub damping_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [4.0, 1.0, -4.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.01,
            damping: true,
            damping_factor: 0.05,
        }
    }
}

/// Directional light and its shadow camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient: [f32; 3],
    pub shadow: ShadowConfig,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [0.25, 2.0, -2.25],
            target: [0.0, 0.0, 0.0],
            color: [1.0, 1.0, 1.0],
            intensity: 3.0,
            ambient: [0.3, 0.32, 0.36],
            shadow: ShadowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow map resolution (square).
    pub map_size: u32,
    /// Half extent of the orthographic shadow camera.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    /// World-space offset along the receiver normal before the depth lookup.
    pub normal_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 1024,
            extent: 5.0,
            near: 0.5,
            far: 15.0,
            normal_bias: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    pub rotation_speed: f32,
    /// Rotation speed change per ArrowUp/ArrowDown press.
    pub speed_step: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.4,
            speed_step: 0.05,
        }
    }
}

/// The swaying model. Without a path a procedural slab stands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub rotation_y: f32,
    pub scale: f32,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            rotation_y: PI * 0.5,
            scale: 1.0,
            base_color: [0.8, 0.62, 0.52, 1.0],
            metallic: 0.0,
            roughness: 0.6,
        }
    }
}

/// The wall plane that receives the model's shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub position: [f32; 3],
    pub rotation_y: f32,
    pub base_color: [f32; 4],
    pub roughness: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            width: 15.0,
            height: 15.0,
            width_segments: 15,
            height_segments: 1,
            position: [0.0, -5.0, 5.0],
            rotation_y: PI,
            base_color: [1.0, 1.0, 1.0, 1.0],
            roughness: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: [f64; 4],
    pub exposure: f32,
    /// Use vsync (`Fifo`) instead of `Immediate` presentation when available.
    pub vsync: bool,
    /// MSAA samples for the main pass. Values above 1 select 4x when the
    /// surface format supports it.
    pub msaa_samples: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.55, 0.62, 0.7, 1.0],
            exposure: 1.0,
            vsync: true,
            msaa_samples: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scene() {
        let config = DemoConfig::default();
        assert_eq!(config.sway.rotation_speed, 0.4);
        assert_eq!(config.camera.position, [4.0, 1.0, -4.0]);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.light.position, [0.25, 2.0, -2.25]);
        assert_eq!(config.light.intensity, 3.0);
        assert_eq!(config.light.shadow.map_size, 1024);
        assert_eq!(config.light.shadow.far, 15.0);
        assert_eq!(config.light.shadow.normal_bias, 0.05);
        assert_eq!(config.ground.position, [0.0, -5.0, 5.0]);
        assert_eq!(config.render.exposure, 1.0);
        assert_eq!(config.render.msaa_samples, 4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DemoConfig::from_toml_str(
            r#"
            [sway]
            rotation_speed = 1.2

            [light.shadow]
            map_size = 2048
            "#,
        )
        .unwrap();

        assert_eq!(config.sway.rotation_speed, 1.2);
        assert_eq!(config.sway.speed_step, 0.05);
        assert_eq!(config.light.shadow.map_size, 2048);
        assert_eq!(config.light.shadow.far, 15.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_model_path() {
        let config = DemoConfig::from_toml_str("[model]\npath = \"models/head.obj\"").unwrap();
        assert_eq!(config.model.path, Some(PathBuf::from("models/head.obj")));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let err = DemoConfig::from_toml_str("[sway]\nrotation_speed = \"fast\"").unwrap_err();
        assert!(matches!(err, SwayError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = DemoConfig::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, SwayError::ConfigRead { .. }));
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = DemoConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(DemoConfig::from_toml_str(&text).unwrap(), config);
    }
}
