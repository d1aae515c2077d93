//! Renderer configuration.
//!
//! [`RendererConfig`] gathers the sizes and constants the renderer and the demo
//! need. It deserializes from TOML; every field has a default so a partial
//! file is enough:
//!
//! ```toml
//! debug_buffers = true
//!
//! [gbuffer]
//! width = 1280
//! height = 720
//!
//! [lighting]
//! ambient = 0.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RendererConfig {
    pub window: WindowConfig,
    pub gbuffer: GBufferConfig,
    pub shadow: ShadowConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    /// Show the shadow map instead of the lit image in the resolve pass.
    pub debug_buffers: bool,
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
            title: "umbra".to_string(),
            width: 960,
            height: 540,
        }
    }
}

/// G-buffer resolution. Independent of the window; the resolve pass scales it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GBufferConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GBufferConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Shadow map resolution and the orthographic volume it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub width: u32,
    pub height: u32,
    /// Half-extent of the light's orthographic projection.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            extent: 25.0,
            near: -10.0,
            far: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            position: [0.0, 1.0, -5.0],
            move_speed: 4.0,
            turn_speed: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Light position (xyz) and intensity (w). The direction towards the
    /// light is the normalized xyz.
    pub directional: [f32; 4],
    pub ambient: f32,
    /// Background of the final image, visible where neither geometry nor
    /// sky was drawn.
    pub clear_color: [f64; 4],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            directional: [1.0, 1.2, 0.3, 1.0],
            ambient: 0.05,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RendererConfig {
    /// Loads a configuration from a `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Writes this configuration to a `.toml` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_scene() {
        let config = RendererConfig::default();
        assert_eq!((config.window.width, config.window.height), (960, 540));
        assert_eq!((config.gbuffer.width, config.gbuffer.height), (1920, 1080));
        assert_eq!((config.shadow.width, config.shadow.height), (960, 540));
        assert_eq!(config.lighting.directional, [1.0, 1.2, 0.3, 1.0]);
        assert!(!config.debug_buffers);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RendererConfig::from_toml(
            "debug_buffers = true\n[gbuffer]\nwidth = 800\nheight = 600\n",
        )
        .unwrap();
        assert!(config.debug_buffers);
        assert_eq!(config.gbuffer.width, 800);
        assert_eq!(config.gbuffer.height, 600);
        assert_eq!(config.shadow, ShadowConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let mut config = RendererConfig::default();
        config.lighting.ambient = 0.2;
        config.camera.position = [0.0, 3.0, -3.0];
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(RendererConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_other_extensions() {
        let err = RendererConfig::load("settings.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn reports_parse_errors() {
        let err = RendererConfig::from_toml("[gbuffer]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
