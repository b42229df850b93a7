//! Runtime configuration.
//!
//! Defaults reproduce the demo as shipped: a 1280x920 "Ripples" window and a
//! 70 degree camera five units back from the quad. Any field can be overridden
//! through `RIPPLES_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Window settings.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 920,
            title: "Ripples".to_string(),
        }
    }
}

/// Initial camera settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 70.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 0.0, 5.0],
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    /// Enable the Vulkan validation layers.
    pub validation: bool,
    /// Directory holding `ripple.vert.spv` and `ripple.frag.spv`.
    pub shader_dir: PathBuf,
    /// Fixed ripple seed; `None` seeds from the wall clock.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            validation: cfg!(debug_assertions),
            shader_dir: PathBuf::from("shaders/spirv"),
            seed: None,
        }
    }
}

impl Config {
    /// Build a configuration from defaults plus process environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults plus overrides supplied by `lookup`.
    ///
    /// Recognised keys: `RIPPLES_WIDTH`, `RIPPLES_HEIGHT`, `RIPPLES_FOV`,
    /// `RIPPLES_VALIDATION`, `RIPPLES_SHADER_DIR`, `RIPPLES_SEED`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(width) = parse(&lookup, "RIPPLES_WIDTH")? {
            config.window.width = width;
        }
        if let Some(height) = parse(&lookup, "RIPPLES_HEIGHT")? {
            config.window.height = height;
        }
        if let Some(fov) = parse::<f32, _>(&lookup, "RIPPLES_FOV")? {
            if !(fov > 0.0 && fov < 180.0) {
                return Err(Error::config(
                    "RIPPLES_FOV",
                    format!("{fov} is outside (0, 180)"),
                ));
            }
            config.camera.fov_y_degrees = fov;
        }
        if let Some(validation) = lookup("RIPPLES_VALIDATION") {
            config.validation = parse_flag("RIPPLES_VALIDATION", &validation)?;
        }
        if let Some(dir) = lookup("RIPPLES_SHADER_DIR") {
            config.shader_dir = PathBuf::from(dir);
        }
        config.seed = parse(&lookup, "RIPPLES_SEED")?;

        if config.window.width == 0 || config.window.height == 0 {
            return Err(Error::config(
                "RIPPLES_WIDTH/RIPPLES_HEIGHT",
                "window dimensions must be non-zero",
            ));
        }

        Ok(config)
    }

    /// Width over height of the initial window.
    pub fn aspect_ratio(&self) -> f32 {
        self.window.width as f32 / self.window.height as f32
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::config(key, format!("{raw:?}: {e}")))
        })
        .transpose()
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(key, format!("{other:?} is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("K", "TRUE").unwrap());
        assert!(parse_flag("K", " on ").unwrap());
        assert!(!parse_flag("K", "0").unwrap());
        assert!(parse_flag("K", "maybe").is_err());
    }

    #[test]
    fn test_aspect_ratio() {
        let config = Config::default();
        assert!((config.aspect_ratio() - 1280.0 / 920.0).abs() < f32::EPSILON);
    }
}
