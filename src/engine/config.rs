//! Application configuration loaded from JSON.

use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::engine::error::Result;
use crate::engine::window::WindowProps;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowProps,
    /// Publish FPS and layer stats to the window title.
    pub debug_ui: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowProps::default(),
            debug_ui: true,
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.window.title, "Hazel Engine");
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert!(config.window.vsync);
        assert!(config.debug_ui);
    }

    #[test]
    fn partial_window_section_keeps_other_defaults() {
        let config = AppConfig::from_json(r#"{ "window": { "width": 800, "vsync": false }, "debug_ui": false }"#).unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert!(!config.window.vsync);
        assert!(!config.debug_ui);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppConfig::from_json("{ window: ").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, crate::engine::error::EngineError::Io(_)));
    }
}
