//! Configuration system
//!
//! Configuration is plain serde data loadable from TOML or RON files. Every
//! field has a default so partial files are accepted.

use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            Self::from_toml(&contents)
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Intensity a newly bound projected texture starts with
pub const DEFAULT_GOBO_INTENSITY: f32 = 10.0;

/// # Gobo Configuration
///
/// Settings for projected-texture spotlights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoboConfig {
    /// Intensity given to a texture binding that does not specify one
    pub default_intensity: f32,
    /// Intensity published for spotlights that have no texture binding at all
    pub unbound_intensity: f32,
    /// Directories searched, in order, when resolving a texture source
    pub texture_search_paths: Vec<String>,
    /// RGBA colour of the placeholder bound to slots without a texture
    pub placeholder_color: [u8; 4],
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl GoboConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            default_intensity: DEFAULT_GOBO_INTENSITY,
            unbound_intensity: 1.0,
            texture_search_paths: vec![
                "resources/gobos".to_string(),
                "resources/textures".to_string(),
                ".".to_string(),
            ],
            placeholder_color: [255, 255, 255, 255],
            log_level: "info".to_string(),
        }
    }

    /// Set the default binding intensity
    pub fn with_default_intensity(mut self, intensity: f32) -> Self {
        self.default_intensity = intensity;
        self
    }

    /// Replace the texture search paths
    pub fn with_search_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texture_search_paths = paths.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for GoboConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for GoboConfig {}
