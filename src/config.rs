//! Configuration file handling for glyphcam.
//!
//! Loads configuration from `~/.config/glyphcam/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for glyphcam.
/// Loaded from ~/.config/glyphcam/config.toml (or custom path via --config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_device")]
    pub device: PathBuf,
    #[serde(default = "default_buffers")]
    pub buffers: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            buffers: default_buffers(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub invert: bool,
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/video0")
}

fn default_buffers() -> u32 {
    4
}

fn default_timeout_ms() -> u64 {
    crate::pipeline::DEFAULT_WAIT_TIMEOUT.as_millis() as u64
}

fn default_workers() -> u32 {
    1
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# glyphcam configuration

[capture]
# Video device node
device = "/dev/video0"
# Mapped capture buffers to request (at least 2)
buffers = 4
# Give up if no frame arrives within this many milliseconds
timeout_ms = 1000

[pipeline]
# Worker threads per parallel stage
workers = 1

[render]
# Character set: standard, blocks, minimal
charset = "standard"
# Invert brightness (for light themes)
invert = false
"#;

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config.validate(&path)?;
            Ok(config)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Reject values the pipeline can't run with.
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };
        if self.pipeline.workers == 0 {
            return Err(invalid("pipeline.workers must be at least 1".to_string()));
        }
        if self.capture.buffers < 2 {
            return Err(invalid(format!(
                "capture.buffers must be at least 2, got {}",
                self.capture.buffers
            )));
        }
        if let Some(name) = &self.render.charset {
            if crate::render::Palette::from_name(name).is_none() {
                return Err(invalid(format!("unknown render.charset '{}'", name)));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid { path, message } => {
                write!(f, "Invalid config file '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("glyphcam").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/glyphcam/config.toml")
        })
}
