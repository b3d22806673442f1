//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use fishbone::{
    FishboneError,
    config::{AppConfig, CanvasConfig},
};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for FishboneError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(message) => FishboneError::Appearance(message),
            other => FishboneError::Io(io::Error::other(other.to_string())),
        }
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (fishbone/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, FishboneError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("fishbone/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "fishbone", "fishbone") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Replaces the configured canvas dimensions with any given on the command line.
pub fn with_canvas_overrides(
    config: AppConfig,
    width: Option<f32>,
    height: Option<f32>,
) -> Result<AppConfig, FishboneError> {
    if width.is_none() && height.is_none() {
        return Ok(config);
    }

    let configured = config.canvas().size();
    let canvas = CanvasConfig::new(
        width.unwrap_or(configured.width()),
        height.unwrap_or(configured.height()),
    );
    canvas.validate().map_err(ConfigError::Validation)?;
    debug!(width:?, height:?; "Canvas overridden from command line");

    Ok(AppConfig::new(canvas, config.appearance().clone()))
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, FishboneError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .canvas()
        .validate()
        .map_err(ConfigError::Validation)?;
    config
        .appearance()
        .to_appearance()
        .map_err(ConfigError::Validation)?;

    Ok(config)
}
