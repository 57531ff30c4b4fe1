//! Configuration file handling for intunepack
//!
//! Settings come from an optional YAML file (`config.yaml`). Resolution order:
//! an explicit path (`--config` / `INTUNEPACK_CONFIG`), then the global
//! `~/.config/intunepack/config.yaml`, then built-in defaults. Command-line
//! flags override whatever was loaded.

pub mod settings;

pub use settings::{FileRequirement, PackConfig, SizeThresholds};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PackError, Result, config as config_error, fs as fs_error};

/// Config directory name under the platform config location
const CONFIG_DIR: &str = "intunepack";

/// Config file name
pub const CONFIG_FILE: &str = "config.yaml";

/// Load configuration, falling back to defaults when no file exists
///
/// # Errors
///
/// Returns `PackError::ConfigNotFound` when an explicit path does not exist,
/// and `PackError::ConfigParseFailed` when a file exists but is not valid YAML.
pub fn load(explicit: Option<&Path>) -> Result<PackConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(config_error::not_found(path.display().to_string()));
            }
            Some(path.to_path_buf())
        }
        None => global_config_path().filter(|p| p.is_file()),
    };

    let Some(path) = path else {
        debug!("No configuration file found, using defaults");
        return Ok(PackConfig::default());
    };

    debug!("Loading configuration from {}", path.display());
    let content = fs::read_to_string(&path)
        .map_err(|e| fs_error::read_failed(path.display().to_string(), e.to_string()))?;

    let config = PackConfig::from_yaml(&content).map_err(|e| match e {
        PackError::ConfigParseFailed { reason, .. } => {
            config_error::parse_failed(path.display().to_string(), reason)
        }
        other => other,
    })?;
    config.validate()?;
    Ok(config)
}

/// Location of the global configuration file, if the platform has a config dir
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
