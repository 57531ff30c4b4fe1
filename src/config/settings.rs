//! Pipeline settings (`config.yaml`) data structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, config as config_error};

const GIB: u64 = 1024 * 1024 * 1024;

/// Default manifest location relative to the deployment root
pub const DEFAULT_MANIFEST_PATH: &str = "image/Summary.txt";

/// Default vendor installer location relative to the deployment root
pub const DEFAULT_INSTALLER_PATH: &str = "image/Installer.exe";

/// Default collection file location relative to the deployment root
pub const DEFAULT_COLLECTION_PATH: &str = "image/Collection.xml";

/// A relative path the validator expects to find in a source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequirement {
    pub path: String,
    /// Missing critical files fail validation; others only warn
    #[serde(default)]
    pub critical: bool,
}

impl FileRequirement {
    pub fn critical(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            critical: true,
        }
    }

    pub fn optional(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            critical: false,
        }
    }
}

/// Size boundaries that select the compression strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeThresholds {
    /// Trees at or above this size use the enhanced strategy
    pub enhanced_bytes: u64,
    /// Trees above this size require explicit confirmation
    pub extreme_bytes: u64,
}

impl Default for SizeThresholds {
    fn default() -> Self {
        Self {
            enhanced_bytes: 4 * GIB,
            extreme_bytes: 8 * GIB,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Directory scanned for deployments
    pub source_root: PathBuf,
    /// Glob patterns matched case-insensitively against directory names
    pub patterns: Vec<String>,
    /// Shared output directory for archives, reports and wrapped packages
    pub output_dir: PathBuf,
    /// Root for per-run staging directories
    pub work_dir: PathBuf,
    /// Path to the external wrapping utility
    pub tool_path: PathBuf,
    /// Manifest location relative to the deployment root
    pub manifest_path: String,
    /// Vendor installer the generated script runs, relative to the deployment root
    pub installer_path: String,
    /// Collection file passed to the installer, relative to the deployment root
    pub collection_path: String,
    /// Structural files checked by the validator
    pub required_files: Vec<FileRequirement>,
    pub thresholds: SizeThresholds,
    /// Files per batch in the chunked strategy
    pub chunk_files: usize,
    /// Window for treating a wrapped file as produced by this run
    pub recent_output_minutes: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        let source_root = if cfg!(windows) {
            PathBuf::from("C:\\Autodesk\\Deployments")
        } else {
            PathBuf::from("deployments")
        };

        Self {
            source_root,
            patterns: [
                "*AutoCAD*",
                "*Revit*",
                "*Civil*3D*",
                "*Inventor*",
                "*Navisworks*",
                "*3ds*Max*",
                "*Maya*",
                "*Vault*",
                "*Autodesk*",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            output_dir: PathBuf::from("output"),
            work_dir: crate::temp::work_dir_base(),
            tool_path: PathBuf::from("IntuneWinAppUtil.exe"),
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            installer_path: DEFAULT_INSTALLER_PATH.to_string(),
            collection_path: DEFAULT_COLLECTION_PATH.to_string(),
            required_files: vec![
                FileRequirement::critical(DEFAULT_INSTALLER_PATH),
                FileRequirement::critical(DEFAULT_COLLECTION_PATH),
            ],
            thresholds: SizeThresholds::default(),
            chunk_files: 1000,
            recent_output_minutes: 5,
        }
    }
}

impl PackConfig {
    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Check value constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.chunk_files == 0 {
            return Err(config_error::invalid(
                "chunk_files must be greater than zero",
            ));
        }
        if self.thresholds.enhanced_bytes > self.thresholds.extreme_bytes {
            return Err(config_error::invalid(
                "thresholds.enhanced_bytes must not exceed thresholds.extreme_bytes",
            ));
        }
        if self.manifest_path.trim().is_empty() {
            return Err(config_error::invalid(
                "manifest_path must not be empty",
            ));
        }
        for (key, value) in [
            ("installer_path", &self.installer_path),
            ("collection_path", &self.collection_path),
        ] {
            if value.trim().is_empty() {
                return Err(config_error::invalid(format!("{key} must not be empty")));
            }
        }
        if self.patterns.is_empty() {
            return Err(config_error::invalid(
                "at least one discovery pattern is required",
            ));
        }
        Ok(())
    }

    /// Structural requirements, with the manifest appended as optional when unlisted
    pub fn requirements(&self) -> Vec<FileRequirement> {
        let mut requirements = self.required_files.clone();
        if !requirements.iter().any(|r| r.path == self.manifest_path) {
            requirements.push(FileRequirement::optional(self.manifest_path.clone()));
        }
        requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackError;

    #[test]
    fn test_default_config_is_valid() {
        let config = PackConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.work_dir.is_absolute());
        assert_eq!(config.thresholds.enhanced_bytes, 4 * GIB);
        assert_eq!(config.thresholds.extreme_bytes, 8 * GIB);
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        assert_eq!(PackConfig::from_yaml("  \n").unwrap(), PackConfig::default());
    }

    #[test]
    fn test_partial_thresholds_keep_other_default() {
        let config = PackConfig::from_yaml("thresholds:\n  enhanced_bytes: 100\n").unwrap();
        assert_eq!(config.thresholds.enhanced_bytes, 100);
        assert_eq!(config.thresholds.extreme_bytes, 8 * GIB);
    }

    #[test]
    fn test_requirements_append_manifest_once() {
        let config = PackConfig::default();
        let requirements = config.requirements();
        assert_eq!(requirements.len(), 3);
        assert_eq!(
            requirements.last(),
            Some(&FileRequirement::optional(DEFAULT_MANIFEST_PATH))
        );

        let listed = PackConfig {
            required_files: vec![FileRequirement::critical(DEFAULT_MANIFEST_PATH)],
            ..PackConfig::default()
        };
        assert_eq!(listed.requirements().len(), 1);
    }

    #[test]
    fn test_script_paths_from_yaml() {
        let config = PackConfig::from_yaml(
            "installer_path: media/Setup.exe\ncollection_path: media/Collection.xml\n",
        )
        .unwrap();
        assert_eq!(config.installer_path, "media/Setup.exe");
        assert_eq!(config.collection_path, "media/Collection.xml");
        assert_eq!(config.manifest_path, DEFAULT_MANIFEST_PATH);

        let defaults = PackConfig::default();
        assert_eq!(defaults.installer_path, DEFAULT_INSTALLER_PATH);
        assert_eq!(defaults.collection_path, DEFAULT_COLLECTION_PATH);
    }

    #[test]
    fn test_validate_rejects_empty_installer_path() {
        let config = PackConfig {
            installer_path: " ".to_string(),
            ..PackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PackError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_threshold_order() {
        let config = PackConfig {
            thresholds: SizeThresholds {
                enhanced_bytes: 10,
                extreme_bytes: 5,
            },
            ..PackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PackError::ConfigInvalid { .. })
        ));
    }
}
