//! Structural validation of source trees
//!
//! Checks a tree for the relative paths listed in the requirements. Every
//! missing critical path is collected, not just the first; missing optional
//! paths only degrade to warnings. Read-only: nothing is written.

use tracing::{debug, warn};

use crate::config::FileRequirement;
use crate::domain::SourceTree;
use crate::error::{Result, structural};

/// Missing entries of one source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub missing_critical: Vec<String>,
    pub missing_optional: Vec<String>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.missing_critical.is_empty()
    }

    /// Convert a failed result into `PackError::ValidationFailed`
    pub fn into_result(self, tree: &SourceTree) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(structural::validation_failed(
                tree.path.display().to_string(),
                self.missing_critical,
            ))
        }
    }
}

/// Probes a tree for required files
pub struct Validator {
    requirements: Vec<FileRequirement>,
}

impl Validator {
    pub fn new(requirements: Vec<FileRequirement>) -> Self {
        Self { requirements }
    }

    pub fn validate(&self, tree: &SourceTree) -> ValidationResult {
        let mut result = ValidationResult::default();

        for requirement in &self.requirements {
            let path = tree.join(&requirement.path);
            if path.is_file() {
                debug!("Found {}", requirement.path);
                continue;
            }
            if requirement.critical {
                result.missing_critical.push(requirement.path.clone());
            } else {
                warn!(
                    "Optional file missing from {}: {}",
                    tree.name, requirement.path
                );
                result.missing_optional.push(requirement.path.clone());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackConfig;
    use crate::error::PackError;
    use std::fs;

    fn tree_with(files: &[&str]) -> (tempfile::TempDir, SourceTree) {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        for file in files {
            let path = temp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        let tree = SourceTree::open(temp.path()).unwrap();
        (temp, tree)
    }

    fn default_validator() -> Validator {
        Validator::new(PackConfig::default().requirements())
    }

    #[test]
    fn test_complete_tree_passes() {
        let (_temp, tree) = tree_with(&[
            "image/Installer.exe",
            "image/Collection.xml",
            "image/Summary.txt",
        ]);
        let result = default_validator().validate(&tree);
        assert!(result.passed());
        assert_eq!(result, ValidationResult::default());
    }

    #[test]
    fn test_missing_optional_only_warns() {
        let (_temp, tree) = tree_with(&["image/Installer.exe", "image/Collection.xml"]);
        let result = default_validator().validate(&tree);
        assert!(result.passed());
        assert_eq!(result.missing_optional, vec!["image/Summary.txt".to_string()]);
    }

    #[test]
    fn test_lists_every_missing_critical_file() {
        let (_temp, tree) = tree_with(&["image/Summary.txt"]);
        let result = default_validator().validate(&tree);
        assert!(!result.passed());
        assert_eq!(
            result.missing_critical,
            vec![
                "image/Installer.exe".to_string(),
                "image/Collection.xml".to_string()
            ]
        );

        match result.into_result(&tree) {
            Err(PackError::ValidationFailed { missing, .. }) => assert_eq!(missing.len(), 2),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_does_not_satisfy_file_requirement() {
        let (temp, tree) = tree_with(&["image/Collection.xml"]);
        fs::create_dir_all(temp.path().join("image/Installer.exe")).unwrap();
        let result = default_validator().validate(&tree);
        assert_eq!(result.missing_critical, vec!["image/Installer.exe".to_string()]);
    }
}
