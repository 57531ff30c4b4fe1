//! Install/uninstall script generation
//!
//! Renders the PowerShell template in `templates/deploy.ps1`. Every value is
//! substituted inside a single-quoted PowerShell string, so quotes are doubled
//! and nothing is ever interpolated by the shell. Placeholders are replaced in
//! one pass; substituted values are never rescanned.

#![allow(clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use regex::{Captures, Regex};
use tracing::debug;

use crate::domain::{PackageDescriptor, SourceTree, UNKNOWN};
use crate::error::{Result, fs as fs_error};

const TEMPLATE: &str = include_str!("templates/deploy.ps1");

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"));

/// Windows PowerShell 5.1 reads BOM-less scripts in the ANSI code page
const UTF8_BOM: char = '\u{feff}';

/// A rendered script ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    pub file_name: String,
    pub content: String,
}

/// File name of the entry script for a package
pub fn script_name(package_name: &str) -> String {
    format!("Deploy-{package_name}.ps1")
}

/// Escape a value for a single-quoted PowerShell string
pub fn ps_quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Convert a tree-relative path to a Windows path
fn windows_path(relative: &str) -> String {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

pub struct ScriptGenerator {
    installer_path: String,
    collection_path: String,
}

impl ScriptGenerator {
    /// `installer_path` and `collection_path` are relative to the tree root
    pub fn new(installer_path: impl Into<String>, collection_path: impl Into<String>) -> Self {
        Self {
            installer_path: installer_path.into(),
            collection_path: collection_path.into(),
        }
    }

    pub fn render(
        &self,
        tree: &SourceTree,
        descriptor: &PackageDescriptor,
        package_name: &str,
        archive_name: &str,
    ) -> GeneratedScript {
        let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let installer_path = windows_path(&self.installer_path);
        let collection_path = windows_path(&self.collection_path);
        let substitutions: [(&str, &str); 12] = [
            ("PROGRAM_NAME", &descriptor.program_name),
            ("BUILD_NUMBER", &descriptor.build_number),
            ("PRODUCT_CODE", &descriptor.product_code),
            ("INSTALLER_VERSION", &descriptor.installer_version),
            ("ARCHIVE_NAME", archive_name),
            ("PACKAGE_NAME", package_name),
            ("INSTALLER_PATH", &installer_path),
            ("COLLECTION_PATH", &collection_path),
            ("SOURCE_NAME", &tree.name),
            ("GENERATED_AT", &generated_at),
            ("TOOL_VERSION", env!("CARGO_PKG_VERSION")),
            ("UNKNOWN", UNKNOWN),
        ];

        let rendered = PLACEHOLDER_RE.replace_all(TEMPLATE, |caps: &Captures<'_>| {
            substitutions
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| ps_quote(value))
                .unwrap_or_else(|| caps[0].to_string())
        });

        let mut content = String::with_capacity(rendered.len() + UTF8_BOM.len_utf8());
        content.push(UTF8_BOM);
        content.push_str(&rendered);

        GeneratedScript {
            file_name: script_name(package_name),
            content,
        }
    }

    /// Write the script into `dir`, returning its path
    pub fn write(&self, script: &GeneratedScript, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .map_err(|e| fs_error::write_failed(dir.display().to_string(), e.to_string()))?;
        let path = dir.join(&script.file_name);
        fs::write(&path, &script.content)
            .map_err(|e| fs_error::write_failed(path.display().to_string(), e.to_string()))?;
        debug!("Wrote install script {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{DEFAULT_COLLECTION_PATH, DEFAULT_INSTALLER_PATH};

    fn revit() -> PackageDescriptor {
        PackageDescriptor {
            program_name: "Revit 2023".to_string(),
            build_number: "23.1.7.0".to_string(),
            product_code: "{AAAA1111-BBBB-2222-CCCC-333344445555}".to_string(),
            installer_version: "2.3.0.58".to_string(),
        }
    }

    fn render(descriptor: &PackageDescriptor) -> (tempfile::TempDir, GeneratedScript) {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let root = temp.path().join("Revit_2023_23.1.7");
        fs::create_dir_all(&root).unwrap();
        let tree = SourceTree::open(&root).unwrap();
        let generator = ScriptGenerator::new(DEFAULT_INSTALLER_PATH, DEFAULT_COLLECTION_PATH);
        let script = generator.render(&tree, descriptor, "Revit_2023", "Revit_2023.tar.gz");
        (temp, script)
    }

    #[test]
    fn test_renders_descriptor_values() {
        let (_temp, script) = render(&revit());
        assert_eq!(script.file_name, "Deploy-Revit_2023.ps1");
        assert!(script.content.starts_with(UTF8_BOM));
        assert!(script.content.contains("$ProgramName      = 'Revit 2023'"));
        assert!(script.content.contains("$BuildNumber      = '23.1.7.0'"));
        assert!(
            script
                .content
                .contains("$ProductCode      = '{AAAA1111-BBBB-2222-CCCC-333344445555}'")
        );
        assert!(script.content.contains("$InstallerVersion = '2.3.0.58'"));
        assert!(script.content.contains("$ArchiveName      = 'Revit_2023.tar.gz'"));
        assert!(script.content.contains("$InstallerPath    = 'image\\Installer.exe'"));
        assert!(script.content.contains("from deployment 'Revit_2023_23.1.7'"));
        assert!(!script.content.contains("{{"));
    }

    #[test]
    fn test_script_behaviour_is_present() {
        let (_temp, script) = render(&revit());
        for expected in [
            "[ValidateSet('Install', 'Uninstall')]",
            "$FailureExitCode = 1603",
            "Test-Administrator",
            "'--offline_mode'",
            "'--installer_version'",
            "'msiexec.exe'",
            "'/x', $ProductCode, '/qn', '/norestart'",
            "WOW6432Node",
            "$installed -ge $target",
            "part-*.tar.gz",
            "} finally {",
        ] {
            assert!(script.content.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_single_quotes_are_doubled() {
        let descriptor = PackageDescriptor {
            program_name: "O'Brien's Tool 2024".to_string(),
            ..revit()
        };
        let (_temp, script) = render(&descriptor);
        assert!(script.content.contains("'O''Brien''s Tool 2024'"));
    }

    #[test]
    fn test_unknown_descriptor_still_renders() {
        let (_temp, script) = render(&PackageDescriptor::default());
        assert!(script.content.contains("$ProductCode      = 'unknown'"));
        assert!(script.content.contains("$Unknown          = 'unknown'"));
        assert!(!script.content.contains("{{"));
    }

    #[test]
    fn test_write_creates_directory() {
        let (temp, script) = render(&revit());
        let dir = temp.path().join("output/Revit_2023");
        let generator = ScriptGenerator::new(DEFAULT_INSTALLER_PATH, DEFAULT_COLLECTION_PATH);
        let path = generator.write(&script, &dir).unwrap();
        assert_eq!(path, dir.join("Deploy-Revit_2023.ps1"));
        assert_eq!(fs::read_to_string(path).unwrap(), script.content);
    }

    #[test]
    fn test_values_are_not_rescanned_for_placeholders() {
        let descriptor = PackageDescriptor {
            program_name: "Tool {{SOURCE_NAME}} {{PRODUCT_CODE}}".to_string(),
            ..revit()
        };
        let (_temp, script) = render(&descriptor);
        assert!(
            script
                .content
                .contains("$ProgramName      = 'Tool {{SOURCE_NAME}} {{PRODUCT_CODE}}'")
        );
        assert!(!script.content.contains("Tool Revit_2023_23.1.7"));
    }

    #[test]
    fn test_configured_paths_are_rendered() {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let root = temp.path().join("Maya_2024");
        fs::create_dir_all(&root).unwrap();
        let tree = SourceTree::open(&root).unwrap();
        let generator = ScriptGenerator::new("media/Setup.exe", "media/Config/Collection.xml");
        let script = generator.render(&tree, &revit(), "Maya_2024", "Maya_2024.tar.gz");
        assert!(script.content.contains("$InstallerPath    = 'media\\Setup.exe'"));
        assert!(
            script
                .content
                .contains("$CollectionPath   = 'media\\Config\\Collection.xml'")
        );
    }

    #[test]
    fn test_ps_quote() {
        assert_eq!(ps_quote("plain"), "plain");
        assert_eq!(ps_quote("it's"), "it''s");
    }
}
