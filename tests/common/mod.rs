//! Common test utilities for intunepack integration tests

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Manifest of a deployment with every field resolvable
#[allow(dead_code)]
pub const REVIT_SUMMARY: &str = "\
Deployment Summary

Autodesk Installer
Build number: 2.3.0.58

Revit 2023
Product Code: {AAAA1111-BBBB-2222-CCCC-333344445555}
Build number: 23.1.7.0
";

/// Wrapping utility stand-in: records what it was given and writes a package
/// named after the setup script
#[allow(dead_code)]
pub const FAKE_TOOL: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -c) content="$2"; shift 2 ;;
    -s) setup="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
ls "$content" > "$out/staged-listing.txt"
name=$(basename "$setup" .ps1)
printf 'wrapped' > "$out/$name.intunewin"
"#;

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = dunce::canonicalize(temp.path()).expect("Failed to resolve temp directory");
        Self { temp, path }
    }

    /// Root scanned for deployments
    pub fn source_root(&self) -> PathBuf {
        self.path.join("deployments")
    }

    /// Shared output directory
    pub fn output_dir(&self) -> PathBuf {
        self.path.join("output")
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Create an empty directory under the source root
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let dir = self.source_root().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create directory");
        dir
    }

    /// Synthesize a complete deployment under the source root
    pub fn create_deployment(&self, name: &str, summary: &str) -> PathBuf {
        let base = format!("deployments/{name}");
        self.write_file(&format!("{base}/image/Installer.exe"), "MZ installer");
        self.write_file(
            &format!("{base}/image/Collection.xml"),
            "<Collection><Package name=\"Revit\"/></Collection>",
        );
        self.write_file(&format!("{base}/image/Summary.txt"), summary);
        self.write_file(&format!("{base}/image/RVT/x64/payload.cab"), &"payload".repeat(64));
        self.source_root().join(name)
    }

    /// Write `config.yaml` pointing every location into this workspace
    pub fn write_config(&self, tool: &Path) -> PathBuf {
        let content = format!(
            "source_root: {}\noutput_dir: {}\nwork_dir: {}\ntool_path: {}\n",
            yaml_quote(&self.source_root()),
            yaml_quote(&self.output_dir()),
            yaml_quote(&self.path.join("work")),
            yaml_quote(tool),
        );
        self.write_file("config.yaml", &content)
    }

    /// Install the fake wrapping utility
    #[cfg(unix)]
    pub fn fake_tool(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write_file("tools/IntuneWinAppUtil", FAKE_TOOL);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make tool executable");
        path
    }

    /// A tool path that does not exist
    pub fn missing_tool(&self) -> PathBuf {
        self.path.join("tools").join("IntuneWinAppUtil.exe")
    }
}

#[allow(dead_code)]
fn yaml_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "''"))
}

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
#[allow(dead_code)]
pub fn intunepack_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("intunepack").expect("Failed to find intunepack binary")
}
