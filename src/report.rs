//! Human-readable package descriptor report
//!
//! Written next to the wrapped package as `<Package>_PackageInfo.txt`. It holds
//! the identity fields, archive details, command lines and the detection rules
//! to configure in the management console. Nothing parses it downstream.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::domain::{
    CompressionOutcome, DescriptorField, PackageDescriptor, SourceTree, StrategyKind, format_size,
};
use crate::error::{Result, fs as fs_error};
use crate::hash;
use crate::metadata::ExtractionWarning;

/// Registry location of per-product uninstall entries
pub const UNINSTALL_KEY: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// File name of the report for a package
pub fn report_name(package_name: &str) -> String {
    format!("{package_name}_PackageInfo.txt")
}

/// Command line the management platform runs for a mode
pub fn command_line(script_name: &str, mode: &str) -> String {
    format!("powershell.exe -ExecutionPolicy Bypass -NoProfile -File .\\{script_name} {mode}")
}

/// Archive details shown in the report
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSummary {
    pub file_name: String,
    pub bytes: u64,
    pub digest: String,
    pub strategy: StrategyKind,
    pub ratio_percent: Option<f64>,
    pub attempts: Vec<String>,
}

impl ArchiveSummary {
    /// Summarize a build, hashing the archive
    pub fn from_outcome(outcome: &CompressionOutcome) -> Result<Self> {
        let file_name = outcome
            .output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            bytes: outcome.output_bytes,
            digest: hash::hash_file(&outcome.output)?,
            strategy: outcome.strategy,
            ratio_percent: outcome.ratio_percent(),
            attempts: outcome.attempts.iter().map(|a| a.summary()).collect(),
        })
    }
}

/// Everything the report renders
pub struct PackageReport<'a> {
    pub tree: &'a SourceTree,
    pub descriptor: &'a PackageDescriptor,
    pub package_name: &'a str,
    pub script_name: &'a str,
    pub archive: &'a ArchiveSummary,
    pub warnings: &'a [ExtractionWarning],
}

impl PackageReport<'_> {
    pub fn file_name(&self) -> String {
        report_name(self.package_name)
    }

    pub fn render(&self) -> String {
        let d = self.descriptor;
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(out, "intunepack package information");
        let _ = writeln!(out, "==============================");
        let _ = writeln!(out, "Generated:          {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Source deployment:  {}", self.tree.name);
        let _ = writeln!(out, "Source path:        {}", self.tree.path.display());
        let _ = writeln!(out);

        let _ = writeln!(out, "PACKAGE IDENTITY");
        let _ = writeln!(out, "  Program name:       {}", d.program_name);
        let _ = writeln!(out, "  Build number:       {}", d.build_number);
        let _ = writeln!(out, "  Product code:       {}", d.product_code);
        let _ = writeln!(out, "  Installer version:  {}", d.installer_version);
        let _ = writeln!(out, "  Package name:       {}", self.package_name);
        let _ = writeln!(out);

        let archive = self.archive;
        let ratio = archive
            .ratio_percent
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"));
        let _ = writeln!(out, "ARCHIVE");
        let _ = writeln!(out, "  File:               {}", archive.file_name);
        let _ = writeln!(out, "  Size:               {} ({} bytes)", format_size(archive.bytes), archive.bytes);
        let _ = writeln!(out, "  Digest:             {}", archive.digest);
        let _ = writeln!(out, "  Strategy:           {}", archive.strategy);
        let _ = writeln!(out, "  Compression ratio:  {ratio}");
        if archive.attempts.len() > 1 {
            let _ = writeln!(out, "  Attempts:           {}", archive.attempts.join("; "));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "COMMANDS");
        let _ = writeln!(out, "  Install:            {}", command_line(self.script_name, "Install"));
        let _ = writeln!(out, "  Uninstall:          {}", command_line(self.script_name, "Uninstall"));
        let _ = writeln!(out, "  Install behavior:   System");
        let _ = writeln!(out);

        self.render_detection(&mut out);
        self.render_warnings(&mut out);
        render_guidance(&mut out);
        out
    }

    fn render_detection(&self, out: &mut String) {
        let d = self.descriptor;
        let _ = writeln!(out, "DETECTION RULE (primary)");
        if d.is_degraded() {
            let missing: Vec<String> = [DescriptorField::ProductCode, DescriptorField::BuildNumber]
                .into_iter()
                .filter(|f| !d.is_known(*f))
                .map(|f| f.to_string())
                .collect();
            let _ = writeln!(
                out,
                "  Unavailable: {} could not be determined. Configure detection manually.",
                missing.join(" and ")
            );
            let _ = writeln!(out);
            return;
        }

        let _ = writeln!(out, "  Rule type:          MSI");
        let _ = writeln!(out, "  MSI product code:   {}", d.product_code);
        let _ = writeln!(out, "  Version check:      Yes");
        let _ = writeln!(out, "  Operator:           Greater than or equal to");
        let _ = writeln!(out, "  Value:              {}", d.build_number);
        let _ = writeln!(out);

        let _ = writeln!(out, "DETECTION RULE (alternative)");
        let _ = writeln!(out, "  Rule type:          Registry");
        let _ = writeln!(out, "  Key path:           {UNINSTALL_KEY}\\{}", d.product_code);
        let _ = writeln!(out, "  Value name:         DisplayVersion");
        let _ = writeln!(out, "  Detection method:   Version comparison");
        let _ = writeln!(out, "  Operator:           Greater than or equal to");
        let _ = writeln!(out, "  Value:              {}", d.build_number);
        let _ = writeln!(out, "  32-bit app on 64-bit clients: No");
        let _ = writeln!(out);
    }

    fn render_warnings(&self, out: &mut String) {
        if self.warnings.is_empty() {
            return;
        }
        let _ = writeln!(out, "EXTRACTION WARNINGS");
        for warning in self.warnings {
            let _ = writeln!(out, "  - {}: {}", warning.field, warning.message);
        }
        let _ = writeln!(out);
    }

    /// Write the report into `dir`, returning its path
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .map_err(|e| fs_error::write_failed(dir.display().to_string(), e.to_string()))?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.render())
            .map_err(|e| fs_error::write_failed(path.display().to_string(), e.to_string()))?;
        debug!("Wrote package report {}", path.display());
        Ok(path)
    }
}

fn render_guidance(out: &mut String) {
    let _ = writeln!(out, "GUIDANCE");
    let _ = writeln!(out, "  - The script must run as SYSTEM; it exits with 1603 when not elevated.");
    let _ = writeln!(out, "  - Clients need tar.exe (Windows 10 1803 or later) to expand the archive.");
    let _ = writeln!(out, "  - Installs are skipped when an equal or newer version is already present.");
    let _ = writeln!(out, "  - Allow for twice the archive size of free disk space during installation.");
    let _ = writeln!(out);
    let _ = writeln!(out, "RETURN CODES");
    let _ = writeln!(out, "  0     Success");
    let _ = writeln!(out, "  1603  Failure (also used before the vendor installer runs)");
    let _ = writeln!(out, "  1641  Success, hard reboot initiated");
    let _ = writeln!(out, "  3010  Success, soft reboot required");
    let _ = writeln!(out, "  Other codes are passed through from the vendor installer.");
}
