//! Package descriptor domain types
//!
//! The descriptor is the normalized identity of one deployment. Every field is
//! always populated: unresolved values carry the [`UNKNOWN`] sentinel so that
//! downstream templates always render.

use std::fmt;

use serde::Serialize;

/// Sentinel for a field that could not be determined
pub const UNKNOWN: &str = "unknown";

/// Normalized identity and version metadata of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub program_name: String,
    /// Package build number; kept verbatim even if it is not a dotted version
    pub build_number: String,
    /// Bracketed hexadecimal product code, e.g. `{AAAA1111-BBBB-...}`
    pub product_code: String,
    /// Build number of the vendor installer bundled with the deployment
    pub installer_version: String,
}

impl Default for PackageDescriptor {
    fn default() -> Self {
        Self {
            program_name: UNKNOWN.to_string(),
            build_number: UNKNOWN.to_string(),
            product_code: UNKNOWN.to_string(),
            installer_version: UNKNOWN.to_string(),
        }
    }
}

/// Descriptor field identifiers used in warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorField {
    ProgramName,
    BuildNumber,
    ProductCode,
    InstallerVersion,
}

impl fmt::Display for DescriptorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DescriptorField::ProgramName => "program name",
            DescriptorField::BuildNumber => "build number",
            DescriptorField::ProductCode => "product code",
            DescriptorField::InstallerVersion => "installer version",
        };
        f.write_str(label)
    }
}

impl PackageDescriptor {
    pub fn get(&self, field: DescriptorField) -> &str {
        match field {
            DescriptorField::ProgramName => &self.program_name,
            DescriptorField::BuildNumber => &self.build_number,
            DescriptorField::ProductCode => &self.product_code,
            DescriptorField::InstallerVersion => &self.installer_version,
        }
    }

    pub fn is_known(&self, field: DescriptorField) -> bool {
        self.get(field) != UNKNOWN
    }

    /// Whether a field needed for detection-rule generation is missing
    pub fn is_degraded(&self) -> bool {
        !self.is_known(DescriptorField::ProductCode) || !self.is_known(DescriptorField::BuildNumber)
    }

    /// File-system safe package name derived from the program name
    ///
    /// Falls back to `fallback` (usually the source tree name) when the program
    /// name is unknown.
    pub fn package_name(&self, fallback: &str) -> String {
        if self.is_known(DescriptorField::ProgramName) {
            let name = sanitize_package_name(&self.program_name);
            if name != UNKNOWN {
                return name;
            }
        }
        sanitize_package_name(fallback)
    }
}

/// Replace whitespace and path-unsafe characters with `_`, collapsing repeats
pub fn sanitize_package_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.trim().chars() {
        let unsafe_char = c.is_whitespace()
            || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '_');
        if unsafe_char {
            if !last_was_sep && !result.is_empty() {
                result.push('_');
            }
            last_was_sep = true;
        } else {
            result.push(c);
            last_was_sep = false;
        }
    }
    // Windows rejects trailing dots and spaces; dot-only names are path components
    while result.ends_with(['_', '.', ' ']) {
        result.pop();
    }
    if result.is_empty() || result.chars().all(|c| c == '.') {
        UNKNOWN.to_string()
    } else {
        result
    }
}
