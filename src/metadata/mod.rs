//! Metadata extraction from deployment manifests
//!
//! The extractor reads the manifest (usually `image/Summary.txt`) and runs the
//! rules in [`rules`] to fill a [`PackageDescriptor`]. It never fails: every
//! field it cannot determine ends up as [`UNKNOWN`] with a warning.

pub mod rules;

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{DescriptorField, PackageDescriptor, UNKNOWN};
use rules::{Candidate, Confidence, Manifest};

/// A field that was not determined with confidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionWarning {
    pub field: DescriptorField,
    pub message: String,
}

impl ExtractionWarning {
    fn new(field: DescriptorField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Descriptor plus every warning raised while building it
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub descriptor: PackageDescriptor,
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    /// Whether a warning concerns a field needed for detection rules
    pub fn has_essential_warnings(&self) -> bool {
        self.warnings.iter().any(|w| {
            matches!(
                w.field,
                DescriptorField::ProductCode | DescriptorField::BuildNumber
            )
        })
    }
}

/// Decode manifest bytes, honoring UTF-8 and UTF-16 byte order marks
pub fn decode_manifest(bytes: &[u8]) -> String {
    let utf16 = |payload: &[u8], read: fn([u8; 2]) -> u16| {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| read([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    };

    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Builds package descriptors from manifest text
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read and extract a manifest file
    ///
    /// An unreadable manifest yields an all-unknown descriptor; the program
    /// name may still be derived from `fallback_name`.
    pub fn extract_file(&self, path: &Path, fallback_name: Option<&str>) -> Extraction {
        match fs::read(path) {
            Ok(bytes) => self.extract(&decode_manifest(&bytes), fallback_name),
            Err(e) => {
                warn!("Cannot read manifest {}: {}", path.display(), e);
                let mut extraction = self.extract("", fallback_name);
                extraction.warnings.insert(
                    0,
                    ExtractionWarning::new(
                        DescriptorField::ProgramName,
                        format!("manifest {} could not be read: {e}", path.display()),
                    ),
                );
                extraction
            }
        }
    }

    /// Extract a descriptor from manifest text
    pub fn extract(&self, text: &str, fallback_name: Option<&str>) -> Extraction {
        let manifest = Manifest::new(text, fallback_name);
        let mut warnings = Vec::new();

        let program_name = Self::program_name(&manifest, &mut warnings);
        let build_number = Self::resolve(
            DescriptorField::BuildNumber,
            rules::build_number(&manifest),
            "no 'Build number:' line found",
            &mut warnings,
        );
        let product_code = Self::resolve(
            DescriptorField::ProductCode,
            rules::product_code(&manifest),
            if manifest.has_product_code_line() {
                "'Product Code:' line has no bracketed hexadecimal code"
            } else {
                "no 'Product Code:' line found"
            },
            &mut warnings,
        );
        let installer_version = Self::resolve(
            DescriptorField::InstallerVersion,
            rules::installer_version(&manifest),
            "no build number found in an 'Autodesk Installer' section",
            &mut warnings,
        );

        let descriptor = PackageDescriptor {
            program_name,
            build_number,
            product_code,
            installer_version,
        };
        debug!(?descriptor, warnings = warnings.len(), "Extracted descriptor");

        Extraction {
            descriptor,
            warnings,
        }
    }

    fn program_name(manifest: &Manifest<'_>, warnings: &mut Vec<ExtractionWarning>) -> String {
        for rule in rules::PROGRAM_NAME_RULES {
            if let Some(candidate) = (rule.apply)(manifest) {
                debug!("Program name '{}' from rule: {}", candidate.value, rule.name);
                return Self::accept(DescriptorField::ProgramName, candidate, warnings);
            }
        }
        warnings.push(ExtractionWarning::new(
            DescriptorField::ProgramName,
            "no rule produced a program name",
        ));
        UNKNOWN.to_string()
    }

    fn resolve(
        field: DescriptorField,
        candidate: Option<Candidate>,
        missing: &str,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> String {
        match candidate {
            Some(candidate) => Self::accept(field, candidate, warnings),
            None => {
                warnings.push(ExtractionWarning::new(field, missing));
                UNKNOWN.to_string()
            }
        }
    }

    fn accept(
        field: DescriptorField,
        candidate: Candidate,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> String {
        if let Some(message) = candidate.warning {
            warnings.push(ExtractionWarning::new(field, message));
        } else if candidate.confidence != Confidence::Structured {
            warnings.push(ExtractionWarning::new(field, "value determined heuristically"));
        }
        candidate.value
    }
}
