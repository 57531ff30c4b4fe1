//! Extraction rules for deployment manifests
//!
//! Each rule is a pure function from a [`Manifest`] to an optional
//! [`Candidate`]. Program-name rules are evaluated in the order of
//! [`PROGRAM_NAME_RULES`]; the first rule yielding a value wins.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

static BUILD_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^build\s+number\s*:\s*(\S+)").expect("valid build number regex")
});

static PRODUCT_CODE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^product\s+code\s*:\s*(.*)$").expect("valid product code regex")
});

static PRODUCT_CODE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[0-9A-Fa-f]+(?:-[0-9A-Fa-f]+)+\}").expect("valid product code token regex")
});

static PRODUCT_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:product|application)\s*:\s*(.+)$").expect("valid product field regex")
});

static DEPLOYMENT_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^deployment(?:\s+name)?\s*:\s*(.+)$").expect("valid deployment regex")
});

static INSTALLER_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bautodesk\s+installer\b").expect("valid installer header regex")
});

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:product|program|application|display)\s+)?(?:name|title)\s*:\s*(.+)$")
        .expect("valid label regex")
});

static DEPLOYMENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+(?:\.\d+)+").expect("valid deployment id regex"));

static VERSION_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[_\s]+v?\d+(?:\.\d+)+.*$").expect("valid version suffix regex")
});

static DOTTED_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)+$").expect("valid dotted version regex"));

static PRODUCT_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:autodesk\s+)?(?:autocad|revit|civil\s*3d|inventor|navisworks|3ds\s*max|maya|vault|advance\s+steel|infraworks|recap)\b[\w \-]*?\b(?:19|20)\d{2})\b",
    )
    .expect("valid product year regex")
});

/// Values that look like a name but carry no identity
const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "n/a",
    "na",
    "none",
    "null",
    "tbd",
    "product",
    "application",
    "deployment",
    "name",
    "autodesk",
    "<product name>",
];

/// Minimum length of an accepted program name
const MIN_NAME_LEN: usize = 4;

/// Manifest text split into trimmed lines
#[derive(Debug, Clone)]
pub struct Manifest<'a> {
    lines: Vec<&'a str>,
    /// Deployment directory name, used when the manifest names nothing
    fallback_name: Option<&'a str>,
}

impl<'a> Manifest<'a> {
    pub fn new(text: &'a str, fallback_name: Option<&'a str>) -> Self {
        let lines = text
            .lines()
            .map(|line| line.trim_start_matches('\u{feff}').trim())
            .collect();
        Self {
            lines,
            fallback_name,
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Indices of every `Build number:` line
    fn build_number_lines(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| BUILD_NUMBER_RE.is_match(line))
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the `Build number:` line that belongs to the installer section
    fn installer_build_line(&self) -> Option<usize> {
        let header = self
            .lines
            .iter()
            .position(|line| INSTALLER_HEADER_RE.is_match(line))?;
        self.build_number_lines().into_iter().find(|&i| i > header)
    }

    /// Index of the package's own `Build number:` line
    fn package_build_line(&self) -> Option<usize> {
        let installer = self.installer_build_line();
        self.build_number_lines()
            .into_iter()
            .find(|&i| Some(i) != installer)
    }

    fn product_code_line(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| PRODUCT_CODE_LINE_RE.is_match(line))
    }

    pub fn has_product_code_line(&self) -> bool {
        self.product_code_line().is_some()
    }

    /// Nearest non-blank line above `index`
    fn preceding_line(&self, index: usize) -> Option<&'a str> {
        self.lines[..index]
            .iter()
            .rev()
            .find(|line| !line.is_empty())
            .copied()
    }
}

/// How a value was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Read from a labelled or anchored manifest field
    Structured,
    /// Inferred by scanning free text
    Heuristic,
    /// Derived from the raw deployment name
    Degraded,
}

/// A rule's answer for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub confidence: Confidence,
    /// Set when the value was kept despite failing format validation
    pub warning: Option<String>,
}

impl Candidate {
    fn structured(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: Confidence::Structured,
            warning: None,
        }
    }
}

pub type Rule = fn(&Manifest<'_>) -> Option<Candidate>;

/// A rule with a name for logging
pub struct NamedRule {
    pub name: &'static str,
    pub apply: Rule,
}

/// Program name rules, most trusted first
pub const PROGRAM_NAME_RULES: &[NamedRule] = &[
    NamedRule {
        name: "line before product code",
        apply: name_before_product_code,
    },
    NamedRule {
        name: "line before build number",
        apply: name_before_build_number,
    },
    NamedRule {
        name: "product field",
        apply: name_from_product_field,
    },
    NamedRule {
        name: "product keyword scan",
        apply: name_from_keyword_scan,
    },
    NamedRule {
        name: "deployment name",
        apply: name_from_deployment,
    },
];

fn is_anchor(line: &str) -> bool {
    BUILD_NUMBER_RE.is_match(line)
        || PRODUCT_CODE_LINE_RE.is_match(line)
        || INSTALLER_HEADER_RE.is_match(line)
        || DEPLOYMENT_FIELD_RE.is_match(line)
}

/// Drop a leading `Label:` from a line
fn strip_label(line: &str) -> &str {
    LABEL_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or(line, |m| m.as_str().trim())
}

/// Whether an extracted string is usable as a program name
pub fn is_acceptable_name(value: &str) -> bool {
    let value = value.trim();
    if value.chars().count() < MIN_NAME_LEN {
        return false;
    }
    let lowered = value.to_lowercase();
    if PLACEHOLDERS.contains(&lowered.as_str()) {
        return false;
    }
    !looks_like_deployment_id(value)
}

/// An underscore followed by a dotted version, e.g. `Revit_2023_23.1.7`
pub fn looks_like_deployment_id(value: &str) -> bool {
    DEPLOYMENT_ID_RE.is_match(value)
}

/// Whether a build number parses as a dotted numeric version
pub fn is_dotted_version(value: &str) -> bool {
    DOTTED_VERSION_RE.is_match(value)
}

fn name_from_line_before(manifest: &Manifest<'_>, anchor: Option<usize>) -> Option<Candidate> {
    let line = manifest.preceding_line(anchor?)?;
    if is_anchor(line) {
        return None;
    }
    let value = strip_label(line);
    is_acceptable_name(value).then(|| Candidate::structured(value))
}

/// (a) the line immediately preceding `Product Code:`
pub fn name_before_product_code(manifest: &Manifest<'_>) -> Option<Candidate> {
    name_from_line_before(manifest, manifest.product_code_line())
}

/// (b) the line immediately preceding the package's `Build number:`
pub fn name_before_build_number(manifest: &Manifest<'_>) -> Option<Candidate> {
    name_from_line_before(manifest, manifest.package_build_line())
}

/// (c) an explicit `Product:` or `Application:` field
pub fn name_from_product_field(manifest: &Manifest<'_>) -> Option<Candidate> {
    manifest
        .lines()
        .iter()
        .filter_map(|line| PRODUCT_FIELD_RE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .find(|value| is_acceptable_name(value))
        .map(Candidate::structured)
}

/// A product-family keyword followed by a year, on a line without underscores
pub fn name_from_keyword_scan(manifest: &Manifest<'_>) -> Option<Candidate> {
    manifest
        .lines()
        .iter()
        .filter(|line| !line.contains('_'))
        .filter_map(|line| PRODUCT_YEAR_RE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|value| is_acceptable_name(value))
        .map(|value| Candidate {
            value,
            confidence: Confidence::Heuristic,
            warning: Some("program name inferred from a product keyword in free text".to_string()),
        })
}

/// The raw deployment name with underscores normalized and version suffix stripped
pub fn name_from_deployment(manifest: &Manifest<'_>) -> Option<Candidate> {
    let field = manifest
        .lines()
        .iter()
        .filter_map(|line| DEPLOYMENT_FIELD_RE.captures(line))
        .find_map(|caps| caps.get(1).map(|m| m.as_str().trim()));

    let (raw, value) = field
        .into_iter()
        .chain(manifest.fallback_name)
        .map(|raw| (raw, normalize_deployment_name(raw)))
        .find(|(_, value)| value.chars().any(char::is_alphanumeric))?;

    Some(Candidate {
        value,
        confidence: Confidence::Degraded,
        warning: Some(format!("program name derived from deployment name '{raw}'")),
    })
}

/// `Revit_2023_23.1.7` becomes `Revit 2023`
pub fn normalize_deployment_name(raw: &str) -> String {
    let stripped = VERSION_SUFFIX_RE.replace(raw.trim(), "");
    stripped
        .split('_')
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The token after the package's `Build number:`, kept even if not dotted
pub fn build_number(manifest: &Manifest<'_>) -> Option<Candidate> {
    let line = manifest.lines()[manifest.package_build_line()?];
    let token = BUILD_NUMBER_RE.captures(line)?.get(1)?.as_str().to_string();
    let warning = (!is_dotted_version(&token))
        .then(|| format!("build number '{token}' is not a dotted numeric version"));
    Some(Candidate {
        value: token,
        confidence: Confidence::Structured,
        warning,
    })
}

/// The bracketed hexadecimal token after `Product Code:`
pub fn product_code(manifest: &Manifest<'_>) -> Option<Candidate> {
    let line = manifest.lines()[manifest.product_code_line()?];
    let rest = PRODUCT_CODE_LINE_RE.captures(line)?.get(1)?.as_str();
    PRODUCT_CODE_TOKEN_RE
        .find(rest)
        .map(|m| Candidate::structured(m.as_str()))
}

/// The `Build number:` nearest after the `Autodesk Installer` header
pub fn installer_version(manifest: &Manifest<'_>) -> Option<Candidate> {
    let line = manifest.lines()[manifest.installer_build_line()?];
    let token = BUILD_NUMBER_RE.captures(line)?.get(1)?.as_str();
    Some(Candidate::structured(token))
}
