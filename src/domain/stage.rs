//! Pipeline stage identifiers

use std::fmt;

/// One step of the package-assembly pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Validate,
    Extract,
    Compress,
    Script,
    Assemble,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::Validate => "validate",
            Stage::Extract => "extract",
            Stage::Compress => "compress",
            Stage::Script => "script",
            Stage::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
