//! Source tree discovery and validation errors

use super::PackError;

/// Creates a source root inaccessible error
pub fn root_inaccessible(path: impl Into<String>, reason: impl Into<String>) -> PackError {
    PackError::SourceRootInaccessible {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a no candidates error
pub fn no_candidates(root: impl Into<String>) -> PackError {
    PackError::NoCandidates { root: root.into() }
}

/// Creates a candidate not found error
pub fn candidate_not_found(name: impl Into<String>) -> PackError {
    PackError::CandidateNotFound { name: name.into() }
}

/// Creates a validation failed error listing every missing critical entry
pub fn validation_failed(path: impl Into<String>, missing: Vec<String>) -> PackError {
    PackError::ValidationFailed {
        path: path.into(),
        missing,
    }
}

/// Creates a selection required error for non-interactive runs
pub fn selection_required(names: &[String]) -> PackError {
    PackError::SelectionRequired {
        candidates: names.join(", "),
    }
}
