//! Wrapping utility and staging errors

use super::PackError;

/// Creates a tool not found error
pub fn not_found(path: impl Into<String>) -> PackError {
    PackError::ToolNotFound { path: path.into() }
}

/// Creates a tool failed error from an exit status description
pub fn failed(code: impl Into<String>) -> PackError {
    PackError::ToolFailed { code: code.into() }
}

/// Creates a staging failed error
pub fn staging_failed(message: impl Into<String>) -> PackError {
    PackError::StagingFailed {
        message: message.into(),
    }
}
