//! Compression strategy errors

use super::PackError;

/// Creates a strategy failed error
pub fn strategy_failed(strategy: impl ToString, reason: impl Into<String>) -> PackError {
    PackError::StrategyFailed {
        strategy: strategy.to_string(),
        reason: reason.into(),
    }
}

/// Creates an empty archive error
pub fn empty_archive(path: impl Into<String>) -> PackError {
    PackError::EmptyArchive { path: path.into() }
}

/// Creates an exhausted strategies error from the attempt summaries
pub fn exhausted(attempts: &[String]) -> PackError {
    PackError::CompressionFailed {
        attempts: attempts.join("; "),
    }
}
