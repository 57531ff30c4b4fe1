//! Cooperative cancellation for long-running stages
//!
//! The token is checked between files while archiving, between chunks, and
//! between pipeline stages. Scoped guards release staging and chunk
//! directories when a cancelled stage unwinds. Ctrl-C cancels the token of
//! the running build; a second Ctrl-C exits immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::{PackError, Result};

/// Conventional exit code for a process ended by SIGINT
const EXIT_INTERRUPTED: i32 = 130;

/// Shared cancellation flag; clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `PackError::Cancelled` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PackError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Cancel `token` when the user presses Ctrl-C
///
/// Failing to install the handler is not fatal; the build then runs without
/// cooperative cancellation.
pub fn install_interrupt_handler(token: &CancellationToken) {
    match ctrlc::set_handler(on_interrupt(token.clone())) {
        Ok(()) => debug!("Installed Ctrl-C handler"),
        Err(e) => warn!("Could not install Ctrl-C handler: {e}"),
    }
}

fn on_interrupt(token: CancellationToken) -> impl FnMut() + Send + 'static {
    move || {
        if token.is_cancelled() {
            std::process::exit(EXIT_INTERRUPTED);
        }
        warn!("Interrupted; cancelling after the current step (press Ctrl-C again to exit)");
        token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_cancels_token() {
        let token = CancellationToken::new();
        let mut handler = on_interrupt(token.clone());
        assert!(!token.is_cancelled());
        handler();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(PackError::Cancelled)));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(PackError::Cancelled)));
    }
}
