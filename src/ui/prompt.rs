//! Confirmation capability
//!
//! Business logic never talks to the terminal directly; it asks an injected
//! [`Confirm`] implementation. The CLI passes [`InquireConfirm`] (or
//! [`AutoConfirm`] under `--yes`), tests pass [`AutoConfirm`] / [`AutoDeny`].

use inquire::InquireError;
use tracing::warn;

/// Ask the operator a yes/no question
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

/// Always answers yes
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Always answers no
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDeny;

impl Confirm for AutoDeny {
    fn confirm(&self, _question: &str) -> bool {
        false
    }
}

/// Interactive confirmation on the terminal
///
/// Without a terminal, or when the prompt is interrupted, the answer is no.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquireConfirm;

impl Confirm for InquireConfirm {
    fn confirm(&self, question: &str) -> bool {
        let answer = inquire::Confirm::new(question)
            .with_default(false)
            .with_help_message("Type 'y' to continue, Enter or 'n' to cancel")
            .prompt();

        match answer {
            Ok(answer) => answer,
            Err(InquireError::NotTTY) => {
                warn!("No terminal available to confirm; treating as declined (use --yes to skip)");
                false
            }
            Err(e) => {
                warn!("Confirmation failed: {e}");
                false
            }
        }
    }
}
