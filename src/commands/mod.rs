//! Command implementations for the intunepack CLI

pub mod build;
pub mod completions;
pub mod discover;
pub mod inspect;
pub mod menu;
pub mod validate;
pub mod version;
