//! Domain models for intunepack
//!
//! This module contains the entities handed from one pipeline stage to the next.
//! Each is produced by exactly one stage and never mutated by a later one.

pub mod descriptor;
pub mod outcome;
pub mod source_tree;
pub mod stage;

pub use descriptor::{DescriptorField, PackageDescriptor, UNKNOWN};
pub use outcome::{Attempt, CompressionOutcome, FinalArtifact, Resolution, StrategyKind};
pub use source_tree::{SourceTree, TreeFile, TreeStats, format_size};
pub use stage::Stage;
