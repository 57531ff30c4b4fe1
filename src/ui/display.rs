//! Display functions for candidates, validation results and build summaries
//!
//! Everything here writes human-readable, styled text to stdout. Diagnostics
//! go through tracing instead.

use console::Style;
use std::path::{Path, PathBuf};

use crate::domain::{DescriptorField, Resolution, SourceTree, format_size};
use crate::metadata::Extraction;
use crate::pipeline::PipelineOutput;
use crate::validation::ValidationResult;

fn label(text: &str) -> console::StyledObject<&str> {
    Style::new().bold().apply_to(text)
}

/// Display discovered candidate deployments
pub fn display_candidates(root: &Path, candidates: &[SourceTree]) {
    println!(
        "{} {}",
        Style::new().bold().apply_to("Deployments under"),
        root.display()
    );
    for tree in candidates {
        let stats = match tree.stats() {
            Ok(stats) => format!("{} files, {}", stats.files, stats.formatted_size()),
            Err(e) => format!("unreadable: {e}"),
        };
        println!(
            "  {}  {}  {}",
            Style::new().bold().yellow().apply_to(&tree.name),
            Style::new()
                .dim()
                .apply_to(tree.created.format("%Y-%m-%d %H:%M")),
            stats
        );
    }
}

/// Display directories that matched no discovery pattern
pub fn display_unmatched(root: &Path, unmatched: &[String]) {
    println!(
        "{} {}",
        Style::new()
            .yellow()
            .apply_to("No deployment directories matched under"),
        root.display()
    );
    if unmatched.is_empty() {
        println!("  The directory contains no subdirectories.");
        return;
    }
    println!("  {}", label("Directories found:"));
    for name in unmatched {
        println!("    {name}");
    }
    println!("  Adjust `patterns` in the configuration to match one of these.");
}

/// Display the result of structural validation
pub fn display_validation(tree: &SourceTree, result: &ValidationResult) {
    if result.passed() {
        println!(
            "{} {}",
            Style::new().green().bold().apply_to("Valid:"),
            tree.path.display()
        );
    } else {
        println!(
            "{} {}",
            Style::new().red().bold().apply_to("Invalid:"),
            tree.path.display()
        );
        for missing in &result.missing_critical {
            println!("  {} {missing}", Style::new().red().apply_to("missing"));
        }
    }
    for missing in &result.missing_optional {
        println!(
            "  {} {missing}",
            Style::new().yellow().apply_to("missing (optional)")
        );
    }
}

/// Display an extracted descriptor with its warnings
pub fn display_extraction(extraction: &Extraction) {
    let descriptor = &extraction.descriptor;
    for field in [
        DescriptorField::ProgramName,
        DescriptorField::BuildNumber,
        DescriptorField::ProductCode,
        DescriptorField::InstallerVersion,
    ] {
        let value = descriptor.get(field);
        let styled = if descriptor.is_known(field) {
            Style::new().green().apply_to(value)
        } else {
            Style::new().red().apply_to(value)
        };
        println!("{:<20} {styled}", label(&format!("{}:", capitalize(&field.to_string()))));
    }

    if !extraction.warnings.is_empty() {
        println!();
        println!("{}", Style::new().yellow().bold().apply_to("Warnings:"));
        for warning in &extraction.warnings {
            println!("  {}: {}", warning.field, warning.message);
        }
    }
}

/// Display the summary of a successful build
pub fn display_build_summary(output: &PipelineOutput) {
    println!();
    println!(
        "{} {}",
        Style::new().green().bold().apply_to("Packaged"),
        Style::new().bold().apply_to(&output.package_name)
    );
    println!("  {} {}", label("Source:   "), output.tree.path.display());
    println!(
        "  {} {} ({}, {})",
        label("Archive:  "),
        output.outcome.output.display(),
        format_size(output.outcome.output_bytes),
        output.outcome.strategy
    );
    if output.outcome.fell_back() {
        for attempt in &output.outcome.attempts {
            println!("             {}", Style::new().dim().apply_to(attempt.summary()));
        }
    }
    println!("  {} {}", label("Digest:   "), output.digest);
    println!("  {} {}", label("Script:   "), output.script.display());
    println!("  {} {}", label("Report:   "), output.report.display());

    let note = match output.artifact.resolution {
        Resolution::Matched => String::new(),
        Resolution::MostRecent => format!(
            " {}",
            Style::new()
                .yellow()
                .apply_to("(most recent file; name did not match)")
        ),
    };
    println!(
        "  {} {}{note}",
        label("Package:  "),
        output.artifact.path.display()
    );

    if output.descriptor.is_degraded() {
        println!();
        println!(
            "{}",
            Style::new()
                .yellow()
                .apply_to("Detection rules could not be generated; see the report for manual steps.")
        );
    }
}

/// Display artifacts that remain usable after a late failure
pub fn display_partial_artifacts(artifacts: &[PathBuf]) {
    eprintln!(
        "{}",
        Style::new()
            .yellow()
            .bold()
            .apply_to("The following artifacts were produced and remain valid:")
    );
    for artifact in artifacts {
        eprintln!("  {}", artifact.display());
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
