//! The package-assembly pipeline
//!
//! Stages run strictly in order: validate, extract, compress, script,
//! assemble. The first fatal failure stops the run and is reported with the
//! stage it came from. A failure in the assemble stage still leaves the
//! archive, script and report valid; they are attached to the error.
//!
//! A [`RunContext`] is created per invocation and handed to every stage. It
//! owns the run id and its tracing span, the cancellation token, and the
//! injected confirmation capability.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::{Span, debug, info, info_span, warn};

use crate::assembler::{ArtifactAssembler, AssemblyInput};
use crate::builder::PackageBuilder;
use crate::cancel::CancellationToken;
use crate::config::PackConfig;
use crate::domain::{CompressionOutcome, FinalArtifact, PackageDescriptor, SourceTree, Stage};
use crate::error::Result;
use crate::metadata::{ExtractionWarning, MetadataExtractor};
use crate::report::{ArchiveSummary, PackageReport};
use crate::script::ScriptGenerator;
use crate::ui::{Confirm, InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};
use crate::validation::{ValidationResult, Validator};

/// Per-invocation state shared by every stage
pub struct RunContext<'a> {
    pub run_id: String,
    span: Span,
    pub cancel: CancellationToken,
    pub confirm: &'a dyn Confirm,
    quiet: bool,
}

impl<'a> RunContext<'a> {
    pub fn new(confirm: &'a dyn Confirm, quiet: bool) -> Self {
        let run_id = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let span = info_span!("run", id = %run_id);
        Self {
            run_id,
            span,
            cancel: CancellationToken::new(),
            confirm,
            quiet,
        }
    }

    /// Progress reporting for this run
    pub fn progress(&self) -> Box<dyn ProgressReporter> {
        if self.quiet {
            Box::new(SilentProgressReporter)
        } else {
            Box::new(InteractiveProgressReporter::new())
        }
    }

    /// Run one stage inside its own span, tagging failures with the stage
    pub fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.cancel.check().map_err(|e| e.in_stage(stage))?;
        let span = info_span!(parent: &self.span, "stage", name = stage.as_str());
        let _entered = span.enter();
        debug!("Stage started");
        let result = f().map_err(|e| e.in_stage(stage));
        if let Err(e) = &result {
            warn!("Stage failed: {e}");
        }
        result
    }
}

/// Everything a successful run produced
#[derive(Debug)]
pub struct PipelineOutput {
    pub tree: SourceTree,
    pub validation: ValidationResult,
    pub descriptor: PackageDescriptor,
    pub warnings: Vec<ExtractionWarning>,
    pub package_name: String,
    pub outcome: CompressionOutcome,
    pub digest: String,
    pub script: PathBuf,
    pub report: PathBuf,
    pub artifact: FinalArtifact,
}

/// Runs the stages for one selected source tree
pub struct Pipeline<'a> {
    config: &'a PackConfig,
    ctx: &'a RunContext<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PackConfig, ctx: &'a RunContext<'a>) -> Self {
        Self { config, ctx }
    }

    pub fn run(&self, tree: &SourceTree) -> Result<PipelineOutput> {
        let ctx = self.ctx;
        let config = self.config;
        info!(run = %ctx.run_id, "Packaging {}", tree.name);

        let validation = ctx.stage(Stage::Validate, || {
            Validator::new(config.requirements())
                .validate(tree)
                .into_result(tree)
        })?;

        let extraction = ctx.stage(Stage::Extract, || {
            let manifest = tree.join(&config.manifest_path);
            Ok(MetadataExtractor::new().extract_file(&manifest, Some(&tree.name)))
        })?;
        for warning in &extraction.warnings {
            warn!("{}: {}", warning.field, warning.message);
        }
        if extraction.has_essential_warnings() {
            warn!("Product code or build number unresolved; detection rules must be set manually");
        }
        let descriptor = extraction.descriptor;
        let package_name = descriptor.package_name(&tree.name);

        let package_dir = config.output_dir.join(&package_name);
        let archive_path = package_dir.join(format!("{package_name}.tar.gz"));

        let outcome = ctx.stage(Stage::Compress, || {
            let progress = ctx.progress();
            PackageBuilder::new(
                config.thresholds,
                config.chunk_files,
                &ctx.cancel,
                ctx.confirm,
                progress.as_ref(),
            )
            .build(tree, &archive_path)
        })?;

        let (script, report, digest) = ctx.stage(Stage::Script, || {
            let generator = ScriptGenerator::new(&config.installer_path, &config.collection_path);
            let archive_name = format!("{package_name}.tar.gz");
            let script = generator.render(tree, &descriptor, &package_name, &archive_name);
            let script_path = generator.write(&script, &package_dir)?;

            let summary = ArchiveSummary::from_outcome(&outcome)?;
            let report = PackageReport {
                tree,
                descriptor: &descriptor,
                package_name: &package_name,
                script_name: &script.file_name,
                archive: &summary,
                warnings: &extraction.warnings,
            };
            let report_path = report.write(&config.output_dir)?;
            Ok((script_path, report_path, summary.digest))
        })?;

        let artifact = ctx
            .stage(Stage::Assemble, || {
                let assembler = ArtifactAssembler::new(&config.tool_path, &config.work_dir)
                    .with_recent_window(Duration::from_secs(config.recent_output_minutes * 60));
                assembler.assemble(
                    &AssemblyInput {
                        archive: &outcome.output,
                        script: &script,
                        package_name: &package_name,
                        output_dir: &config.output_dir,
                    },
                    &ctx.cancel,
                )
            })
            .map_err(|e| {
                e.with_partial(vec![outcome.output.clone(), script.clone(), report.clone()])
            })?;

        Ok(PipelineOutput {
            tree: tree.clone(),
            validation,
            descriptor,
            warnings: extraction.warnings,
            package_name,
            outcome,
            digest,
            script,
            report,
            artifact,
        })
    }
}
