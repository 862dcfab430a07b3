use std::path::PathBuf;

use anyhow::{Context, Result};
use engine::pipeline;
use engine::{Stage, write_output};
use shared::NeedleFontConfig;
use tokio::time::Duration;

use crate::diagnostics::StageTracker;
use crate::heartbeat::{DEFAULT_INTERVAL, Heartbeat};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: NeedleFontConfig,
    pub dry_run: bool,
    pub heartbeat: Duration,
}

impl RunOptions {
    pub fn new(config: NeedleFontConfig) -> Self {
        Self {
            config,
            dry_run: false,
            heartbeat: DEFAULT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written(PathBuf),
    /// Everything but the write ran; carries the plan summary.
    DryRun(String),
}

/// Validates, plans against the template, mutates and writes the output.
pub async fn run(options: RunOptions, tracker: &StageTracker) -> Result<RunOutcome> {
    let RunOptions {
        config,
        dry_run,
        heartbeat,
    } = options;
    let mut on_stage = |stage: Stage| tracker.set(stage);

    on_stage(Stage::Validating);
    let model = pipeline::validate(&config)?;

    on_stage(Stage::OpeningTemplate);
    let template_path = PathBuf::from(&config.template.path);
    let mut document = pipeline::open_template(&template_path)
        .with_context(|| format!("Failed to open template font: {}", template_path.display()))?;

    let plan = pipeline::plan_validated(&config, model, &document, &mut on_stage)?;
    let summary = plan.summary();
    log::info!("Plan: {summary}");

    let report = pipeline::apply_plan(&config, &mut document, plan, &mut on_stage)?;
    log::info!(
        "Lookup {} rebuilt, {} glyph(s) replaced, {} appended",
        report.lookup_index,
        report.replaced_glyphs,
        report.appended_glyphs
    );

    let output = PathBuf::from(&config.output.path);
    if dry_run {
        log::info!("Dry run, not writing {}", output.display());
        on_stage(Stage::Done);
        return Ok(RunOutcome::DryRun(summary));
    }

    on_stage(Stage::Writing);
    let beat = Heartbeat::start("Still writing font", heartbeat);
    let target = output.clone();
    let written = tokio::task::spawn_blocking(move || write_output(&document, &target)).await;
    beat.stop().await;

    written
        .context("Font writer task failed")?
        .with_context(|| format!("Failed to write font: {}", output.display()))?;

    on_stage(Stage::Done);
    Ok(RunOutcome::Written(output))
}
