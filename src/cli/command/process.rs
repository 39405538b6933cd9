//! Processes one radar day from fetch to delivery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{
    batch::{process_volumes, write_options, BatchSummary},
    config::JobConfig,
    deliver::{deliver, select_target, BucketStores, DeliveryTarget},
    environment::ExecutionEnvironment,
    fetch::fetch_volumes,
    finalise::finalise,
    tool::ExternalTool,
    workspace::Workspace,
};

/// Process-level inputs that are not part of the job itself.
pub struct RunContext<'a> {
    /// Directory the run was started from.
    pub origin_dir: PathBuf,
    /// Parent directory for the run's workspace.
    pub scratch_root: PathBuf,
    pub environment: &'a dyn ExecutionEnvironment,
    pub stores: &'a dyn BucketStores,
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// The fetch tool found nothing for this radar and date.
    NoVolumes,
    Delivered {
        target: DeliveryTarget,
        summary: BatchSummary,
    },
}

pub async fn process_day(job: &JobConfig, ctx: &RunContext<'_>) -> Result<RunOutcome> {
    let fetch_tool = ExternalTool::locate(&job.fetch_tool)?;
    let analysis_tool = ExternalTool::locate(&job.analysis_tool)?;

    let workspace = Workspace::acquire_in(&ctx.scratch_root)?;
    let result = run_in_workspace(job, ctx, &workspace, &fetch_tool, &analysis_tool).await;
    let released = workspace.release();

    settle(result, released)
}

/// Combines the pipeline result with the workspace release. A pipeline error
/// takes precedence; a release failure alongside it is only logged.
fn settle(result: Result<RunOutcome>, released: Result<()>) -> Result<RunOutcome> {
    match (result, released) {
        (Ok(outcome), Ok(())) => Ok(outcome),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            tracing::warn!("Failed to remove workspace after error: {:#}", release_err);
            Err(e)
        }
    }
}

async fn run_in_workspace(
    job: &JobConfig,
    ctx: &RunContext<'_>,
    workspace: &Workspace,
    fetch_tool: &ExternalTool,
    analysis_tool: &ExternalTool,
) -> Result<RunOutcome> {
    let volumes = fetch_volumes(job, fetch_tool, workspace).await?;
    if volumes.is_empty() {
        tracing::warn!("no files found for {} on {}", job.radar, job.date);
        return Ok(RunOutcome::NoVolumes);
    }

    if let Some(options) = &job.options {
        write_options(workspace.path(), options)?;
    }

    let report = workspace.path().join(job.report_file_name());
    let summary = process_volumes(
        workspace.path(),
        &volumes,
        analysis_tool,
        &report,
        job.failure_policy,
    )
    .await?;

    let artifact = finalise(&report, job.gzip)?;
    let target = select_target(
        job,
        ctx.environment.is_containerized(),
        &ctx.origin_dir,
        &file_name(&artifact)?,
    );

    deliver(&artifact, &target, ctx.stores).await?;

    Ok(RunOutcome::Delivered { target, summary })
}

fn file_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .with_context(|| format!("Artifact path has no file name: {}", path.display()))?;

    Ok(name.to_string_lossy().to_string())
}

// -- Tests -------------------------------------------------------------------
