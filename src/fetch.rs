//! Downloads the day's polar volumes into the workspace with the fetch tool.

use std::path::PathBuf;

use anyhow::Result;

use crate::{cli::create_spinner, config::JobConfig, tool::ExternalTool, workspace::Workspace};

/// Arguments understood by the fetch tool. Output and delivery settings are
/// never forwarded.
pub fn fetch_args(job: &JobConfig) -> Vec<String> {
    let mut args = vec![
        "--radar".to_string(),
        job.radar.clone(),
        "--date".to_string(),
        job.date.clone(),
        "--step".to_string(),
        job.step.to_string(),
    ];

    if job.night {
        args.push("--night".to_string());
    }

    args
}

/// Runs the fetch tool inside the workspace and returns the downloaded
/// volumes in processing order. An empty result is not an error.
pub async fn fetch_volumes(
    job: &JobConfig,
    tool: &ExternalTool,
    workspace: &Workspace,
) -> Result<Vec<PathBuf>> {
    let args = fetch_args(job);
    tracing::info!("Fetching volumes: {} {}", tool.name(), args.join(" "));

    let bar = create_spinner(format!("Downloading {} volumes for {}...", job.radar, job.date));
    let result = tool.run_checked(workspace.path(), &args).await;
    bar.finish_and_clear();
    result?;

    let volumes = workspace.volume_files()?;
    tracing::info!("Fetched {} volumes", volumes.len());

    Ok(volumes)
}

// -- Tests -------------------------------------------------------------------
