//! Runs the analysis tool over every volume and builds the aggregate report.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{
    cli::create_progress_bar,
    config::FailurePolicy,
    tool::{ExternalTool, ToolError},
};

pub const OPTIONS_FILE: &str = "options.conf";

/// Result of processing a batch of volumes.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub processed: usize,
    /// File names of volumes the analysis tool failed on.
    pub skipped: Vec<String>,
}

/// Writes the shared analysis options to `options.conf` in the workspace.
pub fn write_options(workspace: &Path, options: &str) -> Result<PathBuf> {
    let path = workspace.join(OPTIONS_FILE);
    fs::write(&path, options).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Processes `volumes` in the given order, appending each profile to `report`.
///
/// The report must not exist yet. Each volume is passed to the tool by file
/// name with the workspace as working directory.
pub async fn process_volumes(
    workspace: &Path,
    volumes: &[PathBuf],
    tool: &ExternalTool,
    report: &Path,
    policy: FailurePolicy,
) -> Result<BatchSummary> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(report)
        .with_context(|| format!("Failed to create report {}", report.display()))?;

    let pb = create_progress_bar(volumes.len() as u64, "Processing volumes".to_string());
    let mut processed = 0;
    let mut skipped = Vec::new();

    for volume in volumes {
        let name = volume
            .file_name()
            .with_context(|| format!("Volume path has no file name: {}", volume.display()))?;
        let display_name = name.to_string_lossy().to_string();

        let output = tool.run(workspace, [name]).await?;

        if output.status.success() {
            file.write_all(&output.stdout)
                .with_context(|| format!("Failed to write to {}", report.display()))?;
            processed += 1;
        } else {
            match policy {
                FailurePolicy::Skip => {
                    tracing::warn!(
                        "Skipping {}: {} exited with {}: {}",
                        display_name,
                        tool.name(),
                        output.status,
                        output.stderr_lossy()
                    );
                    skipped.push(display_name);
                }
                FailurePolicy::Abort => {
                    pb.abandon_with_message(format!("Failed on {display_name}"));
                    let error = ToolError::Failed {
                        tool: tool.name().to_string(),
                        status: output.status,
                        stderr: output.stderr_lossy(),
                    };
                    return Err(anyhow::Error::new(error)
                        .context(format!("Failed to process volume {display_name}")));
                }
            }
        }

        pb.inc(1);
    }

    file.flush()?;
    pb.finish_with_message("Volumes processed");

    tracing::info!(
        "Processed {} of {} volumes into {}",
        processed,
        volumes.len(),
        report.display()
    );

    Ok(BatchSummary {
        processed,
        skipped,
    })
}

// -- Tests -------------------------------------------------------------------
