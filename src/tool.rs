//! Runs the external programs the pipeline relies on.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{tool}` not found")]
    NotFound {
        tool: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to execute `{tool}`")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Output of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// An external program with a resolved path.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: String,
    program: PathBuf,
}

impl ExternalTool {
    /// Resolves `program` to an absolute path. Bare names are looked up on
    /// `PATH`, relative paths are taken from the current directory.
    pub fn locate(program: &str) -> Result<Self, ToolError> {
        let program_path = which::which(program).map_err(|source| ToolError::NotFound {
            tool: program.to_string(),
            source,
        })?;

        Ok(ExternalTool {
            name: program.to_string(),
            program: program_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the tool in `working_dir` and captures both output streams.
    ///
    /// A non-zero exit status is not an error here; see [`ExternalTool::run_checked`].
    pub async fn run<I, S>(&self, working_dir: &Path, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .await
            .map_err(|source| ToolError::Launch {
                tool: self.name.clone(),
                source,
            })?;

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Like [`ExternalTool::run`] but turns a non-zero exit status into [`ToolError::Failed`].
    pub async fn run_checked<I, S>(
        &self,
        working_dir: &Path,
        args: I,
    ) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(working_dir, args).await?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.name.clone(),
                status: output.status,
                stderr: output.stderr_lossy(),
            });
        }

        Ok(output)
    }
}

// -- Tests -------------------------------------------------------------------
