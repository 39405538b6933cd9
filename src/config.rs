//! Resolves the job description from command line arguments and the environment.

use std::{
    env,
    ffi::{OsStr, OsString},
    path::PathBuf,
};

use anyhow::{bail, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};

use crate::cli::Cli;

/// What to do when the analysis tool fails on a single volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the volume and leave it out of the report.
    #[default]
    Skip,
    /// Stop the batch at the first failed volume.
    Abort,
}

/// A validated description of one day's processing run.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub radar: String,
    /// `yyyy/mm/dd`
    pub date: String,
    pub night: bool,
    /// Minimum minutes between consecutive volumes.
    pub step: f64,
    pub gzip: bool,
    /// Deliver to object storage instead of the local filesystem.
    pub aws: bool,
    pub bucket: String,
    pub data_dir: PathBuf,
    pub fetch_tool: String,
    pub analysis_tool: String,
    pub failure_policy: FailurePolicy,
    /// Contents of `options.conf`, already un-escaped.
    pub options: Option<String>,
}

impl JobConfig {
    /// A job with default settings for the given radar and date.
    pub fn new(radar: &str, date: &str) -> Result<Self> {
        if radar.is_empty() || date.is_empty() {
            bail!("both a radar and date specification required");
        }

        Ok(JobConfig {
            radar: radar.to_string(),
            date: date.to_string(),
            night: false,
            step: 5.0,
            gzip: false,
            aws: false,
            bucket: "vol2bird".to_string(),
            data_dir: PathBuf::from("/data"),
            fetch_tool: "radcp".to_string(),
            analysis_tool: "vol2bird".to_string(),
            failure_policy: FailurePolicy::Skip,
            options: None,
        })
    }

    fn from_cli(cli: Cli, options: Option<String>) -> Result<Self> {
        let mut job = JobConfig::new(&cli.radar, &cli.date)?;

        job.night = cli.night;
        job.step = cli.step;
        job.gzip = cli.gzip;
        job.aws = cli.aws;
        job.bucket = cli.bucket;
        job.data_dir = cli.data_dir;
        job.fetch_tool = cli.fetch_tool;
        job.analysis_tool = cli.analysis_tool;
        job.failure_policy = if cli.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Skip
        };
        job.options = options;

        Ok(job)
    }

    /// Name of the aggregate report, e.g. `KBGM20200501.txt`.
    pub fn report_file_name(&self) -> String {
        format!("{}{}.txt", self.radar, self.date).replace('/', "")
    }

    /// Object storage key for a delivered file.
    pub fn object_key(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.radar, self.date, file_name)
    }
}

/// Everything the resolver reads from the outside world.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Value of `ARGS`.
    pub env_args: Option<OsString>,
    /// Value of `OPTS`.
    pub env_opts: Option<OsString>,
}

impl RawInputs {
    pub fn from_env() -> Self {
        let mut args = env::args_os();
        let program = args.next().unwrap_or_else(|| OsString::from("process_day"));

        RawInputs {
            program,
            args: args.collect(),
            env_args: env::var_os("ARGS"),
            env_opts: env::var_os("OPTS"),
        }
    }
}

/// Resolves the job configuration.
///
/// Arguments taken from `ARGS` are placed ahead of the command line ones, and a
/// later occurrence of a flag overrides an earlier one, so the command line
/// wins over the environment which wins over the defaults.
///
/// Help and version requests come back as a `clap::Error` whose exit code is 0.
pub fn resolve(inputs: RawInputs) -> Result<JobConfig, clap::Error> {
    let env_tokens: Vec<OsString> = match inputs.env_args.as_deref().map(OsStr::to_str) {
        None => Vec::new(),
        Some(Some(args)) => args.split_whitespace().map(OsString::from).collect(),
        Some(None) => {
            return Err(Cli::command().error(ErrorKind::InvalidUtf8, "ARGS is not valid UTF-8"));
        }
    };

    if !env_tokens.is_empty() {
        tracing::info!("Using arguments from ARGS: {:?}", env_tokens);
    }

    let tokens = std::iter::once(inputs.program)
        .chain(env_tokens)
        .chain(inputs.args);
    let cli = Cli::try_parse_from(tokens)?;
    let options = match inputs.env_opts.as_deref().map(OsStr::to_str) {
        None => None,
        Some(Some(payload)) => Some(unescape_options(payload)),
        Some(None) => {
            return Err(Cli::command().error(ErrorKind::InvalidUtf8, "OPTS is not valid UTF-8"));
        }
    };

    JobConfig::from_cli(cli, options)
        .map_err(|e| Cli::command().error(ErrorKind::MissingRequiredArgument, e))
}

/// `OPTS` carries newlines as literal `\n` markers.
fn unescape_options(payload: &str) -> String {
    payload.replace("\\n", "\n")
}

// -- Tests -------------------------------------------------------------------
