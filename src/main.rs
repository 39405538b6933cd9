mod batch;
mod cli;
mod config;
mod deliver;
mod environment;
mod fetch;
mod finalise;
mod tool;
mod workspace;

use std::{env, process::ExitCode};

use anyhow::{Context, Result};
use cli::command::{process_day, RunContext, RunOutcome};
use config::{resolve, RawInputs};
use deliver::S3Stores;
use environment::CgroupProbe;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let job = match resolve(RawInputs::from_env()) {
        Ok(job) => job,
        Err(e) => {
            // help and version land here too, with a zero exit code
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match run(&job).await {
        Ok(RunOutcome::Delivered { target, summary }) => {
            if !summary.skipped.is_empty() {
                eprintln!(
                    "Skipped {} volumes: {}",
                    summary.skipped.len(),
                    summary.skipped.join(", ")
                );
            }
            println!("Processed {} volumes", summary.processed);
            println!("File saved to `{}`", target);
            ExitCode::SUCCESS
        }
        // already logged by the pipeline
        Ok(RunOutcome::NoVolumes) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(job: &config::JobConfig) -> Result<RunOutcome> {
    let origin_dir = env::current_dir().context("Failed to read the current directory")?;
    let environment = CgroupProbe::new();

    let ctx = RunContext {
        origin_dir,
        scratch_root: env::temp_dir(),
        environment: &environment,
        stores: &S3Stores,
    };

    process_day(job, &ctx).await
}
