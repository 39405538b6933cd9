//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{builder::NonEmptyStringValueParser, Parser};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser, Debug)]
#[command(
    name = "process_day",
    version,
    about = "Process one day of radar volumes into a single vol2bird profile report",
    long_about = None,
    args_override_self = true
)]
/// Contains the job flags
pub struct Cli {
    /// Specify NEXRAD radar, e.g. KBGM
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    pub radar: String,

    /// Specify date in yyyy/mm/dd format
    #[arg(short, long, value_parser = parse_date)]
    pub date: String,

    /// If set, only download nighttime data
    #[arg(short, long)]
    pub night: bool,

    /// Compress output
    #[arg(short, long)]
    pub gzip: bool,

    /// Minimum timestep in minutes between consecutive polar volumes
    #[arg(short, long, default_value_t = 5.0, value_parser = parse_step)]
    pub step: f64,

    /// Store output in the object storage bucket
    #[arg(short, long)]
    pub aws: bool,

    /// Bucket used with --aws
    #[arg(long, default_value = "vol2bird")]
    pub bucket: String,

    /// Output directory used when running inside a container
    #[arg(long, default_value = "/data")]
    pub data_dir: PathBuf,

    /// Program that downloads the polar volumes
    #[arg(long, default_value = "radcp")]
    pub fetch_tool: String,

    /// Program that turns one polar volume into a profile
    #[arg(long, default_value = "vol2bird")]
    pub analysis_tool: String,

    /// Abort the whole day when a single volume fails to process
    #[arg(long)]
    pub fail_fast: bool,
}

fn parse_date(s: &str) -> Result<String, String> {
    let date = NaiveDate::parse_from_str(s, "%Y/%m/%d")
        .map_err(|e| format!("expected a yyyy/mm/dd date: {e}"))?;

    // chrono accepts unpadded fields, the output naming relies on the padded form
    if date.format("%Y/%m/%d").to_string() != s {
        return Err(format!("expected a zero padded yyyy/mm/dd date, got `{s}`"));
    }

    Ok(s.to_string())
}

fn parse_step(s: &str) -> Result<f64, String> {
    let step: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;

    if !step.is_finite() || step < 0.0 {
        return Err(format!("step must be a non-negative number of minutes, got `{s}`"));
    }

    Ok(step)
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_accept_padded_date() {
        assert_eq!(parse_date("2020/05/01").unwrap(), "2020/05/01");
    }

    #[test]
    fn should_reject_bad_dates() {
        assert!(parse_date("2020-05-01").is_err());
        assert!(parse_date("2020/5/1").is_err());
        assert!(parse_date("2020/02/30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn should_parse_step() {
        assert_eq!(parse_step("7.5").unwrap(), 7.5);
        assert_eq!(parse_step("0").unwrap(), 0.0);
        assert!(parse_step("-1").is_err());
        assert!(parse_step("NaN").is_err());
        assert!(parse_step("five").is_err());
    }

    #[test]
    fn should_create_progress_bar() {
        let pb = create_progress_bar(3, "Processing volumes".to_string());
        pb.inc(2);

        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 2);
    }
}
