//! Chooses the artifact that gets delivered, compressing the report if asked.

use std::{
    fs::File,
    io::{copy, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression};

/// Returns the file to deliver: the report itself, or a gzip copy next to it.
pub fn finalise(report: &Path, gzip: bool) -> Result<PathBuf> {
    if gzip {
        compress(report)
    } else {
        Ok(report.to_path_buf())
    }
}

/// Writes `<report>.gz` and leaves the original in place.
pub fn compress(report: &Path) -> Result<PathBuf> {
    let mut file_name = report
        .file_name()
        .with_context(|| format!("Report path has no file name: {}", report.display()))?
        .to_os_string();
    file_name.push(".gz");
    let gz_path = report.with_file_name(file_name);

    let mut reader = BufReader::new(
        File::open(report).with_context(|| format!("Failed to open {}", report.display()))?,
    );
    let gz_file =
        File::create(&gz_path).with_context(|| format!("Failed to create {}", gz_path.display()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(gz_file), Compression::default());

    copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;

    tracing::debug!("Compressed {} to {}", report.display(), gz_path.display());

    Ok(gz_path)
}

// -- Tests -------------------------------------------------------------------
