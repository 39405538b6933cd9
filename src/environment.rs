//! Detects whether the process runs inside a container.

use std::{fs, path::PathBuf};

const INIT_CGROUP: &str = "/proc/1/cgroup";

/// Markers that show up in the init process cgroup paths of common container runtimes.
const CONTAINER_MARKERS: [&str; 4] = ["docker", "containerd", "kubepods", "lxc"];

pub trait ExecutionEnvironment {
    fn is_containerized(&self) -> bool;
}

/// Reads the cgroup membership of the init process.
#[derive(Debug, Clone)]
pub struct CgroupProbe {
    path: PathBuf,
}

impl CgroupProbe {
    pub fn new() -> Self {
        Self::with_path(INIT_CGROUP)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        CgroupProbe { path: path.into() }
    }
}

impl Default for CgroupProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEnvironment for CgroupProbe {
    fn is_containerized(&self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(content) => is_container_cgroup(&content),
            Err(e) => {
                tracing::debug!("Cannot read {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

fn is_container_cgroup(content: &str) -> bool {
    CONTAINER_MARKERS.iter().any(|marker| content.contains(marker))
}

/// An environment with a fixed answer.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedEnvironment(pub bool);

#[cfg(test)]
impl ExecutionEnvironment for FixedEnvironment {
    fn is_containerized(&self) -> bool {
        self.0
    }
}

// -- Tests -------------------------------------------------------------------
