//! Temporary working directory owned by a single run.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::{Builder, TempDir};

const PREFIX: &str = "process-day-";

/// A fresh directory that is removed when the run ends.
///
/// [`Workspace::release`] removes it explicitly and reports failures. If the
/// workspace is dropped without being released the directory is still removed.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace under `root`.
    pub fn acquire_in(root: &Path) -> Result<Self> {
        let dir = Builder::new()
            .prefix(PREFIX)
            .tempdir_in(root)
            .with_context(|| format!("Failed to create workspace in {}", root.display()))?;

        tracing::debug!("Created workspace {}", dir.path().display());

        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Regular files in the workspace, sorted by file name.
    pub fn volume_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(self.path())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, io::Error>>()?
            .into_iter()
            .filter(|path| path.is_file())
            .collect();

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(files)
    }

    /// Removes the workspace and everything in it.
    pub fn release(self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("Failed to remove workspace {}", path.display()))?;

        tracing::debug!("Removed workspace {}", path.display());

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_create_and_release_workspace() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::acquire_in(root.path()).unwrap();
        let path = workspace.path().to_path_buf();

        assert!(path.is_dir());
        assert!(path.starts_with(root.path()));
        fs::create_dir(path.join("nested")).unwrap();
        fs::write(path.join("nested").join("file"), "x").unwrap();

        workspace.release().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn should_remove_workspace_on_drop() {
        let root = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::acquire_in(root.path()).unwrap();
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn should_give_each_run_its_own_directory() {
        let root = TempDir::new().unwrap();
        let a = Workspace::acquire_in(root.path()).unwrap();
        let b = Workspace::acquire_in(root.path()).unwrap();

        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn should_list_files_in_name_order() {
        let workspace = Workspace::acquire_in(&std::env::temp_dir()).unwrap();
        for name in ["KBGM20200501_100512_V06", "KBGM20200501_000112_V06", "KBGM20200501_050302_V06"] {
            fs::write(workspace.path().join(name), name).unwrap();
        }
        fs::create_dir(workspace.path().join("subdir")).unwrap();

        let names: Vec<String> = workspace
            .volume_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "KBGM20200501_000112_V06",
                "KBGM20200501_050302_V06",
                "KBGM20200501_100512_V06"
            ]
        );
    }

    #[test]
    fn should_list_nothing_in_fresh_workspace() {
        let workspace = Workspace::acquire_in(&std::env::temp_dir()).unwrap();
        assert!(workspace.volume_files().unwrap().is_empty());
    }
}
