//! Scratch directory owned by one export.
//!
//! Leftovers from earlier runs for the same content are swept before a new
//! workspace is created; the new one is removed when the guard drops, on
//! success and error paths alike.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use tracing::{debug, warn};

const PREFIX: &str = "newsdesk-";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `root` (the system temp dir when `None`).
    pub fn create(root: Option<&Path>, content_id: &str) -> io::Result<Self> {
        let root = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&root)?;

        let prefix = workspace_prefix(content_id);
        sweep_stale(&root, &prefix);

        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(&root)?;
        debug!(
            target = "application::export::workspace",
            path = %dir.path().display(),
            "workspace created"
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

fn workspace_prefix(content_id: &str) -> String {
    format!("{PREFIX}{content_id}-")
}

fn sweep_stale(root: &Path, prefix: &str) {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                target = "application::export::workspace",
                root = %root.display(),
                error = %err,
                "failed to scan for stale workspaces"
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let is_stale = name.to_str().is_some_and(|name| name.starts_with(prefix))
            && entry.file_type().is_ok_and(|kind| kind.is_dir());
        if !is_stale {
            continue;
        }
        let path = entry.path();
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!(
                target = "application::export::workspace",
                path = %path.display(),
                "removed stale workspace"
            ),
            Err(err) => warn!(
                target = "application::export::workspace",
                path = %path.display(),
                error = %err,
                "failed to remove stale workspace"
            ),
        }
    }
}
