//! Local staging of files before upload.

use ccf_core::{ArchiveError, ArchiveResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Scratch directory with a deterministic name under a scratch root.
///
/// Created empty; removed by `remove()` or, failing that, on drop.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    removed: bool,
}

impl StagingDir {
    /// Create `root/name`, discarding anything left there by an earlier run.
    pub async fn create(root: &Path, name: &str) -> ArchiveResult<Self> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(ArchiveError::validation(format!(
                "invalid scratch directory name: {}",
                name
            )));
        }

        let path = root.join(name);
        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_dir_all(&path)
                .await
                .map_err(|e| ArchiveError::io(&path, e))?;
        }
        fs::create_dir_all(&path)
            .await
            .map_err(|e| ArchiveError::io(&path, e))?;

        tracing::debug!(path = %path.display(), "Created staging directory");
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_file(&self, name: &str, contents: &str) -> ArchiveResult<PathBuf> {
        let file = self.path.join(name);
        fs::write(&file, contents)
            .await
            .map_err(|e| ArchiveError::io(&file, e))?;
        Ok(file)
    }

    /// Best-effort removal; failures are logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staging directory"
            );
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Regular files under `dir`, paired with their `/`-separated path relative to `dir`.
///
/// Symlinks below `dir` are not followed and are never uploaded. Sorted by relative path.
pub async fn collect_files(dir: &Path) -> ArchiveResult<Vec<(PathBuf, String)>> {
    let root = dir.to_path_buf();
    tokio::task::spawn_blocking(move || walk_files(&root))
        .await
        .map_err(|e| ArchiveError::io(dir, std::io::Error::other(e)))?
}

fn walk_files(dir: &Path) -> ArchiveResult<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ArchiveError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_path(dir, entry.path())?;
        files.push((entry.into_path(), relative));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn relative_path(base: &Path, path: &Path) -> ArchiveResult<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        ArchiveError::validation(format!(
            "{} is not inside {}",
            path.display(),
            base.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            ArchiveError::validation(format!("file name is not valid UTF-8: {}", path.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
