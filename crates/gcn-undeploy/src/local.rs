//! Removal of local files tying a folder to its cloud deployment

use gcn_core::{Error, FolderData, ProgressSink, Result};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::UndeployOptions;

/// Delete the registration file and the local state directory of `folder`,
/// plus its `.git` directory when `with_git` is set
pub async fn clean_folder(
    folder: &FolderData,
    options: &UndeployOptions,
    with_git: bool,
    progress: &dyn ProgressSink,
) -> Result<()> {
    if with_git {
        remove_local_git(folder, progress).await?;
    }
    let registration = folder.path().join(&options.registration_file);
    if remove_path(&registration).await.map_err(|e| {
        e.context(format!("Failed to delete local registration for {}", folder.name))
    })? {
        progress.report(&format!("Deleted registration for {}", folder.name));
        info!("[undeploy] Deleted registration file {}", registration.display());
    }

    let state_dir = folder.path().join(&options.local_state_dir);
    if remove_path(&state_dir).await.map_err(|e| {
        e.context(format!("Failed to delete local state for {}", folder.name))
    })? {
        info!("[undeploy] Deleted local state directory {}", state_dir.display());
    }
    Ok(())
}

/// Delete the version-control directory of `folder`
pub async fn remove_local_git(folder: &FolderData, progress: &dyn ProgressSink) -> Result<()> {
    let git = folder.path().join(".git");
    progress.report(&format!("Deleting local GIT repository at {}", folder.path().display()));
    if remove_path(&git).await.map_err(|e| {
        e.context(format!("Failed to delete local GIT repository for {}", folder.name))
    })? {
        info!("[undeploy] Deleted local GIT repository {}", git.display());
    }
    Ok(())
}

/// Remove a file or directory tree; `false` when there was nothing to remove
async fn remove_path(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Nothing to remove at {}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(Error::Io(e)),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path).await?;
    } else {
        fs::remove_file(path).await?;
    }
    Ok(true)
}
