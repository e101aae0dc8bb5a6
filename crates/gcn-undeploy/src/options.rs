//! Undeploy options

use std::path::PathBuf;

/// Tunables of the undeploy orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeployOptions {
    /// Upper bound of in-flight deletions for categories deleted concurrently
    pub max_concurrent_deletes: usize,
    /// Remove the local `.git` directory of undeployed folders
    pub remove_local_git: bool,
    /// Folder registration file, relative to the folder
    pub registration_file: PathBuf,
    /// Local deployment-state directory, relative to the folder
    pub local_state_dir: PathBuf,
}

impl Default for UndeployOptions {
    fn default() -> Self {
        Self {
            max_concurrent_deletes: 4,
            remove_local_git: true,
            registration_file: PathBuf::from(".vscode").join("gcn.json"),
            local_state_dir: PathBuf::from(".gcn"),
        }
    }
}

impl UndeployOptions {
    /// Defaults overridden by `GCN_MAX_CONCURRENT_DELETES` and `GCN_KEEP_LOCAL_GIT`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_deletes: std::env::var("GCN_MAX_CONCURRENT_DELETES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_concurrent_deletes),
            remove_local_git: std::env::var("GCN_KEEP_LOCAL_GIT")
                .map(|v| !matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.remove_local_git),
            ..defaults
        }
    }

    pub fn with_max_concurrent_deletes(mut self, limit: usize) -> Self {
        self.max_concurrent_deletes = limit.max(1);
        self
    }

    pub fn with_remove_local_git(mut self, remove: bool) -> Self {
        self.remove_local_git = remove;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = UndeployOptions::default();
        assert_eq!(options.max_concurrent_deletes, 4);
        assert!(options.remove_local_git);
        assert_eq!(options.registration_file, PathBuf::from(".vscode/gcn.json"));
        assert_eq!(options.local_state_dir, PathBuf::from(".gcn"));
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        let options = UndeployOptions::default().with_max_concurrent_deletes(0);
        assert_eq!(options.max_concurrent_deletes, 1);
    }
}
