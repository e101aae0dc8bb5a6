//! Local workspace folders registered with a DevOps project

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cloud coordinates recorded in a folder registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(alias = "compartment")]
    pub compartment_id: String,
    #[serde(alias = "devopsProject")]
    pub devops_project_id: String,
}

/// A local project folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderData {
    pub name: String,
    pub path: PathBuf,
    /// Cloud registration, `None` when the folder was never deployed
    pub context: Option<CloudContext>,
    /// Sub-projects that produce their own container image
    pub cloud_sub_names: Vec<String>,
}

impl FolderData {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            context: None,
            cloud_sub_names: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: CloudContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_sub_names(mut self, names: Vec<String>) -> Self {
        self.cloud_sub_names = names;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
