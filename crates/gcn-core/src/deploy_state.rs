//! Deployment-state document
//!
//! The persisted record of every cloud resource a deploy created for one
//! project. A resource id is present exactly while the resource is believed
//! to exist; teardown clears ids one at a time and prunes folder entries
//! that run empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named cloud resource (compartment or DevOps project)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(rename = "ocid", alias = "id")]
    pub id: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Root document, one per deployed project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentState {
    /// Authentication profile the project was deployed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub compartment: NamedResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<NamedResource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repositories: BTreeMap<String, FolderDeployState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oke_cluster_environment: Option<String>,
    #[serde(
        rename = "knowledgeBaseOCID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub knowledge_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_work_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_log_work_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
}

impl Default for NamedResource {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl DeploymentState {
    /// Create an empty state for a compartment
    pub fn new(compartment: NamedResource) -> Self {
        Self {
            compartment,
            ..Default::default()
        }
    }

    /// Set the DevOps project
    pub fn with_project(mut self, project: NamedResource) -> Self {
        self.project = Some(project);
        self
    }

    /// Add a repository record
    pub fn with_repository(mut self, name: impl Into<String>, folder: FolderDeployState) -> Self {
        self.repositories.insert(name.into(), folder);
        self
    }

    /// Name of the DevOps project, empty once the project is gone
    pub fn project_name(&self) -> &str {
        self.project.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    /// `compartment/project` prefix used in log lines
    pub fn log_name(&self) -> String {
        format!("{}/{}", self.compartment.name, self.project_name())
    }

    /// Whether no cloud resource is recorded any more
    pub fn is_empty(&self) -> bool {
        self.project.is_none()
            && self.repositories.is_empty()
            && self.artifacts_repository.is_none()
            && self.oke_cluster_environment.is_none()
            && self.knowledge_base.is_none()
            && self.knowledge_base_work_request.is_none()
            && self.project_log_work_request.is_none()
            && self.log_group.is_none()
    }

    pub fn folder(&self, path: &FolderPath) -> Option<&FolderDeployState> {
        let folder = self.repositories.get(&path.repository)?;
        match &path.sub {
            Some(sub) => folder.subs.get(sub),
            None => Some(folder),
        }
    }

    pub fn folder_mut(&mut self, path: &FolderPath) -> Option<&mut FolderDeployState> {
        let folder = self.repositories.get_mut(&path.repository)?;
        match &path.sub {
            Some(sub) => folder.subs.get_mut(sub),
            None => Some(folder),
        }
    }

    /// Remove the entry at `path` if it holds no resource.
    ///
    /// Returns true when the entry was removed.
    pub fn prune(&mut self, path: &FolderPath) -> bool {
        match &path.sub {
            Some(sub) => {
                let Some(folder) = self.repositories.get_mut(&path.repository) else {
                    return false;
                };
                if folder.subs.get(sub).is_some_and(FolderDeployState::is_empty) {
                    folder.subs.remove(sub);
                    return true;
                }
                false
            }
            None => {
                if self
                    .repositories
                    .get(&path.repository)
                    .is_some_and(FolderDeployState::is_empty)
                {
                    self.repositories.remove(&path.repository);
                    return true;
                }
                false
            }
        }
    }

    /// Drop every empty sub-component and repository entry.
    ///
    /// Returns true when anything was removed.
    pub fn prune_empty(&mut self) -> bool {
        let mut changed = false;
        for folder in self.repositories.values_mut() {
            let before = folder.subs.len();
            folder.subs.retain(|_, sub| !sub.is_empty());
            changed |= folder.subs.len() != before;
        }
        let before = self.repositories.len();
        self.repositories.retain(|_, folder| !folder.is_empty());
        changed || self.repositories.len() != before
    }
}

/// Location of a folder record inside the state tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderPath {
    pub repository: String,
    pub sub: Option<String>,
}

impl FolderPath {
    pub fn repository(name: impl Into<String>) -> Self {
        Self {
            repository: name.into(),
            sub: None,
        }
    }

    pub fn sub(repository: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            sub: Some(sub.into()),
        }
    }

    /// The parent repository path of a sub-component path
    pub fn parent(&self) -> Option<FolderPath> {
        self.sub
            .as_ref()
            .map(|_| FolderPath::repository(self.repository.clone()))
    }
}

impl std::fmt::Display for FolderPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sub {
            Some(sub) => write!(f, "{}/{}", self.repository, sub),
            None => write!(f, "{}", self.repository),
        }
    }
}

/// Per source-code-repository deployment record.
///
/// Three build flavors are tracked, each with an artifact, a build pipeline
/// and its build and artifacts stages: `devbuild*` (fat JAR),
/// `nibuild*` (native executable) and `docker_nibuild*` (container image with
/// a native executable). Field names match the persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDeployState {
    #[serde(rename = "codeRepository", default, skip_serializing_if = "Option::is_none")]
    pub code_repository: Option<String>,

    #[serde(rename = "devbuildArtifact", default, skip_serializing_if = "Option::is_none")]
    pub dev_build_artifact: Option<String>,
    #[serde(rename = "devbuildPipeline", default, skip_serializing_if = "Option::is_none")]
    pub dev_build_pipeline: Option<String>,
    #[serde(rename = "devbuildPipelineBuildStage", default, skip_serializing_if = "Option::is_none")]
    pub dev_build_stage: Option<String>,
    #[serde(rename = "devbuildPipelineArtifactsStage", default, skip_serializing_if = "Option::is_none")]
    pub dev_artifacts_stage: Option<String>,

    #[serde(rename = "nibuildArtifact", default, skip_serializing_if = "Option::is_none")]
    pub native_build_artifact: Option<String>,
    #[serde(rename = "nibuildPipeline", default, skip_serializing_if = "Option::is_none")]
    pub native_build_pipeline: Option<String>,
    #[serde(rename = "nibuildPipelineBuildStage", default, skip_serializing_if = "Option::is_none")]
    pub native_build_stage: Option<String>,
    #[serde(rename = "nibuildPipelineArtifactsStage", default, skip_serializing_if = "Option::is_none")]
    pub native_artifacts_stage: Option<String>,

    #[serde(rename = "docker_nibuildArtifact", default, skip_serializing_if = "Option::is_none")]
    pub docker_build_artifact: Option<String>,
    #[serde(rename = "docker_nibuildPipeline", default, skip_serializing_if = "Option::is_none")]
    pub docker_build_pipeline: Option<String>,
    #[serde(rename = "docker_nibuildPipelineBuildStage", default, skip_serializing_if = "Option::is_none")]
    pub docker_build_stage: Option<String>,
    #[serde(rename = "docker_nibuildPipelineArtifactsStage", default, skip_serializing_if = "Option::is_none")]
    pub docker_artifacts_stage: Option<String>,

    #[serde(rename = "containerRepository", default, skip_serializing_if = "Option::is_none")]
    pub container_repository: Option<String>,

    #[serde(rename = "oke_deployPipeline", default, skip_serializing_if = "Option::is_none")]
    pub oke_deploy_pipeline: Option<String>,
    #[serde(rename = "deployToOkeStage", default, skip_serializing_if = "Option::is_none")]
    pub oke_deploy_stage: Option<String>,
    #[serde(rename = "oke_deployConfigArtifact", default, skip_serializing_if = "Option::is_none")]
    pub oke_deploy_config_artifact: Option<String>,

    /// Sub-components with their own container image
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subs: BTreeMap<String, FolderDeployState>,
}

impl FolderDeployState {
    /// Record holding only a code repository
    pub fn with_code_repository(id: impl Into<String>) -> Self {
        Self {
            code_repository: Some(id.into()),
            ..Default::default()
        }
    }

    /// Whether no resource id and no sub-component is left
    pub fn is_empty(&self) -> bool {
        self.resource_ids().next().is_none() && self.subs.is_empty()
    }

    /// Ids recorded directly on this entry (sub-components excluded)
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        [
            &self.code_repository,
            &self.dev_build_artifact,
            &self.dev_build_pipeline,
            &self.dev_build_stage,
            &self.dev_artifacts_stage,
            &self.native_build_artifact,
            &self.native_build_pipeline,
            &self.native_build_stage,
            &self.native_artifacts_stage,
            &self.docker_build_artifact,
            &self.docker_build_pipeline,
            &self.docker_build_stage,
            &self.docker_artifacts_stage,
            &self.container_repository,
            &self.oke_deploy_pipeline,
            &self.oke_deploy_stage,
            &self.oke_deploy_config_artifact,
        ]
        .into_iter()
        .filter_map(|id| id.as_deref())
    }
}
