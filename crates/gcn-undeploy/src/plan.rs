//! Deletion plan of a deployment-state document
//!
//! Folder resources are deleted in a fixed order that mirrors the creation
//! dependencies: deployment stage, deployment pipeline and its configuration
//! artifact first, then per build flavor the build stages, build pipeline and
//! artifact, with the container repository after the container flavor and
//! the code repository last. Project-level resources follow once every
//! folder is gone.

use futures::future::BoxFuture;
use gcn_core::{DeploymentState, DevOpsClient, FolderDeployState, FolderPath, ResourceKind, Result};

use crate::naming::container_repository_name;

/// Deletes one resource by id, ignoring resources that are already gone
pub type DeleteFn = for<'a> fn(&'a dyn DevOpsClient, &'a str) -> BoxFuture<'a, Result<()>>;

/// One resource field of a folder record
pub struct FolderResource {
    pub kind: ResourceKind,
    pub label: &'static str,
    pub field: fn(&mut FolderDeployState) -> &mut Option<String>,
    pub delete: DeleteFn,
}

impl std::fmt::Debug for FolderResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderResource")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish()
    }
}

fn delete_deploy_stage<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_deploy_stage(id, true)
}

fn delete_deploy_pipeline<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_deploy_pipeline(id, true)
}

fn delete_deploy_artifact<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_deploy_artifact(id, true)
}

fn delete_build_stage<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_build_pipeline_stage(id, true)
}

fn delete_build_pipeline<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_build_pipeline(id, true)
}

fn delete_container_repository<'a>(
    client: &'a dyn DevOpsClient,
    id: &'a str,
) -> BoxFuture<'a, Result<()>> {
    client.delete_container_repository(id, true)
}

fn delete_code_repository<'a>(client: &'a dyn DevOpsClient, id: &'a str) -> BoxFuture<'a, Result<()>> {
    client.delete_code_repository(id, true)
}

/// Folder resources in deletion order
pub static FOLDER_RESOURCES: [FolderResource; 17] = [
    FolderResource {
        kind: ResourceKind::DeployStage,
        label: "docker native executables deployment to OKE stage",
        field: |f| &mut f.oke_deploy_stage,
        delete: delete_deploy_stage,
    },
    FolderResource {
        kind: ResourceKind::DeployPipeline,
        label: "docker native executables deployment to OKE pipeline",
        field: |f| &mut f.oke_deploy_pipeline,
        delete: delete_deploy_pipeline,
    },
    FolderResource {
        kind: ResourceKind::DeployArtifact,
        label: "OKE deployment configuration artifact",
        field: |f| &mut f.oke_deploy_config_artifact,
        delete: delete_deploy_artifact,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "docker native executable pipeline artifacts stage",
        field: |f| &mut f.docker_artifacts_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "docker native executable pipeline build stage",
        field: |f| &mut f.docker_build_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipeline,
        label: "docker native executable pipeline",
        field: |f| &mut f.docker_build_pipeline,
        delete: delete_build_pipeline,
    },
    FolderResource {
        kind: ResourceKind::DeployArtifact,
        label: "docker native executable artifact",
        field: |f| &mut f.docker_build_artifact,
        delete: delete_deploy_artifact,
    },
    FolderResource {
        kind: ResourceKind::ContainerRepository,
        label: "container repository",
        field: |f| &mut f.container_repository,
        delete: delete_container_repository,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "native executables pipeline artifacts stage",
        field: |f| &mut f.native_artifacts_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "native executables pipeline build stage",
        field: |f| &mut f.native_build_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipeline,
        label: "native executables pipeline",
        field: |f| &mut f.native_build_pipeline,
        delete: delete_build_pipeline,
    },
    FolderResource {
        kind: ResourceKind::DeployArtifact,
        label: "native executable artifact",
        field: |f| &mut f.native_build_artifact,
        delete: delete_deploy_artifact,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "fat JAR pipeline artifacts stage",
        field: |f| &mut f.dev_artifacts_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipelineStage,
        label: "fat JAR pipeline build stage",
        field: |f| &mut f.dev_build_stage,
        delete: delete_build_stage,
    },
    FolderResource {
        kind: ResourceKind::BuildPipeline,
        label: "fat JAR pipeline",
        field: |f| &mut f.dev_build_pipeline,
        delete: delete_build_pipeline,
    },
    FolderResource {
        kind: ResourceKind::DeployArtifact,
        label: "fat JAR artifact",
        field: |f| &mut f.dev_build_artifact,
        delete: delete_deploy_artifact,
    },
    FolderResource {
        kind: ResourceKind::CodeRepository,
        label: "source code repository",
        field: |f| &mut f.code_repository,
        delete: delete_code_repository,
    },
];

/// What a planned step removes from the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTarget {
    /// Entry `resource` of [`FOLDER_RESOURCES`] in the folder at `path`
    Folder { path: FolderPath, resource: usize },
    KnowledgeBase,
    OkeEnvironment,
    ArtifactsRepository,
    ProjectLog,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDeletion {
    pub kind: ResourceKind,
    /// Resource id, or the work request id for resources not yet resolved
    pub id: String,
    pub description: String,
    pub target: StepTarget,
}

impl PlannedDeletion {
    /// Report branch the step belongs to
    pub fn branch(&self) -> &str {
        match &self.target {
            StepTarget::Folder { path, .. } => &path.repository,
            _ => PROJECT_BRANCH,
        }
    }
}

/// Branch name of project-level steps
pub const PROJECT_BRANCH: &str = "project";

/// Steps a state-driven teardown of `state` performs, in order
pub fn plan(state: &DeploymentState) -> Vec<PlannedDeletion> {
    let project = state.project_name();
    let multi_repository = state.repositories.len() > 1;
    let mut steps = Vec::new();

    for (repository, folder) in &state.repositories {
        for (sub, sub_folder) in &folder.subs {
            let path = FolderPath::sub(repository.clone(), sub.clone());
            plan_folder(&mut steps, project, multi_repository, &path, sub_folder);
        }
        let path = FolderPath::repository(repository.clone());
        plan_folder(&mut steps, project, multi_repository, &path, folder);
    }

    let knowledge_base = state
        .knowledge_base
        .as_ref()
        .or(state.knowledge_base_work_request.as_ref());
    if let Some(id) = knowledge_base {
        steps.push(project_step(ResourceKind::KnowledgeBase, id, project, StepTarget::KnowledgeBase));
    }
    if let Some(id) = &state.oke_cluster_environment {
        steps.push(project_step(ResourceKind::DeployEnvironment, id, project, StepTarget::OkeEnvironment));
    }
    if let Some(id) = &state.artifacts_repository {
        steps.push(project_step(
            ResourceKind::ArtifactRepository,
            id,
            project,
            StepTarget::ArtifactsRepository,
        ));
    }
    let log = state
        .project_log_work_request
        .as_ref()
        .or(state.log_group.as_ref());
    if let Some(id) = log {
        steps.push(project_step(ResourceKind::Log, id, project, StepTarget::ProjectLog));
    }
    if let Some(p) = &state.project {
        steps.push(PlannedDeletion {
            kind: ResourceKind::DevOpsProject,
            id: p.id.clone(),
            description: format!("devops project {}", p.name),
            target: StepTarget::Project,
        });
    }
    steps
}

fn plan_folder(
    steps: &mut Vec<PlannedDeletion>,
    project: &str,
    multi_repository: bool,
    path: &FolderPath,
    folder: &FolderDeployState,
) {
    // accessors need a mutable record; plan from a scratch copy
    let mut scratch = folder.clone();
    for (index, resource) in FOLDER_RESOURCES.iter().enumerate() {
        let Some(id) = (resource.field)(&mut scratch).clone() else {
            continue;
        };
        steps.push(PlannedDeletion {
            kind: resource.kind,
            description: describe(resource, project, multi_repository, path),
            id,
            target: StepTarget::Folder {
                path: path.clone(),
                resource: index,
            },
        });
    }
}

fn describe(resource: &FolderResource, project: &str, multi_repository: bool, path: &FolderPath) -> String {
    if resource.kind == ResourceKind::ContainerRepository {
        let name = container_repository_name(
            project,
            &path.repository,
            path.sub.as_deref(),
            multi_repository,
        );
        return format!("{} {}", resource.label, name);
    }
    match &path.sub {
        Some(sub) => format!("{} of {} for {}", resource.label, sub, path.repository),
        None => format!("{} for {}", resource.label, path.repository),
    }
}

fn project_step(kind: ResourceKind, id: &str, project: &str, target: StepTarget) -> PlannedDeletion {
    PlannedDeletion {
        kind,
        id: id.to_string(),
        description: format!("{} for {}", kind, project),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcn_core::NamedResource;

    #[test]
    fn test_table_covers_every_folder_field() {
        let mut folder = FolderDeployState::default();
        for (index, resource) in FOLDER_RESOURCES.iter().enumerate() {
            *(resource.field)(&mut folder) = Some(format!("id{}", index));
        }
        assert_eq!(folder.resource_ids().count(), FOLDER_RESOURCES.len());
    }

    #[test]
    fn test_code_repository_goes_last() {
        let last = FOLDER_RESOURCES.last().unwrap();
        assert_eq!(last.kind, ResourceKind::CodeRepository);
        assert_eq!(FOLDER_RESOURCES[0].kind, ResourceKind::DeployStage);
    }

    #[test]
    fn test_subs_before_parent_and_project_last() {
        let mut folder = FolderDeployState::with_code_repository("repo");
        folder.dev_build_pipeline = Some("pipe".to_string());
        folder.subs.insert(
            "oci".to_string(),
            FolderDeployState {
                container_repository: Some("cr".to_string()),
                ..Default::default()
            },
        );
        let mut state = DeploymentState::new(NamedResource::new("dev", "c1"))
            .with_project(NamedResource::new("Demo", "p1"))
            .with_repository("app", folder);
        state.knowledge_base_work_request = Some("wr-kb".to_string());
        state.log_group = Some("lg".to_string());

        let steps = plan(&state);
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["cr", "pipe", "repo", "wr-kb", "lg", "p1"]);

        assert_eq!(steps[0].description, "container repository Demo-oci");
        assert_eq!(steps[1].description, "fat JAR pipeline for app");
        assert_eq!(steps[3].description, "ADM knowledge base for Demo");
        assert_eq!(steps[5].branch(), PROJECT_BRANCH);
        assert_eq!(steps[0].branch(), "app");
    }

    #[test]
    fn test_empty_state_plans_nothing() {
        let state = DeploymentState::new(NamedResource::new("dev", "c1"));
        assert!(plan(&state).is_empty());
    }
}
