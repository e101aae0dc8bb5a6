//! In-memory cloud used by the orchestrator tests

use async_trait::async_trait;
use gcn_core::{
    Authentication, AuthenticationResolver, DevOpsClient, Error, LogSummary, ResourceKind,
    ResourceSummary, Result, StageSummary,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeResource {
    kind: ResourceKind,
    summary: ResourceSummary,
    /// Project, pipeline or compartment the resource is listed under
    parent: String,
    predecessors: Vec<String>,
    log_group: Option<String>,
}

#[derive(Debug, Default)]
struct FakeCloud {
    resources: Vec<FakeResource>,
    deleted: Vec<(ResourceKind, String)>,
    failing: HashSet<String>,
    work_requests: HashMap<String, String>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Cloud double remembering what exists and every successful deletion
#[derive(Debug, Default)]
pub struct FakeDevOpsClient {
    cloud: Mutex<FakeCloud>,
}

impl FakeDevOpsClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, kind: ResourceKind, summary: ResourceSummary, parent: &str) -> Self {
        self.push(FakeResource {
            kind,
            summary,
            parent: parent.to_string(),
            predecessors: Vec::new(),
            log_group: None,
        })
    }

    fn push(self, resource: FakeResource) -> Self {
        self.cloud.lock().unwrap().resources.push(resource);
        self
    }

    pub fn with_resource(self, kind: ResourceKind, id: &str, name: &str, parent: &str) -> Self {
        self.with(kind, ResourceSummary::new(id, name), parent)
    }

    pub fn with_tagged(self, kind: ResourceKind, summary: ResourceSummary, compartment: &str) -> Self {
        self.with(kind, summary, compartment)
    }

    pub fn with_stage(self, kind: ResourceKind, stage: StageSummary) -> Self {
        self.push(FakeResource {
            kind,
            summary: ResourceSummary::new(stage.id, stage.display_name),
            parent: stage.pipeline_id,
            predecessors: stage.predecessors,
            log_group: None,
        })
    }

    pub fn with_log(self, id: &str, name: &str, log_group: &str, project: &str) -> Self {
        self.push(FakeResource {
            kind: ResourceKind::Log,
            summary: ResourceSummary::new(id, name),
            parent: project.to_string(),
            predecessors: Vec::new(),
            log_group: Some(log_group.to_string()),
        })
    }

    pub fn with_work_request(self, work_request: &str, resource: &str) -> Self {
        self.cloud
            .lock()
            .unwrap()
            .work_requests
            .insert(work_request.to_string(), resource.to_string());
        self
    }

    /// Deleting `id` fails with a conflict
    pub fn failing_on(self, id: &str) -> Self {
        self.cloud.lock().unwrap().failing.insert(id.to_string());
        self
    }

    pub fn heal(&self, id: &str) {
        self.cloud.lock().unwrap().failing.remove(id);
    }

    /// Ids deleted so far, in order
    pub fn deleted(&self) -> Vec<String> {
        let cloud = self.cloud.lock().unwrap();
        cloud.deleted.iter().map(|(_, id)| id.clone()).collect()
    }

    pub fn exists(&self, id: &str) -> bool {
        let cloud = self.cloud.lock().unwrap();
        cloud.resources.iter().any(|r| r.summary.id == id)
    }

    pub fn max_in_flight(&self) -> usize {
        self.cloud.lock().unwrap().max_in_flight
    }

    fn get(&self, kind: ResourceKind, id: &str) -> Option<ResourceSummary> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .resources
            .iter()
            .find(|r| r.kind == kind && r.summary.id == id)
            .map(|r| r.summary.clone())
    }

    fn list(&self, kind: ResourceKind, parent: &str) -> Vec<FakeResource> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .resources
            .iter()
            .filter(|r| r.kind == kind && r.parent == parent)
            .cloned()
            .collect()
    }

    fn summaries(&self, kind: ResourceKind, parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.list(kind, parent).into_iter().map(|r| r.summary).collect())
    }

    fn stages(&self, kind: ResourceKind, pipeline: &str) -> Result<Vec<StageSummary>> {
        Ok(self
            .list(kind, pipeline)
            .into_iter()
            .map(|r| StageSummary {
                id: r.summary.id,
                display_name: r.summary.display_name,
                pipeline_id: r.parent,
                predecessors: r.predecessors,
            })
            .collect())
    }

    async fn delete(&self, kind: ResourceKind, id: &str, ignore_not_found: bool) -> Result<()> {
        {
            let mut cloud = self.cloud.lock().unwrap();
            cloud.in_flight += 1;
            cloud.max_in_flight = cloud.max_in_flight.max(cloud.in_flight);
        }
        tokio::task::yield_now().await;

        let mut cloud = self.cloud.lock().unwrap();
        cloud.in_flight -= 1;
        if cloud.failing.contains(id) {
            return Err(Error::operation(format!("delete {}", kind.as_str()), "409 Conflict"));
        }
        let position = cloud
            .resources
            .iter()
            .position(|r| r.kind == kind && r.summary.id == id);
        match position {
            Some(index) => {
                cloud.resources.remove(index);
                cloud.deleted.push((kind, id.to_string()));
                Ok(())
            }
            None if ignore_not_found => Ok(()),
            None => Err(Error::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl DevOpsClient for FakeDevOpsClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<ResourceSummary>> {
        Ok(self.get(ResourceKind::DevOpsProject, project_id))
    }

    async fn get_compartment(&self, compartment_id: &str) -> Result<Option<ResourceSummary>> {
        let cloud = self.cloud.lock().unwrap();
        // compartments are parents of projects
        Ok(cloud
            .resources
            .iter()
            .find(|r| r.kind == ResourceKind::DevOpsProject && r.parent == compartment_id)
            .map(|_| ResourceSummary::new(compartment_id, "dev")))
    }

    async fn list_code_repositories(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::CodeRepository, project_id)
    }

    async fn list_build_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::BuildPipeline, project_id)
    }

    async fn list_build_pipeline_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>> {
        self.stages(ResourceKind::BuildPipelineStage, pipeline_id)
    }

    async fn list_deploy_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::DeployPipeline, project_id)
    }

    async fn list_deploy_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>> {
        self.stages(ResourceKind::DeployStage, pipeline_id)
    }

    async fn list_deploy_artifacts(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::DeployArtifact, project_id)
    }

    async fn list_deploy_environments(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::DeployEnvironment, project_id)
    }

    async fn list_project_logs(&self, _compartment_id: &str, project_id: &str) -> Result<Vec<LogSummary>> {
        Ok(self
            .list(ResourceKind::Log, project_id)
            .into_iter()
            .map(|r| LogSummary {
                id: r.summary.id,
                display_name: r.summary.display_name,
                log_group_id: r.log_group.unwrap_or_default(),
            })
            .collect())
    }

    async fn list_artifact_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::ArtifactRepository, compartment_id)
    }

    async fn list_container_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::ContainerRepository, compartment_id)
    }

    async fn list_knowledge_bases(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.summaries(ResourceKind::KnowledgeBase, compartment_id)
    }

    async fn wait_for_knowledge_base(&self, work_request_id: &str) -> Result<Option<String>> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .work_requests
            .get(work_request_id)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::NotFound(work_request_id.to_string()))
    }

    async fn wait_for_log(&self, work_request_id: &str) -> Result<Option<String>> {
        let cloud = self.cloud.lock().unwrap();
        Ok(cloud.work_requests.get(work_request_id).cloned())
    }

    async fn delete_code_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::CodeRepository, id, ignore_not_found).await
    }

    async fn delete_build_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::BuildPipeline, id, ignore_not_found).await
    }

    async fn delete_build_pipeline_stage(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::BuildPipelineStage, id, ignore_not_found).await
    }

    async fn delete_deploy_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::DeployPipeline, id, ignore_not_found).await
    }

    async fn delete_deploy_stage(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::DeployStage, id, ignore_not_found).await
    }

    async fn delete_deploy_artifact(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::DeployArtifact, id, ignore_not_found).await
    }

    async fn delete_deploy_environment(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::DeployEnvironment, id, ignore_not_found).await
    }

    async fn delete_container_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::ContainerRepository, id, ignore_not_found).await
    }

    async fn delete_artifact_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::ArtifactRepository, id, ignore_not_found).await
    }

    async fn delete_log(&self, id: &str, _log_group_id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::Log, id, ignore_not_found).await
    }

    async fn delete_knowledge_base(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::KnowledgeBase, id, ignore_not_found).await
    }

    async fn delete_project(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(ResourceKind::DevOpsProject, id, ignore_not_found).await
    }
}

/// Resolver handing out one shared fake client
pub struct FakeAuthentication {
    client: Arc<FakeDevOpsClient>,
    problem: Option<String>,
}

impl FakeAuthentication {
    pub fn new(client: Arc<FakeDevOpsClient>) -> Self {
        Self { client, problem: None }
    }

    pub fn misconfigured(client: Arc<FakeDevOpsClient>, problem: &str) -> Self {
        Self {
            client,
            problem: Some(problem.to_string()),
        }
    }
}

struct FakeCredentials {
    client: Arc<FakeDevOpsClient>,
    problem: Option<String>,
}

impl Authentication for FakeCredentials {
    fn configuration_problem(&self) -> Option<String> {
        self.problem.clone()
    }

    fn client(&self) -> Arc<dyn DevOpsClient> {
        self.client.clone()
    }
}

impl AuthenticationResolver for FakeAuthentication {
    fn resolve(&self, _profile: Option<&str>) -> Result<Arc<dyn Authentication>> {
        Ok(Arc::new(FakeCredentials {
            client: self.client.clone(),
            problem: self.problem.clone(),
        }))
    }
}
