//! Cloud DevOps client abstraction
//!
//! The teardown only needs list and delete operations per resource kind.
//! Every delete takes an `ignore_not_found` flag: when set, a resource that
//! is already gone counts as deleted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::Result;

/// Freeform tag holding the DevOps project id a resource was created for
pub const PROJECT_TAG: &str = "gcn_tooling_projectOCID";
/// Freeform tag describing what a resource is used for
pub const USAGE_TAG: &str = "gcn_tooling_usage";
/// Usage tag value of the audit knowledge base
pub const AUDIT_KNOWLEDGE_BASE_USAGE: &str = "gcn-adm-audit";

/// Summary of a listed resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub freeform_tags: HashMap<String, String>,
}

impl ResourceSummary {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            freeform_tags: HashMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.freeform_tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.freeform_tags.get(key).map(String::as_str)
    }
}

/// Summary of a build or deploy pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub id: String,
    pub display_name: String,
    /// Owning pipeline
    pub pipeline_id: String,
    /// Ids of the stages that run before this one
    #[serde(default)]
    pub predecessors: Vec<String>,
}

impl StageSummary {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        pipeline_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            pipeline_id: pipeline_id.into(),
            predecessors: Vec::new(),
        }
    }

    pub fn after(mut self, predecessor: impl Into<String>) -> Self {
        self.predecessors.push(predecessor.into());
        self
    }
}

/// Summary of a log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub id: String,
    pub display_name: String,
    pub log_group_id: String,
}

/// List and delete operations of the cloud DevOps services
#[async_trait]
pub trait DevOpsClient: Send + Sync {
    /// Resolve a DevOps project, `None` when it does not exist
    async fn get_project(&self, project_id: &str) -> Result<Option<ResourceSummary>>;

    /// Resolve a compartment, `None` when it does not exist
    async fn get_compartment(&self, compartment_id: &str) -> Result<Option<ResourceSummary>>;

    async fn list_code_repositories(&self, project_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_build_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_build_pipeline_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>>;

    async fn list_deploy_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_deploy_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>>;

    async fn list_deploy_artifacts(&self, project_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_deploy_environments(&self, project_id: &str) -> Result<Vec<ResourceSummary>>;

    /// Logs whose source is the given DevOps project
    async fn list_project_logs(
        &self,
        compartment_id: &str,
        project_id: &str,
    ) -> Result<Vec<LogSummary>>;

    async fn list_artifact_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_container_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>>;

    async fn list_knowledge_bases(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>>;

    /// Wait for a knowledge base work request and return the created knowledge base
    async fn wait_for_knowledge_base(&self, work_request_id: &str) -> Result<Option<String>>;

    /// Wait for a logging work request and return the created log
    async fn wait_for_log(&self, work_request_id: &str) -> Result<Option<String>>;

    async fn delete_code_repository(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_build_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_build_pipeline_stage(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_deploy_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_deploy_stage(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_deploy_artifact(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_deploy_environment(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_container_repository(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_artifact_repository(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_log(&self, id: &str, log_group_id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_knowledge_base(&self, id: &str, ignore_not_found: bool) -> Result<()>;

    async fn delete_project(&self, id: &str, ignore_not_found: bool) -> Result<()>;
}

/// Resolved credentials for one profile
pub trait Authentication: Send + Sync {
    /// A description of why the credentials are unusable, if they are
    fn configuration_problem(&self) -> Option<String>;

    /// Client bound to these credentials
    fn client(&self) -> Arc<dyn DevOpsClient>;
}

/// Resolves credentials by profile name, `None` selecting the default profile
pub trait AuthenticationResolver: Send + Sync {
    fn resolve(&self, profile: Option<&str>) -> Result<Arc<dyn Authentication>>;
}
