//! Kinds of cloud resources created by a project deployment

use serde::{Deserialize, Serialize};

/// Resource kinds the teardown knows how to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    CodeRepository,
    BuildPipeline,
    BuildPipelineStage,
    DeployPipeline,
    DeployStage,
    DeployArtifact,
    DeployEnvironment,
    ContainerRepository,
    ArtifactRepository,
    Log,
    KnowledgeBase,
    DevOpsProject,
}

impl ResourceKind {
    /// Stable identifier used in plans and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::CodeRepository => "code_repository",
            ResourceKind::BuildPipeline => "build_pipeline",
            ResourceKind::BuildPipelineStage => "build_pipeline_stage",
            ResourceKind::DeployPipeline => "deploy_pipeline",
            ResourceKind::DeployStage => "deploy_stage",
            ResourceKind::DeployArtifact => "deploy_artifact",
            ResourceKind::DeployEnvironment => "deploy_environment",
            ResourceKind::ContainerRepository => "container_repository",
            ResourceKind::ArtifactRepository => "artifact_repository",
            ResourceKind::Log => "log",
            ResourceKind::KnowledgeBase => "knowledge_base",
            ResourceKind::DevOpsProject => "devops_project",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::CodeRepository => "source code repository",
            ResourceKind::BuildPipeline => "build pipeline",
            ResourceKind::BuildPipelineStage => "build pipeline stage",
            ResourceKind::DeployPipeline => "deployment pipeline",
            ResourceKind::DeployStage => "deployment stage",
            ResourceKind::DeployArtifact => "deploy artifact",
            ResourceKind::DeployEnvironment => "OKE cluster environment",
            ResourceKind::ContainerRepository => "container repository",
            ResourceKind::ArtifactRepository => "artifact repository",
            ResourceKind::Log => "project log",
            ResourceKind::KnowledgeBase => "ADM knowledge base",
            ResourceKind::DevOpsProject => "devops project",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::DeployEnvironment.to_string(), "OKE cluster environment");
        assert_eq!(ResourceKind::KnowledgeBase.to_string(), "ADM knowledge base");
    }

    #[test]
    fn test_kind_serializes_like_as_str() {
        let json = serde_json::to_string(&ResourceKind::BuildPipelineStage).unwrap();
        assert_eq!(json, format!("\"{}\"", ResourceKind::BuildPipelineStage.as_str()));
    }
}
