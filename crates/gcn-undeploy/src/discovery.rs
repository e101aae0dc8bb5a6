//! Teardown by discovery of the live cloud resources of a folder's project

use gcn_core::{
    AUDIT_KNOWLEDGE_BASE_USAGE, CloudContext, DevOpsClient, FolderData, PROJECT_TAG,
    ResourceKind, ResourceSummary, Result, StageSummary, USAGE_TAG, order_for_deletion,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::local;
use crate::naming::expected_container_repository_names;
use crate::undeployer::DeleteTarget;
use crate::{BranchState, UndeployOutcome, UndeployReport, Undeployer};

/// Everything a discovery run needs to know about its target
struct Scope<'s> {
    client: Arc<dyn DevOpsClient>,
    folder: &'s FolderData,
    context: &'s CloudContext,
    project: ResourceSummary,
    /// `compartment/project`, for project scoped log lines
    log_name: String,
    /// compartment name, for compartment scoped log lines
    compartment_name: String,
}

/// Which kind of pipeline a sweep handles
#[derive(Debug, Clone, Copy)]
enum PipelineFamily {
    Build,
    Deploy,
}

impl PipelineFamily {
    fn pipeline_kind(self) -> ResourceKind {
        match self {
            PipelineFamily::Build => ResourceKind::BuildPipeline,
            PipelineFamily::Deploy => ResourceKind::DeployPipeline,
        }
    }

    fn stage_kind(self) -> ResourceKind {
        match self {
            PipelineFamily::Build => ResourceKind::BuildPipelineStage,
            PipelineFamily::Deploy => ResourceKind::DeployStage,
        }
    }
}

/// Mark a discovery phase finished in the report
fn finish_phase<T>(report: &mut UndeployReport, phase: &str, result: Result<T>) -> Result<T> {
    let state = if result.is_ok() {
        BranchState::Empty
    } else {
        BranchState::Failed
    };
    report.set_branch(phase, state);
    result
}

impl Undeployer<'_> {
    /// Undeploy every folder independently; a failing folder is reported and
    /// the next one is attempted
    pub async fn undeploy_folders(&self, folders: &[FolderData]) -> Vec<UndeployReport> {
        info!("[undeploy] Configured to undeploy {} folder(s)", folders.len());
        let mut reports = Vec::with_capacity(folders.len());
        for folder in folders {
            info!("[undeploy] Undeploying folder {}", folder.path().display());
            match self.undeploy_folder(folder).await {
                Ok(report) => {
                    if matches!(report.outcome, UndeployOutcome::Completed) {
                        info!("[undeploy] Folder {} successfully undeployed", folder.path().display());
                    }
                    reports.push(report);
                }
                Err(e) => {
                    let message = format!("Failed to undeploy folder {}: {}", folder.name, e);
                    self.progress.error(&message);
                    error!("[undeploy] {}", message);
                    let mut report = UndeployReport::new(folder.name.clone());
                    report.fail(message);
                    reports.push(report);
                }
            }
        }
        reports
    }

    /// Delete every resource found under the folder's DevOps project, the
    /// project itself, and the folder's local deployment files.
    ///
    /// Returns an error only for an inconsistent pipeline structure.
    pub async fn undeploy_folder(&self, folder: &FolderData) -> Result<UndeployReport> {
        let mut report = UndeployReport::new(folder.name.clone());
        let Some(context) = &folder.context else {
            let reason = format!("No services to undeploy for {}", folder.name);
            info!("[undeploy] {}", reason);
            report.skip(reason);
            return Ok(report);
        };

        let client = match self.connect(context.profile.as_deref()) {
            Ok(client) => client,
            Err(problem) => {
                let message = format!("Cannot undeploy folder {}: {}", folder.name, problem);
                self.progress.error(&message);
                report.fail(message);
                return Ok(report);
            }
        };

        self.progress
            .begin(&format!("Validating OCI data for folder {}", folder.name));
        let (project, compartment) = match self.validate(client.as_ref(), context).await {
            Ok(resolved) => resolved,
            Err(problem) => {
                let message = format!("Cannot undeploy folder {}: {}", folder.name, problem);
                self.progress.error(&message);
                error!("[undeploy] {}", message);
                report.fail(message);
                return Ok(report);
            }
        };

        let scope = Scope {
            log_name: format!("{}/{}", compartment.display_name, project.display_name),
            compartment_name: compartment.display_name,
            client,
            folder,
            context,
            project,
        };
        self.progress
            .begin(&format!("Undeploying {} from OCI", scope.project.display_name));
        info!("[undeploy] Undeploying {} from OCI", scope.log_name);

        match self.sweep(&scope, &mut report).await {
            Ok(()) => {
                info!("[undeploy] Devops project {} deleted", scope.log_name);
                report.complete();
            }
            Err(e) if e.is_fatal() => {
                error!("[undeploy] {}", e);
                self.progress.error(&e.to_string());
                report.fail(e.to_string());
                return Err(e);
            }
            Err(e) => {
                let message = e.to_string();
                error!("[undeploy] Undeploy of {} stopped: {}", scope.log_name, message);
                self.progress.error(&message);
                report.fail(message);
            }
        }
        Ok(report)
    }

    async fn validate(
        &self,
        client: &dyn DevOpsClient,
        context: &CloudContext,
    ) -> std::result::Result<(ResourceSummary, ResourceSummary), String> {
        let project = client
            .get_project(&context.devops_project_id)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| format!("Failed to resolve DevOps Project {}", context.devops_project_id))?;
        let compartment = client
            .get_compartment(&context.compartment_id)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| format!("Failed to resolve Compartment {}", context.compartment_id))?;
        Ok((project, compartment))
    }

    async fn sweep(&self, scope: &Scope<'_>, report: &mut UndeployReport) -> Result<()> {
        const CODE: &str = "code repositories";
        report.set_branch(CODE, BranchState::Deleting(ResourceKind::CodeRepository));
        let result = self.delete_code_repositories(scope, report).await;
        let repository_names = finish_phase(report, CODE, result)?;

        if self.options.remove_local_git {
            local::remove_local_git(scope.folder, self.progress).await?;
        }

        for family in [PipelineFamily::Build, PipelineFamily::Deploy] {
            let phase = match family {
                PipelineFamily::Build => "build pipelines",
                PipelineFamily::Deploy => "deployment pipelines",
            };
            report.set_branch(phase, BranchState::Deleting(family.pipeline_kind()));
            let result = self.delete_pipelines(scope, report, family).await;
            finish_phase(report, phase, result)?;
        }

        const LOGS: &str = "logs";
        report.set_branch(LOGS, BranchState::Deleting(ResourceKind::Log));
        let result = self.delete_logs(scope, report).await;
        finish_phase(report, LOGS, result)?;

        const ARTIFACTS: &str = "deploy artifacts";
        report.set_branch(ARTIFACTS, BranchState::Deleting(ResourceKind::DeployArtifact));
        let result = self.delete_deploy_artifacts(scope, report).await;
        finish_phase(report, ARTIFACTS, result)?;

        const ARTIFACT_REPOSITORIES: &str = "artifact repositories";
        report.set_branch(
            ARTIFACT_REPOSITORIES,
            BranchState::Deleting(ResourceKind::ArtifactRepository),
        );
        let result = self.delete_artifact_repositories(scope, report).await;
        finish_phase(report, ARTIFACT_REPOSITORIES, result)?;

        const CONTAINER_REPOSITORIES: &str = "container repositories";
        report.set_branch(
            CONTAINER_REPOSITORIES,
            BranchState::Deleting(ResourceKind::ContainerRepository),
        );
        let result = self
            .delete_container_repositories(scope, report, &repository_names)
            .await;
        finish_phase(report, CONTAINER_REPOSITORIES, result)?;

        const ENVIRONMENTS: &str = "OKE cluster environments";
        report.set_branch(ENVIRONMENTS, BranchState::Deleting(ResourceKind::DeployEnvironment));
        let result = self.delete_environments(scope, report).await;
        finish_phase(report, ENVIRONMENTS, result)?;

        const KNOWLEDGE_BASES: &str = "knowledge bases";
        report.set_branch(KNOWLEDGE_BASES, BranchState::Deleting(ResourceKind::KnowledgeBase));
        let result = self.delete_knowledge_bases(scope, report).await;
        finish_phase(report, KNOWLEDGE_BASES, result)?;

        const PROJECT: &str = "project";
        report.set_branch(PROJECT, BranchState::Deleting(ResourceKind::DevOpsProject));
        let description = format!("devops project {}", scope.project.display_name);
        let result = self
            .run_deletion(
                report,
                ResourceKind::DevOpsProject,
                &scope.project.id,
                &description,
                &scope.log_name,
                scope.client.delete_project(&scope.project.id, true),
            )
            .await;
        finish_phase(report, PROJECT, result)?;

        local::clean_folder(scope.folder, &self.options, false, self.progress).await
    }

    /// Returns the names of the repositories found, needed to derive the
    /// container repository names later
    async fn delete_code_repositories(
        &self,
        scope: &Scope<'_>,
        report: &mut UndeployReport,
    ) -> Result<Vec<String>> {
        self.progress
            .report(&format!("Listing project code repositories for {}", scope.project.display_name));
        let repositories = scope
            .client
            .list_code_repositories(&scope.project.id)
            .await
            .map_err(|e| e.context("Failed to list code repositories"))?;
        let names = repositories.iter().map(|r| r.display_name.clone()).collect();

        let targets = repositories
            .into_iter()
            .map(|r| DeleteTarget {
                id: r.id,
                name: r.display_name,
                parent: None,
            })
            .collect();
        let client = &scope.client;
        self.delete_concurrently(
            report,
            ResourceKind::CodeRepository,
            &scope.log_name,
            targets,
            |target| {
                let client = Arc::clone(client);
                async move {
                    let result = client.delete_code_repository(&target.id, true).await;
                    (target, result)
                }
            },
        )
        .await?;
        Ok(names)
    }

    /// Pipelines go one at a time: the service serializes deletions on the
    /// owning project and concurrent calls interfere
    async fn delete_pipelines(
        &self,
        scope: &Scope<'_>,
        report: &mut UndeployReport,
        family: PipelineFamily,
    ) -> Result<()> {
        let kind = family.pipeline_kind();
        self.progress.report(&format!("Listing {}s", kind));
        let pipelines = match family {
            PipelineFamily::Build => scope.client.list_build_pipelines(&scope.project.id).await,
            PipelineFamily::Deploy => scope.client.list_deploy_pipelines(&scope.project.id).await,
        }
        .map_err(|e| e.context(format!("Failed to list {}s", kind)))?;

        for pipeline in pipelines {
            self.progress
                .report(&format!("Processing {} {}", kind, pipeline.display_name));
            let stages: Vec<StageSummary> = match family {
                PipelineFamily::Build => scope.client.list_build_pipeline_stages(&pipeline.id).await,
                PipelineFamily::Deploy => scope.client.list_deploy_stages(&pipeline.id).await,
            }
            .map_err(|e| e.context(format!("Failed to list stages of {} {}", kind, pipeline.display_name)))?;

            for stage in order_for_deletion(&pipeline.id, stages)? {
                let description = format!(
                    "stage {} of {} {}",
                    stage.display_name, kind, pipeline.display_name
                );
                let deletion = match family {
                    PipelineFamily::Build => scope.client.delete_build_pipeline_stage(&stage.id, true),
                    PipelineFamily::Deploy => scope.client.delete_deploy_stage(&stage.id, true),
                };
                self.run_deletion(
                    report,
                    family.stage_kind(),
                    &stage.id,
                    &description,
                    &scope.log_name,
                    deletion,
                )
                .await?;
            }

            let description = format!("{} {}", kind, pipeline.display_name);
            let deletion = match family {
                PipelineFamily::Build => scope.client.delete_build_pipeline(&pipeline.id, true),
                PipelineFamily::Deploy => scope.client.delete_deploy_pipeline(&pipeline.id, true),
            };
            self.run_deletion(report, kind, &pipeline.id, &description, &scope.log_name, deletion)
                .await?;
        }
        Ok(())
    }

    async fn delete_logs(&self, scope: &Scope<'_>, report: &mut UndeployReport) -> Result<()> {
        self.progress.report("Listing project logs");
        let logs = scope
            .client
            .list_project_logs(&scope.context.compartment_id, &scope.project.id)
            .await
            .map_err(|e| e.context("Failed to list project logs"))?;
        let targets = logs
            .into_iter()
            .map(|log| DeleteTarget {
                id: log.id,
                name: log.display_name,
                parent: Some(log.log_group_id),
            })
            .collect();
        let client = &scope.client;
        self.delete_concurrently(report, ResourceKind::Log, &scope.log_name, targets, |target| {
            let client = Arc::clone(client);
            async move {
                let log_group = target.parent.clone().unwrap_or_default();
                let result = client.delete_log(&target.id, &log_group, true).await;
                (target, result)
            }
        })
        .await
    }

    async fn delete_deploy_artifacts(&self, scope: &Scope<'_>, report: &mut UndeployReport) -> Result<()> {
        self.progress.report("Listing project deploy artifacts");
        let artifacts = scope
            .client
            .list_deploy_artifacts(&scope.project.id)
            .await
            .map_err(|e| e.context("Failed to list deploy artifacts"))?;
        for artifact in artifacts {
            let description = format!("deploy artifact {}", artifact.display_name);
            self.run_deletion(
                report,
                ResourceKind::DeployArtifact,
                &artifact.id,
                &description,
                &scope.log_name,
                scope.client.delete_deploy_artifact(&artifact.id, true),
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_artifact_repositories(
        &self,
        scope: &Scope<'_>,
        report: &mut UndeployReport,
    ) -> Result<()> {
        self.progress.report("Listing artifact repositories");
        let repositories = scope
            .client
            .list_artifact_repositories(&scope.context.compartment_id)
            .await
            .map_err(|e| e.context("Failed to list artifact repositories"))?;
        for repository in repositories
            .into_iter()
            .filter(|r| r.tag(PROJECT_TAG) == Some(scope.project.id.as_str()))
        {
            let description = format!("artifact repository {}", repository.display_name);
            self.run_deletion(
                report,
                ResourceKind::ArtifactRepository,
                &repository.id,
                &description,
                &scope.compartment_name,
                scope.client.delete_artifact_repository(&repository.id, true),
            )
            .await?;
        }
        Ok(())
    }

    /// Best effort: matches names the deploy would have given the
    /// repositories under the current naming rules
    async fn delete_container_repositories(
        &self,
        scope: &Scope<'_>,
        report: &mut UndeployReport,
        repository_names: &[String],
    ) -> Result<()> {
        let expected = expected_container_repository_names(
            &scope.project.display_name,
            repository_names,
            &scope.folder.cloud_sub_names,
        );
        self.progress.report("Listing container repositories");
        let repositories = scope
            .client
            .list_container_repositories(&scope.context.compartment_id)
            .await
            .map_err(|e| e.context("Failed to list container repositories"))?;
        for repository in repositories
            .into_iter()
            .filter(|r| expected.contains(&r.display_name.to_lowercase()))
        {
            let description = format!("container repository {}", repository.display_name);
            self.run_deletion(
                report,
                ResourceKind::ContainerRepository,
                &repository.id,
                &description,
                &scope.compartment_name,
                scope.client.delete_container_repository(&repository.id, true),
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_environments(&self, scope: &Scope<'_>, report: &mut UndeployReport) -> Result<()> {
        self.progress.report("Listing OKE cluster environments");
        let environments = scope
            .client
            .list_deploy_environments(&scope.project.id)
            .await
            .map_err(|e| e.context("Failed to list OKE cluster environments"))?;
        for environment in environments {
            let description = format!("OKE cluster environment {}", environment.display_name);
            self.run_deletion(
                report,
                ResourceKind::DeployEnvironment,
                &environment.id,
                &description,
                &scope.log_name,
                scope.client.delete_deploy_environment(&environment.id, true),
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_knowledge_bases(&self, scope: &Scope<'_>, report: &mut UndeployReport) -> Result<()> {
        self.progress.report("Listing ADM knowledge bases");
        let knowledge_bases = scope
            .client
            .list_knowledge_bases(&scope.context.compartment_id)
            .await
            .map_err(|e| e.context("Failed to list ADM knowledge bases"))?;
        for knowledge_base in knowledge_bases.into_iter().filter(|kb| {
            kb.tag(USAGE_TAG) == Some(AUDIT_KNOWLEDGE_BASE_USAGE)
                && kb.tag(PROJECT_TAG) == Some(scope.project.id.as_str())
        }) {
            let description = format!("ADM knowledge base {}", knowledge_base.display_name);
            self.run_deletion(
                report,
                ResourceKind::KnowledgeBase,
                &knowledge_base.id,
                &description,
                &scope.compartment_name,
                scope.client.delete_knowledge_base(&knowledge_base.id, true),
            )
            .await?;
        }
        Ok(())
    }
}
