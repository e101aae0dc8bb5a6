//! DevOps client backed by the `oci` command line tool

use async_trait::async_trait;
use gcn_core::{DevOpsClient, Error, LogSummary, ResourceSummary, Result, StageSummary};
use tracing::{debug, warn};

use crate::parse::{self, WorkRequestStatus};
use crate::{OciCli, OciConfig};

/// `oci` subcommand and id option of a delete
struct DeleteCommand {
    command: &'static [&'static str],
    id_option: &'static str,
    /// DevOps deletions are asynchronous; wait for their work request
    wait: bool,
}

const CODE_REPOSITORY: DeleteCommand = DeleteCommand {
    command: &["devops", "repository", "delete"],
    id_option: "--repository-id",
    wait: true,
};
const BUILD_PIPELINE: DeleteCommand = DeleteCommand {
    command: &["devops", "build-pipeline", "delete"],
    id_option: "--build-pipeline-id",
    wait: true,
};
const BUILD_PIPELINE_STAGE: DeleteCommand = DeleteCommand {
    command: &["devops", "build-pipeline-stage", "delete"],
    id_option: "--stage-id",
    wait: true,
};
const DEPLOY_PIPELINE: DeleteCommand = DeleteCommand {
    command: &["devops", "deploy-pipeline", "delete"],
    id_option: "--pipeline-id",
    wait: true,
};
const DEPLOY_STAGE: DeleteCommand = DeleteCommand {
    command: &["devops", "deploy-stage", "delete"],
    id_option: "--deploy-stage-id",
    wait: true,
};
const DEPLOY_ARTIFACT: DeleteCommand = DeleteCommand {
    command: &["devops", "deploy-artifact", "delete"],
    id_option: "--artifact-id",
    wait: true,
};
const DEPLOY_ENVIRONMENT: DeleteCommand = DeleteCommand {
    command: &["devops", "deploy-environment", "delete"],
    id_option: "--environment-id",
    wait: true,
};
const CONTAINER_REPOSITORY: DeleteCommand = DeleteCommand {
    command: &["artifacts", "container", "repository", "delete"],
    id_option: "--repository-id",
    wait: false,
};
const ARTIFACT_REPOSITORY: DeleteCommand = DeleteCommand {
    command: &["artifacts", "repository", "delete"],
    id_option: "--repository-id",
    wait: false,
};
const KNOWLEDGE_BASE: DeleteCommand = DeleteCommand {
    command: &["adm", "knowledge-base", "delete"],
    id_option: "--knowledge-base-id",
    wait: true,
};
const PROJECT: DeleteCommand = DeleteCommand {
    command: &["devops", "project", "delete"],
    id_option: "--project-id",
    wait: true,
};

/// [`DevOpsClient`] shelling out to `oci`
#[derive(Debug, Clone)]
pub struct OciDevOpsClient {
    cli: OciCli,
}

impl OciDevOpsClient {
    pub fn new(config: OciConfig) -> Self {
        Self {
            cli: OciCli::new(config),
        }
    }

    async fn list(&self, command: &[&str], parent_option: &str, parent: &str) -> Result<Vec<ResourceSummary>> {
        let mut args = command.to_vec();
        args.extend([parent_option, parent, "--all"]);
        parse::resources(self.cli.run(&args).await?)
    }

    async fn get(&self, command: &[&str], id_option: &str, id: &str) -> Result<Option<ResourceSummary>> {
        let mut args = command.to_vec();
        args.extend([id_option, id]);
        match self.cli.run(&args).await {
            Ok(Some(value)) => parse::resource(value).map(Some),
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, delete: &DeleteCommand, id: &str, ignore_not_found: bool) -> Result<()> {
        let mut args = delete.command.to_vec();
        args.extend([delete.id_option, id, "--force"]);
        if delete.wait {
            args.extend(["--wait-for-state", "SUCCEEDED", "--wait-for-state", "FAILED"]);
        }
        match self.cli.run(&args).await {
            Ok(output) => {
                let failed = output
                    .and_then(|value| value.pointer("/data/status").and_then(|s| s.as_str()).map(str::to_string))
                    .filter(|status| status == "FAILED");
                match failed {
                    Some(_) => Err(Error::operation(
                        delete.command.join(" "),
                        format!("work request for {} failed", id),
                    )),
                    None => Ok(()),
                }
            }
            Err(e) if ignore_not_found && e.is_not_found() => {
                debug!("{} already gone", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Poll a work request until it finishes
    async fn wait_for_work_request(&self, service: &str, work_request_id: &str) -> Result<Option<String>> {
        let config = self.cli.config();
        for _ in 0..config.work_request_max_polls.max(1) {
            let output = self
                .cli
                .run(&[service, "work-request", "get", "--work-request-id", work_request_id])
                .await?;
            match parse::work_request(output)? {
                WorkRequestStatus::Succeeded(resource) => return Ok(resource),
                WorkRequestStatus::Failed(status) => {
                    return Err(Error::operation(
                        format!("{} work request {}", service, work_request_id),
                        status,
                    ));
                }
                WorkRequestStatus::Pending => tokio::time::sleep(config.work_request_poll_interval).await,
            }
        }
        warn!("Gave up waiting for {} work request {}", service, work_request_id);
        Err(Error::operation(
            format!("{} work request {}", service, work_request_id),
            "still pending",
        ))
    }
}

#[async_trait]
impl DevOpsClient for OciDevOpsClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<ResourceSummary>> {
        self.get(&["devops", "project", "get"], "--project-id", project_id).await
    }

    async fn get_compartment(&self, compartment_id: &str) -> Result<Option<ResourceSummary>> {
        self.get(&["iam", "compartment", "get"], "--compartment-id", compartment_id)
            .await
    }

    async fn list_code_repositories(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["devops", "repository", "list"], "--project-id", project_id)
            .await
    }

    async fn list_build_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["devops", "build-pipeline", "list"], "--project-id", project_id)
            .await
    }

    async fn list_build_pipeline_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>> {
        let output = self
            .cli
            .run(&[
                "devops",
                "build-pipeline-stage",
                "list",
                "--build-pipeline-id",
                pipeline_id,
                "--all",
            ])
            .await?;
        parse::stages(output, pipeline_id)
    }

    async fn list_deploy_pipelines(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["devops", "deploy-pipeline", "list"], "--project-id", project_id)
            .await
    }

    async fn list_deploy_stages(&self, pipeline_id: &str) -> Result<Vec<StageSummary>> {
        let output = self
            .cli
            .run(&[
                "devops",
                "deploy-stage",
                "list",
                "--deploy-pipeline-id",
                pipeline_id,
                "--all",
            ])
            .await?;
        parse::stages(output, pipeline_id)
    }

    async fn list_deploy_artifacts(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["devops", "deploy-artifact", "list"], "--project-id", project_id)
            .await
    }

    async fn list_deploy_environments(&self, project_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["devops", "deploy-environment", "list"], "--project-id", project_id)
            .await
    }

    async fn list_project_logs(&self, compartment_id: &str, project_id: &str) -> Result<Vec<LogSummary>> {
        let groups = self
            .list(&["logging", "log-group", "list"], "--compartment-id", compartment_id)
            .await?;
        let mut logs = Vec::new();
        for group in groups {
            let output = self
                .cli
                .run(&["logging", "log", "list", "--log-group-id", group.id.as_str(), "--all"])
                .await?;
            logs.extend(parse::logs_of(output, project_id)?);
        }
        Ok(logs)
    }

    async fn list_artifact_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["artifacts", "repository", "list"], "--compartment-id", compartment_id)
            .await
    }

    async fn list_container_repositories(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(
            &["artifacts", "container", "repository", "list"],
            "--compartment-id",
            compartment_id,
        )
        .await
    }

    async fn list_knowledge_bases(&self, compartment_id: &str) -> Result<Vec<ResourceSummary>> {
        self.list(&["adm", "knowledge-base", "list"], "--compartment-id", compartment_id)
            .await
    }

    async fn wait_for_knowledge_base(&self, work_request_id: &str) -> Result<Option<String>> {
        self.wait_for_work_request("adm", work_request_id).await
    }

    async fn wait_for_log(&self, work_request_id: &str) -> Result<Option<String>> {
        self.wait_for_work_request("logging", work_request_id).await
    }

    async fn delete_code_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&CODE_REPOSITORY, id, ignore_not_found).await
    }

    async fn delete_build_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&BUILD_PIPELINE, id, ignore_not_found).await
    }

    async fn delete_build_pipeline_stage(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&BUILD_PIPELINE_STAGE, id, ignore_not_found).await
    }

    async fn delete_deploy_pipeline(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&DEPLOY_PIPELINE, id, ignore_not_found).await
    }

    async fn delete_deploy_stage(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&DEPLOY_STAGE, id, ignore_not_found).await
    }

    async fn delete_deploy_artifact(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&DEPLOY_ARTIFACT, id, ignore_not_found).await
    }

    async fn delete_deploy_environment(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&DEPLOY_ENVIRONMENT, id, ignore_not_found).await
    }

    async fn delete_container_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&CONTAINER_REPOSITORY, id, ignore_not_found).await
    }

    async fn delete_artifact_repository(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&ARTIFACT_REPOSITORY, id, ignore_not_found).await
    }

    async fn delete_log(&self, id: &str, log_group_id: &str, ignore_not_found: bool) -> Result<()> {
        let result = self
            .cli
            .run(&[
                "logging",
                "log",
                "delete",
                "--log-group-id",
                log_group_id,
                "--log-id",
                id,
                "--force",
                "--wait-for-state",
                "SUCCEEDED",
                "--wait-for-state",
                "FAILED",
            ])
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if ignore_not_found && e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn delete_knowledge_base(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&KNOWLEDGE_BASE, id, ignore_not_found).await
    }

    async fn delete_project(&self, id: &str, ignore_not_found: bool) -> Result<()> {
        self.delete(&PROJECT, id, ignore_not_found).await
    }
}
