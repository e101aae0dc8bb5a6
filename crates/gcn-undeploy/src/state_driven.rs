//! Teardown driven by the persisted deployment-state document.
//!
//! Each step deletes one resource, clears its field and persists the state
//! before the next call is issued, so an interrupted run leaves a document
//! that lists exactly the resources still to delete.

use gcn_core::{DeploymentState, DevOpsClient, Error, FolderData, Result, StateStore};
use tracing::{debug, info, warn};

use crate::local;
use crate::naming::folder_key;
use crate::plan::{FOLDER_RESOURCES, PlannedDeletion, StepTarget, plan};
use crate::{BranchState, UndeployReport, Undeployer};

fn persist(store: &mut dyn StateStore, state: &DeploymentState) -> Result<()> {
    store
        .dump(state)
        .map_err(|e| e.context("Failed to persist deployment state"))
}

impl Undeployer<'_> {
    /// Delete every resource recorded in `state`, then the local files of the
    /// matching `folders`.
    ///
    /// Ordinary failures stop the walk and end up in the report; only an
    /// inconsistent pipeline structure is returned as an error.
    pub async fn undeploy(
        &self,
        folders: &[FolderData],
        state: &mut DeploymentState,
        store: &mut dyn StateStore,
    ) -> Result<UndeployReport> {
        info!("[undeploy] Invoked delete devops project {}", state.log_name());
        let mut report = UndeployReport::new(state.project_name());

        let client = match self.connect(state.profile.as_deref()) {
            Ok(client) => client,
            Err(problem) => {
                self.progress.error(&problem);
                report.fail(problem);
                return Ok(report);
            }
        };

        self.progress.begin("Deleting devops project");
        let repositories: Vec<String> = state.repositories.keys().cloned().collect();

        let walked = match self.walk(client.as_ref(), state, store, &mut report).await {
            Ok(()) => self.clean_local(folders, &repositories).await,
            Err(e) => Err(e),
        };
        match walked {
            Ok(()) => {
                info!("[undeploy] Devops project successfully deleted");
                report.complete();
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                let message = e.to_string();
                self.progress.error(&message);
                warn!("[undeploy] Undeploy stopped: {}", message);
                report.fail(message);
            }
        }
        Ok(report)
    }

    async fn walk(
        &self,
        client: &dyn DevOpsClient,
        state: &mut DeploymentState,
        store: &mut dyn StateStore,
        report: &mut UndeployReport,
    ) -> Result<()> {
        if state.prune_empty() {
            debug!("Pruned empty folder records before teardown");
            persist(store, state)?;
        }

        let log_name = state.log_name();
        let steps = plan(state);
        for step in &steps {
            report.set_branch(step.branch(), BranchState::Pending);
        }

        for step in &steps {
            let branch = step.branch();
            report.set_branch(branch, BranchState::Deleting(step.kind));
            if let Err(e) = self.execute(client, state, store, report, step, &log_name).await {
                report.set_branch(branch, BranchState::Failed);
                return Err(e);
            }
        }

        if !state.is_empty() {
            let remaining: Vec<&str> = state.repositories.keys().map(String::as_str).collect();
            return Err(Error::operation(
                "Failed to discard deployment state",
                format!("resources still recorded for {}", remaining.join(", ")),
            ));
        }
        store
            .discard()
            .map_err(|e| e.context("Failed to discard deployment state"))?;
        Ok(())
    }

    async fn execute(
        &self,
        client: &dyn DevOpsClient,
        state: &mut DeploymentState,
        store: &mut dyn StateStore,
        report: &mut UndeployReport,
        step: &PlannedDeletion,
        log_name: &str,
    ) -> Result<()> {
        match &step.target {
            StepTarget::Folder { path, resource } => {
                let entry = &FOLDER_RESOURCES[*resource];
                self.run_deletion(
                    report,
                    step.kind,
                    &step.id,
                    &step.description,
                    log_name,
                    (entry.delete)(client, &step.id),
                )
                .await?;
                if let Some(folder) = state.folder_mut(path) {
                    *(entry.field)(folder) = None;
                }
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Deleted(step.kind));

                if state.prune(path) {
                    persist(store, state)?;
                    let repository_gone = match path.parent() {
                        Some(parent) => {
                            let pruned = state.prune(&parent);
                            if pruned {
                                persist(store, state)?;
                            }
                            pruned
                        }
                        None => true,
                    };
                    if repository_gone {
                        debug!("Folder record {} is empty", path.repository);
                        report.set_branch(step.branch(), BranchState::Empty);
                    }
                }
            }
            StepTarget::KnowledgeBase => {
                let knowledge_base = match (&state.knowledge_base, &state.knowledge_base_work_request) {
                    (Some(id), _) => Some(id.clone()),
                    (None, Some(work_request)) => match client.wait_for_knowledge_base(work_request).await {
                        Ok(id) => id,
                        Err(e) => {
                            warn!("[undeploy] Knowledge base work request {} did not resolve: {}", work_request, e);
                            None
                        }
                    },
                    (None, None) => None,
                };
                if let Some(id) = knowledge_base {
                    self.run_deletion(
                        report,
                        step.kind,
                        &id,
                        &step.description,
                        log_name,
                        client.delete_knowledge_base(&id, true),
                    )
                    .await?;
                }
                state.knowledge_base = None;
                state.knowledge_base_work_request = None;
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Deleted(step.kind));
            }
            StepTarget::OkeEnvironment => {
                self.run_deletion(
                    report,
                    step.kind,
                    &step.id,
                    &step.description,
                    log_name,
                    client.delete_deploy_environment(&step.id, true),
                )
                .await?;
                state.oke_cluster_environment = None;
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Deleted(step.kind));
            }
            StepTarget::ArtifactsRepository => {
                self.run_deletion(
                    report,
                    step.kind,
                    &step.id,
                    &step.description,
                    log_name,
                    client.delete_artifact_repository(&step.id, true),
                )
                .await?;
                state.artifacts_repository = None;
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Deleted(step.kind));
            }
            StepTarget::ProjectLog => {
                let log = match &state.project_log_work_request {
                    Some(work_request) => client
                        .wait_for_log(work_request)
                        .await
                        .map_err(|e| e.context(format!("Failed to resolve {}", step.description)))?,
                    None => None,
                };
                match (log, state.log_group.clone()) {
                    (Some(log), Some(log_group)) => {
                        self.run_deletion(
                            report,
                            step.kind,
                            &log,
                            &step.description,
                            log_name,
                            client.delete_log(&log, &log_group, true),
                        )
                        .await?;
                    }
                    (Some(log), None) => {
                        warn!("[undeploy] No log group recorded for log {}, skipping it", log);
                    }
                    (None, _) => debug!("No project log to delete"),
                }
                state.project_log_work_request = None;
                state.log_group = None;
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Deleted(step.kind));
            }
            StepTarget::Project => {
                self.run_deletion(
                    report,
                    step.kind,
                    &step.id,
                    &step.description,
                    log_name,
                    client.delete_project(&step.id, true),
                )
                .await?;
                state.project = None;
                persist(store, state)?;
                report.set_branch(step.branch(), BranchState::Empty);
            }
        }
        Ok(())
    }

    /// Local cleanup of the folders whose names match a deployed repository
    async fn clean_local(&self, folders: &[FolderData], repositories: &[String]) -> Result<()> {
        for folder in folders {
            if !repositories.contains(&folder_key(&folder.name)) {
                debug!("Folder {} matches no deployed repository, leaving it alone", folder.name);
                continue;
            }
            local::clean_folder(folder, &self.options, self.options.remove_local_git, self.progress).await?;
        }
        Ok(())
    }
}
