//! The undeploy orchestrator and the deletion machinery shared by both modes

use futures::stream::{self, StreamExt};
use gcn_core::{AuthenticationResolver, DevOpsClient, ProgressSink, ResourceKind, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use crate::{UndeployOptions, UndeployReport};

/// Tears down cloud resources of deployed projects.
///
/// [`Undeployer::undeploy`] walks a persisted deployment-state document;
/// [`Undeployer::undeploy_folder`] rediscovers the resources by listing the
/// live cloud project.
pub struct Undeployer<'a> {
    pub(crate) resolver: &'a dyn AuthenticationResolver,
    pub(crate) progress: &'a dyn ProgressSink,
    pub(crate) options: UndeployOptions,
}

/// A resource queued for concurrent deletion
#[derive(Debug, Clone)]
pub(crate) struct DeleteTarget {
    pub id: String,
    pub name: String,
    /// Owning resource needed by the delete call (log group of a log)
    pub parent: Option<String>,
}

impl<'a> Undeployer<'a> {
    pub fn new(resolver: &'a dyn AuthenticationResolver, progress: &'a dyn ProgressSink) -> Self {
        Self {
            resolver,
            progress,
            options: UndeployOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UndeployOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &UndeployOptions {
        &self.options
    }

    /// Client for `profile`, or the reason the credentials are unusable
    pub(crate) fn connect(&self, profile: Option<&str>) -> std::result::Result<Arc<dyn DevOpsClient>, String> {
        let authentication = self.resolver.resolve(profile).map_err(|e| e.to_string())?;
        if let Some(problem) = authentication.configuration_problem() {
            return Err(problem);
        }
        Ok(authentication.client())
    }

    /// Run one deletion with progress and audit logging
    pub(crate) async fn run_deletion<F>(
        &self,
        report: &mut UndeployReport,
        kind: ResourceKind,
        id: &str,
        description: &str,
        log_name: &str,
        deletion: F,
    ) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        self.progress.report(&format!("Deleting {}", description));
        info!("[undeploy] Deleting {} in {}", description, log_name);
        if let Err(e) = deletion.await {
            error!("[undeploy] Failed to delete {} in {}: {}", description, log_name, e);
            return Err(e.context(format!("Failed to delete {}", description)));
        }
        info!("[undeploy] Deleted {} in {}", description, log_name);
        report.record_deleted(kind, id, description);
        Ok(())
    }

    /// Delete `targets` with bounded concurrency.
    ///
    /// Every deletion runs to completion; the first failure is returned
    /// afterwards.
    pub(crate) async fn delete_concurrently<F, Fut>(
        &self,
        report: &mut UndeployReport,
        kind: ResourceKind,
        log_name: &str,
        targets: Vec<DeleteTarget>,
        delete: F,
    ) -> Result<()>
    where
        F: Fn(DeleteTarget) -> Fut,
        Fut: Future<Output = (DeleteTarget, Result<()>)>,
    {
        let progress = self.progress;
        let results: Vec<(DeleteTarget, Result<()>)> = stream::iter(targets)
            .map(|target| {
                progress.report(&format!("Deleting {} {}", kind, target.name));
                info!("[undeploy] Deleting {} {} in {}", kind, target.name, log_name);
                delete(target)
            })
            .buffer_unordered(self.options.max_concurrent_deletes.max(1))
            .collect()
            .await;

        let mut failure = None;
        for (target, result) in results {
            match result {
                Ok(()) => {
                    info!("[undeploy] Deleted {} {} in {}", kind, target.name, log_name);
                    report.record_deleted(kind, &target.id, &format!("{} {}", kind, target.name));
                }
                Err(e) => {
                    error!("[undeploy] Failed to delete {} {} in {}: {}", kind, target.name, log_name, e);
                    if failure.is_none() {
                        failure = Some(e.context(format!("Failed to delete {} {}", kind, target.name)));
                    }
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }
}
