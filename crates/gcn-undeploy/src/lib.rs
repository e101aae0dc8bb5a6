//! Undeploy orchestrator for GCN DevOps projects
//!
//! Two entry points share the deletion machinery:
//!
//! - [`Undeployer::undeploy`] walks a persisted deployment-state document,
//!   deleting one resource per step and persisting the shrunk document after
//!   each one, so an interrupted run can be resumed.
//! - [`Undeployer::undeploy_folder`] (and [`Undeployer::undeploy_folders`])
//!   rediscovers the resources by listing the live cloud project.

mod discovery;
pub mod local;
pub mod naming;
pub mod options;
pub mod plan;
pub mod report;
mod state_driven;
mod undeployer;

#[cfg(test)]
pub(crate) mod testing;

pub use options::UndeployOptions;
pub use plan::{FOLDER_RESOURCES, FolderResource, PlannedDeletion, StepTarget, plan};
pub use report::{BranchState, DeletedResource, UndeployOutcome, UndeployReport};
pub use undeployer::Undeployer;
