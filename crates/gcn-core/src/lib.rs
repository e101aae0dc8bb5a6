//! Core traits and types for GCN project teardown
//!
//! This crate defines the deployment-state document, the cloud client and
//! authentication interfaces, the progress and persistence seams, and the
//! pipeline stage orderer used by the undeploy orchestrator.

pub mod deploy_state;
pub mod devops_client;
pub mod error;
pub mod folder;
pub mod progress;
pub mod resource;
pub mod stage_order;
pub mod state_store;

pub use deploy_state::{DeploymentState, FolderDeployState, FolderPath, NamedResource};
pub use devops_client::{
    AUDIT_KNOWLEDGE_BASE_USAGE, Authentication, AuthenticationResolver, DevOpsClient,
    LogSummary, PROJECT_TAG, ResourceSummary, StageSummary, USAGE_TAG,
};
pub use error::{Error, Result};
pub use folder::{CloudContext, FolderData};
pub use progress::{ProgressSink, RecordingProgress};
pub use resource::ResourceKind;
pub use stage_order::{deletion_order, order_for_deletion};
pub use state_store::{FileStateStore, MemoryStateStore, StateStore};
