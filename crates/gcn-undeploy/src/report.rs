//! Outcome of an undeploy run

use chrono::{DateTime, Utc};
use gcn_core::ResourceKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// A resource removed during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedResource {
    pub kind: ResourceKind,
    pub id: String,
    pub description: String,
}

/// Progress of one branch (repository, discovery phase or project-level step)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "kind", rename_all = "snake_case")]
pub enum BranchState {
    Pending,
    Deleting(ResourceKind),
    Deleted(ResourceKind),
    /// Nothing left, the branch was pruned
    Empty,
    Failed,
}

impl BranchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BranchState::Empty | BranchState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UndeployOutcome {
    InProgress,
    Completed,
    /// Nothing was attempted
    Skipped { reason: String },
    /// The run stopped; deletions made so far remain applied
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UndeployReport {
    /// Project or folder the run targeted
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub deleted: Vec<DeletedResource>,
    pub branches: BTreeMap<String, BranchState>,
    pub outcome: UndeployOutcome,
}

impl UndeployReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            started_at: Utc::now(),
            finished_at: None,
            deleted: Vec::new(),
            branches: BTreeMap::new(),
            outcome: UndeployOutcome::InProgress,
        }
    }

    pub fn record_deleted(&mut self, kind: ResourceKind, id: &str, description: &str) {
        self.deleted.push(DeletedResource {
            kind,
            id: id.to_string(),
            description: description.to_string(),
        });
    }

    pub fn set_branch(&mut self, branch: &str, state: BranchState) {
        self.branches.insert(branch.to_string(), state);
    }

    pub fn branch(&self, branch: &str) -> Option<BranchState> {
        self.branches.get(branch).copied()
    }

    pub fn complete(&mut self) {
        self.finish(UndeployOutcome::Completed);
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        self.finish(UndeployOutcome::Skipped {
            reason: reason.into(),
        });
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.finish(UndeployOutcome::Failed {
            message: message.into(),
        });
    }

    fn finish(&mut self, outcome: UndeployOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            UndeployOutcome::Completed | UndeployOutcome::Skipped { .. }
        )
    }

    pub fn failure_message(&self) -> Option<&str> {
        match &self.outcome {
            UndeployOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Ids deleted, in deletion order
    pub fn deleted_ids(&self) -> Vec<&str> {
        self.deleted.iter().map(|d| d.id.as_str()).collect()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
