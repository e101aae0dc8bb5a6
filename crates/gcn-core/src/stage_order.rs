//! Deletion order of pipeline stages
//!
//! A stage may only be deleted once no other stage lists it as a
//! predecessor, so dependents come out before the stages they depend on.
//! Predecessor references to the stage itself, to the owning pipeline, or to
//! ids outside the stage set are ignored; pipelines returned by the provider
//! do carry such references.

use std::collections::{HashMap, HashSet};

use crate::{Error, Result, StageSummary};

/// Indices into `stages` in safe deletion order.
///
/// Stages that are ready at the same time keep their input order.
pub fn deletion_order(pipeline_id: &str, stages: &[StageSummary]) -> Result<Vec<usize>> {
    let known: HashSet<&str> = stages.iter().map(|s| s.id.as_str()).collect();
    let predecessors = |stage: &StageSummary| -> Vec<String> {
        stage
            .predecessors
            .iter()
            .filter(|p| {
                p.as_str() != stage.id && p.as_str() != pipeline_id && known.contains(p.as_str())
            })
            .cloned()
            .collect()
    };

    let mut dependents: HashMap<&str, usize> =
        stages.iter().map(|s| (s.id.as_str(), 0)).collect();
    for stage in stages {
        for p in predecessors(stage) {
            if let Some(count) = dependents.get_mut(p.as_str()) {
                *count += 1;
            }
        }
    }

    let mut pending: Vec<usize> = (0..stages.len()).collect();
    let mut order = Vec::with_capacity(stages.len());

    while !pending.is_empty() {
        let mut still_pending = Vec::with_capacity(pending.len());
        let mut emitted = false;

        for idx in pending {
            let stage = &stages[idx];
            if dependents.get(stage.id.as_str()).copied().unwrap_or(0) != 0 {
                still_pending.push(idx);
                continue;
            }
            emitted = true;
            order.push(idx);
            for p in predecessors(stage) {
                if let Some(count) = dependents.get_mut(p.as_str()) {
                    *count = count.saturating_sub(1);
                }
            }
        }

        if !emitted {
            return Err(Error::InconsistentPipeline {
                pipeline: pipeline_id.to_string(),
            });
        }
        pending = still_pending;
    }

    Ok(order)
}

/// Reorder `stages` for deletion, see [`deletion_order`]
pub fn order_for_deletion(pipeline_id: &str, stages: Vec<StageSummary>) -> Result<Vec<StageSummary>> {
    let order = deletion_order(pipeline_id, &stages)?;
    let mut slots: Vec<Option<StageSummary>> = stages.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}
