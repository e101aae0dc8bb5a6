//! Parsing of `oci` JSON output

use gcn_core::{Error, LogSummary, ResourceSummary, Result, StageSummary};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Listings come either as a plain array or wrapped in `items`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Collection<T> {
    Items { items: Vec<T> },
    List(Vec<T>),
}

impl<T> Collection<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Collection::Items { items } => items,
            Collection::List(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawResource {
    id: String,
    #[serde(alias = "name")]
    display_name: Option<String>,
    #[serde(default)]
    freeform_tags: HashMap<String, String>,
    lifecycle_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PredecessorCollection {
    #[serde(default)]
    items: Vec<Predecessor>,
}

#[derive(Debug, Deserialize)]
struct Predecessor {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawStage {
    id: String,
    display_name: Option<String>,
    build_pipeline_id: Option<String>,
    deploy_pipeline_id: Option<String>,
    build_pipeline_stage_predecessor_collection: Option<PredecessorCollection>,
    deploy_stage_predecessor_collection: Option<PredecessorCollection>,
    lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawLog {
    id: String,
    display_name: Option<String>,
    log_group_id: String,
    configuration: Option<LogConfiguration>,
    lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogConfiguration {
    source: Option<LogSource>,
}

#[derive(Debug, Deserialize)]
struct LogSource {
    resource: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawWorkRequest {
    status: String,
    #[serde(default)]
    resources: Vec<WorkRequestResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WorkRequestResource {
    identifier: String,
    action_type: Option<String>,
}

/// State of a polled work request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkRequestStatus {
    Pending,
    /// Finished; carries the created resource when one is reported
    Succeeded(Option<String>),
    Failed(String),
}

fn is_gone(lifecycle_state: Option<&str>) -> bool {
    matches!(lifecycle_state, Some("DELETED") | Some("DELETING"))
}

fn data<T: DeserializeOwned>(value: Value) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_value(value)?;
    Ok(envelope.data)
}

fn to_summary(raw: RawResource) -> ResourceSummary {
    ResourceSummary {
        display_name: raw.display_name.unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        freeform_tags: raw.freeform_tags,
    }
}

/// A single resource from a `get` call
pub fn resource(value: Value) -> Result<ResourceSummary> {
    data::<RawResource>(value).map(to_summary)
}

/// Live resources of a listing; deleted ones are left out
pub fn resources(value: Option<Value>) -> Result<Vec<ResourceSummary>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = data::<Collection<RawResource>>(value)?.into_vec();
    Ok(items
        .into_iter()
        .filter(|r| !is_gone(r.lifecycle_state.as_deref()))
        .map(to_summary)
        .collect())
}

/// Stages of a build or deploy pipeline listing
pub fn stages(value: Option<Value>, pipeline_id: &str) -> Result<Vec<StageSummary>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = data::<Collection<RawStage>>(value)?.into_vec();
    Ok(items
        .into_iter()
        .filter(|s| !is_gone(s.lifecycle_state.as_deref()))
        .map(|s| {
            let predecessors = s
                .build_pipeline_stage_predecessor_collection
                .or(s.deploy_stage_predecessor_collection)
                .unwrap_or_default()
                .items
                .into_iter()
                .map(|p| p.id)
                .collect();
            StageSummary {
                display_name: s.display_name.unwrap_or_else(|| s.id.clone()),
                pipeline_id: s
                    .build_pipeline_id
                    .or(s.deploy_pipeline_id)
                    .unwrap_or_else(|| pipeline_id.to_string()),
                id: s.id,
                predecessors,
            }
        })
        .collect())
}

/// Logs of a log group whose source is `resource_id`
pub fn logs_of(value: Option<Value>, resource_id: &str) -> Result<Vec<LogSummary>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = data::<Collection<RawLog>>(value)?.into_vec();
    Ok(items
        .into_iter()
        .filter(|l| !is_gone(l.lifecycle_state.as_deref()))
        .filter(|l| {
            l.configuration
                .as_ref()
                .and_then(|c| c.source.as_ref())
                .and_then(|s| s.resource.as_deref())
                == Some(resource_id)
        })
        .map(|l| LogSummary {
            display_name: l.display_name.unwrap_or_else(|| l.id.clone()),
            id: l.id,
            log_group_id: l.log_group_id,
        })
        .collect())
}

pub fn work_request(value: Option<Value>) -> Result<WorkRequestStatus> {
    let value = value.ok_or_else(|| Error::Serialization("empty work request response".to_string()))?;
    let request: RawWorkRequest = data(value)?;
    Ok(match request.status.as_str() {
        "SUCCEEDED" => {
            let created = request
                .resources
                .iter()
                .find(|r| r.action_type.as_deref() == Some("CREATED"))
                .or(request.resources.first())
                .map(|r| r.identifier.clone());
            WorkRequestStatus::Succeeded(created)
        }
        "FAILED" | "CANCELED" | "CANCELING" => WorkRequestStatus::Failed(request.status),
        _ => WorkRequestStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_listing() {
        let value = json!({
            "data": {
                "items": [
                    { "id": "r1", "display-name": "app", "lifecycle-state": "ACTIVE" },
                    { "id": "r2", "name": "lib" },
                    { "id": "r3", "display-name": "old", "lifecycle-state": "DELETED" }
                ]
            }
        });
        let listed = resources(Some(value)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].display_name, "app");
        assert_eq!(listed[1].display_name, "lib");
    }

    #[test]
    fn test_plain_listing_with_tags() {
        let value = json!({
            "data": [
                {
                    "id": "kb1",
                    "display-name": "audit",
                    "freeform-tags": { "gcn_tooling_usage": "gcn-adm-audit" }
                }
            ]
        });
        let listed = resources(Some(value)).unwrap();
        assert_eq!(listed[0].tag("gcn_tooling_usage"), Some("gcn-adm-audit"));
    }

    #[test]
    fn test_empty_output_is_empty_listing() {
        assert!(resources(None).unwrap().is_empty());
    }

    #[test]
    fn test_stage_predecessors() {
        let value = json!({
            "data": {
                "items": [
                    {
                        "id": "s2",
                        "display-name": "Test",
                        "build-pipeline-id": "bp1",
                        "build-pipeline-stage-predecessor-collection": {
                            "items": [ { "id": "s1" } ]
                        }
                    },
                    {
                        "id": "d1",
                        "display-name": "Deploy",
                        "deploy-stage-predecessor-collection": { "items": [ { "id": "dp1" } ] }
                    }
                ]
            }
        });
        let listed = stages(Some(value), "bp1").unwrap();
        assert_eq!(listed[0].predecessors, vec!["s1".to_string()]);
        assert_eq!(listed[0].pipeline_id, "bp1");
        assert_eq!(listed[1].predecessors, vec!["dp1".to_string()]);
    }

    #[test]
    fn test_logs_filtered_by_source() {
        let value = json!({
            "data": [
                {
                    "id": "log1",
                    "display-name": "project",
                    "log-group-id": "lg1",
                    "configuration": { "source": { "resource": "p1" } }
                },
                {
                    "id": "log2",
                    "display-name": "other",
                    "log-group-id": "lg1",
                    "configuration": { "source": { "resource": "p2" } }
                }
            ]
        });
        let listed = logs_of(Some(value), "p1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].log_group_id, "lg1");
    }

    #[test]
    fn test_work_request_states() {
        let succeeded = json!({
            "data": {
                "status": "SUCCEEDED",
                "resources": [
                    { "identifier": "lg1", "action-type": "RELATED" },
                    { "identifier": "log1", "action-type": "CREATED" }
                ]
            }
        });
        assert_eq!(
            work_request(Some(succeeded)).unwrap(),
            WorkRequestStatus::Succeeded(Some("log1".to_string()))
        );

        let pending = json!({ "data": { "status": "IN_PROGRESS" } });
        assert_eq!(work_request(Some(pending)).unwrap(), WorkRequestStatus::Pending);

        let failed = json!({ "data": { "status": "FAILED" } });
        assert_eq!(
            work_request(Some(failed)).unwrap(),
            WorkRequestStatus::Failed("FAILED".to_string())
        );
    }
}
