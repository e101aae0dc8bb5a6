//! Invocation of the `oci` command line tool

use gcn_core::{Error, Result};
use serde_json::Value;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::OciConfig;

/// Runs `oci` subcommands for one profile
#[derive(Debug, Clone)]
pub struct OciCli {
    config: OciConfig,
}

impl OciCli {
    pub fn new(config: OciConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OciConfig {
        &self.config
    }

    /// Run `oci <args>` and parse its JSON output, `None` when it printed nothing
    pub async fn run(&self, args: &[&str]) -> Result<Option<Value>> {
        let operation = format!("oci {}", args.join(" "));
        debug!("Running {} (profile {})", operation, self.config.profile);

        let output = Command::new(&self.config.cli_path)
            .args(args)
            .arg("--profile")
            .arg(&self.config.profile)
            .arg("--config-file")
            .arg(&self.config.config_file)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::operation(operation.clone(), e))?;

        parse_output(&operation, output)
    }
}

fn parse_output(operation: &str, output: Output) -> Result<Option<Value>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(operation, stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(stdout)?))
}

/// Service errors are printed as `ServiceError:` followed by a JSON body
fn classify_failure(operation: &str, stderr: &str) -> Error {
    let not_found = stderr.contains("NotAuthorizedOrNotFound")
        || stderr.contains("\"status\": 404")
        || stderr.contains("\"code\": \"NotFound\"");
    if not_found {
        return Error::NotFound(format!("{}: {}", operation, service_message(stderr)));
    }
    Error::operation(operation, service_message(stderr))
}

/// The `message` of a service error, the raw text otherwise
fn service_message(stderr: &str) -> String {
    stderr
        .find('{')
        .and_then(|start| serde_json::from_str::<Value>(&stderr[start..]).ok())
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| stderr.to_string())
}
