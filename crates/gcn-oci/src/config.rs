//! OCI CLI configuration

use gcn_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// How the `oci` command line tool is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OciConfig {
    /// Profile section of the configuration file
    pub profile: String,
    pub config_file: PathBuf,
    /// Executable, `oci` resolved through `PATH` by default
    pub cli_path: String,
    /// Delay between two polls of a work request
    pub work_request_poll_interval: Duration,
    /// Polls before a pending work request is given up
    pub work_request_max_polls: u32,
}

impl Default for OciConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            config_file: default_config_file(),
            cli_path: "oci".to_string(),
            work_request_poll_interval: Duration::from_secs(5),
            work_request_max_polls: 120,
        }
    }
}

fn default_config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".oci")
        .join("config")
}

impl OciConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let profile = env::var("OCI_CLI_PROFILE").unwrap_or(defaults.profile);
        let config_file = env::var("OCI_CLI_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.config_file);
        let cli_path = env::var("OCI_CLI_PATH").unwrap_or(defaults.cli_path);

        let work_request_poll_interval = match env::var("OCI_WORK_REQUEST_POLL_SECS") {
            Ok(value) => Duration::from_secs(value.parse().map_err(|_| {
                Error::Configuration(format!("OCI_WORK_REQUEST_POLL_SECS is not a number: {}", value))
            })?),
            Err(_) => defaults.work_request_poll_interval,
        };
        let work_request_max_polls = match env::var("OCI_WORK_REQUEST_MAX_POLLS") {
            Ok(value) => value.parse().map_err(|_| {
                Error::Configuration(format!("OCI_WORK_REQUEST_MAX_POLLS is not a number: {}", value))
            })?,
            Err(_) => defaults.work_request_max_polls,
        };

        Ok(Self {
            profile,
            config_file,
            cli_path,
            work_request_poll_interval,
            work_request_max_polls,
        })
    }

    /// Same settings for another profile
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OciConfig::default();
        assert_eq!(config.profile, "DEFAULT");
        assert_eq!(config.cli_path, "oci");
        assert!(config.config_file.ends_with(".oci/config"));
        assert_eq!(config.work_request_poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_with_profile() {
        let config = OciConfig::default()
            .with_profile("FRANKFURT")
            .with_config_file("/tmp/oci-config");
        assert_eq!(config.profile, "FRANKFURT");
        assert_eq!(config.config_file, PathBuf::from("/tmp/oci-config"));
    }
}
