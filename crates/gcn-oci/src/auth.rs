//! Profile based authentication against the OCI configuration file

use gcn_core::{Authentication, AuthenticationResolver, DevOpsClient, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::{OciConfig, OciDevOpsClient};

/// Keys a profile needs unless it authenticates with a session token
const REQUIRED_KEYS: [&str; 5] = ["user", "fingerprint", "key_file", "tenancy", "region"];
const SESSION_KEYS: [&str; 3] = ["security_token_file", "tenancy", "region"];

/// Credentials of one profile
#[derive(Debug)]
pub struct OciAuthentication {
    config: OciConfig,
    client: Arc<OciDevOpsClient>,
}

impl OciAuthentication {
    pub fn new(config: OciConfig) -> Self {
        Self {
            client: Arc::new(OciDevOpsClient::new(config.clone())),
            config,
        }
    }

    pub fn profile(&self) -> &str {
        &self.config.profile
    }
}

impl Authentication for OciAuthentication {
    fn configuration_problem(&self) -> Option<String> {
        let problem = check_profile(&self.config.config_file, &self.config.profile);
        if let Some(problem) = &problem {
            debug!("Profile {} unusable: {}", self.config.profile, problem);
        }
        problem
    }

    fn client(&self) -> Arc<dyn DevOpsClient> {
        self.client.clone()
    }
}

/// Resolves profiles against a base configuration
#[derive(Debug, Clone)]
pub struct OciAuthResolver {
    config: OciConfig,
}

impl OciAuthResolver {
    pub fn new(config: OciConfig) -> Self {
        Self { config }
    }
}

impl AuthenticationResolver for OciAuthResolver {
    fn resolve(&self, profile: Option<&str>) -> Result<Arc<dyn Authentication>> {
        let config = match profile {
            Some(profile) => self.config.clone().with_profile(profile),
            None => self.config.clone(),
        };
        Ok(Arc::new(OciAuthentication::new(config)))
    }
}

/// Why `profile` of the configuration file at `path` cannot be used, if it cannot
fn check_profile(path: &Path, profile: &str) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            return Some(format!("OCI configuration file {} not found", path.display()));
        }
    };
    let sections = parse_sections(&content);
    let Some(section) = sections.get(profile) else {
        return Some(format!(
            "Profile {} not found in OCI configuration file {}",
            profile,
            path.display()
        ));
    };
    // keys missing from a profile are inherited from DEFAULT
    let has = |key: &str| {
        section.contains_key(key) || sections.get("DEFAULT").is_some_and(|d| d.contains_key(key))
    };
    let required: &[&str] = if has("security_token_file") {
        &SESSION_KEYS
    } else {
        &REQUIRED_KEYS
    };
    let missing: Vec<&str> = required.iter().copied().filter(|key| !has(*key)).collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "Profile {} in {} is missing {}",
            profile,
            path.display(),
            missing.join(", ")
        ))
    }
}

/// `[section]` headed `key = value` lines; `#` and `;` start comments
fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        if let (Some(section), Some((key, value))) = (&current, line.split_once('=')) {
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CONFIG: &str = "\
[DEFAULT]
user=ocid1.user.oc1..aaa
fingerprint=aa:bb
key_file=~/.oci/key.pem
tenancy=ocid1.tenancy.oc1..aaa
region=eu-frankfurt-1

# session profile
[SESSION]
security_token_file = ~/.oci/sessions/token
";

    fn config_file() -> NamedTempFile {
        write_config(CONFIG)
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_profiles() {
        let file = config_file();
        assert_eq!(check_profile(file.path(), "DEFAULT"), None);
        // tenancy and region fall back to DEFAULT
        assert_eq!(check_profile(file.path(), "SESSION"), None);
    }

    #[test]
    fn test_missing_profile() {
        let file = config_file();
        let problem = check_profile(file.path(), "PHOENIX").unwrap();
        assert!(problem.starts_with("Profile PHOENIX not found"));
    }

    #[test]
    fn test_missing_file() {
        let problem = check_profile(Path::new("/nonexistent/oci/config"), "DEFAULT").unwrap();
        assert_eq!(problem, "OCI configuration file /nonexistent/oci/config not found");
    }

    #[test]
    fn test_resolver_reports_problems() {
        let file = config_file();
        let resolver = OciAuthResolver::new(OciConfig::default().with_config_file(file.path()));

        let auth = resolver.resolve(Some("DEFAULT")).unwrap();
        assert!(auth.configuration_problem().is_none());

        let broken = write_config("[BROKEN]\nuser=ocid1.user.oc1..bbb\n");
        let resolver = OciAuthResolver::new(OciConfig::default().with_config_file(broken.path()));
        let auth = resolver.resolve(Some("BROKEN")).unwrap();
        let problem = auth.configuration_problem().unwrap();
        assert!(problem.contains("missing fingerprint, key_file"), "{}", problem);
    }
}
