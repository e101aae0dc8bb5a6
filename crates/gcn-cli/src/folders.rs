//! Discovery of workspace folders and their cloud registration

use gcn_core::{CloudContext, Error, FolderData, Result};
use gcn_undeploy::UndeployOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of cloud specific sub-projects producing their own image
const CLOUD_SUB_PROJECT: &str = "oci";

const BUILD_FILES: [&str; 3] = ["build.gradle", "build.gradle.kts", "pom.xml"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Registration {
    #[serde(default)]
    cloud_services: Vec<CloudService>,
}

#[derive(Debug, Deserialize)]
struct CloudService {
    #[serde(rename = "type")]
    kind: String,
    data: Option<CloudContext>,
}

/// Load the folder at `path`, with its OCI registration when it has one
pub fn load_folder(path: &Path, options: &UndeployOptions) -> Result<FolderData> {
    if !path.is_dir() {
        return Err(Error::Configuration(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    let path = path.canonicalize()?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut folder = FolderData::new(name, path.clone()).with_sub_names(cloud_sub_names(&path));
    if let Some(context) = read_registration(&path.join(&options.registration_file))? {
        folder = folder.with_context(context);
    }
    Ok(folder)
}

/// Load every folder, failing on the first unreadable one
pub fn load_folders(paths: &[PathBuf], options: &UndeployOptions) -> Result<Vec<FolderData>> {
    paths.iter().map(|p| load_folder(p, options)).collect()
}

fn read_registration(file: &Path) -> Result<Option<CloudContext>> {
    if !file.exists() {
        debug!("No registration at {}", file.display());
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let registration: Registration = serde_json::from_str(&content).map_err(|e| {
        Error::Configuration(format!("invalid registration {}: {}", file.display(), e))
    })?;
    Ok(registration
        .cloud_services
        .into_iter()
        .find(|s| s.kind == "oci")
        .and_then(|s| s.data))
}

fn cloud_sub_names(path: &Path) -> Vec<String> {
    let sub = path.join(CLOUD_SUB_PROJECT);
    if BUILD_FILES.iter().any(|f| sub.join(f).is_file()) {
        vec![CLOUD_SUB_PROJECT.to_string()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn register(dir: &Path, json: &str) {
        fs::create_dir_all(dir.join(".vscode")).unwrap();
        fs::write(dir.join(".vscode/gcn.json"), json).unwrap();
    }

    fn load(dir: &Path) -> Result<FolderData> {
        load_folder(dir, &UndeployOptions::default())
    }

    #[test]
    fn test_registered_folder() {
        let dir = TempDir::new().unwrap();
        register(
            dir.path(),
            r#"{
                "cloudServices": [
                    { "type": "oci", "data": { "profile": "DEFAULT", "compartment": "c1", "devopsProject": "p1" } }
                ]
            }"#,
        );

        let folder = load(dir.path()).unwrap();
        let context = folder.context.unwrap();
        assert_eq!(context.devops_project_id, "p1");
        assert_eq!(context.compartment_id, "c1");
        assert!(folder.cloud_sub_names.is_empty());
    }

    #[test]
    fn test_unregistered_folder() {
        let dir = TempDir::new().unwrap();
        let folder = load(dir.path()).unwrap();
        assert!(folder.context.is_none());
        assert_eq!(
            folder.name,
            dir.path().canonicalize().unwrap().file_name().unwrap().to_string_lossy()
        );
    }

    #[test]
    fn test_other_clouds_are_ignored() {
        let dir = TempDir::new().unwrap();
        register(dir.path(), r#"{ "cloudServices": [ { "type": "aws", "data": null } ] }"#);
        assert!(load(dir.path()).unwrap().context.is_none());
    }

    #[test]
    fn test_cloud_sub_project() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("oci")).unwrap();
        fs::write(dir.path().join("oci/build.gradle"), "").unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/build.gradle"), "").unwrap();

        let folder = load(dir.path()).unwrap();
        assert_eq!(folder.cloud_sub_names, vec!["oci".to_string()]);
    }

    #[test]
    fn test_invalid_registration() {
        let dir = TempDir::new().unwrap();
        register(dir.path(), "{ not json");
        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid registration"));
    }

    #[test]
    fn test_missing_folder() {
        assert!(load(Path::new("/nonexistent/gcn/folder")).is_err());
    }
}
