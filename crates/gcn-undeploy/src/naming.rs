//! Names derived from project and folder names

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Repository key of a folder name: whitespace runs become `_`
pub fn folder_key(folder_name: &str) -> String {
    WHITESPACE.replace_all(folder_name, "_").into_owned()
}

/// Display name a deploy gives the container repository of a repository
/// (and optionally one of its sub-components).
///
/// With a single code repository the repository name is left out.
pub fn container_repository_name(
    project: &str,
    repository: &str,
    sub: Option<&str>,
    multi_repository: bool,
) -> String {
    let mut name = project.to_string();
    if multi_repository {
        name.push('-');
        name.push_str(repository);
    }
    if let Some(sub) = sub {
        name.push('-');
        name.push_str(sub);
    }
    name
}

/// Lower-cased container repository names expected for a project
pub fn expected_container_repository_names(
    project: &str,
    repositories: &[String],
    sub_names: &[String],
) -> Vec<String> {
    // zero or one repository: the repository name never appears
    let multi = repositories.len() > 1;
    let single = [String::new()];
    let repositories = if multi { repositories } else { &single[..] };

    let mut names = Vec::new();
    for repository in repositories {
        if sub_names.is_empty() {
            names.push(container_repository_name(project, repository, None, multi));
        }
        for sub in sub_names {
            names.push(container_repository_name(project, repository, Some(sub), multi));
        }
    }
    names.iter().map(|n| n.to_lowercase()).collect()
}
