//! Per-directory project declarations (`projects.kdl`).

use crate::nodes::{get_string_prop, require_name};
use crate::{ConfigError, ConfigResult};
use flowgen_core::{Project, ProjectIdentifier, TypeRegistry};
use kdl::{KdlDocument, KdlNode};

/// Name of the file that declares the projects living in a directory.
pub const PROJECTS_FILE_NAME: &str = "projects.kdl";

/// Parse the projects declared in one directory.
///
/// `dir` is the directory's path relative to the repository root, `"."` for
/// the root itself. Dependencies without an explicit `path` bind to the
/// project of the requested type in the same directory.
pub fn parse_projects(kdl: &str, dir: &str, registry: &TypeRegistry) -> ConfigResult<Vec<Project>> {
    let doc: KdlDocument = kdl.parse()?;
    let mut projects = Vec::new();

    for node in doc.nodes() {
        if node.name().value() == "project" {
            projects.push(parse_project(node, dir, registry)?);
        }
    }

    Ok(projects)
}

fn parse_project(node: &KdlNode, dir: &str, registry: &TypeRegistry) -> ConfigResult<Project> {
    let type_id = require_name(node, "project type")?;
    let project_type = registry
        .get(&type_id)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownType(type_id.clone()))?;

    let mut project = Project::new(project_type, dir);

    let Some(children) = node.children() else {
        return Ok(project);
    };

    for child in children.nodes() {
        if child.name().value() != "dependency" {
            return Err(ConfigError::InvalidValue {
                field: "project".to_string(),
                message: format!("unexpected node '{}'", child.name().value()),
            });
        }

        let name = require_name(child, "dependency name")?;
        let expected = project.project_type.dependencies.get(&name).ok_or_else(|| {
            ConfigError::UnknownDependency {
                dependency: name.clone(),
                project_type: type_id.clone(),
            }
        })?;

        let found = get_string_prop(child, "type").unwrap_or_else(|| expected.clone());
        if &found != expected {
            return Err(ConfigError::DependencyTypeMismatch {
                dependency: name,
                path: dir.to_string(),
                project_type: type_id,
                expected: expected.clone(),
                found,
            });
        }

        let path = get_string_prop(child, "path")
            .map(|p| normalize_path(&p))
            .unwrap_or_else(|| dir.to_string());

        if project.dependencies.contains_key(&name) {
            return Err(ConfigError::Duplicate(format!(
                "dependency '{}' of project (path={}, type={})",
                name, dir, type_id
            )));
        }
        project = project.with_dependency(name, ProjectIdentifier::new(path, found));
    }

    Ok(project)
}

/// Normalize a repository-relative path: strip `./` prefixes and trailing
/// slashes, mapping the empty path to `"."`.
pub(crate) fn normalize_path(path: &str) -> String {
    let mut trimmed = path.trim_end_matches('/');
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest.trim_start_matches('/');
    }
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}
