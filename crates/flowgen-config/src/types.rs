//! Project type configuration parsing.

use crate::nodes::{
    get_all_string_args, get_child_map, get_first_string_arg, get_index_prop, get_string_prop,
    require_name,
};
use crate::{ConfigError, ConfigResult};
use flowgen_core::{JobType, ProjectType, StepTemplate, TypeRegistry, WorkflowIdentifier};
use kdl::{KdlDocument, KdlNode};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the project type configuration file.
pub const CONFIG_FILE_NAME: &str = "flowgen.kdl";

/// Branch filter applied to workflow triggers when none is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// Everything loaded from the project type configuration file.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub registry: TypeRegistry,
    pub settings: Settings,
    /// Files copied verbatim into the output directory.
    pub static_files: Vec<StaticFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Branches every workflow trigger is filtered to.
    pub branches: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            branches: vec![DEFAULT_BRANCH.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    /// Name of the file in the output directory.
    pub file_name: String,
    /// Where to read the contents from. Relative paths are resolved against
    /// the configuration file's directory by [`load_config`].
    pub source: PathBuf,
}

/// Read and parse a configuration file.
pub async fn load_config(path: &Path) -> ConfigResult<GeneratorConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::from(e).in_file(path))?;
    let mut config = parse_config(&content).map_err(|e| e.in_file(path))?;

    let base = path.parent().unwrap_or(Path::new("."));
    for file in &mut config.static_files {
        if file.source.is_relative() {
            file.source = base.join(&file.source);
        }
    }

    debug!(
        path = %path.display(),
        project_types = config.registry.len(),
        static_files = config.static_files.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Parse a configuration from KDL text.
pub fn parse_config(kdl: &str) -> ConfigResult<GeneratorConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut settings = Settings::default();
    let mut types = Vec::new();
    let mut static_files: Vec<StaticFile> = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "settings" => {
                settings = parse_settings(node)?;
            }
            "project-type" => {
                types.push(parse_project_type(node)?);
            }
            "static" => {
                let file_name = require_name(node, "static file name")?;
                validate_file_name(&file_name)?;
                let source = get_string_prop(node, "source").ok_or_else(|| {
                    ConfigError::MissingField(format!("source for static file '{}'", file_name))
                })?;
                if static_files.iter().any(|f| f.file_name == file_name) {
                    return Err(ConfigError::Duplicate(format!("static file '{}'", file_name)));
                }
                static_files.push(StaticFile {
                    file_name,
                    source: PathBuf::from(source),
                });
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(GeneratorConfig {
        registry: TypeRegistry::new(types)?,
        settings,
        static_files,
    })
}

/// Static files land directly in the output directory, so their names must
/// be plain file names.
fn validate_file_name(file_name: &str) -> ConfigResult<()> {
    let is_plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\']);
    if is_plain {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "static".to_string(),
            message: format!("'{}' is not a plain file name", file_name),
        })
    }
}

fn parse_settings(node: &KdlNode) -> ConfigResult<Settings> {
    let mut settings = Settings::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "branches" {
                let branches = get_all_string_args(child);
                if branches.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "branches".to_string(),
                        message: "at least one branch is required".to_string(),
                    });
                }
                settings.branches = branches;
            }
        }
    }
    Ok(settings)
}

fn parse_project_type(node: &KdlNode) -> ConfigResult<ProjectType> {
    let identifier = require_name(node, "project type identifier")?;
    let mut project_type = ProjectType::new(identifier.clone());

    let Some(children) = node.children() else {
        return Ok(project_type);
    };

    for child in children.nodes() {
        match child.name().value() {
            "dependency" => {
                let name = require_name(child, "dependency name")?;
                let type_id = get_string_prop(child, "type").ok_or_else(|| {
                    ConfigError::MissingField(format!(
                        "type for dependency '{}' of project type '{}'",
                        name, identifier
                    ))
                })?;
                if project_type.dependencies.insert(name.clone(), type_id).is_some() {
                    return Err(ConfigError::Duplicate(format!(
                        "dependency '{}' of project type '{}'",
                        name, identifier
                    )));
                }
            }
            "workflow" => {
                let workflow = parse_workflow_name(child)?;
                let mut seen: HashSet<String> = project_type
                    .jobs(workflow)
                    .iter()
                    .map(|j| j.name.clone())
                    .collect();

                if let Some(jobs) = child.children() {
                    for job_node in jobs.nodes() {
                        if job_node.name().value() != "job" {
                            return Err(unexpected_node(job_node, "workflow"));
                        }
                        let job = parse_job(job_node)?;
                        if !seen.insert(job.name.clone()) {
                            return Err(ConfigError::Duplicate(format!(
                                "job '{}' in the {} workflow of project type '{}'",
                                job.name,
                                workflow.key(),
                                identifier
                            )));
                        }
                        project_type = project_type.with_job(workflow, job);
                    }
                }
            }
            _ => return Err(unexpected_node(child, "project-type")),
        }
    }

    Ok(project_type)
}

fn parse_workflow_name(node: &KdlNode) -> ConfigResult<WorkflowIdentifier> {
    let name = require_name(node, "workflow name")?;
    name.parse().map_err(|e: flowgen_core::ParseWorkflowError| ConfigError::InvalidValue {
        field: "workflow".to_string(),
        message: e.to_string(),
    })
}

fn parse_job(node: &KdlNode) -> ConfigResult<JobType> {
    let name = require_name(node, "job name")?;
    let mut job = JobType::new(name.clone());

    if let Some(runs_on) = get_string_prop(node, "runs-on") {
        job = job.with_runs_on(runs_on);
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "needs" => {
                    let dependency = require_name(child, "needs dependency name")?;
                    let index = get_index_prop(child, "job")?.unwrap_or(0);
                    job = job.with_dependency(dependency, index);
                }
                "step" => {
                    job = job.with_step(parse_step(child, &name)?);
                }
                _ => return Err(unexpected_node(child, "job")),
            }
        }
    }

    Ok(job)
}

fn parse_step(node: &KdlNode, job: &str) -> ConfigResult<StepTemplate> {
    let mut step = StepTemplate {
        name: get_string_prop(node, "name").or_else(|| get_first_string_arg(node)),
        uses: get_string_prop(node, "uses"),
        run: get_string_prop(node, "run"),
        working_directory: get_string_prop(node, "working-directory"),
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "env" => step.env.extend(get_child_map(child)),
                "with" => step.with.extend(get_child_map(child)),
                "run" => step.run = get_first_string_arg(child),
                _ => return Err(unexpected_node(child, "step")),
            }
        }
    }

    if step.uses.is_none() && step.run.is_none() {
        return Err(ConfigError::MissingField(format!(
            "'uses' or 'run' for step in job '{}'",
            job
        )));
    }

    Ok(step)
}

fn unexpected_node(node: &KdlNode, parent: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: parent.to_string(),
        message: format!("unexpected node '{}'", node.name().value()),
    }
}
