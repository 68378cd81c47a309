//! Project type and job type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::WorkflowIdentifier;

/// Runner label used when a job type doesn't name one.
pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";

/// A step in a job, before placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTemplate {
    /// Step display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Action to use (e.g., "actions/checkout@v4").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    /// Shell command(s) to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Working directory for `run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Step environment variables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Action inputs for `uses` steps.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub with: BTreeMap<String, String>,
}

impl StepTemplate {
    pub fn uses(action: impl Into<String>) -> Self {
        Self {
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn run(command: impl Into<String>) -> Self {
        Self {
            run: Some(command.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// A reference from a job type to one job of a dependency slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTypeDependency {
    /// Dependency slot declared on the owning project type.
    pub name: String,
    /// Index into the dependency type's job list for the same workflow.
    pub job_index: usize,
}

/// The prototype from which concrete jobs are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobType {
    /// Suffixed onto the project name to form job identifiers.
    pub name: String,
    pub dependencies: Vec<JobTypeDependency>,
    pub runs_on: String,
    pub steps: Vec<StepTemplate>,
}

impl JobType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            runs_on: DEFAULT_RUNS_ON.to_string(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, job_index: usize) -> Self {
        self.dependencies.push(JobTypeDependency {
            name: name.into(),
            job_index,
        });
        self
    }

    #[must_use]
    pub fn with_runs_on(mut self, runs_on: impl Into<String>) -> Self {
        self.runs_on = runs_on.into();
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: StepTemplate) -> Self {
        self.steps.push(step);
        self
    }
}

/// A kind of project, e.g. a Go module, a Terraform target or a lambda.
///
/// Dependency slots name other project types by identifier; they are resolved
/// through a [`TypeRegistry`](crate::TypeRegistry) or, during
/// materialization, through the concrete project bound to the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectType {
    /// Prefixed onto project names to disambiguate projects with the same
    /// basename but different types.
    pub identifier: String,
    /// Dependency slot name -> project type identifier.
    pub dependencies: BTreeMap<String, String>,
    pub workflows: BTreeMap<WorkflowIdentifier, Vec<JobType>>,
}

impl ProjectType {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            dependencies: BTreeMap::new(),
            workflows: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, type_id: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), type_id.into());
        self
    }

    #[must_use]
    pub fn with_job(mut self, workflow: WorkflowIdentifier, job: JobType) -> Self {
        self.workflows.entry(workflow).or_default().push(job);
        self
    }

    /// Job types this project type contributes to `workflow`, in declared order.
    pub fn jobs(&self, workflow: WorkflowIdentifier) -> &[JobType] {
        self.workflows.get(&workflow).map_or(&[], Vec::as_slice)
    }
}

/// Value key for one concrete project.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("(path={path}, type={project_type})")]
pub struct ProjectIdentifier {
    /// Repository-relative path.
    pub path: String,
    /// Project type identifier.
    pub project_type: String,
}

impl ProjectIdentifier {
    pub fn new(path: impl Into<String>, project_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            project_type: project_type.into(),
        }
    }
}

/// A project in a repository: a type, a path relative to the repository root,
/// and the concrete projects bound to the type's dependency slots.
#[derive(Debug, Clone)]
pub struct Project {
    pub project_type: Arc<ProjectType>,
    pub path: String,
    pub dependencies: BTreeMap<String, ProjectIdentifier>,
}

impl Project {
    pub fn new(project_type: Arc<ProjectType>, path: impl Into<String>) -> Self {
        Self {
            project_type,
            path: path.into(),
            dependencies: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, target: ProjectIdentifier) -> Self {
        self.dependencies.insert(name.into(), target);
        self
    }

    /// The project name: the type identifier followed by the basename of the
    /// project path, e.g. `golang-foo` for a `golang` project at `svc/foo`.
    pub fn name(&self) -> String {
        let base = Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone());
        format!("{}-{}", self.project_type.identifier, base)
    }

    pub fn identifier(&self) -> ProjectIdentifier {
        ProjectIdentifier::new(self.path.clone(), self.project_type.identifier.clone())
    }
}
