//! Materialized jobs and workflows.

use serde::{Deserialize, Serialize};

use crate::WorkflowIdentifier;
use crate::project::StepTemplate;

/// A concrete job: one project's instance of a job type within one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique within the workflow: `{project name}-{job type name}`.
    pub identifier: String,
    /// Human-readable name: `{project name} {job type name}`.
    pub name: String,
    pub project_name: String,
    /// Repository-relative path of the owning project.
    pub project_path: String,
    /// Identifiers of jobs that must complete before this one starts, in the
    /// order the job type declares them.
    pub dependencies: Vec<String>,
    pub runs_on: String,
    /// Step templates, passed through unmodified.
    pub steps: Vec<StepTemplate>,
}

/// The materialized jobs of one workflow, dependencies before dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub identifier: WorkflowIdentifier,
    pub jobs: Vec<Job>,
}

impl Workflow {
    pub fn new(identifier: WorkflowIdentifier) -> Self {
        Self {
            identifier,
            jobs: Vec::new(),
        }
    }

    pub fn job(&self, identifier: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.identifier == identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
