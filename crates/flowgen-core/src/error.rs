//! Error types for flowgen.

use thiserror::Error;

use crate::WorkflowIdentifier;

/// Broad classification of a failure, independent of the context it was
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Type or project declarations are inconsistent.
    Configuration,
    /// A dependency points at a project that does not exist.
    Resolution,
    /// Job dependencies loop back on themselves.
    Cycle,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "projects of type '{project_type}' must have dependency called '{dependency}', \
         but no such dependency exists on project '{project_path}'"
    )]
    MissingDependency {
        project_type: String,
        dependency: String,
        project_path: String,
    },

    #[error(
        "job '{job_type}' of project type '{project_type}' references dependency \
         '{dependency}', which the project type does not declare"
    )]
    UndeclaredDependency {
        project_type: String,
        job_type: String,
        dependency: String,
    },

    #[error(
        "job '{job_type}' of project type '{project_type}' references job {index} of \
         dependency '{dependency}' (type '{dependency_type}'), but that type only has \
         {available} job(s) in the {workflow} workflow"
    )]
    JobIndexOutOfRange {
        project_type: String,
        job_type: String,
        dependency: String,
        dependency_type: String,
        workflow: WorkflowIdentifier,
        index: usize,
        available: usize,
    },

    #[error("dependency '{dependency}' of project type '{project_type}' has unknown type '{dependency_type}'")]
    UnknownDependencyType {
        project_type: String,
        dependency: String,
        dependency_type: String,
    },

    #[error(
        "dependency '{dependency}' of project '{project_path}' is bound to a project of \
         type '{found}', expected '{expected}'"
    )]
    DependencyTypeMismatch {
        project_path: String,
        dependency: String,
        expected: String,
        found: String,
    },

    #[error(
        "job identifier '{identifier}' is produced by both {first} and {second}; \
         projects of the same type need distinct directory names"
    )]
    DuplicateJobIdentifier {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("duplicate project type: {0}")]
    DuplicateProjectType(String),

    #[error("project not found (path={path}, type={project_type})")]
    ProjectNotFound { path: String, project_type: String },

    #[error("cycle detected in job dependencies: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error(
        "materializing job '{job_type}' of project (path={project_path}, type={project_type}) \
         in the {workflow} workflow"
    )]
    Job {
        workflow: WorkflowIdentifier,
        project_type: String,
        project_path: String,
        job_type: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, with all job context stripped away.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Job { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Error::ProjectNotFound { .. } => ErrorKind::Resolution,
            Error::Cycle { .. } => ErrorKind::Cycle,
            _ => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
