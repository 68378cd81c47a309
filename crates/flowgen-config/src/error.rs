//! Configuration parsing errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("duplicate definition: {0}")]
    Duplicate(String),

    #[error("project type '{0}' not found")]
    UnknownType(String),

    #[error("unknown dependency '{dependency}' for project type '{project_type}'")]
    UnknownDependency {
        dependency: String,
        project_type: String,
    },

    #[error(
        "expected type '{expected}' for dependency '{dependency}' of \
         (path={path}, type={project_type}); found type '{found}'"
    )]
    DependencyTypeMismatch {
        dependency: String,
        path: String,
        project_type: String,
        expected: String,
        found: String,
    },

    #[error(
        "duplicate projects detected: '{first}' and '{second}': two projects may not \
         share the same basename and project type"
    )]
    DuplicateProject { first: String, second: String },

    #[error("no git repository found at or above {0}")]
    RepoRootNotFound(PathBuf),

    #[error("in {path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("invalid project types: {0}")]
    Registry(#[from] flowgen_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Attach the file an error came from.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        ConfigError::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
