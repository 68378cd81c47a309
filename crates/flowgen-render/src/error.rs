//! Rendering errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown placeholder '${{{placeholder}}}' in job '{job}'")]
    Template { job: String, placeholder: String },

    #[error("YAML serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("output file name '{0}' is not a plain file name")]
    InvalidFileName(String),

    #[error("output file '{0}' is produced more than once")]
    DuplicateFile(String),

    #[error("failed to read static file {path}: {source}")]
    StaticFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
