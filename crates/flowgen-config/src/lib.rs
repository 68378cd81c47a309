//! KDL configuration parsing for flowgen.
//!
//! This crate handles parsing of:
//! - Project type definitions (flowgen.kdl)
//! - Per-directory project declarations (projects.kdl)
//! - Repository scanning for project declarations

pub mod discovery;
pub mod error;
mod nodes;
pub mod projects;
pub mod types;

pub use discovery::{find_projects, find_repo_root};
pub use error::{ConfigError, ConfigResult};
pub use projects::{PROJECTS_FILE_NAME, parse_projects};
pub use types::{
    CONFIG_FILE_NAME, DEFAULT_BRANCH, GeneratorConfig, Settings, StaticFile, load_config,
    parse_config,
};
