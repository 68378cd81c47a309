//! Core domain types for flowgen, the CI workflow generator.
//!
//! This crate contains:
//! - Workflow identifiers
//! - Project types, job types and concrete projects
//! - The validated type registry
//! - The job graph materializer, which expands type-level job graphs into
//!   concrete, deduplicated, dependency-ordered jobs per workflow

pub mod error;
pub mod job;
pub mod materializer;
pub mod project;
pub mod registry;
pub mod workflow;

pub use error::{Error, ErrorKind, Result};
pub use job::{Job, Workflow};
pub use materializer::materialize_workflows;
pub use project::{
    JobType, JobTypeDependency, Project, ProjectIdentifier, ProjectType, StepTemplate,
};
pub use registry::TypeRegistry;
pub use workflow::{ParseWorkflowError, WorkflowIdentifier};
