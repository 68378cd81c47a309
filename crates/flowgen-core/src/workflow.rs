//! Workflow identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The pipelines flowgen generates. Every variant maps to exactly one trigger
/// and one output file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowIdentifier {
    /// Runs against pull requests.
    #[display("Pull Request")]
    PullRequest,
    /// Runs on pushes to the main branch.
    #[display("Merge")]
    Merge,
}

#[derive(Debug, Error)]
#[error("invalid workflow name '{0}'; wanted 'pull-request' or 'merge'")]
pub struct ParseWorkflowError(String);

impl WorkflowIdentifier {
    /// Every workflow, in output order.
    pub const ALL: [WorkflowIdentifier; 2] = [Self::PullRequest, Self::Merge];

    /// The name used for this workflow in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull-request",
            Self::Merge => "merge",
        }
    }

    /// The GitHub Actions event that starts this workflow (the `pull_request`
    /// in `on: pull_request:`).
    pub fn trigger(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull_request",
            Self::Merge => "push",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull-request.yaml",
            Self::Merge => "merge.yaml",
        }
    }
}

impl std::str::FromStr for WorkflowIdentifier {
    type Err = ParseWorkflowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.key() == s)
            .ok_or_else(|| ParseWorkflowError(s.to_string()))
    }
}
