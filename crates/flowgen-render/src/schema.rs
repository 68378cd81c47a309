//! GitHub Actions Workflow Schema Types
//!
//! The subset of the workflow syntax that generated workflows use.
//! See: <https://docs.github.com/en/actions/using-workflows/workflow-syntax-for-github-actions>

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// A GitHub Actions workflow definition.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    /// Workflow name displayed in GitHub UI
    pub name: String,

    /// Trigger configuration
    #[serde(rename = "on")]
    pub on: WorkflowTriggers,

    /// Job definitions (order preserved via `IndexMap`)
    pub jobs: IndexMap<String, Job>,
}

/// Trigger configuration keyed by GitHub event name (`push`, `pull_request`).
pub type WorkflowTriggers = IndexMap<String, BranchTrigger>;

/// Push or pull request trigger filtered by branch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BranchTrigger {
    /// Branch patterns to trigger on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
}

/// A job in a workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    /// Job display name
    pub name: String,

    /// Runner label
    pub runs_on: String,

    /// Jobs that must complete first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    pub steps: Vec<Step>,
}

/// A step in a job.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Action reference (e.g., "actions/checkout@v4")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Action inputs
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub with: BTreeMap<String, String>,

    /// Shell command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}
