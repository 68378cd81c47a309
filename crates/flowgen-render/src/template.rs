//! Placeholder interpolation for step templates.
//!
//! Supports placeholders like:
//! - `${project.name}` - Project name (e.g. `golang-ping`)
//! - `${project.path}` - Project directory relative to the repository root
//! - `${job.id}` - Job identifier
//! - `${workflow.name}` - Workflow display name
//!
//! GitHub expressions such as `${{ github.sha }}` are left untouched.

use flowgen_core::{Job, StepTemplate, WorkflowIdentifier};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::{RenderError, RenderResult};

// Regex for matching ${...} placeholders
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\}")
        .unwrap_or_else(|e| panic!("invalid placeholder regex: {e}"))
});

/// Values available to step templates of one job.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub project_name: String,
    pub project_path: String,
    pub job_id: String,
    pub workflow_name: String,
}

impl TemplateContext {
    pub fn for_job(workflow: WorkflowIdentifier, job: &Job) -> Self {
        Self {
            project_name: job.project_name.clone(),
            project_path: job.project_path.clone(),
            job_id: job.identifier.clone(),
            workflow_name: workflow.to_string(),
        }
    }

    /// Resolve a placeholder name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<&str> {
        let parts: Vec<&str> = var_name.split('.').collect();

        match parts.as_slice() {
            ["project", "name"] => Some(self.project_name.as_str()),
            ["project", "path"] => Some(self.project_path.as_str()),
            ["job", "id"] => Some(self.job_id.as_str()),
            ["workflow", "name"] => Some(self.workflow_name.as_str()),
            _ => None,
        }
    }

    /// Interpolate all placeholders in a string.
    ///
    /// Fails on the first placeholder that doesn't resolve.
    pub fn interpolate(&self, input: &str) -> RenderResult<String> {
        if let Some(unknown) = VAR_REGEX
            .captures_iter(input)
            .map(|caps| caps[1].to_string())
            .find(|name| self.resolve(name).is_none())
        {
            return Err(RenderError::Template {
                job: self.job_id.clone(),
                placeholder: unknown,
            });
        }

        Ok(VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                self.resolve(&caps[1]).unwrap_or_default().to_string()
            })
            .to_string())
    }

    fn interpolate_opt(&self, input: Option<&String>) -> RenderResult<Option<String>> {
        input.map(|s| self.interpolate(s)).transpose()
    }

    /// Interpolate the values of a map; keys are kept as written.
    pub fn interpolate_map(
        &self,
        map: &BTreeMap<String, String>,
    ) -> RenderResult<BTreeMap<String, String>> {
        map.iter()
            .map(|(k, v)| Ok((k.clone(), self.interpolate(v)?)))
            .collect()
    }

    /// Produce a concrete step from a template.
    pub fn render_step(&self, step: &StepTemplate) -> RenderResult<StepTemplate> {
        Ok(StepTemplate {
            name: self.interpolate_opt(step.name.as_ref())?,
            uses: step.uses.clone(),
            run: self.interpolate_opt(step.run.as_ref())?,
            working_directory: self.interpolate_opt(step.working_directory.as_ref())?,
            env: self.interpolate_map(&step.env)?,
            with: self.interpolate_map(&step.with)?,
        })
    }
}
