//! Conversion of materialized workflows into GitHub Actions YAML.

use indexmap::IndexMap;
use tracing::debug;

use crate::RenderResult;
use crate::output::RenderedFile;
use crate::schema::{BranchTrigger, Job, Step, Workflow, WorkflowTriggers};
use crate::template::TemplateContext;

/// Comment placed at the top of every generated workflow.
pub const GENERATED_HEADER: &str =
    "# Generated by flowgen - do not edit manually\n# Regenerate with: flowgen generate\n\n";

/// Renders materialized workflows as workflow files.
#[derive(Debug, Clone)]
pub struct WorkflowEmitter {
    branches: Vec<String>,
}

impl WorkflowEmitter {
    pub fn new(branches: Vec<String>) -> Self {
        Self { branches }
    }

    /// Render one workflow, or `None` if it has no jobs.
    pub fn emit(&self, workflow: &flowgen_core::Workflow) -> RenderResult<Option<RenderedFile>> {
        if workflow.is_empty() {
            debug!(workflow = workflow.identifier.key(), "Skipping empty workflow");
            return Ok(None);
        }

        let document = self.build_workflow(workflow)?;
        let yaml = serde_yaml::to_string(&document)?;

        Ok(Some(RenderedFile {
            file_name: workflow.identifier.file_name().to_string(),
            contents: format!("{GENERATED_HEADER}{yaml}"),
        }))
    }

    /// Render every non-empty workflow.
    pub fn emit_all(
        &self,
        workflows: &[flowgen_core::Workflow],
    ) -> RenderResult<Vec<RenderedFile>> {
        let mut files = Vec::new();
        for workflow in workflows {
            files.extend(self.emit(workflow)?);
        }
        Ok(files)
    }

    fn build_workflow(&self, workflow: &flowgen_core::Workflow) -> RenderResult<Workflow> {
        let identifier = workflow.identifier;
        let mut on = WorkflowTriggers::new();
        on.insert(
            identifier.trigger().to_string(),
            BranchTrigger {
                branches: self.branches.clone(),
            },
        );

        let mut jobs = IndexMap::new();
        for job in &workflow.jobs {
            let ctx = TemplateContext::for_job(identifier, job);
            let steps = job
                .steps
                .iter()
                .map(|step| {
                    let rendered = ctx.render_step(step)?;
                    Ok(Step {
                        name: rendered.name,
                        uses: rendered.uses,
                        with: rendered.with,
                        run: rendered.run,
                        working_directory: rendered.working_directory,
                        env: rendered.env,
                    })
                })
                .collect::<RenderResult<Vec<_>>>()?;

            jobs.insert(
                job.identifier.clone(),
                Job {
                    name: job.name.clone(),
                    runs_on: job.runs_on.clone(),
                    needs: job.dependencies.clone(),
                    steps,
                },
            );
        }

        Ok(Workflow {
            name: identifier.to_string(),
            on,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::{Job as MaterializedJob, StepTemplate, WorkflowIdentifier};

    fn job(identifier: &str, needs: &[&str]) -> MaterializedJob {
        MaterializedJob {
            identifier: identifier.to_string(),
            name: identifier.replace('-', " "),
            project_name: "golang-ping".to_string(),
            project_path: "services/ping".to_string(),
            dependencies: needs.iter().map(|s| s.to_string()).collect(),
            runs_on: "ubuntu-latest".to_string(),
            steps: vec![
                StepTemplate::uses("actions/checkout@v4"),
                StepTemplate::run("make -C ${project.path}").with_name("Build ${job.id}"),
            ],
        }
    }

    fn emitter() -> WorkflowEmitter {
        WorkflowEmitter::new(vec!["master".to_string()])
    }

    #[test]
    fn test_emit_pull_request() {
        let mut workflow = flowgen_core::Workflow::new(WorkflowIdentifier::PullRequest);
        workflow.jobs.push(job("golang-ping-build", &[]));
        workflow.jobs.push(job("golang-ping-test", &["golang-ping-build"]));

        let file = emitter().emit(&workflow).unwrap().unwrap();
        assert_eq!(file.file_name, "pull-request.yaml");
        assert!(file.contents.starts_with(GENERATED_HEADER));

        let yaml: serde_yaml::Value = serde_yaml::from_str(&file.contents).unwrap();
        assert_eq!(yaml["name"], "Pull Request");
        assert_eq!(yaml["on"]["pull_request"]["branches"][0], "master");
        assert!(yaml["on"].get("push").is_none());

        let jobs = yaml["jobs"].as_mapping().unwrap();
        let keys: Vec<&str> = jobs.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["golang-ping-build", "golang-ping-test"]);

        let build = &yaml["jobs"]["golang-ping-build"];
        assert_eq!(build["runs-on"], "ubuntu-latest");
        assert!(build.get("needs").is_none());
        assert_eq!(build["steps"][0]["uses"], "actions/checkout@v4");
        assert_eq!(build["steps"][1]["run"], "make -C services/ping");
        assert_eq!(build["steps"][1]["name"], "Build golang-ping-build");

        let test = &yaml["jobs"]["golang-ping-test"];
        assert_eq!(test["needs"][0], "golang-ping-build");
    }

    #[test]
    fn test_emit_merge_uses_push_trigger() {
        let mut workflow = flowgen_core::Workflow::new(WorkflowIdentifier::Merge);
        workflow.jobs.push(job("golang-ping-build", &[]));

        let file = emitter().emit(&workflow).unwrap().unwrap();
        assert_eq!(file.file_name, "merge.yaml");

        let yaml: serde_yaml::Value = serde_yaml::from_str(&file.contents).unwrap();
        assert_eq!(yaml["on"]["push"]["branches"][0], "master");
    }

    #[test]
    fn test_trigger_follows_workflow_identifier() {
        for identifier in WorkflowIdentifier::ALL {
            let mut workflow = flowgen_core::Workflow::new(identifier);
            workflow.jobs.push(job("golang-ping-build", &[]));

            let file = emitter().emit(&workflow).unwrap().unwrap();
            let yaml: serde_yaml::Value = serde_yaml::from_str(&file.contents).unwrap();
            let on = yaml["on"].as_mapping().unwrap();
            let events: Vec<&str> = on.keys().filter_map(|k| k.as_str()).collect();
            assert_eq!(events, vec![identifier.trigger()]);
        }
    }

    #[test]
    fn test_empty_workflow_skipped() {
        let workflows = vec![
            flowgen_core::Workflow::new(WorkflowIdentifier::PullRequest),
            flowgen_core::Workflow::new(WorkflowIdentifier::Merge),
        ];
        assert!(emitter().emit_all(&workflows).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_placeholder_fails() {
        let mut workflow = flowgen_core::Workflow::new(WorkflowIdentifier::Merge);
        let mut broken = job("golang-ping-build", &[]);
        broken.steps.push(StepTemplate::run("echo ${run.id}"));
        workflow.jobs.push(broken);

        assert!(matches!(
            emitter().emit(&workflow).unwrap_err(),
            crate::RenderError::Template { .. }
        ));
    }
}
