//! Job graph materialization.
//!
//! Turns the type-level job graph into concrete jobs per workflow. Each
//! `(workflow, project type, project path, job type)` tuple is materialized
//! exactly once; a job's dependencies are always materialized (and appended
//! to the workflow) before the job itself.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::debug;

use crate::job::{Job, Workflow};
use crate::project::{JobType, Project, ProjectIdentifier};
use crate::{Error, Result, WorkflowIdentifier};

/// Materialize the workflows for a set of projects.
///
/// The result holds one [`Workflow`] per [`WorkflowIdentifier`], in
/// [`WorkflowIdentifier::ALL`] order. Any error invalidates the whole result.
pub fn materialize_workflows(projects: &[Project]) -> Result<Vec<Workflow>> {
    Materializer::new(projects).materialize_all()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JobKey {
    workflow: WorkflowIdentifier,
    project_type: String,
    project_path: String,
    job_type: String,
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(workflow={}, type={}, path={}, job={})",
            self.workflow.key(),
            self.project_type,
            self.project_path,
            self.job_type
        )
    }
}

struct Materializer<'a> {
    projects: &'a [Project],
    index: HashMap<ProjectIdentifier, &'a Project>,
    /// Position of each finished job in its workflow's output.
    cache: HashMap<JobKey, usize>,
    /// Keys currently being materialized, outermost first.
    in_progress: Vec<JobKey>,
    workflows: BTreeMap<WorkflowIdentifier, Vec<Job>>,
    /// Which key produced each job identifier, per workflow.
    issued: HashMap<(WorkflowIdentifier, String), JobKey>,
}

impl<'a> Materializer<'a> {
    fn new(projects: &'a [Project]) -> Self {
        let mut index = HashMap::with_capacity(projects.len());
        for project in projects {
            index.entry(project.identifier()).or_insert(project);
        }

        Self {
            projects,
            index,
            cache: HashMap::new(),
            in_progress: Vec::new(),
            workflows: BTreeMap::new(),
            issued: HashMap::new(),
        }
    }

    fn materialize_all(mut self) -> Result<Vec<Workflow>> {
        let projects = self.projects;
        for project in projects {
            for (&workflow, job_types) in &project.project_type.workflows {
                for job_type in job_types {
                    self.materialize_job(workflow, job_type, project)?;
                }
            }
        }

        Ok(WorkflowIdentifier::ALL
            .into_iter()
            .map(|identifier| Workflow {
                identifier,
                jobs: self.workflows.remove(&identifier).unwrap_or_default(),
            })
            .collect())
    }

    /// Materialize one job (and, first, everything it depends on), returning
    /// its position in the workflow's output.
    fn materialize_job(
        &mut self,
        workflow: WorkflowIdentifier,
        job_type: &'a JobType,
        project: &'a Project,
    ) -> Result<usize> {
        self.materialize_job_inner(workflow, job_type, project)
            .map_err(|source| Error::Job {
                workflow,
                project_type: project.project_type.identifier.clone(),
                project_path: project.path.clone(),
                job_type: job_type.name.clone(),
                source: Box::new(source),
            })
    }

    fn materialize_job_inner(
        &mut self,
        workflow: WorkflowIdentifier,
        job_type: &'a JobType,
        project: &'a Project,
    ) -> Result<usize> {
        let key = JobKey {
            workflow,
            project_type: project.project_type.identifier.clone(),
            project_path: project.path.clone(),
            job_type: job_type.name.clone(),
        };

        if let Some(&position) = self.cache.get(&key) {
            return Ok(position);
        }

        if let Some(start) = self.in_progress.iter().position(|k| *k == key) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(&key))
                .map(ToString::to_string)
                .collect();
            return Err(Error::Cycle { chain });
        }

        self.in_progress.push(key.clone());
        let dependencies = self.materialize_dependencies(workflow, job_type, project);
        self.in_progress.pop();
        let dependencies = dependencies?;

        let project_name = project.name();
        let identifier = format!("{}-{}", project_name, job_type.name);
        if let Some(first) = self.issued.get(&(workflow, identifier.clone())) {
            return Err(Error::DuplicateJobIdentifier {
                identifier,
                first: first.to_string(),
                second: key.to_string(),
            });
        }
        self.issued
            .insert((workflow, identifier.clone()), key.clone());

        let job = Job {
            identifier,
            name: format!("{} {}", project_name, job_type.name),
            project_name,
            project_path: project.path.clone(),
            dependencies,
            runs_on: job_type.runs_on.clone(),
            steps: job_type.steps.clone(),
        };

        debug!(
            workflow = workflow.key(),
            job = %job.identifier,
            needs = ?job.dependencies,
            "Materialized job"
        );

        let jobs = self.workflows.entry(workflow).or_default();
        jobs.push(job);
        let position = jobs.len() - 1;
        self.cache.insert(key, position);
        Ok(position)
    }

    /// Resolve the job type's dependencies in declared order, returning the
    /// identifiers of the jobs they resolve to.
    fn materialize_dependencies(
        &mut self,
        workflow: WorkflowIdentifier,
        job_type: &'a JobType,
        project: &'a Project,
    ) -> Result<Vec<String>> {
        let project_type = &project.project_type;
        let mut identifiers = Vec::with_capacity(job_type.dependencies.len());

        for reference in &job_type.dependencies {
            let declared_type = project_type.dependencies.get(&reference.name).ok_or_else(|| {
                Error::UndeclaredDependency {
                    project_type: project_type.identifier.clone(),
                    job_type: job_type.name.clone(),
                    dependency: reference.name.clone(),
                }
            })?;

            let target = project.dependencies.get(&reference.name).ok_or_else(|| {
                Error::MissingDependency {
                    project_type: project_type.identifier.clone(),
                    dependency: reference.name.clone(),
                    project_path: project.path.clone(),
                }
            })?;

            if target.project_type != *declared_type {
                return Err(Error::DependencyTypeMismatch {
                    project_path: project.path.clone(),
                    dependency: reference.name.clone(),
                    expected: declared_type.clone(),
                    found: target.project_type.clone(),
                });
            }

            let dependency = self.find_project(target)?;
            let dependency_jobs = dependency.project_type.jobs(workflow);
            let dependency_job = dependency_jobs.get(reference.job_index).ok_or_else(|| {
                Error::JobIndexOutOfRange {
                    project_type: project_type.identifier.clone(),
                    job_type: job_type.name.clone(),
                    dependency: reference.name.clone(),
                    dependency_type: declared_type.clone(),
                    workflow,
                    index: reference.job_index,
                    available: dependency_jobs.len(),
                }
            })?;

            let position = self.materialize_job(workflow, dependency_job, dependency)?;
            identifiers.push(self.workflows[&workflow][position].identifier.clone());
        }

        Ok(identifiers)
    }

    fn find_project(&self, id: &ProjectIdentifier) -> Result<&'a Project> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::ProjectNotFound {
                path: id.path.clone(),
                project_type: id.project_type.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::project::{ProjectType, StepTemplate};
    use std::collections::HashSet;
    use std::sync::Arc;

    const PR: WorkflowIdentifier = WorkflowIdentifier::PullRequest;
    const MERGE: WorkflowIdentifier = WorkflowIdentifier::Merge;

    fn golang() -> Arc<ProjectType> {
        let mut golang = ProjectType::new("golang");
        for workflow in WorkflowIdentifier::ALL {
            golang = golang
                .with_job(
                    workflow,
                    JobType::new("test").with_step(StepTemplate::run("cd ${project.path} && go test ./...")),
                )
                .with_job(workflow, JobType::new("lint"));
        }
        Arc::new(golang)
    }

    fn lambda() -> Arc<ProjectType> {
        Arc::new(
            ProjectType::new("lambda")
                .with_dependency("source", "golang")
                .with_job(MERGE, JobType::new("deploy").with_dependency("source", 0)),
        )
    }

    fn workflow(workflows: &[Workflow], identifier: WorkflowIdentifier) -> &Workflow {
        workflows
            .iter()
            .find(|w| w.identifier == identifier)
            .unwrap()
    }

    fn identifiers(workflow: &Workflow) -> Vec<&str> {
        workflow.jobs.iter().map(|j| j.identifier.as_str()).collect()
    }

    fn assert_topological(workflow: &Workflow) {
        let mut seen = HashSet::new();
        for job in &workflow.jobs {
            for dep in &job.dependencies {
                assert!(
                    seen.contains(dep.as_str()),
                    "{} needs {} which appears later",
                    job.identifier,
                    dep
                );
            }
            assert!(seen.insert(job.identifier.as_str()), "duplicate {}", job.identifier);
        }
    }

    #[test]
    fn test_no_dependencies() {
        let projects = vec![Project::new(golang(), "svc/foo")];
        let workflows = materialize_workflows(&projects).unwrap();

        assert_eq!(workflows.len(), 2);
        for w in &workflows {
            assert_eq!(identifiers(w), vec!["golang-foo-test", "golang-foo-lint"]);
            assert!(w.jobs.iter().all(|j| j.dependencies.is_empty()));
        }

        let test = workflow(&workflows, PR).job("golang-foo-test").unwrap();
        assert_eq!(test.name, "golang-foo test");
        assert_eq!(test.project_name, "golang-foo");
        assert_eq!(test.project_path, "svc/foo");
        assert_eq!(test.runs_on, "ubuntu-latest");
        // steps are copied, not interpolated
        assert_eq!(
            test.steps[0].run.as_deref(),
            Some("cd ${project.path} && go test ./...")
        );
    }

    #[test]
    fn test_cross_project_dependency() {
        let projects = vec![
            Project::new(lambda(), "svc/bar")
                .with_dependency("source", ProjectIdentifier::new("svc/bar", "golang")),
            Project::new(golang(), "svc/bar"),
        ];
        let workflows = materialize_workflows(&projects).unwrap();

        let merge = workflow(&workflows, MERGE);
        assert_eq!(
            identifiers(merge),
            vec![
                "golang-bar-test",
                "lambda-bar-deploy",
                "golang-bar-lint",
            ]
        );
        assert_eq!(
            merge.job("lambda-bar-deploy").unwrap().dependencies,
            vec!["golang-bar-test"]
        );
        assert_topological(merge);

        // the pull request workflow has no lambda jobs
        assert_eq!(
            identifiers(workflow(&workflows, PR)),
            vec!["golang-bar-test", "golang-bar-lint"]
        );
    }

    #[test]
    fn test_shared_dependency_materialized_once() {
        let projects = vec![
            Project::new(lambda(), "svc/one")
                .with_dependency("source", ProjectIdentifier::new("lib/shared", "golang")),
            Project::new(lambda(), "svc/two")
                .with_dependency("source", ProjectIdentifier::new("lib/shared", "golang")),
            Project::new(golang(), "lib/shared"),
        ];
        let workflows = materialize_workflows(&projects).unwrap();
        let merge = workflow(&workflows, MERGE);

        let count = merge
            .jobs
            .iter()
            .filter(|j| j.identifier == "golang-shared-test")
            .count();
        assert_eq!(count, 1);
        assert_eq!(
            merge.job("lambda-one-deploy").unwrap().dependencies,
            merge.job("lambda-two-deploy").unwrap().dependencies
        );
        assert_eq!(merge.jobs.len(), 4);
        assert_topological(merge);
    }

    #[test]
    fn test_duplicate_job_identifier() {
        let projects = vec![
            Project::new(golang(), "a/foo"),
            Project::new(golang(), "b/foo"),
        ];

        let err = materialize_workflows(&projects).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        match err.root_cause() {
            Error::DuplicateJobIdentifier {
                identifier,
                first,
                second,
            } => {
                assert_eq!(identifier, "golang-foo-test");
                assert!(first.contains("path=a/foo"));
                assert!(second.contains("path=b/foo"));
            }
            other => panic!("expected duplicate job identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_dependencies_keep_declared_order() {
        let app = Arc::new(
            ProjectType::new("app")
                .with_dependency("source", "golang")
                .with_dependency("function", "lambda")
                .with_job(
                    MERGE,
                    JobType::new("release")
                        .with_dependency("function", 0)
                        .with_dependency("source", 1)
                        .with_dependency("source", 0),
                ),
        );
        let projects = vec![
            Project::new(app, "apps/web")
                .with_dependency("source", ProjectIdentifier::new("svc/api", "golang"))
                .with_dependency("function", ProjectIdentifier::new("svc/api", "lambda")),
            Project::new(lambda(), "svc/api")
                .with_dependency("source", ProjectIdentifier::new("svc/api", "golang")),
            Project::new(golang(), "svc/api"),
        ];

        let workflows = materialize_workflows(&projects).unwrap();
        let merge = workflow(&workflows, MERGE);

        assert_eq!(
            merge.job("app-web-release").unwrap().dependencies,
            vec!["lambda-api-deploy", "golang-api-lint", "golang-api-test"]
        );
        assert_topological(merge);
    }

    #[test]
    fn test_missing_dependency_mapping() {
        let projects = vec![Project::new(lambda(), "svc/bar"), Project::new(golang(), "svc/bar")];

        let err = materialize_workflows(&projects).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        match err.root_cause() {
            Error::MissingDependency {
                project_type,
                dependency,
                project_path,
            } => {
                assert_eq!(project_type, "lambda");
                assert_eq!(dependency, "source");
                assert_eq!(project_path, "svc/bar");
            }
            other => panic!("expected missing dependency, got {other:?}"),
        }

        // the outermost error carries the job being materialized
        assert!(matches!(
            &err,
            Error::Job { job_type, workflow: WorkflowIdentifier::Merge, .. } if job_type == "deploy"
        ));
    }

    #[test]
    fn test_unknown_project() {
        let projects = vec![
            Project::new(lambda(), "svc/bar")
                .with_dependency("source", ProjectIdentifier::new("svc/missing", "golang")),
        ];

        let err = materialize_workflows(&projects).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(matches!(
            err.root_cause(),
            Error::ProjectNotFound { path, project_type } if path == "svc/missing" && project_type == "golang"
        ));
    }

    #[test]
    fn test_dependency_bound_to_wrong_type() {
        let projects = vec![
            Project::new(lambda(), "svc/bar")
                .with_dependency("source", ProjectIdentifier::new("svc/bar", "lambda")),
        ];

        let err = materialize_workflows(&projects).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::DependencyTypeMismatch { expected, found, .. } if expected == "golang" && found == "lambda"
        ));
    }

    #[test]
    fn test_undeclared_dependency_name() {
        let broken = Arc::new(
            ProjectType::new("lambda")
                .with_job(MERGE, JobType::new("deploy").with_dependency("source", 0)),
        );
        let projects = vec![Project::new(broken, "svc/bar")];

        let err = materialize_workflows(&projects).unwrap_err();
        assert!(matches!(err.root_cause(), Error::UndeclaredDependency { .. }));
    }

    #[test]
    fn test_job_index_out_of_range() {
        let broken = Arc::new(
            ProjectType::new("lambda")
                .with_dependency("source", "golang")
                .with_job(MERGE, JobType::new("deploy").with_dependency("source", 5)),
        );
        let projects = vec![
            Project::new(broken, "svc/bar")
                .with_dependency("source", ProjectIdentifier::new("svc/bar", "golang")),
            Project::new(golang(), "svc/bar"),
        ];

        let err = materialize_workflows(&projects).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::JobIndexOutOfRange { index: 5, available: 2, .. }
        ));
    }

    #[test]
    fn test_mutual_cycle() {
        let ping = Arc::new(
            ProjectType::new("ping")
                .with_dependency("peer", "pong")
                .with_job(PR, JobType::new("build").with_dependency("peer", 0)),
        );
        let pong = Arc::new(
            ProjectType::new("pong")
                .with_dependency("peer", "ping")
                .with_job(PR, JobType::new("build").with_dependency("peer", 0)),
        );
        let projects = vec![
            Project::new(ping, "x").with_dependency("peer", ProjectIdentifier::new("x", "pong")),
            Project::new(pong, "x").with_dependency("peer", ProjectIdentifier::new("x", "ping")),
        ];

        let err = materialize_workflows(&projects).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
        match err.root_cause() {
            Error::Cycle { chain } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain[0], "(workflow=pull-request, type=ping, path=x, job=build)");
                assert_eq!(chain[1], "(workflow=pull-request, type=pong, path=x, job=build)");
                assert_eq!(chain[2], chain[0]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle() {
        let solo = Arc::new(
            ProjectType::new("solo")
                .with_dependency("me", "solo")
                .with_job(PR, JobType::new("build").with_dependency("me", 0)),
        );
        let projects =
            vec![Project::new(solo, "x").with_dependency("me", ProjectIdentifier::new("x", "solo"))];

        let err = materialize_workflows(&projects).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Cycle { chain } if chain.len() == 2));
    }

    #[test]
    fn test_same_type_different_projects_is_not_a_cycle() {
        let chained = Arc::new(
            ProjectType::new("stage")
                .with_dependency("previous", "golang")
                .with_job(PR, JobType::new("build").with_dependency("previous", 0)),
        );
        let projects = vec![
            Project::new(chained.clone(), "a")
                .with_dependency("previous", ProjectIdentifier::new("lib", "golang")),
            Project::new(chained, "b")
                .with_dependency("previous", ProjectIdentifier::new("lib", "golang")),
            Project::new(golang(), "lib"),
        ];

        let workflows = materialize_workflows(&projects).unwrap();
        let pr = workflow(&workflows, PR);
        assert_eq!(
            identifiers(pr),
            vec![
                "golang-lib-test",
                "stage-a-build",
                "stage-b-build",
                "golang-lib-lint",
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_every_workflow() {
        let workflows = materialize_workflows(&[]).unwrap();
        let ids: Vec<_> = workflows.iter().map(|w| w.identifier).collect();
        assert_eq!(ids, WorkflowIdentifier::ALL.to_vec());
        assert!(workflows.iter().all(Workflow::is_empty));
    }

    #[test]
    fn test_output_serializes_to_json() {
        let projects = vec![Project::new(golang(), "svc/foo")];
        let workflows = materialize_workflows(&projects).unwrap();

        let json = serde_json::to_value(&workflows).unwrap();
        assert_eq!(json[0]["identifier"], "pull-request");
        assert_eq!(json[0]["jobs"][0]["identifier"], "golang-foo-test");
    }
}
