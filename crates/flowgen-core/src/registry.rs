//! The catalog of project types.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::project::ProjectType;
use crate::{Error, Result, WorkflowIdentifier};

/// Validated, read-only catalog of project types keyed by identifier.
///
/// Construction checks every dependency slot and job reference, so the
/// materializer only ever sees job graphs that are well-formed at the type
/// level.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Arc<ProjectType>>,
}

impl TypeRegistry {
    pub fn new(types: impl IntoIterator<Item = ProjectType>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for project_type in types {
            let identifier = project_type.identifier.clone();
            if map.insert(identifier.clone(), Arc::new(project_type)).is_some() {
                return Err(Error::DuplicateProjectType(identifier));
            }
        }

        let registry = Self { types: map };
        registry.validate_references()?;
        registry.detect_cycles()?;
        Ok(registry)
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<ProjectType>> {
        self.types.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProjectType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn validate_references(&self) -> Result<()> {
        for project_type in self.types.values() {
            for (dependency, dependency_type) in &project_type.dependencies {
                if !self.types.contains_key(dependency_type) {
                    return Err(Error::UnknownDependencyType {
                        project_type: project_type.identifier.clone(),
                        dependency: dependency.clone(),
                        dependency_type: dependency_type.clone(),
                    });
                }
            }

            for (&workflow, jobs) in &project_type.workflows {
                for job in jobs {
                    for reference in &job.dependencies {
                        let target = project_type
                            .dependencies
                            .get(&reference.name)
                            .and_then(|id| self.types.get(id))
                            .ok_or_else(|| Error::UndeclaredDependency {
                                project_type: project_type.identifier.clone(),
                                job_type: job.name.clone(),
                                dependency: reference.name.clone(),
                            })?;

                        let available = target.jobs(workflow).len();
                        if reference.job_index >= available {
                            return Err(Error::JobIndexOutOfRange {
                                project_type: project_type.identifier.clone(),
                                job_type: job.name.clone(),
                                dependency: reference.name.clone(),
                                dependency_type: target.identifier.clone(),
                                workflow,
                                index: reference.job_index,
                                available,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Detect cycles in the type-level job graph using DFS.
    fn detect_cycles(&self) -> Result<()> {
        let mut visited = HashMap::new();
        let mut stack = Vec::new();

        for project_type in self.types.values() {
            for (&workflow, jobs) in &project_type.workflows {
                for index in 0..jobs.len() {
                    let node = JobRef {
                        project_type: &project_type.identifier,
                        workflow,
                        index,
                    };
                    self.visit(node, &mut visited, &mut stack)?;
                }
            }
        }
        Ok(())
    }

    fn visit<'r>(
        &'r self,
        node: JobRef<'r>,
        visited: &mut HashMap<JobRef<'r>, bool>,
        stack: &mut Vec<JobRef<'r>>,
    ) -> Result<()> {
        match visited.get(&node) {
            Some(true) => return Ok(()),
            Some(false) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let chain = stack[start..]
                    .iter()
                    .chain(std::iter::once(&node))
                    .map(|n| self.describe(n))
                    .collect();
                return Err(Error::Cycle { chain });
            }
            None => {}
        }

        // false = on the current DFS path, true = fully explored
        visited.insert(node, false);
        stack.push(node);

        if let Some(project_type) = self.types.get(node.project_type) {
            if let Some(job) = project_type.jobs(node.workflow).get(node.index) {
                for reference in &job.dependencies {
                    let Some(target) = project_type.dependencies.get(&reference.name) else {
                        continue;
                    };
                    let next = JobRef {
                        project_type: target,
                        workflow: node.workflow,
                        index: reference.job_index,
                    };
                    self.visit(next, visited, stack)?;
                }
            }
        }

        stack.pop();
        visited.insert(node, true);
        Ok(())
    }

    fn describe(&self, node: &JobRef<'_>) -> String {
        let job = self
            .types
            .get(node.project_type)
            .and_then(|t| t.jobs(node.workflow).get(node.index))
            .map_or("?", |j| j.name.as_str());
        format!(
            "(workflow={}, type={}, job={})",
            node.workflow.key(),
            node.project_type,
            job
        )
    }
}

/// A job type addressed by position within its project type's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct JobRef<'r> {
    project_type: &'r str,
    workflow: WorkflowIdentifier,
    index: usize,
}
