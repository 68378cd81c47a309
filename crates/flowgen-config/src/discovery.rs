//! Repository scanning for project declarations.

use crate::projects::{PROJECTS_FILE_NAME, parse_projects};
use crate::{ConfigError, ConfigResult};
use flowgen_core::{Project, TypeRegistry};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Walk upward from `start` to the first directory containing `.git`.
pub fn find_repo_root(start: &Path) -> ConfigResult<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::RepoRootNotFound(start.to_path_buf()))
}

/// Find every project declared under `repo_root`.
///
/// Directories listed in `skip` (absolute, or relative to the root) are not
/// entered. The result is sorted by type, name and path, and two projects of
/// the same type may not share a name.
pub async fn find_projects(
    registry: &TypeRegistry,
    repo_root: &Path,
    skip: &[PathBuf],
) -> ConfigResult<Vec<Project>> {
    let scanner = ProjectScanner {
        registry: registry.clone(),
        root: repo_root.to_path_buf(),
        skip: skip
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { repo_root.join(p) })
            .collect(),
    };

    let mut projects = Vec::new();
    scanner.scan_directory(repo_root, &mut projects).await?;

    projects.sort_by(|a, b| {
        (&a.project_type.identifier, a.name(), &a.path).cmp(&(
            &b.project_type.identifier,
            b.name(),
            &b.path,
        ))
    });
    check_duplicates(&projects)?;

    info!(
        root = %repo_root.display(),
        projects = projects.len(),
        "Project discovery complete"
    );
    Ok(projects)
}

fn check_duplicates(projects: &[Project]) -> ConfigResult<()> {
    for pair in projects.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if first.project_type.identifier == second.project_type.identifier
            && first.name() == second.name()
        {
            return Err(ConfigError::DuplicateProject {
                first: first.path.clone(),
                second: second.path.clone(),
            });
        }
    }
    Ok(())
}

struct ProjectScanner {
    registry: TypeRegistry,
    root: PathBuf,
    skip: Vec<PathBuf>,
}

impl ProjectScanner {
    #[async_recursion::async_recursion]
    async fn scan_directory(
        &self,
        current_path: &Path,
        projects: &mut Vec<Project>,
    ) -> ConfigResult<()> {
        let declarations = current_path.join(PROJECTS_FILE_NAME);
        if tokio::fs::try_exists(&declarations).await? {
            let dir = self.relative(current_path);
            let content = tokio::fs::read_to_string(&declarations)
                .await
                .map_err(|e| ConfigError::from(e).in_file(&declarations))?;
            let found = parse_projects(&content, &dir, &self.registry)
                .map_err(|e| e.in_file(&declarations))?;
            debug!(path = %dir, count = found.len(), "Found project declarations");
            projects.extend(found);
        }

        let mut entries = tokio::fs::read_dir(current_path).await?;
        let mut subdirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            let file_name = entry.file_name();
            let file_name_str = file_name.to_string_lossy();

            // Skip hidden directories (like .git) and common non-source directories
            if file_name_str.starts_with('.')
                || matches!(file_name_str.as_ref(), "node_modules" | "target" | "vendor")
                || self.skip.iter().any(|s| s == &path)
            {
                continue;
            }
            subdirs.push(path);
        }

        // read_dir order is platform dependent
        subdirs.sort();
        for path in subdirs {
            self.scan_directory(&path, projects).await?;
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        if relative.is_empty() {
            ".".to_string()
        } else {
            relative
        }
    }
}
