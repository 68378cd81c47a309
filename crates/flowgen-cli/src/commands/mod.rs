//! CLI command implementations.

pub mod generate;
pub mod plan;

use anyhow::{Context, Result};
use flowgen_config::{CONFIG_FILE_NAME, GeneratorConfig, find_projects, find_repo_root, load_config};
use flowgen_core::{Project, Workflow, materialize_workflows};
use flowgen_render::{RenderedFile, WorkflowEmitter, load_static_file};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output directory, relative to the repository root.
pub const DEFAULT_OUT_DIR: &str = ".github/workflows";

/// Where to find the repository and its configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub repo_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// A loaded repository: configuration, discovered projects and their
/// materialized workflows.
pub struct Loaded {
    pub repo_root: PathBuf,
    pub out_dir: PathBuf,
    pub config: GeneratorConfig,
    pub projects: Vec<Project>,
    pub workflows: Vec<Workflow>,
}

impl Loaded {
    /// Render workflow files and static files in memory.
    pub async fn render(&self) -> Result<Vec<RenderedFile>> {
        let mut files = WorkflowEmitter::new(self.config.settings.branches.clone())
            .emit_all(&self.workflows)
            .context("failed to render workflows")?;

        for file in &self.config.static_files {
            files.push(load_static_file(file.file_name.clone(), &file.source).await?);
        }
        Ok(files)
    }
}

/// Locate the repository, load configuration, discover projects and
/// materialize workflows.
pub async fn load(options: LoadOptions, out_dir: Option<PathBuf>) -> Result<Loaded> {
    let repo_root = match options.repo_root {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            find_repo_root(&cwd)?
        }
    };
    let out_dir = resolve_out_dir(&repo_root, out_dir);
    let config_path = options
        .config
        .unwrap_or_else(|| repo_root.join(CONFIG_FILE_NAME));

    let config = load_config(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let projects = find_projects(&config.registry, &repo_root, std::slice::from_ref(&out_dir))
        .await
        .context("failed to discover projects")?;

    let workflows = materialize_workflows(&projects).context("failed to materialize jobs")?;
    for workflow in &workflows {
        info!(
            workflow = %workflow.identifier,
            jobs = workflow.jobs.len(),
            "Materialized workflow"
        );
    }

    Ok(Loaded {
        repo_root,
        out_dir,
        config,
        projects,
        workflows,
    })
}

/// Resolve the output directory against the repository root.
pub fn resolve_out_dir(repo_root: &Path, out_dir: Option<PathBuf>) -> PathBuf {
    match out_dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => repo_root.join(dir),
        None => repo_root.join(DEFAULT_OUT_DIR),
    }
}

pub async fn validate(options: LoadOptions) -> Result<()> {
    let loaded = load(options, None).await?;
    let files = loaded.render().await?;

    println!("Configuration is valid");
    println!("  project types: {}", loaded.config.registry.len());
    println!("  projects:      {}", loaded.projects.len());
    for workflow in &loaded.workflows {
        println!("  {:<14} {} jobs", format!("{}:", workflow.identifier), workflow.jobs.len());
    }
    println!("  output files:  {}", files.len());
    Ok(())
}
