//! `flowgen generate`.

use anyhow::{Context, Result};
use flowgen_render::write_atomically;
use std::path::PathBuf;
use tracing::info;

use super::{LoadOptions, load};

pub async fn run(options: LoadOptions, out_dir: Option<PathBuf>) -> Result<()> {
    let loaded = load(options, out_dir).await?;
    let files = loaded.render().await?;

    write_atomically(&loaded.out_dir, &files)
        .await
        .with_context(|| format!("failed to write {}", loaded.out_dir.display()))?;

    info!(
        repo_root = %loaded.repo_root.display(),
        projects = loaded.projects.len(),
        files = files.len(),
        "Generated workflows"
    );
    for file in &files {
        println!("{}", loaded.out_dir.join(&file.file_name).display());
    }
    Ok(())
}
