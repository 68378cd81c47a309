//! Writing rendered files into the output directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{RenderError, RenderResult};

/// A file ready to be written into the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub file_name: String,
    pub contents: String,
}

/// Read a file that is copied into the output directory unchanged.
pub async fn load_static_file(
    file_name: impl Into<String>,
    source: &Path,
) -> RenderResult<RenderedFile> {
    let contents = tokio::fs::read_to_string(source)
        .await
        .map_err(|e| RenderError::StaticFile {
            path: source.to_path_buf(),
            source: e,
        })?;
    Ok(RenderedFile {
        file_name: file_name.into(),
        contents,
    })
}

/// Replace the contents of `out_dir` with `files`.
///
/// Files are first written to a staging directory beside `out_dir`, which is
/// then swapped into place. If anything fails before the swap, `out_dir` is
/// left as it was.
pub async fn write_atomically(out_dir: &Path, files: &[RenderedFile]) -> RenderResult<()> {
    let mut seen = HashSet::new();
    for file in files {
        if !is_plain_file_name(&file.file_name) {
            return Err(RenderError::InvalidFileName(file.file_name.clone()));
        }
        if !seen.insert(file.file_name.as_str()) {
            return Err(RenderError::DuplicateFile(file.file_name.clone()));
        }
    }

    let parent = match out_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await?;

    let staging = tempfile::Builder::new()
        .prefix(".flowgen-staging-")
        .tempdir_in(&parent)?;

    for file in files {
        let path = staging.path().join(&file.file_name);
        tokio::fs::write(&path, &file.contents).await?;
        debug!(path = %path.display(), bytes = file.contents.len(), "Staged file");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(staging.path(), std::fs::Permissions::from_mode(0o755))
            .await?;
    }

    // Move the old directory aside so a failed rename can be rolled back
    let backup = if tokio::fs::try_exists(out_dir).await? {
        let backup = tempfile::Builder::new()
            .prefix(".flowgen-previous-")
            .tempdir_in(&parent)?;
        let backup_path = backup.path().join("workflows");
        tokio::fs::rename(out_dir, &backup_path).await?;
        Some((backup, backup_path))
    } else {
        None
    };

    let staged = staging.keep();
    if let Err(e) = tokio::fs::rename(&staged, out_dir).await {
        if let Some((_, backup_path)) = &backup {
            tokio::fs::rename(backup_path, out_dir).await?;
        }
        tokio::fs::remove_dir_all(&staged).await?;
        return Err(e.into());
    }

    if let Some((backup, _)) = backup {
        backup.close()?;
    }

    info!(
        out_dir = %out_dir.display(),
        files = files.len(),
        "Wrote output directory"
    );
    Ok(())
}

/// Output files are written straight into the staging directory, so their
/// names may not contain separators or refer to a parent.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
