use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Find the nearest directory at or above `start` that holds a package.json.
pub fn find_package_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("package.json").is_file())
        .map(Path::to_path_buf)
}

/// Resolve the Node project root for the loader.
pub fn resolve_project_root(project_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = project_root {
        return path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize project root: {}", path.display()));
    }

    let current = std::env::current_dir().context("Failed to get current directory")?;
    Ok(find_package_root(&current).unwrap_or(current))
}
