use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::FlowgraphConfig;

/// Source file extensions the loader hands to the parser.
const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Directory names excluded unconditionally: dependency caches, version
/// control, and generated build output. Dotfiles and .gitignore rules are
/// handled by the `ignore` crate's standard filters.
const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build", "out", "coverage", ".git"];

/// Walk a project directory and collect source files, sorted by path.
///
/// Respects `.gitignore` rules, skips dotfiles and the hard-excluded
/// directories, applies any additional exclusions from `config.exclude`, and
/// keeps only source-like extensions.
///
/// # Errors
/// The only hard failure is an unreadable root; everything below it degrades
/// per file.
pub fn walk_project(root: &Path, config: &FlowgraphConfig) -> Result<Vec<PathBuf>> {
    root.read_dir()
        .with_context(|| format!("cannot read project root {}", root.display()))?;

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git repository.
        .require_git(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                eprintln!("warning: {err}");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        if path_contains_excluded_dir(path, root) {
            continue;
        }

        if is_excluded_by_config(path, config) {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Returns true if any component of `path` below the project root is one of
/// the hard-excluded directory names. Components above the root are not
/// examined: a project checked out under a directory named `build` or `dist`
/// must still analyze.
fn path_contains_excluded_dir(path: &Path, root: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| EXCLUDED_DIRS.contains(&s))
            .unwrap_or(false)
    })
}

/// Returns true if `path` matches any exclusion pattern from config.
fn is_excluded_by_config(path: &Path, config: &FlowgraphConfig) -> bool {
    let patterns = match &config.exclude {
        Some(p) => p,
        None => return false,
    };

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Ok(matched) = glob::Pattern::new(pattern)
            && matched.matches(&path_str)
        {
            return true;
        }
        // Also check if any component matches the pattern directly.
        for component in path.components() {
            if let Some(s) = component.as_os_str().to_str()
                && let Ok(matched) = glob::Pattern::new(pattern)
                && matched.matches(s)
            {
                return true;
            }
        }
    }

    false
}
