use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Python source and stub extensions.
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Virtualenvs and tool caches are never project code.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".venv/**",
    "venv/**",
    ".tox/**",
    ".nox/**",
    "**/site-packages/**",
    "**/__pycache__/**",
];

fn is_python(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Discover Python files under `root`.
///
/// - Respects `.gitignore`
/// - Applies include/exclude glob patterns to the root-relative path
/// - Returns sorted paths for deterministic output
///
/// A `root` that is itself a Python file yields just that file.
pub fn discover_files(
    root: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(if is_python(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let exclude_set = build_globset(
        DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(exclude_patterns.iter().map(String::as_str)),
    )?;
    let include_set = if include_patterns.is_empty() {
        None
    } else {
        Some(build_globset(include_patterns.iter().map(String::as_str))?)
    };

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_python(path) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) {
            continue;
        }
        // Bare filename patterns such as `conftest.py`
        if let Some(fname) = path.file_name() {
            if exclude_set.is_match(Path::new(fname)) {
                continue;
            }
        }

        if let Some(ref include) = include_set {
            if !include.is_match(relative) {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    tracing::debug!(root = %root.display(), files = files.len(), "discovered files");

    Ok(files)
}
