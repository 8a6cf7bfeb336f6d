use crate::errors::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extension of the source files the collector picks up.
pub const SOURCE_EXTENSION: &str = "py";

/// Options controlling source file discovery.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Discover Python source files under `root`.
///
/// - Skips hidden files and directories
/// - Respects `.gitignore` inside git repositories (when enabled)
/// - Applies include/exclude glob patterns against the root-relative path
/// - Returns sorted paths for deterministic output
pub fn discover_files(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>> {
    let exclude_set = build_globset(&options.exclude)?;

    let include_set = if options.include.is_empty() {
        None
    } else {
        Some(build_globset(&options.include)?)
    };

    // Hidden entries (.venv, .tox, .git) are skipped.
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .parents(options.respect_gitignore)
        .build();

    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!("Skipping unreadable entry: {err}");
                continue;
            }
        };

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext_match = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == SOURCE_EXTENSION);

        if !ext_match {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) || exclude_set.is_match(path) {
            continue;
        }

        if let Some(ref include) = include_set {
            if !include.is_match(relative) && !include.is_match(path) {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    files.sort();

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
