use crate::cancel::CancelToken;
use crate::errors::{PathKind, ReqpinError, Result};
use crate::manifest::{self, OverwritePolicy, WriteOutcome, MANIFEST_FILE_NAME};
use crate::parse::{ImportName, ParseFailure, PythonFrontend};
use crate::resolve::{ResolvedDependency, VersionResolver};
use crate::stdlib::StandardLibrarySet;
use crate::walk::{self, WalkOptions, SOURCE_EXTENSION};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A recoverable per-item problem. Warnings never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    ParseFailure { file: PathBuf, message: String },
    UnresolvedDependency { name: String },
}

impl From<ParseFailure> for Warning {
    fn from(f: ParseFailure) -> Self {
        Warning::ParseFailure {
            file: f.file,
            message: f.message,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ParseFailure { file, message } => {
                write!(f, "could not parse {}: {}", file.display(), message)
            }
            Warning::UnresolvedDependency { name } => {
                write!(f, "could not find an installed version for {name}")
            }
        }
    }
}

/// Terminal state of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Written { path: PathBuf, count: usize },
    /// Dependencies were computed but writing was not requested.
    DryRun,
    NoSourceFiles,
    NoDependencies,
    OverwriteDeclined { path: PathBuf },
    Cancelled,
}

/// Everything a front end needs to present a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: PathBuf,
    pub manifest_path: PathBuf,
    pub files_parsed: usize,
    pub files_failed: usize,
    /// Distinct third-party names that were sent to the resolver.
    pub candidates: Vec<ImportName>,
    pub dependencies: Vec<ResolvedDependency>,
    pub warnings: Vec<Warning>,
    pub outcome: Outcome,
}

/// Whether a finished analysis is written out.
#[derive(Debug)]
pub enum Emit<'p> {
    Manifest(&'p OverwritePolicy),
    DryRun,
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub walk: WalkOptions,
    /// Extra names to drop before resolution.
    pub ignore_modules: BTreeSet<String>,
    /// Drop names that match modules living in the analyzed project.
    pub exclude_local: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            ignore_modules: BTreeSet::new(),
            exclude_local: true,
        }
    }
}

pub struct Pipeline<'a> {
    stdlib: &'a StandardLibrarySet,
    resolver: &'a VersionResolver,
    options: AnalysisOptions,
    cancel: CancelToken,
    on_resolved: Box<dyn Fn(&ImportName) + Sync + 'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(stdlib: &'a StandardLibrarySet, resolver: &'a VersionResolver) -> Self {
        Self {
            stdlib,
            resolver,
            options: AnalysisOptions::default(),
            cancel: CancelToken::new(),
            on_resolved: Box::new(|_: &ImportName| {}),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Called once for every name after its lookup finishes.
    pub fn on_resolved(mut self, f: impl Fn(&ImportName) + Sync + 'a) -> Self {
        self.on_resolved = Box::new(f);
        self
    }

    /// Pin the third-party imports of a single source file.
    ///
    /// The manifest defaults to `requirements.txt` next to the file.
    pub fn analyze_file(
        &self,
        file: &Path,
        target: Option<&Path>,
        emit: &Emit<'_>,
    ) -> Result<Report> {
        validate_input(file, PathKind::File)?;

        let project_dir = parent_dir(file);
        let manifest_path = target
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dir.join(MANIFEST_FILE_NAME));

        let frontend = PythonFrontend::new();
        let (names, warnings, files_failed) = match frontend.extract_file(file) {
            Ok(names) => (names, Vec::new(), 0),
            Err(failure) => {
                tracing::warn!("{failure}");
                (BTreeSet::new(), vec![Warning::from(failure)], 1)
            }
        };

        let scan = Scan {
            source: file.to_path_buf(),
            project_dir,
            manifest_path,
            files_parsed: 1 - files_failed,
            files_failed,
            names,
            warnings,
        };
        self.finish(scan, emit)
    }

    /// Pin the third-party imports of every source file under `dir`.
    ///
    /// Names are unioned across files before any lookup, so each distinct
    /// package is resolved at most once. The manifest defaults to
    /// `requirements.txt` inside `dir`.
    pub fn analyze_directory(
        &self,
        dir: &Path,
        target: Option<&Path>,
        emit: &Emit<'_>,
    ) -> Result<Report> {
        validate_input(dir, PathKind::Directory)?;

        let manifest_path = target
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join(MANIFEST_FILE_NAME));

        let files = walk::discover_files(dir, &self.options.walk)?;
        tracing::debug!("found {} source files under {}", files.len(), dir.display());

        if files.is_empty() {
            return Ok(Report {
                source: dir.to_path_buf(),
                manifest_path,
                files_parsed: 0,
                files_failed: 0,
                candidates: Vec::new(),
                dependencies: Vec::new(),
                warnings: Vec::new(),
                outcome: Outcome::NoSourceFiles,
            });
        }

        let (names, failures) = extract_all(&files);
        let files_failed = failures.len();
        let warnings = failures
            .into_iter()
            .map(|failure| {
                tracing::warn!("{failure}");
                Warning::from(failure)
            })
            .collect();

        let scan = Scan {
            source: dir.to_path_buf(),
            project_dir: dir.to_path_buf(),
            manifest_path,
            files_parsed: files.len() - files_failed,
            files_failed,
            names,
            warnings,
        };
        self.finish(scan, emit)
    }

    fn finish(&self, scan: Scan, emit: &Emit<'_>) -> Result<Report> {
        let Scan {
            source,
            project_dir,
            manifest_path,
            files_parsed,
            files_failed,
            names,
            mut warnings,
        } = scan;

        let local = if self.options.exclude_local {
            local_modules(&project_dir)
        } else {
            BTreeSet::new()
        };
        let candidates = filter_third_party(names, self.stdlib, &self.options.ignore_modules, &local);

        let resolution = self
            .resolver
            .resolve_all(&candidates, &self.cancel, self.on_resolved.as_ref());

        for name in &resolution.unresolved {
            tracing::warn!("could not find an installed version for {name}");
            warnings.push(Warning::UnresolvedDependency {
                name: name.to_string(),
            });
        }

        let outcome = if resolution.cancelled || self.cancel.is_cancelled() {
            Outcome::Cancelled
        } else if resolution.resolved.is_empty() {
            Outcome::NoDependencies
        } else {
            match emit {
                Emit::DryRun => Outcome::DryRun,
                Emit::Manifest(policy) => {
                    match manifest::write_manifest(&resolution.resolved, &manifest_path, policy)? {
                        WriteOutcome::Written { path, count } => Outcome::Written { path, count },
                        WriteOutcome::Declined { path } => Outcome::OverwriteDeclined { path },
                        WriteOutcome::Empty => Outcome::NoDependencies,
                    }
                }
            }
        };

        Ok(Report {
            source,
            manifest_path,
            files_parsed,
            files_failed,
            candidates: candidates.into_iter().collect(),
            dependencies: resolution.resolved,
            warnings,
            outcome,
        })
    }
}

struct Scan {
    source: PathBuf,
    project_dir: PathBuf,
    manifest_path: PathBuf,
    files_parsed: usize,
    files_failed: usize,
    names: BTreeSet<ImportName>,
    warnings: Vec<Warning>,
}

/// Extract every file and union the results. Failures are returned in
/// path order alongside the names of the files that parsed.
pub fn extract_all(files: &[PathBuf]) -> (BTreeSet<ImportName>, Vec<ParseFailure>) {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            // Parser is not shared across threads; each file gets its own.
            let frontend = PythonFrontend::new();
            frontend.extract_file(path)
        })
        .collect();

    let mut names = BTreeSet::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(found) => names.extend(found),
            Err(failure) => failures.push(failure),
        }
    }
    (names, failures)
}

/// Drop standard-library, ignored and project-local names.
pub fn filter_third_party(
    names: BTreeSet<ImportName>,
    stdlib: &StandardLibrarySet,
    ignored: &BTreeSet<String>,
    local: &BTreeSet<String>,
) -> BTreeSet<ImportName> {
    names
        .into_iter()
        .filter(|name| {
            if stdlib.contains(name) {
                tracing::debug!("{name}: standard library");
                return false;
            }
            if ignored.contains(name.as_str()) {
                tracing::debug!("{name}: ignored by configuration");
                return false;
            }
            if local.contains(name.as_str()) {
                tracing::debug!("{name}: project module");
                return false;
            }
            true
        })
        .collect()
}

/// Top-level module names importable from `root` itself: `.py` files and
/// packages with an `__init__.py`, also looking inside a `src/` layout.
pub fn local_modules(root: &Path) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();
    for dir in [root.to_path_buf(), root.join("src")] {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let is_module = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION);
            let is_package = path.is_dir() && path.join("__init__.py").is_file();
            if (is_module || is_package) && name != "__init__" && !name.contains('.') {
                modules.insert(name.to_string());
            }
        }
    }
    modules
}

/// Fail with `InvalidPath` unless `path` is an existing entry of `kind`.
pub fn validate_input(path: &Path, kind: PathKind) -> Result<()> {
    let ok = match kind {
        PathKind::File => path.is_file(),
        PathKind::Directory => path.is_dir(),
    };
    if ok {
        Ok(())
    } else {
        Err(ReqpinError::InvalidPath {
            path: path.to_path_buf(),
            expected: kind,
        })
    }
}

/// Directory containing `file`, `.` for a bare file name.
pub fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
