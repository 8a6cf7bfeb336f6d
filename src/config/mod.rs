pub mod ignore;
pub mod provenance;
pub mod resolve;
pub mod schema;
pub mod show;

use crate::output::OutputFormat;
use crate::pipeline::AnalysisOptions;
use crate::walk::WalkOptions;
use provenance::ProvenanceMap;
use std::path::PathBuf;
use std::time::Duration;

pub const PROJECT_CONFIG_FILE: &str = ".reqpin.toml";

#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully resolved configuration. No Option fields except the optional
/// manifest override.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    // Operational
    pub format: OutputFormat,
    pub quiet: bool,
    pub jobs: usize,
    pub output: Option<PathBuf>,

    // Resolver
    pub python: PathBuf,
    pub timeout_secs: u64,
    pub probe_stdlib: bool,

    // Targeting
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
    pub ignore_patterns: Vec<String>,

    // Analysis
    pub ignore_modules: Vec<String>,
    pub exclude_local: bool,

    // Provenance
    pub provenance: ProvenanceMap,
    pub loaded_files: Vec<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            quiet: false,
            jobs: 1,
            output: None,
            python: PathBuf::from(DEFAULT_PYTHON),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_stdlib: true,
            include: Vec::new(),
            exclude: Vec::new(),
            respect_gitignore: true,
            ignore_patterns: Vec::new(),
            ignore_modules: Vec::new(),
            exclude_local: true,
            provenance: ProvenanceMap::new(),
            loaded_files: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Exclude globs from config plus `.reqpinignore` patterns.
    pub fn walk_options(&self) -> WalkOptions {
        let mut exclude = self.exclude.clone();
        exclude.extend(self.ignore_patterns.iter().cloned());
        WalkOptions {
            include: self.include.clone(),
            exclude,
            respect_gitignore: self.respect_gitignore,
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            walk: self.walk_options(),
            ignore_modules: self.ignore_modules.iter().cloned().collect(),
            exclude_local: self.exclude_local,
        }
    }
}
