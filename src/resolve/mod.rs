pub mod pip;

pub use pip::PipLookup;

use crate::cancel::CancelToken;
use crate::parse::ImportName;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

/// Capability to ask the package manager for an installed version.
///
/// `None` covers every expected miss: not installed, timed out, tool
/// unavailable, unparsable output.
pub trait VersionLookup: Send + Sync {
    fn installed_version(&self, name: &str) -> Option<String>;
}

/// A package pinned at its installed version. The version is never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResolvedDependency {
    pub name: String,
    pub version: String,
}

impl ResolvedDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Outcome of resolving a set of names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Sorted by name.
    pub resolved: Vec<ResolvedDependency>,
    /// Sorted by name.
    pub unresolved: Vec<ImportName>,
    pub cancelled: bool,
}

pub struct VersionResolver {
    lookup: Box<dyn VersionLookup>,
    jobs: usize,
}

impl VersionResolver {
    pub fn new(lookup: Box<dyn VersionLookup>) -> Self {
        Self { lookup, jobs: 1 }
    }

    /// Resolve on up to `jobs` worker threads. 0 and 1 both mean sequential.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn resolve(&self, name: &ImportName) -> Option<String> {
        self.lookup
            .installed_version(name.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Resolve every name once. Names are already distinct since they come
    /// from a set, so the lookup sees each at most once per call.
    pub fn resolve_all(
        &self,
        names: &BTreeSet<ImportName>,
        cancel: &CancelToken,
        on_done: &(dyn Fn(&ImportName) + Sync),
    ) -> Resolution {
        let resolve_one = |name: &ImportName| -> Option<(ImportName, Option<String>)> {
            if cancel.is_cancelled() {
                return None;
            }
            let version = self.resolve(name);
            match &version {
                Some(v) => tracing::debug!("resolved {name}=={v}"),
                None => tracing::debug!("could not resolve {name}"),
            }
            on_done(name);
            Some((name.clone(), version))
        };

        let results: Vec<_> = if self.jobs <= 1 {
            names.iter().filter_map(resolve_one).collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| names.par_iter().filter_map(resolve_one).collect()),
                Err(e) => {
                    tracing::warn!("could not start resolver pool, resolving sequentially: {e}");
                    names.iter().filter_map(resolve_one).collect()
                }
            }
        };

        let mut resolution = Resolution {
            cancelled: cancel.is_cancelled(),
            ..Default::default()
        };
        for (name, version) in results {
            match version {
                Some(version) => resolution
                    .resolved
                    .push(ResolvedDependency::new(name.as_str(), version)),
                None => resolution.unresolved.push(name),
            }
        }
        resolution.resolved.sort();
        resolution.unresolved.sort();
        resolution
    }
}
