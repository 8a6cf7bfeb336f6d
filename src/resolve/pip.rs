use crate::process::{Invocation, RunError};
use crate::resolve::VersionLookup;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Looks versions up with `<python> -m pip show <name>`.
#[derive(Debug)]
pub struct PipLookup {
    interpreter: PathBuf,
    timeout: Duration,
    reported_unavailable: AtomicBool,
}

impl PipLookup {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
            reported_unavailable: AtomicBool::new(false),
        }
    }

    fn invocation(&self, name: &str) -> Invocation {
        Invocation::new(&self.interpreter, self.timeout)
            .arg("-m")
            .arg("pip")
            .arg("show")
            .arg(name)
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1")
            .env("PIP_NO_INPUT", "1")
            .env("PYTHONIOENCODING", "utf-8")
    }
}

impl VersionLookup for PipLookup {
    fn installed_version(&self, name: &str) -> Option<String> {
        let finished = match self.invocation(name).run() {
            Ok(finished) => finished,
            Err(err @ RunError::Spawn { .. }) => {
                if !self.reported_unavailable.swap(true, Ordering::Relaxed) {
                    tracing::warn!("package manager unavailable, no versions can be resolved: {err}");
                }
                return None;
            }
            Err(err) => {
                tracing::debug!("pip show {name}: {err}");
                return None;
            }
        };

        if !finished.status.success() {
            tracing::debug!("pip show {name} exited with {}", finished.status);
            return None;
        }

        let version = parse_show_version(&finished.stdout);
        if version.is_none() {
            tracing::debug!("pip show {name}: no Version field in output");
        }
        version
    }
}

/// Read the `Version:` field from `pip show` output.
pub fn parse_show_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
