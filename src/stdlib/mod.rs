mod known;

pub use known::KNOWN_STDLIB_MODULES;

use crate::parse::ImportName;
use crate::process::Invocation;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

const PROBE_SCRIPT: &str = "import sys; \
names = set(getattr(sys, 'stdlib_module_names', ())) | set(sys.builtin_module_names); \
print('\\n'.join(sorted(names)))";

/// Asks a Python interpreter which modules its base installation provides.
#[derive(Debug, Clone)]
pub struct InterpreterProbe {
    pub interpreter: PathBuf,
    pub timeout: Duration,
}

impl InterpreterProbe {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    /// Module names reported by the interpreter, or None when it cannot be
    /// run or exits unsuccessfully.
    pub fn module_names(&self) -> Option<Vec<String>> {
        let finished = Invocation::new(&self.interpreter, self.timeout)
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .run()
            .map_err(|e| tracing::debug!("stdlib probe failed: {e}"))
            .ok()?;

        if !finished.status.success() {
            tracing::debug!(
                "stdlib probe exited with {}: {}",
                finished.status,
                finished.stderr.trim()
            );
            return None;
        }

        Some(
            finished
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.contains('.'))
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Module names that belong to the base Python distribution.
///
/// Built once per run and passed by reference; there is no mutation path
/// after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardLibrarySet {
    names: BTreeSet<String>,
}

impl StandardLibrarySet {
    /// The built-in list, extended with whatever `probe` reports.
    pub fn compute(probe: Option<&InterpreterProbe>) -> Self {
        let mut set = Self::builtin();
        if let Some(probe) = probe {
            match probe.module_names() {
                Some(names) => {
                    let before = set.len();
                    set.names.extend(names);
                    tracing::debug!(
                        "stdlib probe via {} added {} names",
                        probe.interpreter.display(),
                        set.len() - before
                    );
                }
                None => tracing::debug!("using built-in stdlib list only"),
            }
        }
        set
    }

    pub fn builtin() -> Self {
        Self::from_names(KNOWN_STDLIB_MODULES.iter().copied())
    }

    /// Nothing is excluded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &ImportName) -> bool {
        self.names.contains(name.as_str())
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
