use crate::errors::{ReqpinError, Result};
use crate::resolve::ResolvedDependency;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default manifest file name.
pub const MANIFEST_FILE_NAME: &str = "requirements.txt";

/// What to do when the target manifest already exists.
pub enum OverwritePolicy {
    Always,
    Never,
    /// Called with the existing target path; `true` means overwrite.
    Ask(Box<dyn Fn(&Path) -> bool>),
}

impl std::fmt::Debug for OverwritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverwritePolicy::Always => write!(f, "Always"),
            OverwritePolicy::Never => write!(f, "Never"),
            OverwritePolicy::Ask(_) => write!(f, "Ask(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, count: usize },
    /// The target exists and overwriting was refused. The file is untouched.
    Declined { path: PathBuf },
    /// No dependencies were given; nothing is written.
    Empty,
}

/// Render `name==version` lines sorted by name, newline terminated.
pub fn render_manifest(deps: &[ResolvedDependency]) -> String {
    let mut sorted: Vec<&ResolvedDependency> = deps.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut out = String::new();
    for dep in sorted {
        out.push_str(&dep.name);
        out.push_str("==");
        out.push_str(&dep.version);
        out.push('\n');
    }
    out
}

/// Parse `name==version` lines back into dependencies.
///
/// Blank lines and `#` comments are skipped, as are lines without a pin.
pub fn parse_manifest(text: &str) -> Vec<ResolvedDependency> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once("=="))
        .map(|(name, version)| ResolvedDependency::new(name.trim(), version.trim()))
        .filter(|d| !d.name.is_empty() && !d.version.is_empty())
        .collect()
}

/// Write `deps` to `target`.
///
/// The content goes to a temporary file in the target directory which is
/// then renamed over `target`. A failed write leaves any previous manifest
/// in place and never a truncated one.
pub fn write_manifest(
    deps: &[ResolvedDependency],
    target: &Path,
    policy: &OverwritePolicy,
) -> Result<WriteOutcome> {
    if deps.is_empty() {
        return Ok(WriteOutcome::Empty);
    }

    if target.exists() {
        let overwrite = match policy {
            OverwritePolicy::Always => true,
            OverwritePolicy::Never => false,
            OverwritePolicy::Ask(confirm) => confirm(target),
        };
        if !overwrite {
            tracing::info!("not overwriting existing {}", target.display());
            return Ok(WriteOutcome::Declined {
                path: target.to_path_buf(),
            });
        }
    }

    let content = render_manifest(deps);
    let count = content.lines().count();
    atomic_write(target, content.as_bytes()).map_err(|source| ReqpinError::Write {
        path: target.to_path_buf(),
        source,
    })?;

    tracing::debug!("wrote {count} pins to {}", target.display());
    Ok(WriteOutcome::Written {
        path: target.to_path_buf(),
        count,
    })
}

fn atomic_write(target: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".reqpin-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;

    let permissions = match std::fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<std::fs::Permissions> {
    None
}
