use assert_cmd::Command;
use std::path::{Path, PathBuf};

/// A `reqpin` command isolated from the caller's config and environment.
pub fn reqpin(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reqpin").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    for var in [
        "REQPIN_FORMAT",
        "REQPIN_QUIET",
        "REQPIN_JOBS",
        "REQPIN_PYTHON",
        "REQPIN_TIMEOUT",
        "REQPIN_EXCLUDE",
        "REQPIN_IGNORE_MODULES",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write an interpreter stand-in that answers `-c` probes with nothing and
/// `-m pip show` for `requests` and `flask` only.
#[cfg(unix)]
pub fn fake_python(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("python");
    std::fs::write(
        &path,
        r#"#!/bin/sh
if [ "$1" = "-c" ]; then
  exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ] && [ "$3" = "show" ]; then
  case "$4" in
    requests) printf 'Name: requests\nVersion: 2.31.0\nSummary: HTTP\n' ;;
    flask) printf 'Name: Flask\nVersion: 3.0.0\n' ;;
    *) echo "WARNING: Package(s) not found: $4" >&2; exit 1 ;;
  esac
  exit 0
fi
exit 2
"#,
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
