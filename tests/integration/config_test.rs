use crate::common::{reqpin, write};
use predicates::prelude::*;

#[test]
fn config_show_defaults() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .args(["config", "show", "--path", project.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded config files: (none)"))
        .stdout(predicate::str::contains("Resolved settings (0 of 12 overridden):"))
        .stdout(predicate::str::contains("defaults.format: text <- default"))
        .stdout(predicate::str::contains("defaults.jobs: 1 <- default"))
        .stdout(predicate::str::contains("resolver.timeout_secs: 30 <- default"))
        .stdout(predicate::str::contains("analysis.exclude_local: true <- default"));
}

#[test]
fn config_show_with_project_config() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    write(
        project.path(),
        ".reqpin.toml",
        r#"
[defaults]
format = "json"

[resolver]
timeout_secs = 7

[analysis]
ignore_modules = ["setuptools"]
"#,
    );

    reqpin(home.path())
        .args(["config", "show", "--path", project.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(".reqpin.toml"))
        .stdout(predicate::str::contains("defaults.format: json <- project config"))
        .stdout(predicate::str::contains("resolver.timeout_secs: 7 <- project config"))
        .stdout(predicate::str::contains(
            "analysis.ignore_modules: [\"setuptools\"] <- project config",
        ));
}

#[test]
fn config_show_with_user_config() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    write(
        home.path(),
        ".config/reqpin/config.toml",
        "[defaults]\njobs = 4\n",
    );

    reqpin(home.path())
        .args(["config", "show", "--path", project.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults.jobs: 4 <- user config"));
}

#[test]
fn env_var_shows_as_source() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .env("REQPIN_PYTHON", "/opt/python")
        .args(["config", "show", "--path", project.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "resolver.python: /opt/python <- env var (REQPIN_PYTHON)",
        ));
}

#[test]
fn config_show_section() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .args([
            "config",
            "show",
            "--section",
            "targeting",
            "--path",
            project.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[targeting]"))
        .stdout(predicate::str::contains("targeting.respect_gitignore: true"))
        .stdout(predicate::str::contains("defaults.format").not());
}

#[test]
fn invalid_config_fails() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    write(project.path(), ".reqpin.toml", "[resolver]\ninterpreter = \"py\"\n");

    reqpin(home.path())
        .args(["config", "show", "--path", project.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project config"));
}
