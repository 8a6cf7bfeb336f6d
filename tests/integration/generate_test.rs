use crate::common::{reqpin, write};
use predicates::prelude::*;
use std::fs;

#[test]
fn invalid_directory_fails() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("missing");

    reqpin(home.path())
        .args(["dir", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reqpin::invalid_path"));
}

#[test]
fn file_workflow_rejects_directory() {
    let home = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .args(["file", home.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reqpin::invalid_path"));
}

#[test]
fn empty_directory_reports_no_sources() {
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .args(["dir", project.path().to_str().unwrap(), "--no-stdlib-probe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No source files found under"));
    assert!(!project.path().join("requirements.txt").exists());
}

#[cfg(unix)]
mod with_interpreter {
    use super::*;
    use crate::common::fake_python;

    struct Setup {
        home: tempfile::TempDir,
        project: tempfile::TempDir,
        python: std::path::PathBuf,
    }

    fn setup() -> Setup {
        let home = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let python = fake_python(home.path());
        Setup {
            home,
            project,
            python,
        }
    }

    impl Setup {
        fn cmd(&self, args: &[&str]) -> assert_cmd::Command {
            let mut cmd = reqpin(self.home.path());
            cmd.args(args)
                .arg("--python")
                .arg(&self.python)
                .arg("--timeout")
                .arg("10");
            cmd
        }

        fn dir(&self) -> &str {
            self.project.path().to_str().unwrap()
        }

        fn manifest(&self) -> std::path::PathBuf {
            self.project.path().join("requirements.txt")
        }
    }

    #[test]
    fn invalid_path_is_rejected_before_interpreter_runs() {
        use std::os::unix::fs::PermissionsExt;

        let s = setup();
        let marker = s.home.path().join("ran");
        let python = s.home.path().join("recording-python");
        fs::write(
            &python,
            format!("#!/bin/sh\ntouch '{}'\nexit 0\n", marker.display()),
        )
        .unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();
        let missing = s.project.path().join("missing");

        reqpin(s.home.path())
            .args(["dir", missing.to_str().unwrap(), "--python"])
            .arg(&python)
            .assert()
            .failure()
            .stderr(predicate::str::contains("reqpin::invalid_path"));
        assert!(!marker.exists());
    }

    #[test]
    fn directory_with_one_third_party_import() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\nimport os\n");

        s.cmd(&["dir", s.dir()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote 1 pin to"));
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn single_file_with_mixed_imports() {
        let s = setup();
        let file = write(
            s.project.path(),
            "service.py",
            "import json\nfrom flask import Flask\nimport requests.adapters\n",
        );

        s.cmd(&["file", file.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("flask==3.0.0"));
        assert_eq!(
            fs::read_to_string(s.manifest()).unwrap(),
            "flask==3.0.0\nrequests==2.31.0\n"
        );
    }

    #[test]
    fn unparsable_file_is_a_warning() {
        let s = setup();
        write(s.project.path(), "good.py", "import requests\n");
        write(s.project.path(), "bad.py", "def broken(:\n");

        s.cmd(&["dir", s.dir()])
            .assert()
            .success()
            .stdout(predicate::str::contains("could not parse"))
            .stdout(predicate::str::contains("bad.py"))
            .stdout(predicate::str::contains("Parsed:     1 files (1 failed)"));
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn only_stdlib_imports_write_nothing() {
        let s = setup();
        write(s.project.path(), "tool.py", "import os\nimport sys\nfrom pathlib import Path\n");

        s.cmd(&["dir", s.dir()])
            .assert()
            .success()
            .stdout(predicate::str::contains("No third-party dependencies to pin"));
        assert!(!s.manifest().exists());
    }

    #[test]
    fn existing_manifest_is_kept_without_force() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");
        fs::write(s.manifest(), "old==1.0\n").unwrap();

        s.cmd(&["dir", s.dir()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Kept existing"));
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "old==1.0\n");
    }

    #[test]
    fn force_overwrites_existing_manifest() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");
        fs::write(s.manifest(), "old==1.0\n").unwrap();

        s.cmd(&["dir", s.dir(), "--force"]).assert().success();
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn unresolved_names_are_reported() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\nimport notinstalled\n");

        s.cmd(&["dir", s.dir()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "could not find an installed version for notinstalled",
            ));
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn dry_run_prints_manifest() {
        let s = setup();
        write(s.project.path(), "app.py", "import flask\nimport requests\n");

        s.cmd(&["dir", s.dir(), "--dry-run"])
            .assert()
            .success()
            .stdout("flask==3.0.0\nrequests==2.31.0\n")
            .stderr(predicate::str::contains("Dry run: manifest not written"));
        assert!(!s.manifest().exists());
    }

    #[test]
    fn explicit_output_path() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");
        let out = s.home.path().join("pins.txt");

        s.cmd(&["dir", s.dir(), "--output", out.to_str().unwrap()])
            .assert()
            .success();
        assert_eq!(fs::read_to_string(&out).unwrap(), "requests==2.31.0\n");
        assert!(!s.manifest().exists());
    }

    #[test]
    fn json_report() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\nimport missingpkg\n");

        let output = s.cmd(&["dir", s.dir(), "--format", "json", "--jobs", "2"]).output().unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["outcome"]["status"], "written");
        assert_eq!(value["outcome"]["count"], 1);
        assert_eq!(value["dependencies"][0]["name"], "requests");
        assert_eq!(value["warnings"][0]["kind"], "unresolved_dependency");
        assert_eq!(value["warnings"][0]["name"], "missingpkg");
    }

    #[test]
    fn ignore_flag_and_local_modules_are_not_pinned() {
        let s = setup();
        write(
            s.project.path(),
            "app.py",
            "import requests\nimport flask\nimport helpers\n",
        );
        write(s.project.path(), "helpers.py", "import os\n");

        s.cmd(&["dir", s.dir(), "--ignore", "flask"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Candidates: 1"));
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn project_config_output_is_relative_to_project() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");
        write(
            s.project.path(),
            ".reqpin.toml",
            "[defaults]\noutput = \"requirements/base.txt\"\n",
        );
        fs::create_dir(s.project.path().join("requirements")).unwrap();

        s.cmd(&["dir", s.dir()]).assert().success();
        assert_eq!(
            fs::read_to_string(s.project.path().join("requirements/base.txt")).unwrap(),
            "requests==2.31.0\n"
        );
    }

    #[test]
    fn reqpinignore_excludes_files() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");
        write(s.project.path(), "venv/lib/site.py", "import flask\n");
        write(s.project.path(), ".reqpinignore", "venv/**\n");

        s.cmd(&["dir", s.dir()]).assert().success();
        assert_eq!(fs::read_to_string(s.manifest()).unwrap(), "requests==2.31.0\n");
    }

    #[test]
    fn quiet_prints_only_outcome() {
        let s = setup();
        write(s.project.path(), "app.py", "import requests\n");

        s.cmd(&["dir", s.dir(), "--quiet"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Wrote 1 pin to"))
            .stdout(predicate::str::contains("Source:").not());
    }
}
