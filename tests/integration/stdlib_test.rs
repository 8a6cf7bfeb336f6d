use crate::common::reqpin;
use predicates::prelude::*;

#[test]
fn lists_builtin_names() {
    let home = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .current_dir(home.path())
        .args(["stdlib", "--no-stdlib-probe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\nos\n"))
        .stdout(predicate::str::contains("\nsys\n"))
        .stdout(predicate::str::contains("\nrequests\n").not());
}

#[test]
fn json_listing() {
    let home = tempfile::tempdir().unwrap();

    let output = reqpin(home.path())
        .current_dir(home.path())
        .args(["stdlib", "--no-stdlib-probe", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(names.contains(&"collections".to_string()));
    assert!(names.windows(2).all(|w| w[0] < w[1]));
}

#[cfg(unix)]
#[test]
fn unusable_interpreter_falls_back_to_builtin() {
    let home = tempfile::tempdir().unwrap();

    reqpin(home.path())
        .current_dir(home.path())
        .args(["stdlib", "--python", "/nonexistent/python3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\njson\n"));
}
