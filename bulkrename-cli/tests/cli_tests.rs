use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn bulkrename(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bulkrename").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    cmd
}

fn props() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("props/chair.mesh").write_str("chair").unwrap();
    temp_dir.child("props/table.mesh").write_str("table").unwrap();
    temp_dir
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("bulkrename").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bulk rename assets, folders and objects"));
}

#[test]
fn test_version_subcommand() {
    let mut cmd = Command::cargo_bin("bulkrename").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bulkrename 0.1.0"));
}

#[test]
fn test_version_subcommand_json() {
    let mut cmd = Command::cargo_bin("bulkrename").unwrap();
    cmd.args(["version", "--output", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r#"\{"name":"bulkrename","version":"0\.1\.0"\}"#).unwrap(),
        );
}

#[test]
fn test_preview_does_not_rename() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args([
            "preview",
            "props/chair.mesh",
            "props/table.mesh",
            "--prefix",
            "SM_",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("<a>SM_</>chair"))
        .stdout(predicate::str::contains("2 to rename"));

    temp_dir.child("props/chair.mesh").assert(predicate::path::exists());
    temp_dir
        .child("props/SM_chair.mesh")
        .assert(predicate::path::missing());
}

#[test]
fn test_preview_json_reports_statuses() {
    let temp_dir = props();
    let output = bulkrename(&temp_dir)
        .args([
            "preview",
            "props/chair.mesh",
            "--name",
            "0=table",
            "--output",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["operation"], "preview");
    assert_eq!(json["can_commit"], false);
    assert_eq!(json["summary"]["duplicated"], 1);
    assert_eq!(json["rows"][0]["status"], "duplicated");
}

#[test]
fn test_apply_renames_files() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args([
            "apply",
            "props/chair.mesh",
            "props/table.mesh",
            "--search",
            "a",
            "--replace",
            "o",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 2 asset(s)"))
        .stdout(predicate::str::contains("props/chair.mesh -> props/choir.mesh"));

    temp_dir.child("props/choir.mesh").assert("chair");
    temp_dir.child("props/toble.mesh").assert("table");
    temp_dir
        .child("props/chair.mesh")
        .assert(predicate::path::missing());
}

#[test]
fn test_apply_folder_with_directory_flag() {
    let temp_dir = props();
    let mut cmd = Command::cargo_bin("bulkrename").unwrap();
    cmd.arg("-C")
        .arg(temp_dir.path())
        .args([
            "apply",
            "props",
            "--kind",
            "folder",
            "--suffix",
            "_old",
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    temp_dir
        .child("props_old/chair.mesh")
        .assert(predicate::path::exists());
}

#[test]
fn test_apply_refuses_duplicates() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args(["apply", "props/chair.mesh", "--name", "0=table"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot rename"));

    temp_dir.child("props/chair.mesh").assert("chair");
}

#[test]
fn test_apply_missing_item() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args(["apply", "props/sofa.mesh", "--prefix", "SM_"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Item not found: props/sofa.mesh"));
}

#[test]
fn test_preview_invalid_regex() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args(["preview", "props/chair.mesh", "--search", "(", "--regex"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid search pattern"));
}

#[test]
fn test_apply_vcs_needs_config() {
    let temp_dir = props();
    bulkrename(&temp_dir)
        .args(["apply", "props/chair.mesh", "--prefix", "SM_", "--vcs"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Version control is not enabled"));

    temp_dir.child("props/chair.mesh").assert("chair");
}

#[test]
fn test_apply_objects_json() {
    let temp_dir = TempDir::new().unwrap();
    let output = bulkrename(&temp_dir)
        .args([
            "apply",
            "Light.001",
            "Light.002",
            "--kind",
            "object",
            "--search",
            "light",
            "--replace",
            "Lamp",
            "-i",
            "--output",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["vcs"], false);
    assert_eq!(json["renamed"][0]["to"], "Lamp.001");
    assert_eq!(json["renamed"][1]["to"], "Lamp.002");
}

#[test]
fn test_relink_with_nothing_pending() {
    let temp_dir = TempDir::new().unwrap();
    bulkrename(&temp_dir)
        .arg("relink")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending history moves"));
}
