// ABOUTME: Integration tests for the ecrbuildpush CLI commands.
// ABOUTME: Validates --help, init, and the offline plan and status commands.

use assert_cmd::Command;
use ecrbuildpush::fingerprint::Fingerprint;
use ecrbuildpush::reconcile::{DesiredImageSpec, ResourceState};
use ecrbuildpush::registry::ImageManifest;
use ecrbuildpush::store::{StateFile, StateStore};
use ecrbuildpush::types::{ImageName, ImageTag, Region, RepositoryName};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const DOCKERFILE: &str = "FROM alpine:3.20\n";

fn ecrbuildpush_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ecrbuildpush"))
}

fn write_project(dir: &Path, tag: &str) {
    fs::write(
        dir.join("ecrbuildpush.yml"),
        format!(
            r#"region: eu-central-1
resources:
  - name: web
    repository: repo-1
    image_name: myapp
    image_tag: {tag}
"#
        ),
    )
    .unwrap();
    fs::write(dir.join("Dockerfile"), DOCKERFILE).unwrap();
}

fn record_applied(dir: &Path, tag: &str, dockerfile: &str) {
    let mut state = StateFile::default();
    state.record(
        "web",
        Region::new("eu-central-1").unwrap(),
        DesiredImageSpec {
            repository: RepositoryName::new("repo-1").unwrap(),
            build_context: dir.to_path_buf(),
            image_name: ImageName::new("myapp").unwrap(),
            image_tag: ImageTag::new(tag).unwrap(),
        },
        ResourceState {
            id: ImageManifest::new(r#"{"schemaVersion":2}"#),
            content_fingerprint: Fingerprint::of_bytes(dockerfile.as_bytes()),
        },
    );
    StateStore::new(dir).save(&state).unwrap();
}

#[test]
fn help_shows_commands() {
    ecrbuildpush_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("destroy"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("ecrbuildpush.yml");

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--repository", "repo-1", "--tag", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ecrbuildpush.yml"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("repository: repo-1"));
    assert!(content.contains("image_tag: v1"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("ecrbuildpush.yml"), "existing: config").unwrap();

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn plan_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn plan_shows_create_for_unrecorded_resource() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("web: create"));
}

#[test]
fn plan_shows_no_changes_when_in_sync() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("web: no changes"));
}

#[test]
fn plan_shows_retag_when_tag_changes() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v2");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("web: retag v1 -> v2"));
}

#[test]
fn plan_json_reports_rebuild_as_replaced_in_place() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", "FROM alpine:3.19\n");

    let assert = ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "plan"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let line: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(line["resource"], "web");
    assert_eq!(line["action"], "rebuild");
    assert_eq!(line["replaced_in_place"][0], "content_fingerprint");
}

#[test]
fn plan_shows_replace_when_resource_region_changes() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);
    let config = fs::read_to_string(temp_dir.path().join("ecrbuildpush.yml")).unwrap();
    fs::write(
        temp_dir.path().join("ecrbuildpush.yml"),
        config.replace("    repository: repo-1\n", "    repository: repo-1\n    region: us-west-2\n"),
    )
    .unwrap();

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "web: replace (region eu-central-1 -> us-west-2)",
        ));
}

#[test]
fn status_shows_not_created() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("web: not created"));
}

#[test]
fn status_shows_recorded_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("web: repo-1:v1 (sha256:"));
}

#[test]
fn status_json_includes_region() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);

    let assert = ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "status"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let line: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(line["region"], "eu-central-1");
    assert_eq!(line["created"], true);
}

#[test]
fn hand_edited_fingerprint_is_reported_as_corrupt_state() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    record_applied(temp_dir.path(), "v1", DOCKERFILE);
    let path = temp_dir.path().join(".ecrbuildpush/state.json");
    let fingerprint = Fingerprint::of_bytes(DOCKERFILE.as_bytes());
    let saved = fs::read_to_string(&path).unwrap();
    fs::write(&path, saved.replace(fingerprint.as_str(), &"ü".repeat(32))).unwrap();

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt state file"));
}

#[test]
fn corrupt_state_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");
    fs::create_dir(temp_dir.path().join(".ecrbuildpush")).unwrap();
    fs::write(temp_dir.path().join(".ecrbuildpush/state.json"), "{not json").unwrap();

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt state file"));
}

#[test]
fn unknown_resource_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), "v1");

    ecrbuildpush_cmd()
        .current_dir(temp_dir.path())
        .args(["destroy", "--resource", "db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource: db"));
}
