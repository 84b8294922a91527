//! Integration tests for the skillet CLI.
//!
//! Each test runs the real binary against a temp fixture tree with an
//! isolated SKILLET_HOME, so no per-user state leaks between tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write_skill(dir: &Path, name: &str, description: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {name}\ndescription: {description}\n---\nInstructions.\n"),
    )
    .unwrap();
}

fn skillet(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skillet").unwrap();
    cmd.env("SKILLET_HOME", home);
    cmd
}

#[test]
fn add_with_skill_filter_installs_only_the_match() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("skill-one"), "skill-one", "First skill");
    write_skill(&source.join("skill-two"), "skill-two", "Second skill");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .args(["--skill", "skill-one"])
        .assert()
        .success();

    assert!(target.join("skill-one/SKILL.md").exists());
    assert!(!target.join("skill-two").exists());

    // Exactly one lock entry, keyed by the installed name, version 3.
    let lock: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("skills-lock.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(lock["version"], 3);
    let skills = lock["skills"].as_object().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills["skill-one"]["sourceType"], "local");
}

#[test]
fn add_without_selection_fails_when_multiple_skills_exist() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("skill-one"), "skill-one", "First skill");
    write_skill(&source.join("skill-two"), "skill-two", "Second skill");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", tmp.path().join("skills").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skill-one"));

    // --all accepts everything.
    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", tmp.path().join("skills").to_str().unwrap()])
        .arg("--all")
        .assert()
        .success();
    assert!(tmp.path().join("skills/skill-one/SKILL.md").exists());
    assert!(tmp.path().join("skills/skill-two/SKILL.md").exists());
}

#[test]
fn list_mode_installs_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("skill-one"), "skill-one", "First skill");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("skill-one"));

    assert!(!target.exists());
    assert!(!tmp.path().join("skills-lock.json").exists());
}

#[test]
fn install_names_are_sanitized() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("loud"), "My Cool Skill!", "Shouts a lot");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();

    assert!(target.join("my-cool-skill/SKILL.md").exists());
}

#[test]
fn explicit_skill_filter_surfaces_internal_skills() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    fs::create_dir_all(source.join("int")).unwrap();
    fs::write(
        source.join("int/SKILL.md"),
        "---\nname: int-skill\ndescription: Hidden helper\nmetadata:\n  internal: true\n---\nBody.\n",
    )
    .unwrap();
    let target = tmp.path().join("skills");

    // Without a name filter the internal skill stays invisible.
    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no skills found"));

    // Naming it explicitly installs it, which is also the path `skillet
    // update` takes when reinstalling.
    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .args(["--skill", "int-skill"])
        .assert()
        .success();
    assert!(target.join("int-skill/SKILL.md").exists());
}

#[test]
fn root_manifest_wins_at_default_depth() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source, "root-skill", "The whole repo is one skill");
    write_skill(&source.join("nested"), "nested-skill", "Hidden at depth");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();

    assert!(target.join("root-skill/SKILL.md").exists());
    assert!(!target.join("nested-skill").exists());
}

#[test]
fn reinstall_replaces_prior_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("tool"), "tool", "A tool skill");
    fs::write(source.join("tool/old-notes.md"), "stale").unwrap();
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();
    assert!(target.join("tool/old-notes.md").exists());

    fs::remove_file(source.join("tool/old-notes.md")).unwrap();
    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();
    assert!(!target.join("tool/old-notes.md").exists());
}

#[test]
fn remove_unknown_name_is_a_successful_noop() {
    let tmp = tempfile::tempdir().unwrap();
    skillet(tmp.path())
        .args(["remove", "not-installed"])
        .args(["--dir", tmp.path().join("skills").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching skills"));
}

#[test]
fn remove_deletes_directory_and_lock_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("tool"), "tool", "A tool skill");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();

    skillet(tmp.path())
        .args(["remove", "tool"])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();

    assert!(!target.join("tool").exists());
    let lock: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("skills-lock.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(lock["skills"].as_object().unwrap().len(), 0);
}

#[test]
fn outdated_lock_schema_is_treated_as_absent() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("skills-lock.json"),
        r#"{"version":1,"skills":{"ghost":{"source":"s","sourceType":"github","sourceUrl":"u","installedAt":"t","updatedAt":"t"}}}"#,
    )
    .unwrap();

    // The stale entry is invisible: nothing is tracked, nothing to check.
    skillet(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No skills tracked"));
}

#[test]
fn unparseable_source_fails_with_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    skillet(tmp.path())
        .args(["add", "definitely not a source"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized source"));
}

#[test]
fn list_shows_installed_skills() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("source");
    write_skill(&source.join("tool"), "tool", "A tool skill");
    let target = tmp.path().join("skills");

    skillet(tmp.path())
        .args(["add", source.to_str().unwrap()])
        .args(["--dir", target.to_str().unwrap()])
        .assert()
        .success();

    skillet(tmp.path())
        .args(["list", "--dir", target.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("tool"));
}
