#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn docbuild(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docbuild").unwrap();
    cmd.current_dir(dir.path())
        .env("DOCBUILD_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    docbuild(dir)
        .args(["init", "--metadata", "meta.xml", "--assembly", "app.dll"])
        .assert()
        .success();
}

#[cfg(unix)]
fn stub_tool(dir: &TempDir, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.path().join("build.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// docbuild init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let content = std::fs::read_to_string(dir.path().join("docbuild.yaml")).unwrap();
    assert!(content.contains("metadata: meta.xml"));
    assert!(content.contains("assembly: app.dll"));
    assert!(content.contains("MSBuild.exe"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docbuild(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    docbuild(&dir)
        .args(["init", "--force", "--metadata", "other.xml", "--assembly", "other.dll"])
        .assert()
        .success();
    let content = std::fs::read_to_string(dir.path().join("docbuild.yaml")).unwrap();
    assert!(content.contains("other.xml"));
}

// ---------------------------------------------------------------------------
// docbuild generate
// ---------------------------------------------------------------------------

#[test]
fn generate_requires_init() {
    let dir = TempDir::new().unwrap();
    docbuild(&dir)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn generate_writes_descriptor() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docbuild(&dir)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documentation.shfbproj"))
        .stdout(predicate::str::contains("ProjectGuid"));

    let xml = std::fs::read_to_string(dir.path().join("Documentation.shfbproj")).unwrap();
    assert!(xml.contains(r#"<DocumentationSource sourceFile="meta.xml" />"#));
    assert!(xml.contains(r#"<DocumentationSource sourceFile="app.dll" />"#));
    assert!(xml.contains("<HelpFileFormat>HtmlHelp1</HelpFileFormat>"));
}

#[test]
fn generate_overrides_sources() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docbuild(&dir)
        .args(["generate", "--assembly", "lib/Other.dll"])
        .assert()
        .success();

    let xml = std::fs::read_to_string(dir.path().join("Documentation.shfbproj")).unwrap();
    assert!(xml.contains(r#"sourceFile="meta.xml""#));
    assert!(xml.contains(r#"sourceFile="lib/Other.dll""#));
    assert!(!xml.contains("app.dll"));
}

#[test]
fn generate_json_reports_new_guid_each_time() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let guid = || {
        let out = docbuild(&dir).args(["generate", "--json"]).output().unwrap();
        assert!(out.status.success());
        let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        v["project_guid"].as_str().unwrap().to_string()
    };
    assert_ne!(guid(), guid());
}

#[test]
fn generate_rejects_empty_sources() {
    let dir = TempDir::new().unwrap();
    docbuild(&dir).arg("init").assert().success();
    docbuild(&dir)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sources.metadata is empty"));
}

// ---------------------------------------------------------------------------
// docbuild config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    docbuild(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    docbuild(&dir).arg("init").assert().success();
    docbuild(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] sources.assembly is empty"));
}

#[test]
fn config_show_json() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let out = docbuild(&dir)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["sources"]["metadata"], "meta.xml");
    assert_eq!(v["descriptor"]["language"], "ru-RU");
}

// ---------------------------------------------------------------------------
// docbuild build
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn build_runs_tool_against_descriptor() {
    let dir = TempDir::new().unwrap();
    let tool = stub_tool(&dir, "cp \"$1\" built-from.xml");
    docbuild(&dir)
        .args(["init", "--metadata", "meta.xml", "--assembly", "app.dll", "--tool", &tool])
        .assert()
        .success();

    docbuild(&dir)
        .args(["build", "--no-open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exit"));

    let built = std::fs::read_to_string(dir.path().join("built-from.xml")).unwrap();
    assert!(built.contains(r#"sourceFile="meta.xml""#));
}

#[cfg(unix)]
#[test]
fn build_failure_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let tool = stub_tool(&dir, "exit 4");
    docbuild(&dir)
        .args(["init", "--metadata", "meta.xml", "--assembly", "app.dll", "--tool", &tool])
        .assert()
        .success();

    docbuild(&dir)
        .args(["build", "--no-open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("build tool exited with status 4"));
}

#[cfg(unix)]
#[test]
fn build_failure_without_artifact_reports_exit_status() {
    let dir = TempDir::new().unwrap();
    let tool = stub_tool(&dir, "exit 4");
    docbuild(&dir)
        .args(["init", "--metadata", "meta.xml", "--assembly", "app.dll", "--tool", &tool])
        .assert()
        .success();

    // Opening stays enabled; the failed build leaves no Help/Documentation.chm.
    docbuild(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("build tool exited with status 4"))
        .stderr(predicate::str::contains("artifact not found").not());
}

#[test]
fn build_with_missing_tool_fails() {
    let dir = TempDir::new().unwrap();
    docbuild(&dir)
        .args([
            "init",
            "--metadata",
            "meta.xml",
            "--assembly",
            "app.dll",
            "--tool",
            "docbuild-no-such-build-tool",
        ])
        .assert()
        .success();

    docbuild(&dir)
        .args(["build", "--no-open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("build tool not found"));
    // The descriptor is still written before the launch fails.
    assert!(dir.path().join("Documentation.shfbproj").exists());
}
