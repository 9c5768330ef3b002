// tests/integration_test.rs
use std::process::Command;

fn gitflow_build() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gitflow-build"))
}

#[test]
fn test_gitflow_build_help() {
    let output = gitflow_build()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("gitflow-build"));
    assert!(stdout.contains("Run gitflow release and hotfix workflows around a build"));
    for command in [
        "start-release",
        "test-release",
        "publish-release",
        "finish-release",
        "start-hotfix",
        "test-hotfix",
        "publish-hotfix",
        "finish-hotfix",
        "branches",
    ] {
        assert!(stdout.contains(command), "missing subcommand {}", command);
    }
}

#[test]
fn test_gitflow_build_version() {
    let output = gitflow_build()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_is_required() {
    let output = gitflow_build().output().expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = gitflow_build()
        .args(["--config", "missing.toml", "build"])
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}
