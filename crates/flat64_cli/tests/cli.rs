//! End-to-end checks for the flat64 binary.

use assert_cmd::cargo::cargo_bin_cmd;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::path::{Path, PathBuf};

#[test]
fn help_lists_the_conversion_options() {
    let mut cmd = cargo_bin_cmd!("flat64");
    let output = cmd
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("--skip-until"), "help missing --skip-until");
    assert!(text.contains("--max-entries"), "help missing --max-entries");
    assert!(
        text.contains("--on-tool-error"),
        "help missing --on-tool-error"
    );
}

#[test]
fn missing_tools_fail_the_preflight() {
    let empty = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("flat64");
    cmd.env("PATH", empty.path())
        .arg("src")
        .arg("dst")
        .assert()
        .failure()
        .stderr(predicates::str::contains("required tools not found"));
}

#[cfg(unix)]
fn write_stub(dir: &Path, name: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
fn stub_bin_dir(root: &Path) -> PathBuf {
    let bin = root.join("bin");
    fs::create_dir(&bin).unwrap();
    for tool in ["unzip", "unrar", "gzip", "tar", "cbmconvert", "zip2disk"] {
        write_stub(&bin, tool);
    }
    bin
}

#[cfg(unix)]
#[test]
fn converts_a_plain_tree() {
    let temp = tempfile::tempdir().unwrap();
    let bin = stub_bin_dir(temp.path());

    let src = temp.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("GAME.PRG"), b"payload").unwrap();
    let dst = temp.path().join("dst");
    let scratch = temp.path().join("scratch");

    let mut cmd = cargo_bin_cmd!("flat64");
    let output = cmd
        .env("PATH", &bin)
        .arg(&src)
        .arg(&dst)
        .arg("-y")
        .arg("-e")
        .arg("ignore")
        .arg("-t")
        .arg(&scratch)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);

    assert!(dst.join("game.prg").is_file(), "payload not converted");
    assert!(text.contains("Saved files"), "summary missing from stdout");
}

#[cfg(unix)]
#[test]
fn missing_resume_point_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let bin = stub_bin_dir(temp.path());
    let src = temp.path().join("src");
    fs::create_dir(&src).unwrap();

    let mut cmd = cargo_bin_cmd!("flat64");
    cmd.env("PATH", &bin)
        .arg(&src)
        .arg(temp.path().join("dst"))
        .arg("-y")
        .arg("-s")
        .arg(src.join("ghost.prg"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("resume point"));
}
