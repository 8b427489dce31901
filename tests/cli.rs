use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn writes_document_to_given_output() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("app");
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("main.py"), "'''Application entry point.'''\n").unwrap();
    fs::write(root.join("lib/helpers.php"), "<?php\n// after the tag\n").unwrap();

    let output_file = temp_dir.path().join("app.md");

    Command::cargo_bin("dirdoc")
        .unwrap()
        .arg(&root)
        .arg(&output_file)
        .assert()
        .success();

    let output = fs::read_to_string(&output_file).unwrap();
    assert!(output.starts_with("# Project Structure\n\n- **🗀  app/**\n"));
    assert!(output.contains("        - 🗋  helpers.php\n"));
    assert!(output.contains("## main.py\n\nApplication entry point.\n\n"));
    assert!(!output.contains("## lib"));
}

#[test]
fn default_output_lands_in_working_directory() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("proj");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.js"), "/* A */").unwrap();

    Command::cargo_bin("dirdoc")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("proj")
        .assert()
        .success();

    let generated: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("proj_docs_") && name.ends_with(".md"))
        .collect();
    assert_eq!(generated.len(), 1);
}

#[test]
fn missing_source_fails() {
    let temp_dir = tempdir().unwrap();

    Command::cargo_bin("dirdoc")
        .unwrap()
        .arg(temp_dir.path().join("does-not-exist"))
        .arg(temp_dir.path().join("out.md"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn source_argument_is_required() {
    Command::cargo_bin("dirdoc")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<DIR>"));
}

#[test]
fn current_directory_source_gets_a_root_line() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("proj");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.py"), "# A\n").unwrap();
    let output_file = temp_dir.path().join("out.md");

    Command::cargo_bin("dirdoc")
        .unwrap()
        .current_dir(&root)
        .arg(".")
        .arg(&output_file)
        .assert()
        .success();

    let output = fs::read_to_string(&output_file).unwrap();
    assert!(output.starts_with("# Project Structure\n\n- **🗀  ./**\n    - 🗋  a.py\n"));
}
