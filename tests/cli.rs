//! Integration tests for the firewatch CLI

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn firewatch(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_firewatch"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute firewatch")
}

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_firewatch"))
        .arg("--help")
        .output()
        .expect("Failed to execute firewatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["download", "merge", "assess", "serve"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_merge_combines_regional_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Csv");
    fs::create_dir(&input).unwrap();
    fs::write(
        input.join("Greece_2024.csv"),
        "latitude,longitude,frp\n38.1,23.8,14.0\n38.2,23.9,9.5\n",
    )
    .unwrap();
    fs::write(input.join("Chile_2024.csv"), "latitude,longitude,frp\n-36.8,-73.0,30.1\n").unwrap();
    let merged = dir.path().join("merged.csv");
    let config = write_config(dir.path(), "");

    let output = firewatch(
        &config,
        &[
            "merge",
            "--input-dir",
            input.to_str().unwrap(),
            "--output",
            merged.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Merged 3 rows from 2 files"));

    let contents = fs::read_to_string(&merged).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "latitude,longitude,frp,region");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with(",Chile"));
    assert!(lines[3].ends_with(",Greece"));
}

#[test]
fn test_merge_without_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = firewatch(
        &config,
        &["merge", "--input-dir", dir.path().to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No CSV files"));
}

#[test]
fn test_assess_without_model_fails_early() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "[model]\npath = \"{}\"\n",
            dir.path().join("missing.json").display()
        ),
    );

    let output = firewatch(&config, &["assess", "California"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("prediction model could not be used"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[defaults]\nregion_radius_km = 5\n");

    let output = firewatch(&config, &["merge"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration error"));
}
