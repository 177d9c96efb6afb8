//! Argument parsing and end-to-end runs of the `circle` binary.

mod util;

use assert_cmd::Command;
use assert_fs::prelude::*;
use clap::Parser;
use cultist_circle::cli::{Cli, Commands, OutputFormat, ScanArgs};
use predicates::prelude::*;
use serde_json::Value;

fn circle() -> Command {
    Command::cargo_bin("circle").expect("circle binary")
}

#[test]
fn scan_flag_parsing() {
    // Given
    let argv = vec![
        "circle", "scan", "scan.txt", "--catalog", "items.json", "-t", "300000", "-s", "3",
        "--pin", "a", "--pin", "a", "--exclude", "b", "--format", "json",
    ];

    // When
    let cmd = Cli::parse_from(argv);

    // Then
    match cmd.command {
        Commands::Scan(ScanArgs { threshold, slots, pin, exclude, format, sources, .. }) => {
            assert_eq!(threshold, Some(300_000));
            assert_eq!(slots, Some(3));
            assert_eq!(pin, ["a", "a"]);
            assert_eq!(exclude, ["b"]);
            assert_eq!(format, OutputFormat::Json);
            assert!(sources.catalog.expect("catalog").ends_with("items.json"));
        }
        _ => panic!("expected Scan command"),
    }
}

#[test]
fn scan_json_end_to_end() {
    let tmp = util::make_scan_fixture();

    let assert = circle()
        .current_dir(tmp.path())
        .args(["--quiet", "scan", "scan.txt", "--catalog", "catalog.json", "-s", "3", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let v: Value = serde_json::from_str(stdout.trim()).expect("valid json");

    assert_eq!(v["status"], "qualifying");
    assert_eq!(v["total"], 440_000);
    assert_eq!(v["shortfall"], 0);
    assert_eq!(v["unmatched"][0], "ZZTOP");
    assert_eq!(v["items"].as_array().map(Vec::len), Some(3));
}

#[test]
fn scan_reads_stdin_and_config() {
    let tmp = util::make_scan_fixture();
    tmp.child("circle.toml")
        .write_str("threshold = 100000\nmax_slots = 1\ncatalog = \"catalog.json\"\n")
        .expect("write config");

    circle()
        .current_dir(tmp.path())
        .args(["--quiet", "--no-color", "scan"])
        .write_stdin(util::SCAN_TEXT)
        .assert()
        .success()
        .stdout(predicate::str::contains("qualifies"))
        .stdout(predicate::str::contains("1× Tetriz"));
}

#[test]
fn scan_without_catalog_fails() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    circle()
        .current_dir(tmp.path())
        .args(["--quiet", "scan", "-"])
        .write_stdin("SPlug")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No catalog given"));
}

#[test]
fn unknown_pin_fails() {
    let tmp = util::make_scan_fixture();

    circle()
        .current_dir(tmp.path())
        .args(["--quiet", "scan", "scan.txt", "--catalog", "catalog.json", "--pin", "zz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zz"));
}

#[test]
fn match_reports_unmatched() {
    let tmp = util::make_scan_fixture();

    circle()
        .current_dir(tmp.path())
        .args(["--no-color", "match", "scan.txt", "--catalog", "catalog.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched 5 items"))
        .stdout(predicate::str::contains("Unmatched: ZZTOP"));
}

#[test]
fn normalize_prints_labels() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    circle()
        .current_dir(tmp.path())
        .args(["normalize", "M.parts", "5Plug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M.parts\tMPARTS"))
        .stdout(predicate::str::contains("5Plug\tSPLUG"));
}

#[test]
fn init_refuses_to_overwrite() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    circle()
        .args(["--quiet", "init"])
        .arg(tmp.path())
        .assert()
        .success();
    tmp.child("circle.toml").assert(predicate::path::exists());

    circle()
        .args(["--quiet", "init"])
        .arg(tmp.path())
        .assert()
        .failure();
}
