//! # distpack CLI Args Integration Tests
//!
//! File: cli/tests/args.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Integration tests for `distpack args`. The command never runs a backend, so
//! these tests pass without 7za installed.
//!

mod common;
use common::*;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_args_zip_maximum() {
    let dir = tempdir().unwrap();
    isolated_cmd(dir.path())
        .args(["args", "--format", "zip", "--compression", "maximum"])
        .assert()
        .success()
        .stdout("a -bd -mfb=258 -mpass=15 -mx=9 -mtc=off -mm=Deflate -mcu\n");
}

#[test]
fn test_args_7z_non_solid_uncompressed_header() {
    let dir = tempdir().unwrap();
    isolated_cmd(dir.path())
        .args(["args", "-f", "7z", "--no-solid", "--no-header-compression", "--dict-size", "64"])
        .assert()
        .success()
        .stdout("a -bd -mx=9 -md=64m -mtc=off -ms=off -mhc=off -mtm=off -mta=off\n");
}

#[test]
fn test_args_environment_overrides() {
    let dir = tempdir().unwrap();
    isolated_cmd(dir.path())
        .env("DISTPACK_COMPRESSION_LEVEL", "5")
        .env("DISTPACK_7Z_FILTER", "BCJ2")
        .env("DISTPACK_DEBUG_7Z", "1")
        .args(["args", "-f", "7z", "-c", "store"])
        .assert()
        .success()
        .stdout("a -bd -bb -mx=5 -mtc=off -mf=BCJ2 -mtm=off -mta=off\n");
}

#[test]
fn test_args_zip_fallback_warning_on_stderr() {
    let dir = tempdir().unwrap();
    isolated_cmd(dir.path())
        .args(["args", "-f", "zip", "--zip-fallback", "--method", "lzma"])
        .assert()
        .success()
        .stdout("-q -r -y -7 -X\n")
        .stderr(predicate::str::contains("ignoring unsupported option method=LZMA"));
}

#[test]
fn test_args_uses_project_config_defaults() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join(".distpack.toml"),
        "[archive]\ncompression = \"store\"\n",
    )
    .unwrap();
    isolated_cmd(dir.path())
        .args(["args", "-f", "zip"])
        .assert()
        .success()
        .stdout("a -bd -mtc=off -mm=Copy -mcu\n");
}

#[test]
fn test_args_invalid_project_config_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".distpack.toml"), "[archive]\nlevel = 3\n").unwrap();
    isolated_cmd(dir.path())
        .args(["args", "-f", "zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse TOML"));
}

#[test]
fn test_args_unsupported_format() {
    let dir = tempdir().unwrap();
    isolated_cmd(dir.path())
        .args(["args", "--format", "rar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rar"));
}
