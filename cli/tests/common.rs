//! # distpack CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Each test file
//! declares `mod common;` and builds commands through `distpack_cmd()` or
//! `isolated_cmd()`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

const DISTPACK_ENV: [&str; 4] = [
    "DISTPACK_COMPRESSION_LEVEL",
    "DISTPACK_7Z_FILTER",
    "DISTPACK_DEBUG_7Z",
    "DISTPACK_7ZA_PATH",
];

/// Creates an `assert_cmd::Command` for the compiled `distpack` binary.
pub fn distpack_cmd() -> Command {
    Command::cargo_bin("distpack").expect("Failed to find distpack binary for testing")
}

/// Like `distpack_cmd`, but running in `dir` with no user config, no project
/// config above `dir` and no `DISTPACK_*` variables from the caller's shell.
pub fn isolated_cmd(dir: &Path) -> Command {
    // A `.git` marker stops the project config search at `dir`.
    std::fs::create_dir_all(dir.join(".git")).expect("Failed to create .git marker");
    let home = dir.join("home");
    std::fs::create_dir_all(&home).expect("Failed to create fake home");

    let mut cmd = distpack_cmd();
    cmd.current_dir(dir)
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    for var in DISTPACK_ENV {
        cmd.env_remove(var);
    }
    cmd
}

/// `true` when `program` can be spawned. Real-backend tests skip otherwise.
pub fn tool_available(program: &str, arg: &str) -> bool {
    std::process::Command::new(program)
        .arg(arg)
        .output()
        .is_ok()
}
