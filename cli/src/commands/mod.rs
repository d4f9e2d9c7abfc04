//! # distpack Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Aggregates the top-level commands of the distpack CLI. Each module defines
//! its Clap arguments structure and an async `handle_*` function called from
//! `main.rs`.
//!
//! - `archive`: create an archive (`distpack archive <OUTPUT> <SOURCE> --format F`)
//! - `args`: print the backend argument vector for a set of options
//! - `tools`: check for `7za`, `zip` and `lzip`
//!

/// Archive creation. Also defines the option flags shared with `args`.
pub mod archive;
/// Argument preview for the compression backends.
pub mod args;
/// External tool availability check.
pub mod tools;
