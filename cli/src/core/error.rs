//! # distpack Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout distpack. Domain
//! failures are variants of `DistpackError`; everything else travels as an
//! `anyhow::Error` with context attached.
//!
//! ## Architecture
//!
//! - `DistpackError`: a `thiserror` enum for the failures callers may want to
//!   match on (missing source directory, failed backend, unknown format).
//! - `Result<T>`: an alias for `anyhow::Result<T>`.
//!
//! Option degradation (an option a backend cannot honour) is *not* an error.
//! It is reported through `archive::ArgWarning` values instead.
//!
//! ## Examples
//!
//! ```rust
//! // Translating a low-level failure into a domain error
//! match result {
//!     Err(e) if matches!(e.downcast_ref::<DistpackError>(), Some(DistpackError::CommandNotFound { .. })) => {
//!         return Err(DistpackError::SourceMissing { path: dir.to_path_buf() }.into());
//!     }
//!     other => other?,
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for distpack.
#[derive(Error, Debug)]
pub enum DistpackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Cannot create archive: \"{}\" doesn't exist", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Unsupported archive format '{format}'. Expected one of: 7z, zip, tar, tar.gz, tar.bz2, tar.xz, tar.lz")]
    UnsupportedFormat { format: String },

    #[error("Command '{program}' not found (or its working directory does not exist)")]
    CommandNotFound { program: String },

    #[error("External command failed: {cmd}, Status: {status}, Output:\n{output}")]
    ExternalCommand {
        cmd: String,
        status: String,
        output: String,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
