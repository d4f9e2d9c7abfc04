//! # distpack Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Root of the shared modules used by the command handlers. Keeps the archive
//! pipeline and its supporting plumbing separate from command-specific logic
//! (`commands::`) and core infrastructure (`core::`).
//!
//! - **`archive`**: the archive pipeline (argument builders, staleness check,
//!   backend selection, orchestrator, tar combinator).
//! - **`fs`**: filesystem helpers (`io`) and temporary file allocation (`temp`).
//! - **`process`**: running external commands behind the `ProcessRunner` trait.
//!
//! ```rust
//! use crate::common::{archive, fs, process};
//! use crate::core::config::{EnvOverrides, ToolsConfig};
//!
//! # async fn run_example() -> Result<()> {
//! let tmp = fs::temp::TmpDir::new()?;
//! let archiver = archive::Archiver::new(
//!     process::SystemRunner,
//!     ToolsConfig::default(),
//!     EnvOverrides::from_env(),
//! );
//! let options = archive::ArchiveOptions::default();
//! archiver
//!     .produce(archive::Format::TarGz, Path::new("dist/app.tar.gz"), Path::new("build/app"), &options, false, &tmp)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!

/// Archive production: 7z, zip, tar and compressed tarballs.
pub mod archive;
/// Filesystem operations and temporary files.
pub mod fs;
/// External process execution.
pub mod process;
