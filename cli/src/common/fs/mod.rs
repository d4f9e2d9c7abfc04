//! # distpack Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Filesystem helpers shared by the archive pipeline and the commands.
//!
//! - **`io`**: directory creation, metadata lookup, remove-if-exists, and
//!   cross-device-safe moves.
//! - **`temp`**: the `TempAllocator` trait and the scoped `TmpDir` allocator
//!   used to stage intermediate tarballs.
//!
//! ```rust
//! use crate::common::fs::{io, temp::{TempAllocator, TmpDir}};
//!
//! # async fn run_example() -> Result<()> {
//! let tmp = TmpDir::new()?;
//! let staged = tmp.temp_file(".tar")?;
//! io::remove_if_exists(&staged).await?;
//! # Ok(())
//! # }
//! ```
//!

/// Basic file I/O operations (`ensure_dir_exists`, `stat_or_none`, `remove_if_exists`, `move_file`).
pub mod io;
/// Temporary path allocation (`TempAllocator`, `TmpDir`).
pub mod temp;
