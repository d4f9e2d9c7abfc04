//! # distpack Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` / `tokio::fs` used by the archive pipeline:
//! - **`ensure_dir_exists`**: creates a directory (and parents) if missing, and
//!   rejects paths that exist but are not directories.
//! - **`absolutize`**: anchors relative paths at the current directory.
//! - **`stat_or_none`**: metadata, with "not found" mapped to `None`.
//! - **`remove_if_exists`**: deletes a file, treating "not found" as success.
//!   Both backends update an existing archive instead of replacing it, so every
//!   output is removed before it is written.
//! - **`move_file`**: rename, falling back to copy-and-delete (via `fs_extra`)
//!   when source and destination are on different filesystems.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs::io;
//!
//! # async fn run_example() -> Result<()> {
//! io::remove_if_exists(Path::new("dist/app.zip")).await?;
//! if let Some(meta) = io::stat_or_none(Path::new("build/app")).await? {
//!     println!("modified: {:?}", meta.modified()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{DistpackError, Result};
use anyhow::Context;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path.
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or creating it fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(DistpackError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Resolves a relative path against the current directory. Backends run in a
/// different working directory, so every path handed to them must be absolute.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}

/// Returns the metadata of `path`, or `None` when nothing exists there.
pub async fn stat_or_none(path: &Path) -> Result<Option<Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to stat {:?}", path)),
    }
}

/// Deletes the file at `path` if present. Returns whether a file was removed.
pub async fn remove_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed existing file: {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove existing file {:?}", path)),
    }
}

/// Moves `from` to `to`, replacing any file at `to`.
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(e)
            .with_context(|| format!("Failed to move {:?} to {:?}", from, to)),
        Err(e) => {
            debug!("Rename {:?} -> {:?} failed ({}), copying instead", from, to, e);
            let (from, to) = (from.to_path_buf(), to.to_path_buf());
            tokio::task::spawn_blocking(move || {
                let mut options = fs_extra::file::CopyOptions::new();
                options.overwrite = true;
                fs_extra::file::move_file(&from, &to, &options)
                    .map(|_| ())
                    .with_context(|| format!("Failed to move {:?} to {:?}", from, to))
            })
            .await
            .context("File move task panicked")?
        }
    }
}
