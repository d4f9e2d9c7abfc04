//! # distpack Temporary File Allocation (`common::fs::temp`)
//!
//! File: cli/src/common/fs/temp.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The tar combinator stages its uncompressed tarball in a temporary file. It
//! asks a `TempAllocator` for a unique path and never deletes that path itself;
//! reclaiming it is the allocator owner's job.
//!
//! `TmpDir` is the standard allocator: a `tempfile::TempDir` that hands out
//! numbered paths inside itself and removes everything when dropped. Keep it
//! alive for as long as the produced archives' intermediates may be needed.
//!
use crate::core::error::Result;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Yields unique, not-yet-existing paths whose lifetime the allocator controls.
pub trait TempAllocator {
    /// Returns a fresh path ending in `suffix` (e.g. `.tar`).
    fn temp_file(&self, suffix: &str) -> Result<PathBuf>;
}

/// Scoped temporary directory. Its contents are deleted on drop.
#[derive(Debug)]
pub struct TmpDir {
    dir: tempfile::TempDir,
    counter: AtomicUsize,
}

impl TmpDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("distpack-")
            .tempdir()
            .context("Failed to create temporary directory")?;
        Ok(Self {
            dir,
            counter: AtomicUsize::new(0),
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl TempAllocator for TmpDir {
    fn temp_file(&self, suffix: &str) -> Result<PathBuf> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .dir
            .path()
            .join(format!("t-{}-{}{}", std::process::id(), n, suffix)))
    }
}
