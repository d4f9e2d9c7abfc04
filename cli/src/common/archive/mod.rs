//! # distpack Archive Pipeline (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module turns a directory tree into a reproducible distribution archive
//! by driving external compression backends (`7za`, Info-ZIP `zip`, `lzip`).
//! No compression happens in-process; the pipeline's job is to build the right
//! argument vector, run the right binary in the right directory, and skip work
//! when the output is already current.
//!
//! ## Architecture
//!
//! - **`compression`**: pure argument builders (`compute_7z_args`,
//!   `compute_zip_args`) returning `BuiltArgs`.
//! - **`staleness`**: output-vs-source modification time check.
//! - **`backend`**: pure `select_backend` decision plus the NFD path check.
//! - **`orchestrator`**: `Archiver`, the entry point for 7z/zip/tar and the
//!   `produce` dispatcher.
//! - **`tar`**: the tar combinator for `tar.gz`, `tar.bz2`, `tar.xz`, `tar.lz`.
//!
//! This file holds the shared data model: `Format`, `SevenZipFormat`,
//! `CompressionLevel`, `Method`, `ArchiveOptions`, `BuiltArgs`, `ArgWarning`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{ArchiveOptions, Archiver, CompressionLevel, Format};
//!
//! # async fn run(archiver: Archiver<SystemRunner>, tmp: &TmpDir) -> Result<()> {
//! let options = ArchiveOptions {
//!     compression: Some(CompressionLevel::Maximum),
//!     ..Default::default()
//! };
//! archiver
//!     .produce(Format::Zip, Path::new("dist/app.zip"), Path::new("build/app"), &options, false, tmp)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::DistpackError;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub mod backend;
pub mod compression;
pub mod orchestrator;
pub mod staleness;
pub mod tar;

pub use compression::{compute_7z_args, compute_zip_args};
pub use orchestrator::Archiver;

/// Archive formats distpack can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    SevenZ,
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
    TarLz,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::SevenZ,
        Format::Zip,
        Format::Tar,
        Format::TarGz,
        Format::TarBz2,
        Format::TarXz,
        Format::TarLz,
    ];

    /// The canonical name, which is also the file extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::SevenZ => "7z",
            Format::Zip => "zip",
            Format::Tar => "tar",
            Format::TarGz => "tar.gz",
            Format::TarBz2 => "tar.bz2",
            Format::TarXz => "tar.xz",
            Format::TarLz => "tar.lz",
        }
    }

    /// `tar.*` formats go through the tar combinator.
    pub fn is_compressed_tar(self) -> bool {
        matches!(
            self,
            Format::TarGz | Format::TarBz2 | Format::TarXz | Format::TarLz
        )
    }

    /// Format handed to 7za when it produces this archive directly, or
    /// compresses the staged tar for a `tar.*` format. `None` for `tar.lz`.
    pub fn sevenzip_format(self) -> Option<SevenZipFormat> {
        match self {
            Format::SevenZ => Some(SevenZipFormat::SevenZ),
            Format::Zip => Some(SevenZipFormat::Zip),
            Format::Tar => Some(SevenZipFormat::Tar),
            Format::TarGz => Some(SevenZipFormat::Gzip),
            Format::TarBz2 => Some(SevenZipFormat::Bzip2),
            Format::TarXz => Some(SevenZipFormat::Xz),
            Format::TarLz => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = DistpackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DistpackError::UnsupportedFormat {
                format: s.to_string(),
            })
    }
}

/// Container/stream type as seen by 7za.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SevenZipFormat {
    SevenZ,
    Zip,
    Tar,
    Gzip,
    Bzip2,
    Xz,
}

impl SevenZipFormat {
    pub fn is_7z(self) -> bool {
        self == SevenZipFormat::SevenZ
    }

    pub fn is_zip(self) -> bool {
        self == SevenZipFormat::Zip
    }
}

/// Compression/speed trade-off requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Store,
    Normal,
    Maximum,
}

/// Explicit compression method (`-mm=`). `Default` suppresses the switch entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Copy,
    Lzma,
    Deflate,
    Default,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Copy => "Copy",
            Method::Lzma => "LZMA",
            Method::Deflate => "Deflate",
            Method::Default => "DEFAULT",
        })
    }
}

/// Per-request archive configuration. Immutable for the duration of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// `None` leaves the level to the backend's default rules.
    pub compression: Option<CompressionLevel>,
    /// Archive the directory's contents at the root instead of nesting them
    /// under the directory's name.
    pub without_dir: bool,
    /// 7z only. `false` compresses every file as its own block.
    pub solid: bool,
    /// 7z only.
    pub is_archive_header_compressed: bool,
    /// LZMA dictionary size in megabytes.
    pub dict_size: Option<u32>,
    /// Glob patterns to omit, in order.
    pub excluded: Option<Vec<String>>,
    /// `None` applies the automatic method rule.
    pub method: Option<Method>,
    /// `true` for compressible file content. `false` treats the tree as a raw
    /// filesystem payload and suppresses host timestamp/attribute preservation.
    pub is_regular_file: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression: None,
            without_dir: false,
            solid: true,
            is_archive_header_compressed: true,
            dict_size: None,
            excluded: None,
            method: None,
            is_regular_file: false,
        }
    }
}

/// An option the selected backend cannot honour and therefore ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgWarning {
    pub option: &'static str,
    pub value: String,
}

impl fmt::Display for ArgWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring unsupported option {}={}", self.option, self.value)
    }
}

/// Output of an argument builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltArgs {
    pub args: Vec<String>,
    pub warnings: Vec<ArgWarning>,
}

impl BuiltArgs {
    fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn warn(&mut self, option: &'static str, value: impl ToString) {
        self.warnings.push(ArgWarning {
            option,
            value: value.to_string(),
        });
    }

    #[cfg(test)]
    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Emits every recorded warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}
