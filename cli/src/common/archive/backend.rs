//! # Backend Selection (`common::archive::backend`)
//!
//! File: cli/src/common/archive/backend.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! 7za is the primary backend for every format it can write. The one exception
//! is macOS: HFS+/APFS hand out file names in decomposed (NFD) form, and 7za
//! mangles those names inside zip archives. When a zip is requested there and
//! the source path is not already in composed (NFC) form, Info-ZIP `zip` is
//! used instead.
//!
//! `select_backend` is a pure decision over `(platform, format, mismatch)`;
//! `has_normalization_mismatch` is the only part that looks at a path.
//!
use super::Format;
use crate::core::config::ToolsConfig;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Host platform, as far as backend selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    /// Whether the platform's filesystems report names in decomposed form.
    pub fn uses_decomposed_names(self) -> bool {
        self == Platform::MacOs
    }
}

/// Which external archiver produces the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// 7-Zip standalone (`7za`).
    SevenZip,
    /// Info-ZIP `zip`.
    Zip,
}

impl BackendKind {
    /// Backend-specific recursive exclusion switch for `pattern`.
    pub fn exclusion_arg(self, pattern: &str) -> String {
        match self {
            BackendKind::SevenZip => format!("-xr!{}", pattern),
            BackendKind::Zip => format!("-x{}", pattern),
        }
    }

    pub fn binary(self, tools: &ToolsConfig) -> &str {
        match self {
            BackendKind::SevenZip => &tools.sevenzip,
            BackendKind::Zip => &tools.zip,
        }
    }
}

/// Picks the backend for `format` on `platform`.
pub fn select_backend(
    platform: Platform,
    format: Format,
    normalization_mismatch: bool,
) -> BackendKind {
    if platform.uses_decomposed_names() && format == Format::Zip && normalization_mismatch {
        BackendKind::Zip
    } else {
        BackendKind::SevenZip
    }
}

/// `true` when the NFC form of `path` differs from the path as given.
pub fn has_normalization_mismatch(path: &Path) -> bool {
    let original = path.to_string_lossy();
    let composed: String = original.nfc().collect();
    composed != original
}
