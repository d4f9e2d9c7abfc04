//! # distpack Backend Argument Builders (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Pure functions translating `ArchiveOptions` plus an `EnvOverrides` snapshot
//! into the argument vector for a compression backend. Nothing here touches the
//! filesystem, the environment or a logger, so each reproducibility rule can be
//! asserted directly.
//!
//! - `compute_7z_args`: the `7za a ...` vocabulary (7z, zip, tar, gzip, bzip2, xz)
//! - `compute_zip_args`: the Info-ZIP `zip` vocabulary, used only for the
//!   NFD fallback on macOS
//!
//! Options the zip backend cannot honour are recorded as `ArgWarning`s in the
//! returned `BuiltArgs` instead of failing.
//!
//! The caller appends the output path, the input and any exclusion switches.
//!
use super::{ArchiveOptions, BuiltArgs, CompressionLevel, Method, SevenZipFormat};
use crate::core::config::EnvOverrides;

/// # Compute 7-Zip Arguments (`compute_7z_args`)
///
/// Builds the `7za a` switches for creating an archive of `format`.
///
/// ## Arguments
///
/// * `format` - Container or stream type 7za writes.
/// * `options` - Archive options. Every field is honoured by 7za.
/// * `env` - Environment snapshot. A compression level override replaces the
///   computed `-mx` and disables store-only mode.
///
/// ## Returns
///
/// * `BuiltArgs` - `a -bd` followed by the switches, in a fixed order. The
///   warning list is always empty.
pub fn compute_7z_args(
    format: SevenZipFormat,
    options: &ArchiveOptions,
    env: &EnvOverrides,
) -> BuiltArgs {
    let mut built = BuiltArgs::default();
    built.push("a");
    built.push("-bd");
    if env.debug {
        built.push("-bb");
    }

    let mut store_only = options.compression == Some(CompressionLevel::Store);
    let mut is_level_set = false;
    if let Some(level) = &env.compression_level {
        store_only = false;
        built.push(format!("-mx={}", level));
        is_level_set = true;
    }

    let is_zip = format.is_zip();
    let is_maximum = options.compression == Some(CompressionLevel::Maximum);
    if !store_only {
        if is_zip && is_maximum {
            built.push("-mfb=258");
            built.push("-mpass=15");
        }
        if !is_level_set {
            built.push(if !is_zip || is_maximum { "-mx=9" } else { "-mx=7" });
        }
    }

    if let Some(dict_size) = options.dict_size {
        built.push(format!("-md={}m", dict_size));
    }

    // NTFS timestamps (creation/access) would embed host state.
    if !options.is_regular_file {
        built.push("-mtc=off");
    }

    if format.is_7z() {
        if !options.solid {
            built.push("-ms=off");
        }
        if !options.is_archive_header_compressed {
            built.push("-mhc=off");
        }
        if let Some(filter) = &env.sevenzip_filter {
            built.push(format!("-mf={}", filter));
        }
        // Identical content must yield identical bytes regardless of build time.
        built.push("-mtm=off");
        built.push("-mta=off");
    }

    match options.method {
        Some(Method::Default) => {}
        Some(method) => built.push(format!("-mm={}", method)),
        None if is_zip || store_only => {
            built.push(if store_only { "-mm=Copy" } else { "-mm=Deflate" })
        }
        None => {}
    }

    // UTF-8 names whatever the host code page is.
    if is_zip {
        built.push("-mcu");
    }
    built
}

/// # Compute Info-ZIP Arguments (`compute_zip_args`)
///
/// Builds the `zip` switches for the macOS fallback backend.
///
/// ## Arguments
///
/// * `options` - Archive options. `solid` and `is_archive_header_compressed`
///   do not apply to zip and are not reported.
/// * `env` - Environment snapshot. A compression level override is passed as
///   `-<level>`.
///
/// ## Returns
///
/// * `BuiltArgs` - The switches, plus an `ArgWarning` for a `dict_size` or a
///   non-default `method`, which `zip` cannot honour.
pub fn compute_zip_args(options: &ArchiveOptions, env: &EnvOverrides) -> BuiltArgs {
    let mut built = BuiltArgs::default();
    built.push("-q");
    built.push("-r");
    built.push("-y");
    if env.debug {
        built.push("-v");
    }

    let mut store_only = options.compression == Some(CompressionLevel::Store);
    if let Some(level) = &env.compression_level {
        store_only = false;
        built.push(format!("-{}", level));
    } else if !store_only {
        built.push(if options.compression == Some(CompressionLevel::Maximum) {
            "-9"
        } else {
            "-7"
        });
    }

    if let Some(dict_size) = options.dict_size {
        built.warn("dict_size", dict_size);
    }

    // No extra attributes (uid/gid, Unix file times).
    if !options.is_regular_file {
        built.push("-X");
    }

    match options.method {
        Some(Method::Default) => {}
        Some(method) => built.warn("method", method),
        None => {
            built.push("-Z");
            built.push(if store_only { "store" } else { "deflate" });
        }
    }
    built
}
