//! # Archive Orchestrator (`common::archive::orchestrator`)
//!
//! File: cli/src/common/archive/orchestrator.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `Archiver` is the entry point of the pipeline. It owns the process runner,
//! the tool locations and the environment snapshot, so a single value carries
//! everything one archive request needs.
//!
//! ## Workflow (`archive`)
//!
//! 1. Skip all work if the output is newer than the source directory.
//! 2. Select the backend (7za, or `zip` for NFD paths on macOS).
//! 3. Delete any previous output; both backends update instead of overwrite.
//! 4. Build the arguments, then append the output, the input (`.` or the
//!    directory name) and one exclusion switch per pattern.
//! 5. Run the backend in the source directory (`without_dir`) or its parent.
//! 6. A "not found" failure while the source directory is missing becomes
//!    `DistpackError::SourceMissing`; any other failure is returned unchanged.
//!
//! `produce` dispatches `tar.*` formats to the tar combinator (see `tar.rs`)
//! and everything else to `archive`.
//!
//! Concurrent calls for different outputs are independent. Calls targeting the
//! same output are not synchronised here.
//!
use super::backend::{has_normalization_mismatch, select_backend, BackendKind, Platform};
use super::compression::{compute_7z_args, compute_zip_args};
use super::staleness::is_up_to_date;
use super::tar::tar_ignored_options;
use super::{ArchiveOptions, BuiltArgs, Format};
use crate::common::fs::io::{absolutize, remove_if_exists, stat_or_none};
use crate::common::fs::temp::TempAllocator;
use crate::common::process::{Invocation, ProcessRunner};
use crate::core::config::{EnvOverrides, ToolsConfig};
use crate::core::error::{DistpackError, Result};
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Produces archives by driving external backends through a `ProcessRunner`.
#[derive(Debug)]
pub struct Archiver<R> {
    pub(super) runner: R,
    pub(super) tools: ToolsConfig,
    pub(super) env: EnvOverrides,
    pub(super) platform: Platform,
}

impl<R: ProcessRunner> Archiver<R> {
    pub fn new(runner: R, tools: ToolsConfig, env: EnvOverrides) -> Self {
        Self {
            runner,
            tools,
            env,
            platform: Platform::current(),
        }
    }

    /// Overrides the detected host platform.
    #[cfg(test)]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// # Produce Archive (`produce`)
    ///
    /// Creates `output` from `source` in any supported format, dispatching
    /// `tar.*` formats to the tar combinator and the rest to `archive`.
    ///
    /// ## Arguments
    ///
    /// * `format` - Archive format.
    /// * `output` - Archive path, relative paths resolved against the current directory.
    /// * `source` - Directory to archive.
    /// * `options` - Archive options. For `tar.*` only `compression` is honoured;
    ///   every other non-default field is logged as an ignored option.
    /// * `is_bundle_directory` - `tar.*` only: keep the source's own name as the
    ///   tarball root. Logged as ignored for other formats.
    /// * `temp` - Temporary path allocator, used by `tar.*` only.
    ///
    /// ## Returns
    ///
    /// * `Result<PathBuf>` - The absolute path of the archive.
    ///
    /// ## Errors
    ///
    /// Whatever `archive` or `tar` report for the selected format.
    pub async fn produce(
        &self,
        format: Format,
        output: &Path,
        source: &Path,
        options: &ArchiveOptions,
        is_bundle_directory: bool,
        temp: &impl TempAllocator,
    ) -> Result<PathBuf> {
        if format.is_compressed_tar() {
            tar_ignored_options(options).log_warnings();
            self.tar(options.compression, format, output, source, is_bundle_directory, temp)
                .await?;
            absolutize(output)
        } else {
            if is_bundle_directory {
                let mut ignored = BuiltArgs::default();
                ignored.warn("bundle", true);
                ignored.log_warnings();
            }
            self.archive(format, output, source, options).await
        }
    }

    /// # Create Archive (`archive`)
    ///
    /// Creates a 7z, zip or plain tar archive of `source` at `output` with a
    /// single backend call. Nothing is done when `output` is already newer
    /// than `source`.
    ///
    /// ## Arguments
    ///
    /// * `format` - `7z`, `zip` or `tar`.
    /// * `output` - Archive path. Its parent directory must exist; an existing
    ///   stale file is deleted first.
    /// * `source` - Directory to archive.
    /// * `options` - Archive options. Options the selected backend cannot
    ///   honour are logged and ignored.
    ///
    /// ## Returns
    ///
    /// * `Result<PathBuf>` - The absolute path of the archive.
    ///
    /// ## Errors
    ///
    /// * `format` is a `tar.*` format.
    /// * `DistpackError::SourceMissing` if the backend cannot be started and
    ///   `source` does not exist.
    /// * `DistpackError::CommandNotFound` / `ExternalCommand` from the backend otherwise.
    pub async fn archive(
        &self,
        format: Format,
        output: &Path,
        source: &Path,
        options: &ArchiveOptions,
    ) -> Result<PathBuf> {
        let output = absolutize(output)?;
        let source = absolutize(source)?;

        if is_up_to_date(&output, &source).await? {
            info!(
                "Skipped archiving {}: archive file is up to date",
                output.display()
            );
            return Ok(output);
        }

        let (backend, invocation) = self.archive_invocation(format, &output, &source, options)?;

        // Remove before writing: 7za and zip update an existing archive.
        remove_if_exists(&output).await?;

        debug!("Archiving with {:?}: {}", backend, invocation);
        if let Err(e) = self.runner.run(&invocation).await {
            let not_found = matches!(
                e.downcast_ref::<DistpackError>(),
                Some(DistpackError::CommandNotFound { .. })
            );
            if not_found && stat_or_none(&source).await?.is_none() {
                return Err(DistpackError::SourceMissing { path: source }.into());
            }
            return Err(e);
        }

        info!("Created {} archive {}", format, output.display());
        Ok(output)
    }

    /// Builds the backend invocation `archive` would run, without touching the
    /// output. Warnings for ignored options are logged here.
    pub fn archive_invocation(
        &self,
        format: Format,
        output: &Path,
        source: &Path,
        options: &ArchiveOptions,
    ) -> Result<(BackendKind, Invocation)> {
        let sevenzip_format = match format.sevenzip_format() {
            Some(f) if !format.is_compressed_tar() => f,
            _ => {
                return Err(anyhow!(
                    "Format '{}' is produced through the tar combinator, not a single backend call",
                    format
                ))
            }
        };

        let mismatch =
            self.platform.uses_decomposed_names() && has_normalization_mismatch(source);
        let backend = select_backend(self.platform, format, mismatch);
        let mut built = match backend {
            BackendKind::SevenZip => compute_7z_args(sevenzip_format, options, &self.env),
            BackendKind::Zip => {
                warn!(
                    "Using zip for {}: 7z doesn't support NFD-normalized filenames",
                    source.display()
                );
                compute_zip_args(options, &self.env)
            }
        };
        built.log_warnings();

        built.push(output.to_string_lossy());
        if options.without_dir {
            built.push(".");
        } else {
            let name = source.file_name().ok_or_else(|| {
                anyhow!(DistpackError::FileSystem(format!(
                    "Source path has no directory name: {}",
                    source.display()
                )))
            })?;
            built.push(name.to_string_lossy());
        }
        for pattern in options.excluded.iter().flatten() {
            built.push(backend.exclusion_arg(pattern));
        }

        let cwd = if options.without_dir {
            source
        } else {
            source.parent().unwrap_or(source)
        };
        let invocation = Invocation::new(backend.binary(&self.tools), built.args)
            .current_dir(cwd)
            .verbose(self.env.debug);
        Ok((backend, invocation))
    }
}
