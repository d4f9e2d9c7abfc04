//! # distpack Tar Combinator (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Produces `tar.gz`, `tar.bz2`, `tar.xz` and `tar.lz` archives in two stages:
//!
//! 1. An uncompressed, portable tarball is written to a path obtained from the
//!    `TempAllocator`. In parallel, any existing file at the final output path is
//!    deleted (the compressors update rather than overwrite). Both tasks must
//!    finish before stage 2 starts.
//! 2. The tarball is compressed: `lzip -1|-9 --keep` for `tar.lz` (its
//!    `<tmp>.tar.lz` sidecar is then moved to the output path), and `7za` with
//!    the gzip/bzip2/xz stream format for the others.
//!
//! ## Tar layout
//!
//! Entries live under a single root directory:
//! - the output's file name without the `.<format>` extension
//!   (`dist/app-1.0.tar.gz` -> `app-1.0/...`), or
//! - for a bundle directory (e.g. `My.app`, which the target platform treats as
//!   one opaque item) the bundle's own name (`My.app/...`).
//!
//! "Portable" means no host identity: uid/gid are zeroed, user and group names
//! and device numbers are omitted. Entries are written in sorted order, symlinks
//! are stored as links, and modification times and executable bits are kept.
//!
//! The staged tarball is never deleted here; it lives as long as the allocator.
//!
//! Only the compression level reaches the compressor. Every other
//! `ArchiveOptions` field is reported by `tar_ignored_options` so the caller
//! can warn about it.
//!
use super::compression::compute_7z_args;
use super::orchestrator::Archiver;
use super::{ArchiveOptions, BuiltArgs, CompressionLevel, Format, Method};
use crate::common::fs::io::{absolutize, move_file, remove_if_exists};
use crate::common::fs::temp::TempAllocator;
use crate::common::process::{Invocation, ProcessRunner};
use crate::core::error::Result;
use anyhow::{anyhow, Context};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tar::{EntryType, Header, HeaderMode};
use tracing::{debug, info};
use walkdir::WalkDir;

impl<R: ProcessRunner> Archiver<R> {
    /// # Create Compressed Tarball (`tar`)
    ///
    /// Stages `source` as a portable tarball, then compresses it into `output`.
    /// Unlike `archive`, there is no up-to-date check: the output is always
    /// rebuilt.
    ///
    /// ## Arguments
    ///
    /// * `compression` - `Store` selects the fastest setting (`lzip -1`, no `-mx`
    ///   for 7za); anything else compresses at maximum.
    /// * `format` - One of `tar.gz`, `tar.bz2`, `tar.xz`, `tar.lz`.
    /// * `output` - Final archive path. Its parent directory must exist.
    /// * `source` - Directory to archive.
    /// * `is_bundle_directory` - Name the tarball's root after `source` instead
    ///   of after `output`.
    /// * `temp` - Supplies the staging path and owns its lifetime.
    ///
    /// ## Returns
    ///
    /// * `Result<()>` - `Ok(())` once `output` holds the compressed tarball.
    ///
    /// ## Errors
    ///
    /// * `format` is not a compressed tar format.
    /// * The source cannot be read or the tarball cannot be written.
    /// * The compressor fails (`CommandNotFound`, `ExternalCommand`), or the
    ///   `lzip` output cannot be moved to `output`.
    pub async fn tar(
        &self,
        compression: Option<CompressionLevel>,
        format: Format,
        output: &Path,
        source: &Path,
        is_bundle_directory: bool,
        temp: &impl TempAllocator,
    ) -> Result<()> {
        if !format.is_compressed_tar() {
            return Err(anyhow!("'{}' is not a compressed tar format", format));
        }
        let output = absolutize(output)?;
        let source = absolutize(source)?;

        let tar_file = temp.temp_file(".tar")?;
        let root_name = tar_root_name(format, &output, &source, is_bundle_directory)?;
        debug!(
            "Staging {} as {:?} in {}",
            source.display(),
            root_name,
            tar_file.display()
        );

        let staging = {
            let (tar_file, source) = (tar_file.clone(), source.clone());
            tokio::task::spawn_blocking(move || write_portable_tar(&tar_file, &source, &root_name))
        };
        let (staged, removed) = tokio::join!(staging, remove_if_exists(&output));
        staged.context("Tar staging task panicked")??;
        removed?;

        if format == Format::TarLz {
            let invocation = Invocation::new(&self.tools.lzip, lzip_args(compression, &tar_file))
                .verbose(self.env.debug);
            debug!("Compressing: {}", invocation);
            self.runner.run(&invocation).await?;
            // lzip always writes next to its input; it has no usable output option.
            move_file(&lz_sidecar(&tar_file), &output).await?;
        } else {
            let invocation = self.tar_compress_invocation(compression, format, &output, &tar_file, &source)?;
            debug!("Compressing: {}", invocation);
            self.runner.run(&invocation).await?;
        }

        info!("Created {} archive {}", format, output.display());
        Ok(())
    }

    /// The 7za call compressing a staged tarball for `tar.gz`, `tar.bz2` or `tar.xz`.
    pub fn tar_compress_invocation(
        &self,
        compression: Option<CompressionLevel>,
        format: Format,
        output: &Path,
        tar_file: &Path,
        source: &Path,
    ) -> Result<Invocation> {
        let stream_format = match format.sevenzip_format() {
            Some(f) if format.is_compressed_tar() => f,
            _ => return Err(anyhow!("'{}' is not compressed by 7za", format)),
        };
        let mut built = compute_7z_args(stream_format, &tar_stage_options(compression), &self.env);
        built.log_warnings();
        built.push(output.to_string_lossy());
        built.push(tar_file.to_string_lossy());
        Ok(Invocation::new(&self.tools.sevenzip, built.args)
            .current_dir(source.parent().unwrap_or(source))
            .verbose(self.env.debug))
    }
}

/// Options for compressing a staged tarball with 7za: a tarball is ordinary
/// file data, and the stream formats take no method switch.
pub fn tar_stage_options(compression: Option<CompressionLevel>) -> ArchiveOptions {
    ArchiveOptions {
        compression,
        is_regular_file: true,
        method: Some(Method::Default),
        ..Default::default()
    }
}

/// Options a `tar.*` request cannot honour, as warnings.
///
/// The staged tarball always nests the tree under one root directory and
/// holds every file, and its compression stage has fixed settings, so only
/// `compression` has any effect. An `is_regular_file` request is already what
/// the compression stage uses and produces no warning.
pub fn tar_ignored_options(options: &ArchiveOptions) -> BuiltArgs {
    let mut ignored = BuiltArgs::default();
    if let Some(patterns) = options.excluded.as_ref().filter(|p| !p.is_empty()) {
        ignored.warn("excluded", patterns.join(","));
    }
    if options.without_dir {
        ignored.warn("without_dir", true);
    }
    if !options.solid {
        ignored.warn("solid", false);
    }
    if !options.is_archive_header_compressed {
        ignored.warn("is_archive_header_compressed", false);
    }
    if let Some(dict_size) = options.dict_size {
        ignored.warn("dict_size", dict_size);
    }
    if let Some(method) = options.method {
        ignored.warn("method", method);
    }
    ignored
}

/// `lzip` arguments: `-1` for store, `-9` otherwise, and keep the input.
pub fn lzip_args(compression: Option<CompressionLevel>, tar_file: &Path) -> Vec<String> {
    let level = if compression == Some(CompressionLevel::Store) {
        "-1"
    } else {
        "-9"
    };
    vec![
        level.to_string(),
        "--keep".to_string(),
        tar_file.to_string_lossy().into_owned(),
    ]
}

fn lz_sidecar(tar_file: &Path) -> PathBuf {
    let mut name = tar_file.as_os_str().to_owned();
    name.push(".lz");
    PathBuf::from(name)
}

/// Name of the single top-level directory inside the tarball.
fn tar_root_name(
    format: Format,
    output: &Path,
    source: &Path,
    is_bundle_directory: bool,
) -> Result<OsString> {
    if is_bundle_directory {
        return source
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| anyhow!("Bundle path has no name: {}", source.display()));
    }
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow!("Output path has no file name: {}", output.display()))?
        .to_string_lossy()
        .into_owned();
    let extension = format!(".{}", format);
    let root = file_name
        .strip_suffix(&extension)
        .filter(|r| !r.is_empty())
        .unwrap_or(&file_name);
    Ok(OsString::from(root))
}

/// Writes `source` (recursively, sorted, symlinks not followed) into a new
/// uncompressed tarball at `tar_path`, with every entry under `root_name`.
fn write_portable_tar(tar_path: &Path, source: &Path, root_name: &OsString) -> Result<()> {
    let file = File::create(tar_path)
        .with_context(|| format!("Failed to create tar file {}", tar_path.display()))?;
    let mut builder = tar::Builder::new(BufWriter::new(file));
    builder.follow_symlinks(false);

    let root = Path::new(root_name);
    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{} is outside {}", entry.path().display(), source.display()))?;
        let name = root.join(relative);
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        header.set_mtime(mtime);

        let file_type = entry.file_type();
        let appended = if file_type.is_dir() {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder.append_data(&mut header, &name, io::empty())
        } else if file_type.is_symlink() {
            let target = std::fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link {}", entry.path().display()))?;
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            builder.append_link(&mut header, &name, &target)
        } else if file_type.is_file() {
            let data = File::open(entry.path())
                .with_context(|| format!("Failed to open {}", entry.path().display()))?;
            builder.append_data(&mut header, &name, data)
        } else {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        };
        appended.with_context(|| format!("Failed to add {} to the tar archive", entry.path().display()))?;
    }

    let mut writer = builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    writer.flush().context("Failed to flush tar archive")?;
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::backend::Platform;
    use crate::common::fs::temp::TmpDir;
    use crate::common::process::testing::RecordingRunner;
    use crate::common::process::ProcessOutput;
    use crate::core::config::{EnvOverrides, ToolsConfig};
    use filetime::{set_file_mtime, FileTime};
    use std::collections::BTreeMap;
    use std::fs;
    use tar::Archive;
    use tempfile::tempdir;

    fn archiver(runner: RecordingRunner) -> Archiver<RecordingRunner> {
        Archiver::new(runner, ToolsConfig::default(), EnvOverrides::default())
            .with_platform(Platform::Linux)
    }

    fn sample_tree(root: &Path) -> Result<PathBuf> {
        let source = root.join("app");
        fs::create_dir_all(source.join("resources"))?;
        fs::write(source.join("main.js"), "console.log('hi')")?;
        fs::write(source.join("resources/data.bin"), [0u8, 1, 2, 3])?;
        Ok(source)
    }

    /// Lists `(path, uid, mtime)` for every entry of an uncompressed tarball.
    fn tar_entries(path: &Path) -> Result<Vec<(String, u64, u64)>> {
        let mut archive = Archive::new(File::open(path)?);
        let mut entries = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let header = entry.header();
            entries.push((
                entry.path()?.to_string_lossy().trim_end_matches('/').to_string(),
                header.uid()?,
                header.mtime()?,
            ));
        }
        Ok(entries)
    }

    /// Relative path -> bytes for every regular file below `root`.
    fn file_contents(root: &Path) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
        let mut files = BTreeMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(root)?.to_path_buf();
                files.insert(relative, fs::read(entry.path())?);
            }
        }
        Ok(files)
    }

    #[test]
    fn test_staged_tar_extracts_to_identical_tree() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        fs::create_dir_all(source.join("resources/empty"))?;
        fs::write(source.join("resources/large.bin"), vec![0xa5u8; 70_000])?;

        let tar_path = temp_dir.path().join("staged.tar");
        write_portable_tar(&tar_path, &source, &OsString::from("app-1.0"))?;

        let extracted = temp_dir.path().join("extracted");
        Archive::new(File::open(&tar_path)?).unpack(&extracted)?;

        let expected = file_contents(&source)?;
        assert_eq!(expected.len(), 3);
        assert_eq!(file_contents(&extracted.join("app-1.0"))?, expected);
        assert!(extracted.join("app-1.0/resources/empty").is_dir());
        Ok(())
    }

    #[test]
    fn test_tar_ignored_options() {
        assert!(tar_ignored_options(&ArchiveOptions::default()).warnings.is_empty());
        // Compression is honoured and a regular-file request matches the stage.
        let honoured = ArchiveOptions {
            compression: Some(CompressionLevel::Maximum),
            is_regular_file: true,
            excluded: Some(Vec::new()),
            ..Default::default()
        };
        assert!(tar_ignored_options(&honoured).warnings.is_empty());

        let ignored = ArchiveOptions {
            excluded: Some(vec!["*.map".into()]),
            without_dir: true,
            solid: false,
            is_archive_header_compressed: false,
            dict_size: Some(32),
            method: Some(Method::Lzma),
            ..Default::default()
        };
        let warnings: Vec<String> = tar_ignored_options(&ignored)
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect();
        assert_eq!(
            warnings,
            vec![
                "ignoring unsupported option excluded=*.map",
                "ignoring unsupported option without_dir=true",
                "ignoring unsupported option solid=false",
                "ignoring unsupported option is_archive_header_compressed=false",
                "ignoring unsupported option dict_size=32",
                "ignoring unsupported option method=LZMA",
            ]
        );
    }

    #[test]
    fn test_tar_root_name() -> Result<()> {
        let out = Path::new("/dist/app-1.0.tar.gz");
        let src = Path::new("/build/linux-unpacked");
        assert_eq!(tar_root_name(Format::TarGz, out, src, false)?, "app-1.0");
        assert_eq!(
            tar_root_name(Format::TarGz, out, Path::new("/build/My.app"), true)?,
            "My.app"
        );
        // A mismatched extension leaves the name alone.
        assert_eq!(
            tar_root_name(Format::TarXz, Path::new("/dist/app.tgz"), src, false)?,
            "app.tgz"
        );
        Ok(())
    }

    #[test]
    fn test_lzip_args() {
        let tar = Path::new("/tmp/t-1-0.tar");
        assert_eq!(
            lzip_args(Some(CompressionLevel::Store), tar),
            vec!["-1", "--keep", "/tmp/t-1-0.tar"]
        );
        assert_eq!(lzip_args(None, tar)[0], "-9");
        assert_eq!(lzip_args(Some(CompressionLevel::Maximum), tar)[0], "-9");
        assert_eq!(lz_sidecar(tar), PathBuf::from("/tmp/t-1-0.tar.lz"));
    }

    #[test]
    fn test_write_portable_tar_layout() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        set_file_mtime(source.join("main.js"), FileTime::from_unix_time(1_650_000_000, 0))?;
        #[cfg(unix)]
        std::os::unix::fs::symlink("main.js", source.join("link.js"))?;

        let tar_path = temp_dir.path().join("staged.tar");
        write_portable_tar(&tar_path, &source, &OsString::from("app-1.0"))?;

        let entries = tar_entries(&tar_path)?;
        let names: Vec<&str> = entries.iter().map(|(n, _, _)| n.as_str()).collect();
        let mut expected = vec![
            "app-1.0",
            "app-1.0/link.js",
            "app-1.0/main.js",
            "app-1.0/resources",
            "app-1.0/resources/data.bin",
        ];
        if cfg!(not(unix)) {
            expected.retain(|n| *n != "app-1.0/link.js");
        }
        assert_eq!(names, expected);
        assert!(entries.iter().all(|(_, uid, _)| *uid == 0));
        let main = entries.iter().find(|(n, _, _)| n == "app-1.0/main.js").unwrap();
        assert_eq!(main.2, 1_650_000_000);

        #[cfg(unix)]
        {
            let mut archive = Archive::new(File::open(&tar_path)?);
            let link = archive
                .entries()?
                .filter_map(|e| e.ok())
                .find(|e| e.header().entry_type() == EntryType::Symlink)
                .expect("symlink entry");
            assert_eq!(link.link_name()?.unwrap(), Path::new("main.js"));
        }
        Ok(())
    }

    #[test]
    fn test_write_portable_tar_is_reproducible() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        let first = temp_dir.path().join("one.tar");
        let second = temp_dir.path().join("two.tar");
        write_portable_tar(&first, &source, &OsString::from("app"))?;
        write_portable_tar(&second, &source, &OsString::from("app"))?;
        assert_eq!(fs::read(first)?, fs::read(second)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_lz_store_relocates_sidecar() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        let output = temp_dir.path().join("app-1.0.tar.lz");
        let tmp = TmpDir::new()?;

        let runner = RecordingRunner::with_handler(|inv| {
            let input = PathBuf::from(inv.args.last().unwrap());
            fs::write(lz_sidecar(&input), "lzip data")?;
            Ok(ProcessOutput::default())
        });
        let archiver = archiver(runner);
        archiver
            .tar(Some(CompressionLevel::Store), Format::TarLz, &output, &source, false, &tmp)
            .await?;

        let calls = archiver.runner().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "lzip");
        assert_eq!(&calls[0].args[..2], &["-1", "--keep"]);
        let staged = PathBuf::from(&calls[0].args[2]);
        assert!(staged.starts_with(tmp.path()));

        assert_eq!(fs::read_to_string(&output)?, "lzip data");
        assert!(!lz_sidecar(&staged).exists());
        // The uncompressed tarball stays with the allocator.
        assert!(staged.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_gz_uses_7za_with_regular_file_options() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        let output = temp_dir.path().join("app-1.0.tar.gz");
        fs::write(&output, "previous build")?;
        let tmp = TmpDir::new()?;

        let seen = output.clone();
        let runner = RecordingRunner::with_handler(move |_| {
            assert!(!seen.exists(), "stale output must be gone before compression");
            Ok(ProcessOutput::default())
        });
        let archiver = archiver(runner);
        archiver
            .tar(None, Format::TarGz, &output, &source, false, &tmp)
            .await?;

        let calls = archiver.runner().calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.program, "7za");
        assert_eq!(call.cwd.as_deref(), Some(temp_dir.path()));
        let staged = PathBuf::from(&call.args[4]);
        assert_eq!(
            call.args,
            vec![
                "a".to_string(),
                "-bd".to_string(),
                "-mx=9".to_string(),
                output.to_string_lossy().into_owned(),
                staged.to_string_lossy().into_owned(),
            ]
        );

        let names: Vec<String> = tar_entries(&staged)?.into_iter().map(|(n, _, _)| n).collect();
        assert_eq!(names[0], "app-1.0");
        assert!(names.contains(&"app-1.0/resources/data.bin".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_store_compression_for_7za_streams() -> Result<()> {
        let temp_dir = tempdir()?;
        let source = sample_tree(temp_dir.path())?;
        let archiver = archiver(RecordingRunner::new());
        for (format, name) in [(Format::TarBz2, "a.tar.bz2"), (Format::TarXz, "a.tar.xz")] {
            let invocation = archiver.tar_compress_invocation(
                Some(CompressionLevel::Store),
                format,
                &temp_dir.path().join(name),
                Path::new("/tmp/staged.tar"),
                &source,
            )?;
            assert_eq!(&invocation.args[..2], &["a", "-bd"]);
            assert!(!invocation.args.iter().any(|a| a.starts_with("-mx") || a.starts_with("-mm")));
        }
        assert!(archiver
            .tar_compress_invocation(None, Format::TarLz, Path::new("/o"), Path::new("/t"), &source)
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_bundle_directory_keeps_bundle_name() -> Result<()> {
        let temp_dir = tempdir()?;
        let bundle = temp_dir.path().join("My.app");
        fs::create_dir_all(bundle.join("Contents/MacOS"))?;
        fs::write(bundle.join("Contents/MacOS/My"), "binary")?;
        let tmp = TmpDir::new()?;

        let archiver = archiver(RecordingRunner::new());
        archiver
            .tar(None, Format::TarXz, &temp_dir.path().join("my-1.0-mac.tar.xz"), &bundle, true, &tmp)
            .await?;

        let call = &archiver.runner().calls()[0];
        let staged = PathBuf::from(call.args.last().unwrap());
        let names: Vec<String> = tar_entries(&staged)?.into_iter().map(|(n, _, _)| n).collect();
        assert_eq!(
            names,
            vec!["My.app", "My.app/Contents", "My.app/Contents/MacOS", "My.app/Contents/MacOS/My"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_missing_source_fails_before_compression() -> Result<()> {
        let temp_dir = tempdir()?;
        let tmp = TmpDir::new()?;
        let archiver = archiver(RecordingRunner::new());
        let result = archiver
            .tar(
                None,
                Format::TarGz,
                &temp_dir.path().join("x.tar.gz"),
                &temp_dir.path().join("missing"),
                false,
                &tmp,
            )
            .await;
        assert!(result.is_err());
        assert!(archiver.runner().calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_tar_rejects_non_tar_format() -> Result<()> {
        let temp_dir = tempdir()?;
        let tmp = TmpDir::new()?;
        let result = archiver(RecordingRunner::new())
            .tar(None, Format::Zip, &temp_dir.path().join("x.zip"), temp_dir.path(), false, &tmp)
            .await;
        assert!(result.is_err());
        Ok(())
    }
}
