//! # distpack Archive Command
//!
//! File: cli/src/commands/archive.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `distpack archive`, which produces one archive of a directory.
//!
//! ## Architecture
//!
//! 1. Load configuration (user file, then `.distpack.toml` in the project).
//! 2. Merge CLI flags over the `[archive]` defaults into `ArchiveOptions`.
//! 3. Make sure the output's parent directory exists.
//! 4. Run `Archiver::produce` with the system process runner, the configured
//!    tool paths and a snapshot of the `DISTPACK_*` environment.
//! 5. Print the absolute output path.
//!
//! Temporary files (the staged tarball for `tar.*`) live in a private
//! directory removed when the command ends.
//!
//! ## Usage
//!
//! ```bash
//! distpack archive dist/app-1.0.7z build/app --format 7z --no-solid
//! distpack archive dist/My-1.0-mac.tar.xz build/mac/My.app --format tar.xz --bundle
//! distpack archive dist/app.zip build/app -f zip --exclude '*.map' --exclude '*.pdb'
//! ```
//!
use crate::common::archive::{ArchiveOptions, Archiver, CompressionLevel, Format, Method};
use crate::common::fs::io::ensure_dir_exists;
use crate::common::fs::temp::TmpDir;
use crate::common::process::SystemRunner;
use crate::core::config::{self, ArchiveDefaults, EnvOverrides};
use crate::core::error::Result;
use clap::{Args, Parser};
use std::path::PathBuf;
use tracing::info;

/// Archive option flags, shared by `archive` and `args`.
#[derive(Args, Debug, Clone)]
pub struct OptionArgs {
    /// Archive format: 7z, zip, tar, tar.gz, tar.bz2, tar.xz or tar.lz
    #[arg(short, long)]
    pub format: Format,

    /// Compression level (defaults to the config file, then the backend's rules)
    #[arg(short, long, value_enum)]
    pub compression: Option<CompressionLevel>,

    /// Put the directory's contents at the archive root
    #[arg(long)]
    pub without_dir: bool,

    /// 7z: compress every file as its own block
    #[arg(long)]
    pub no_solid: bool,

    /// 7z: leave the archive header uncompressed
    #[arg(long)]
    pub no_header_compression: bool,

    /// LZMA dictionary size in megabytes
    #[arg(long, value_name = "MB")]
    pub dict_size: Option<u32>,

    /// Glob pattern to leave out (repeatable, appended to the configured list)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub excluded: Vec<String>,

    /// Compression method (`default` emits no method switch)
    #[arg(long, value_enum)]
    pub method: Option<Method>,

    /// Treat the tree as ordinary file data and keep host timestamps/attributes
    #[arg(long)]
    pub regular_file: bool,
}

impl OptionArgs {
    /// Combines the flags with configured defaults. Flags win; exclusion
    /// patterns from both sources are kept, configured ones first.
    pub fn to_archive_options(&self, defaults: &ArchiveDefaults) -> ArchiveOptions {
        let excluded: Vec<String> = defaults
            .excluded
            .iter()
            .chain(&self.excluded)
            .cloned()
            .collect();
        ArchiveOptions {
            compression: self.compression.or(defaults.compression),
            without_dir: self.without_dir,
            solid: !self.no_solid,
            is_archive_header_compressed: !self.no_header_compression,
            dict_size: self.dict_size,
            excluded: (!excluded.is_empty()).then_some(excluded),
            method: self.method,
            is_regular_file: self.regular_file,
        }
    }
}

/// Arguments for the `archive` command.
#[derive(Parser, Debug)]
pub struct ArchiveArgs {
    /// Archive file to create (replaced if it exists and is out of date)
    pub output: PathBuf,

    /// Directory to archive
    pub source: PathBuf,

    #[command(flatten)]
    pub options: OptionArgs,

    /// tar.*: the source is a bundle directory (e.g. `My.app`) kept under its own name
    #[arg(long)]
    pub bundle: bool,
}

/// Handler for `distpack archive`.
pub async fn handle_archive(args: ArchiveArgs) -> Result<()> {
    info!("Handling archive command...");
    let config = config::load_config()?;
    let options = args.options.to_archive_options(&config.archive);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir_exists(parent)?;
    }

    let temp = TmpDir::new()?;
    let archiver = Archiver::new(SystemRunner, config.tools, EnvOverrides::from_env());
    let output = archiver
        .produce(
            args.options.format,
            &args.output,
            &args.source,
            &options,
            args.bundle,
            &temp,
        )
        .await?;

    println!("{}", output.display());
    Ok(())
}
