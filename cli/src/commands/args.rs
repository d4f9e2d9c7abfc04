//! # distpack Args Command
//!
//! File: cli/src/commands/args.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `distpack args`, which prints the argument vector the archive
//! pipeline would hand to its backend for a given set of options. Nothing is
//! executed and no files are touched.
//!
//! The output path, input and exclusion switches are appended by the archive
//! pipeline and are not shown. For `tar.*` formats the compression stage is
//! shown: `7za` arguments for `tar.gz`/`tar.bz2`/`tar.xz` and `lzip`
//! arguments for `tar.lz` (with `<tarball>` standing for the staged file).
//!
//! Warnings for options the backend cannot honour go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! distpack args --format zip --compression maximum
//! # a -bd -mfb=258 -mpass=15 -mx=9 -mtc=off -mm=Deflate -mcu
//!
//! distpack args --format zip --zip-fallback --dict-size 64
//! # -q -r -y -7 -X -Z deflate
//! # warning: ignoring unsupported option dict_size=64
//! ```
//!
use super::archive::OptionArgs;
use crate::common::archive::tar::{lzip_args, tar_ignored_options, tar_stage_options};
use crate::common::archive::{compute_7z_args, compute_zip_args, BuiltArgs, Format};
use crate::core::config::{self, ArchiveDefaults, EnvOverrides};
use crate::core::error::Result;
use anyhow::{anyhow, bail};
use clap::Parser;
use std::path::Path;

/// Arguments for the `args` command.
#[derive(Parser, Debug)]
pub struct ArgsArgs {
    #[command(flatten)]
    pub options: OptionArgs,

    /// Show the Info-ZIP `zip` arguments used when 7za cannot handle decomposed file names
    #[arg(long)]
    pub zip_fallback: bool,
}

/// Handler for `distpack args`.
pub async fn handle_args(args: ArgsArgs) -> Result<()> {
    let config = config::load_config()?;
    let built = render_args(&args, &config.archive, &EnvOverrides::from_env())?;
    println!("{}", built.args.join(" "));
    for warning in &built.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

/// Computes the backend arguments for `args` without running anything.
fn render_args(args: &ArgsArgs, defaults: &ArchiveDefaults, env: &EnvOverrides) -> Result<BuiltArgs> {
    let format = args.options.format;
    let options = args.options.to_archive_options(defaults);

    if args.zip_fallback {
        if format != Format::Zip {
            bail!("--zip-fallback only applies to the zip format, not {}", format);
        }
        return Ok(compute_zip_args(&options, env));
    }

    let sevenzip_format = format.sevenzip_format();
    if !format.is_compressed_tar() {
        let sevenzip_format =
            sevenzip_format.ok_or_else(|| anyhow!("{} is not produced by 7za", format))?;
        return Ok(compute_7z_args(sevenzip_format, &options, env));
    }

    let mut built = match sevenzip_format {
        Some(stream) => compute_7z_args(stream, &tar_stage_options(options.compression), env),
        None => BuiltArgs {
            args: lzip_args(options.compression, Path::new("<tarball>")),
            warnings: Vec::new(),
        },
    };
    built.warnings.extend(tar_ignored_options(&options).warnings);
    Ok(built)
}
