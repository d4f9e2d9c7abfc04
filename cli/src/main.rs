//! # distpack Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the distpack CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! - Each top-level command (`archive`, `args`, `tools`) is a variant of the `Commands` enum
//! - Commands are mapped to handler functions in their respective modules
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! ```bash
//! # Reproducible zip of build/app at dist/app-1.0.zip
//! distpack archive dist/app-1.0.zip build/app --format zip --compression maximum
//!
//! # Show the 7za arguments for a 7z archive, with debug logging
//! distpack -vv args --format 7z --no-solid
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command handlers (archive, args, tools)
mod common; // Archive pipeline, process execution, filesystem helpers
mod core; // Errors and configuration

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "distpack",
    about = "Reproducible distribution archives (7z, zip, tar.*) via 7za, zip and lzip",
    long_about = "Builds byte-stable distribution archives of a build output directory.\n\
                  Compression is delegated to external 7za, zip and lzip binaries.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Create an archive of a directory
    #[command(alias = "a")]
    Archive(commands::archive::ArchiveArgs),
    /// Print the backend arguments an archive request would use
    Args(commands::args::ArgsArgs),
    /// Check that the external compression tools are available
    Tools(commands::tools::ToolsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Archive(args) => commands::archive::handle_archive(args).await,
        Commands::Args(args) => commands::args::handle_args(args).await,
        Commands::Tools(args) => commands::tools::handle_tools(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
