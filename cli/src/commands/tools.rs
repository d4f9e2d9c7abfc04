//! # distpack Tools Command
//!
//! File: cli/src/commands/tools.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Implements `distpack tools`, which checks that the external compression
//! backends can be started.
//!
//! ## Architecture
//!
//! 1. Resolve the tool paths from configuration (`[tools]`, `DISTPACK_7ZA_PATH`).
//! 2. Start each tool with a harmless argument. A tool counts as missing
//!    only when it cannot be spawned; a non-zero exit still proves it exists.
//! 3. Report each tool. `7za` is required, `zip` (macOS NFD fallback) and
//!    `lzip` (`tar.lz`) are optional unless `--all` is given.
//!
//! ## Usage
//!
//! ```bash
//! distpack tools
//! distpack tools --all
//! ```
//!
use crate::common::process::{Invocation, ProcessRunner, SystemRunner};
use crate::core::config::{self, ToolsConfig};
use crate::core::error::{DistpackError, Result};
use clap::Parser;

/// Arguments for the `tools` command.
#[derive(Parser, Debug)]
pub struct ToolsArgs {
    /// Also fail when an optional tool (zip, lzip) is missing
    #[arg(long)]
    all: bool,
}

/// One external tool and the arguments used to check for it.
struct ToolCheck<'a> {
    label: &'static str,
    program: &'a str,
    check_args: &'static [&'static str],
    required: bool,
}

fn tool_checks(tools: &ToolsConfig) -> [ToolCheck<'_>; 3] {
    [
        ToolCheck {
            label: "7za",
            program: &tools.sevenzip,
            check_args: &["i"],
            required: true,
        },
        ToolCheck {
            label: "zip",
            program: &tools.zip,
            check_args: &["-v"],
            required: false,
        },
        ToolCheck {
            label: "lzip",
            program: &tools.lzip,
            check_args: &["--version"],
            required: false,
        },
    ]
}

/// Handler for `distpack tools`.
pub async fn handle_tools(args: ToolsArgs) -> Result<()> {
    tracing::info!("Handling tools command...");
    let config = config::load_config()?;
    check_tools(&SystemRunner, &config.tools, args.all).await
}

async fn check_tools<R: ProcessRunner>(runner: &R, tools: &ToolsConfig, all: bool) -> Result<()> {
    let mut missing = Vec::new();

    println!("Checking external compression tools...");
    for check in tool_checks(tools) {
        print!("  - {} ({})... ", check.label, check.program);
        if tool_exists(runner, check.program, check.check_args).await {
            println!("Found.");
        } else if check.required || all {
            println!("Missing.");
            missing.push(check.label);
        } else {
            println!("Missing (optional).");
        }
    }

    if missing.is_empty() {
        println!("All required tools found.");
        Ok(())
    } else {
        anyhow::bail!(
            "Missing tools: {}. Install them or set their paths in the [tools] config section.",
            missing.join(", ")
        )
    }
}

/// `false` only when the program cannot be started at all.
async fn tool_exists<R: ProcessRunner>(runner: &R, program: &str, check_args: &[&str]) -> bool {
    match runner.run(&Invocation::new(program, check_args.iter().copied())).await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Check of '{}' failed: {:#}", program, e);
            !matches!(
                e.downcast_ref::<DistpackError>(),
                Some(DistpackError::CommandNotFound { .. })
            )
        }
    }
}
