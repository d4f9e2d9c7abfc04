//! # distpack Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Runs the external compression backends. An `Invocation` names the binary,
//! its ordered arguments, the working directory and whether the backend's
//! output should be surfaced in the log. A `ProcessRunner` executes it.
//!
//! ## Architecture
//!
//! - **`ProcessRunner`**: the seam between the archive pipeline and the OS.
//!   The pipeline is generic over it, so tests substitute a recording double
//!   and never spawn a real `7za`.
//! - **`SystemRunner`**: `tokio::process::Command` implementation. Output is
//!   captured, never inherited.
//!
//! Error mapping:
//! - spawn fails with `NotFound` -> `DistpackError::CommandNotFound`. On Unix
//!   this also happens when the working directory is missing, which the
//!   orchestrator relies on to report a missing source directory.
//! - non-zero exit -> `DistpackError::ExternalCommand` carrying the command
//!   line, the exit status and the captured output.
//!
//! There is no retry and no timeout: the backends are deterministic, so a
//! repeated run would fail the same way.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::process::{Invocation, ProcessRunner, SystemRunner};
//!
//! # async fn run_example() -> Result<()> {
//! let invocation = Invocation::new("lzip", ["-9", "--keep", "/tmp/t.tar"]);
//! let output = SystemRunner.run(&invocation).await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{DistpackError, Result};
use anyhow::Context;
use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// A single backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Log the backend's stdout/stderr at `info` level.
    pub verbose: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            verbose: false,
        }
    }

    pub fn current_dir(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes invocations. Non-zero exit must surface as an error.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ProcessOutput>> + Send;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("Executing: {} (cwd: {:?})", invocation, invocation.cwd);
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DistpackError::CommandNotFound {
                    program: invocation.program.clone(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to execute '{}'", invocation.program));
            }
        };

        let captured = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if invocation.verbose {
            info!("{} stdout:\n{}", invocation.program, captured.stdout.trim_end());
            if !captured.stderr.trim().is_empty() {
                info!("{} stderr:\n{}", invocation.program, captured.stderr.trim_end());
            }
        }

        if !output.status.success() {
            return Err(DistpackError::ExternalCommand {
                cmd: invocation.to_string(),
                status: output.status.to_string(),
                output: format!("{}{}", captured.stdout, captured.stderr),
            }
            .into());
        }
        Ok(captured)
    }
}
