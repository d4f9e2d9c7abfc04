//! # distpack Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module loads, merges and validates distpack's configuration, and takes
//! the read-only snapshot of the process environment that the argument
//! builders consume.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.distpack.toml` in the current directory or an ancestor
//!    (the search stops at the first directory containing `.git`)
//! 2. User-specific `config.toml` in the platform config directory
//! 3. Default values defined in the code
//!
//! Environment variables are never read ad hoc by the archive code. Instead
//! `EnvOverrides::from_env` captures them once per command and the snapshot is
//! handed to the builders, which keeps "environment wins" an explicit merge step.
//!
//! | Variable | Effect |
//! |---|---|
//! | `DISTPACK_COMPRESSION_LEVEL` | Forces `-mx=<level>` / `-<level>` and disables store mode |
//! | `DISTPACK_7Z_FILTER` | Appends `-mf=<filter>` for 7z archives |
//! | `DISTPACK_DEBUG_7Z` | Verbose backend output (`-bb`, `-v`) |
//! | `DISTPACK_7ZA_PATH` | Overrides `tools.sevenzip` |
//!
//! ## Examples
//!
//! ```toml
//! [tools]
//! sevenzip = "~/bin/7za"
//!
//! [archive]
//! compression = "maximum"
//! excluded = ["*.map"]
//! ```
//!
use crate::common::archive::CompressionLevel;
use crate::core::error::{DistpackError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Environment variable forcing a compression level on every backend.
pub const ENV_COMPRESSION_LEVEL: &str = "DISTPACK_COMPRESSION_LEVEL";
/// Environment variable selecting a 7z filter (BCJ, BCJ2, ARM, ...).
pub const ENV_7Z_FILTER: &str = "DISTPACK_7Z_FILTER";
/// Environment variable enabling verbose backend output.
pub const ENV_DEBUG_7Z: &str = "DISTPACK_DEBUG_7Z";
/// Environment variable overriding the 7za binary.
pub const ENV_7ZA_PATH: &str = "DISTPACK_7ZA_PATH";

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub archive: ArchiveDefaults,
}

/// Locations of the external compression backends.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// 7-Zip standalone binary (`7za`). Can use `~`.
    #[serde(default = "default_sevenzip")]
    pub sevenzip: String,
    /// Info-ZIP `zip`, used for the NFD fallback on macOS.
    #[serde(default = "default_zip")]
    pub zip: String,
    /// `lzip`, used for `tar.lz`.
    #[serde(default = "default_lzip")]
    pub lzip: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sevenzip: default_sevenzip(),
            zip: default_zip(),
            lzip: default_lzip(),
        }
    }
}

/// Archive option defaults applied when the command line does not set them.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveDefaults {
    pub compression: Option<CompressionLevel>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

fn default_sevenzip() -> String {
    "7za".to_string()
}
fn default_zip() -> String {
    "zip".to_string()
}
fn default_lzip() -> String {
    "lzip".to_string()
}

/// Read-only snapshot of the environment variables the argument builders honour.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Raw level passed through to the backend (`-mx=<level>` / `-<level>`).
    pub compression_level: Option<String>,
    /// 7z filter name (`-mf=<filter>`).
    pub sevenzip_filter: Option<String>,
    /// Verbose backend output.
    pub debug: bool,
}

impl EnvOverrides {
    /// Captures the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a snapshot from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let debug = non_empty(ENV_DEBUG_7Z)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false"))
            .unwrap_or(false);
        let overrides = Self {
            compression_level: non_empty(ENV_COMPRESSION_LEVEL).map(|v| v.trim().to_string()),
            sevenzip_filter: non_empty(ENV_7Z_FILTER).map(|v| v.trim().to_string()),
            debug,
        };
        debug!("Environment overrides: {:?}", overrides);
        overrides
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".distpack.toml";

/// Loads, merges, expands and validates configuration, then applies
/// `DISTPACK_7ZA_PATH` on top.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    if let Ok(path) = std::env::var(ENV_7ZA_PATH) {
        if !path.trim().is_empty() {
            debug!("Using 7za from {}: {}", ENV_7ZA_PATH, path);
            merged_config.tools.sevenzip = path;
        }
    }
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "distpack", "distpack") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            load_config_from_path(&path).map(Some)
        }
        None => {
            debug!("No project configuration file (.distpack.toml) found.");
            Ok(None)
        }
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let pick = |project: String, user: String, default: String| {
        if project != default {
            project
        } else {
            user
        }
    };
    Config {
        tools: ToolsConfig {
            sevenzip: pick(project.tools.sevenzip, user.tools.sevenzip, default_sevenzip()),
            zip: pick(project.tools.zip, user.tools.zip, default_zip()),
            lzip: pick(project.tools.lzip, user.tools.lzip, default_lzip()),
        },
        archive: ArchiveDefaults {
            compression: project.archive.compression.or(user.archive.compression),
            excluded: if !project.archive.excluded.is_empty() {
                project.archive.excluded
            } else {
                user.archive.excluded
            },
        },
    }
}

fn expand_config_paths(config: &mut Config) {
    for tool in [
        &mut config.tools.sevenzip,
        &mut config.tools.zip,
        &mut config.tools.lzip,
    ] {
        *tool = shellexpand::tilde(tool.as_str()).into_owned();
    }
    debug!("Expanded tool paths: {:?}", config.tools);
}

fn validate_config(config: &Config) -> Result<()> {
    for (name, value) in [
        ("sevenzip", &config.tools.sevenzip),
        ("zip", &config.tools.zip),
        ("lzip", &config.tools.lzip),
    ] {
        if value.trim().is_empty() {
            return Err(anyhow!(DistpackError::Config(format!(
                "Tool path 'tools.{}' cannot be empty.",
                name
            ))));
        }
    }
    for pattern in &config.archive.excluded {
        if pattern.is_empty() {
            return Err(anyhow!(DistpackError::Config(
                "Exclusion patterns in 'archive.excluded' cannot be empty.".to_string()
            )));
        }
    }
    Ok(())
}
