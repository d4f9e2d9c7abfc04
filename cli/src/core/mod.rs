//! # distpack Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the infrastructure shared by every command:
//! - `config`: configuration files (tool locations, archive defaults) and the
//!   process environment snapshot
//! - `error`: the `DistpackError` enum and the crate-wide `Result` alias
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{DistpackError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
