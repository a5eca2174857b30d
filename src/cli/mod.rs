//! Command-line interface module
//!
//! This module defines the CLI structure and command handling
//! using the clap crate for argument parsing.

pub mod commands;

pub use commands::*;
