//! Configuration management module
//!
//! This module handles configuration loading, validation, and persistence
//! from environment variables, the configuration file, and default values.

pub mod settings;

pub use settings::*;
