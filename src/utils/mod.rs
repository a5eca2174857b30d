//! Utility functions module
//!
//! This module contains output formatting and storage account name
//! validation helpers.

pub mod format;
pub mod sanitizer;

pub use format::*;
pub use sanitizer::*;
