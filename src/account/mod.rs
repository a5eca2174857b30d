//! Storage account definition module
//!
//! This module provides the staged builder for storage account definitions,
//! the value types it accumulates, the create-parameters document derived
//! from a definition, and the trait the remote create call is made through.

pub mod definition;
pub mod models;
pub mod operations;
pub mod parameters;

pub use definition::*;
pub use models::*;
pub use operations::*;
pub use parameters::*;
