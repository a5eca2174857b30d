//! xstore - Azure Storage account definitions
//!
//! A staged builder for storage account definitions, the create-parameters
//! document derived from them, and the `xs` planning CLI.

pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use account::{AccountDefinition, StorageAccountDefinition, StorageAccountOperations};
pub use error::{Result, XstoreError};
