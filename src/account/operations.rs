//! Storage account operations
//!
//! The remote side of a definition. Transport, authentication, polling and
//! retries belong to the client that implements this trait; the definition
//! only hands over its accumulated properties.

use async_trait::async_trait;

use super::models::{AccountDefinition, StorageAccount};
use crate::error::Result;

/// Trait for the resource provider's create call
#[async_trait]
pub trait StorageAccountOperations: Send + Sync {
    /// Create a storage account from a finished definition.
    ///
    /// Remote validation failures (SKU/kind compatibility, access tier
    /// cooldown, malformed network rules) come back as
    /// [`crate::error::XstoreError::AzureApiError`].
    async fn create_storage_account(&self, definition: &AccountDefinition) -> Result<StorageAccount>;
}
