//! Storage account creation tests
//!
//! The resource provider call is mocked; these tests check what the
//! definition hands over and how remote failures come back.

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::always;

use xstore::account::{
    AccessTier, AccountDefinition, Kind, PrimaryEndpoints, ProvisioningState, StorageAccount,
    StorageAccountDefinition, StorageAccountOperations, StorageAccountSkuType, DEFAULT_KIND,
    DEFAULT_SKU,
};
use xstore::{Result, XstoreError};

mock! {
    pub Operations {}

    #[async_trait]
    impl StorageAccountOperations for Operations {
        async fn create_storage_account(&self, definition: &AccountDefinition) -> Result<StorageAccount>;
    }
}

/// What the service would report back for a definition
fn created_account(definition: &AccountDefinition) -> StorageAccount {
    let resource_group = definition
        .resource_group
        .as_ref()
        .map(|rg| rg.name.clone())
        .unwrap_or_default();

    StorageAccount {
        id: StorageAccount::resource_id("sub-1", &resource_group, &definition.name),
        name: definition.name.clone(),
        region: definition.region.clone().unwrap_or_default(),
        resource_group,
        sku: definition.sku.unwrap_or(DEFAULT_SKU),
        kind: definition.kind.unwrap_or(DEFAULT_KIND),
        access_tier: definition.access_tier,
        provisioning_state: ProvisioningState::Succeeded,
        primary_endpoints: PrimaryEndpoints::for_account(&definition.name),
        created_at: None,
        tags: definition.tags.clone(),
    }
}

#[tokio::test]
async fn test_create_hands_over_definition_once() {
    let mut operations = MockOperations::new();
    operations
        .expect_create_storage_account()
        .withf(|definition: &AccountDefinition| {
            definition.name == "logs01"
                && definition.sku == Some(StorageAccountSkuType::StandardLrs)
                && definition.kind == Some(Kind::BlobStorage)
                && definition.access_tier == Some(AccessTier::Hot)
                && definition.tags.get("env").map(String::as_str) == Some("prod")
        })
        .times(1)
        .returning(|definition| Ok(created_account(definition)));

    let account = StorageAccountDefinition::define("logs01")
        .with_region("eastus")
        .with_new_resource_group("rg-logs")
        .with_standard_lrs()
        .with_blob_storage_account_kind()
        .with_tag("env", "prod")
        .create(&operations)
        .await
        .unwrap();

    assert_eq!(
        account.id,
        "/subscriptions/sub-1/resourceGroups/rg-logs/providers/Microsoft.Storage/storageAccounts/logs01"
    );
    assert_eq!(account.provisioning_state, ProvisioningState::Succeeded);
    assert_eq!(account.access_tier, Some(AccessTier::Hot));
    assert_eq!(
        account.primary_endpoints.blob.as_deref(),
        Some("https://logs01.blob.core.windows.net/")
    );
}

#[tokio::test]
async fn test_create_from_active_directory_stage() {
    let mut operations = MockOperations::new();
    operations
        .expect_create_storage_account()
        .with(always())
        .times(1)
        .returning(|definition| Ok(created_account(definition)));

    let account = StorageAccountDefinition::define("files01")
        .with_region("westeurope")
        .with_existing_resource_group("rg-files")
        .with_file_storage_account_kind()
        .with_active_directory()
        .with_domain_name("corp.contoso.com")
        .with_net_bios_domain_name("CORP")
        .create(&operations)
        .await
        .unwrap();

    assert_eq!(account.kind, Kind::FileStorage);
    assert_eq!(account.sku, DEFAULT_SKU);
    assert_eq!(account.access_tier, None);
}

#[tokio::test]
async fn test_remote_failure_is_returned_unchanged() {
    let mut operations = MockOperations::new();
    operations
        .expect_create_storage_account()
        .times(1)
        .returning(|_| {
            Err(XstoreError::azure_api(
                409,
                "The storage account named logs01 is already taken.",
            ))
        });

    let result = StorageAccountDefinition::define("logs01")
        .with_region("eastus")
        .with_existing_resource_group("rg-logs")
        .create(&operations)
        .await;

    match result {
        Err(error) => {
            assert_eq!(error.remote_status(), Some(409));
            assert!(error.to_string().contains("already taken"));
        }
        Ok(account) => panic!("expected a remote failure, got {:?}", account),
    }
}

#[test]
fn test_create_outside_a_runtime() {
    let mut operations = MockOperations::new();
    operations
        .expect_create_storage_account()
        .withf(|definition: &AccountDefinition| {
            definition
                .resource_group
                .as_ref()
                .map(|rg| rg.is_new)
                .unwrap_or(false)
        })
        .times(1)
        .returning(|definition| Ok(created_account(definition)));

    let definition = StorageAccountDefinition::define("queue01")
        .with_region("eastus")
        .with_new_resource_group("rg-queues")
        .with_standard_zrs();

    let account = tokio_test::block_on(definition.create(&operations)).unwrap();

    assert_eq!(account.sku, StorageAccountSkuType::StandardZrs);
    assert_eq!(account.kind, DEFAULT_KIND);
    assert_eq!(account.resource_group, "rg-queues");
}
