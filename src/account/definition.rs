//! Staged storage account definition
//!
//! A definition moves through narrowing stages, tracked as a phantom type
//! parameter, so that only the calls legal at a given point compile:
//!
//! ```text
//! Blank --with_region--> WithGroup --with_*_resource_group--> WithCreate
//! WithCreate --with_blob_storage_account_kind--> WithCreateAndAccessTier
//! WithCreate --with_active_directory--> WithActiveDirectoryProperties
//! ```
//!
//! Every `CreateStage` accepts the common setters (SKU, kind, encryption,
//! network, flags, tags) and the terminal [`StorageAccountDefinition::create`].
//! Setters never fail; content such as domain names, key vault URIs or IP
//! ranges is validated by the service when the definition is submitted.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::{debug, error, info};

use super::models::{
    AccessTier, AccountDefinition, ActiveDirectoryProperties, CustomDomain, DefaultAction,
    DirectoryService, KeyVaultKeyReference, Kind, NetworkBypass, ResourceGroupRef, RoutingChoice,
    StorageAccount, StorageAccountSkuType,
};
use super::operations::StorageAccountOperations;
use crate::error::Result;

/// Stage marker carried by a definition
pub trait DefinitionStage: stage::Sealed {
    const NAME: &'static str;
}

/// Stages from which the account can be configured and created
pub trait CreateStage: DefinitionStage {}

mod stage {
    pub trait Sealed {}
}

/// First stage: the region has not been chosen yet
#[derive(Debug, Clone, Copy)]
pub struct Blank;

/// The resource group has not been chosen yet
#[derive(Debug, Clone, Copy)]
pub struct WithGroup;

/// All required properties are set; optional ones may follow
#[derive(Debug, Clone, Copy)]
pub struct WithCreate;

/// Blob storage kind was chosen, so the access tier may be set
#[derive(Debug, Clone, Copy)]
pub struct WithCreateAndAccessTier;

/// Active Directory was chosen, so its domain properties may be set
#[derive(Debug, Clone, Copy)]
pub struct WithActiveDirectoryProperties;

impl stage::Sealed for Blank {}
impl stage::Sealed for WithGroup {}
impl stage::Sealed for WithCreate {}
impl stage::Sealed for WithCreateAndAccessTier {}
impl stage::Sealed for WithActiveDirectoryProperties {}

impl DefinitionStage for Blank {
    const NAME: &'static str = "Blank";
}

impl DefinitionStage for WithGroup {
    const NAME: &'static str = "WithGroup";
}

impl DefinitionStage for WithCreate {
    const NAME: &'static str = "WithCreate";
}

impl DefinitionStage for WithCreateAndAccessTier {
    const NAME: &'static str = "WithCreateAndAccessTier";
}

impl DefinitionStage for WithActiveDirectoryProperties {
    const NAME: &'static str = "WithActiveDirectoryProperties";
}

impl CreateStage for WithCreate {}
impl CreateStage for WithCreateAndAccessTier {}
impl CreateStage for WithActiveDirectoryProperties {}

/// Fluent storage account definition at stage `S`
#[derive(Debug, Clone)]
pub struct StorageAccountDefinition<S: DefinitionStage> {
    inner: AccountDefinition,
    _stage: PhantomData<S>,
}

impl StorageAccountDefinition<Blank> {
    /// Start defining a storage account with the given name
    pub fn define<N: Into<String>>(name: N) -> Self {
        let inner = AccountDefinition::new(name);
        debug!(account = %inner.name, "Starting storage account definition");
        Self {
            inner,
            _stage: PhantomData,
        }
    }

    /// Azure region the account is created in
    pub fn with_region<R: Into<String>>(mut self, region: R) -> StorageAccountDefinition<WithGroup> {
        self.inner.region = Some(region.into());
        self.transition()
    }
}

impl StorageAccountDefinition<WithGroup> {
    /// Place the account in a resource group that already exists
    pub fn with_existing_resource_group<G: Into<String>>(
        self,
        name: G,
    ) -> StorageAccountDefinition<WithCreate> {
        self.with_resource_group(name.into(), false)
    }

    /// Create the resource group along with the account
    pub fn with_new_resource_group<G: Into<String>>(
        self,
        name: G,
    ) -> StorageAccountDefinition<WithCreate> {
        self.with_resource_group(name.into(), true)
    }

    fn with_resource_group(mut self, name: String, is_new: bool) -> StorageAccountDefinition<WithCreate> {
        self.inner.resource_group = Some(ResourceGroupRef { name, is_new });
        self.transition()
    }
}

impl<S: DefinitionStage> StorageAccountDefinition<S> {
    /// Properties accumulated so far
    pub fn definition(&self) -> &AccountDefinition {
        &self.inner
    }

    /// Consume the builder and keep only the accumulated properties
    pub fn into_definition(self) -> AccountDefinition {
        self.inner
    }

    /// Name of the current stage
    pub fn stage(&self) -> &'static str {
        S::NAME
    }

    fn transition<T: DefinitionStage>(self) -> StorageAccountDefinition<T> {
        debug!(
            account = %self.inner.name,
            from = S::NAME,
            to = T::NAME,
            "Definition stage transition"
        );
        StorageAccountDefinition {
            inner: self.inner,
            _stage: PhantomData,
        }
    }
}

impl<S: CreateStage> StorageAccountDefinition<S> {
    // SKU

    /// Set the SKU. The last SKU chosen wins.
    pub fn with_sku(mut self, sku: StorageAccountSkuType) -> Self {
        self.inner.sku = Some(sku);
        self
    }

    pub fn with_standard_lrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardLrs)
    }

    pub fn with_standard_grs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardGrs)
    }

    pub fn with_standard_ragrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardRagrs)
    }

    pub fn with_standard_zrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardZrs)
    }

    pub fn with_standard_gzrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardGzrs)
    }

    pub fn with_standard_ragzrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::StandardRagzrs)
    }

    pub fn with_premium_lrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::PremiumLrs)
    }

    pub fn with_premium_zrs(self) -> Self {
        self.with_sku(StorageAccountSkuType::PremiumZrs)
    }

    // Account kind

    /// General purpose v1 account
    pub fn with_general_purpose_account_kind(self) -> StorageAccountDefinition<WithCreate> {
        self.with_kind(Kind::Storage).transition()
    }

    /// General purpose v2 account
    pub fn with_general_purpose_account_kind_v2(self) -> StorageAccountDefinition<WithCreate> {
        self.with_kind(Kind::StorageV2).transition()
    }

    /// Blob-only account. The access tier starts out as Hot.
    pub fn with_blob_storage_account_kind(mut self) -> StorageAccountDefinition<WithCreateAndAccessTier> {
        self.inner.kind = Some(Kind::BlobStorage);
        self.inner.access_tier = Some(AccessTier::Hot);
        self.transition()
    }

    /// Premium block blob account
    pub fn with_block_blob_storage_account_kind(self) -> StorageAccountDefinition<WithCreate> {
        self.with_kind(Kind::BlockBlobStorage).transition()
    }

    /// Premium file share account
    pub fn with_file_storage_account_kind(self) -> StorageAccountDefinition<WithCreate> {
        self.with_kind(Kind::FileStorage).transition()
    }

    fn with_kind(mut self, kind: Kind) -> Self {
        self.inner.kind = Some(kind);
        if !kind.supports_access_tier() {
            self.inner.access_tier = None;
        }
        self
    }

    // Encryption

    pub fn with_blob_encryption(mut self) -> Self {
        self.inner.encryption.blob_enabled = Some(true);
        self
    }

    pub fn without_blob_encryption(mut self) -> Self {
        self.inner.encryption.blob_enabled = Some(false);
        self
    }

    pub fn with_file_encryption(mut self) -> Self {
        self.inner.encryption.file_enabled = Some(true);
        self
    }

    pub fn without_file_encryption(mut self) -> Self {
        self.inner.encryption.file_enabled = Some(false);
        self
    }

    /// Encrypt with a customer-managed key instead of a Microsoft-managed one
    pub fn with_encryption_key_from_key_vault<U, N, V>(
        mut self,
        key_vault_uri: U,
        key_name: N,
        key_version: V,
    ) -> Self
    where
        U: Into<String>,
        N: Into<String>,
        V: Into<String>,
    {
        self.inner.encryption.key_vault_key = Some(KeyVaultKeyReference {
            vault_uri: key_vault_uri.into(),
            key_name: key_name.into(),
            key_version: key_version.into(),
        });
        self
    }

    // Custom domain

    pub fn with_custom_domain(mut self, custom_domain: CustomDomain) -> Self {
        self.inner.custom_domain = Some(custom_domain);
        self
    }

    pub fn with_custom_domain_name<N: Into<String>>(self, name: N) -> Self {
        self.with_custom_domain(CustomDomain::new(name))
    }

    pub fn with_custom_domain_and_subdomain<N: Into<String>>(self, name: N, use_sub_domain: bool) -> Self {
        self.with_custom_domain(CustomDomain::new(name).with_sub_domain(use_sub_domain))
    }

    // Network access

    /// Allow traffic from every network unless a rule says otherwise
    pub fn with_access_from_all_networks(mut self) -> Self {
        self.inner.network_rules.default_action = Some(DefaultAction::Allow);
        self
    }

    /// Deny traffic except from the subnets and addresses allowed by rules
    pub fn with_access_from_selected_networks(mut self) -> Self {
        self.inner.network_rules.default_action = Some(DefaultAction::Deny);
        self
    }

    /// Allow traffic from a virtual network subnet, given by resource ID
    pub fn with_access_from_network_subnet<I: Into<String>>(mut self, subnet_id: I) -> Self {
        self.inner.network_rules.allow_subnet(subnet_id.into());
        self
    }

    pub fn with_access_from_ip_address<A: Into<String>>(mut self, ip_address: A) -> Self {
        self.inner.network_rules.allow_ip(ip_address.into());
        self
    }

    /// Allow traffic from an address range in CIDR notation
    pub fn with_access_from_ip_address_range<C: Into<String>>(mut self, cidr: C) -> Self {
        self.inner.network_rules.allow_ip(cidr.into());
        self
    }

    pub fn with_access_from_azure_services(mut self) -> Self {
        self.inner.network_rules.bypass.insert(NetworkBypass::AzureServices);
        self
    }

    pub fn with_read_access_to_log_entries_from_any_network(mut self) -> Self {
        self.inner.network_rules.bypass.insert(NetworkBypass::Logging);
        self
    }

    pub fn with_read_access_to_metrics_from_any_network(mut self) -> Self {
        self.inner.network_rules.bypass.insert(NetworkBypass::Metrics);
        self
    }

    // Identity and flags

    /// Attach a system-assigned managed identity. Cannot be undone after creation.
    pub fn with_system_assigned_managed_service_identity(mut self) -> Self {
        self.inner.managed_identity = true;
        self
    }

    pub fn with_https_only(mut self, https_only: bool) -> Self {
        self.inner.https_only = Some(https_only);
        self
    }

    pub fn with_only_https_traffic(self) -> Self {
        self.with_https_only(true)
    }

    pub fn with_http_and_https_traffic(self) -> Self {
        self.with_https_only(false)
    }

    /// Hierarchical namespace (Data Lake Gen2). Preview, subject to change.
    pub fn with_hns_enabled(mut self, enabled: bool) -> Self {
        self.inner.hns_enabled = Some(enabled);
        self
    }

    /// Azure Files authentication through AAD Domain Services.
    /// Preview, subject to change.
    pub fn with_azure_files_aad_integration_enabled(mut self, enabled: bool) -> Self {
        self.inner.azure_files_aad_integration = Some(enabled);
        self
    }

    /// File shares up to 100 TiB. Preview, subject to change.
    pub fn with_large_file_shares(mut self, enabled: bool) -> Self {
        self.inner.large_file_shares = Some(enabled);
        self
    }

    // Directory service (preview, subject to change)

    pub fn with_none_directory_service(mut self) -> StorageAccountDefinition<WithCreate> {
        self.inner.directory_service = Some(DirectoryService::None);
        self.transition()
    }

    pub fn with_azure_active_directory_domain_services(mut self) -> StorageAccountDefinition<WithCreate> {
        self.inner.directory_service = Some(DirectoryService::AzureActiveDirectoryDomainServices);
        self.transition()
    }

    /// Bind file shares to an on-premises Active Directory domain.
    ///
    /// Replaces any earlier directory service choice; the domain properties
    /// start empty.
    pub fn with_active_directory(mut self) -> StorageAccountDefinition<WithActiveDirectoryProperties> {
        self.inner.directory_service =
            Some(DirectoryService::ActiveDirectory(ActiveDirectoryProperties::default()));
        self.transition()
    }

    // Routing (preview, subject to change)

    pub fn with_microsoft_routing(mut self) -> Self {
        self.inner.routing_preference = Some(RoutingChoice::MicrosoftRouting);
        self
    }

    pub fn with_internet_routing(mut self) -> Self {
        self.inner.routing_preference = Some(RoutingChoice::InternetRouting);
        self
    }

    // Tags

    /// Add a tag, overwriting any earlier value for the key
    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.inner.tags.insert(key.into(), value.into());
        self
    }

    /// Merge tags into the existing ones
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.inner.tags.extend(tags);
        self
    }

    /// Submit the definition to the resource provider.
    ///
    /// The definition is consumed; the returned handle describes the account
    /// as the service created it.
    pub async fn create(self, operations: &dyn StorageAccountOperations) -> Result<StorageAccount> {
        let definition = self.inner;
        info!(
            account = %definition.name,
            region = definition.region.as_deref().unwrap_or_default(),
            sku = ?definition.sku,
            kind = ?definition.kind,
            "Creating storage account"
        );

        match operations.create_storage_account(&definition).await {
            Ok(account) => {
                info!(account = %account.id, state = %account.provisioning_state, "Storage account created");
                Ok(account)
            }
            Err(e) => {
                error!(account = %definition.name, "Storage account creation failed: {}", e);
                Err(e)
            }
        }
    }
}

impl StorageAccountDefinition<WithCreateAndAccessTier> {
    /// Set the access tier of a blob storage account
    ///
    /// ```
    /// use xstore::account::{AccessTier, StorageAccountDefinition};
    ///
    /// let definition = StorageAccountDefinition::define("archive01")
    ///     .with_region("westus2")
    ///     .with_existing_resource_group("rg-archive")
    ///     .with_blob_storage_account_kind()
    ///     .with_access_tier(AccessTier::Cool)
    ///     .into_definition();
    /// assert_eq!(definition.access_tier, Some(AccessTier::Cool));
    /// ```
    ///
    /// Other kinds never reach this stage:
    ///
    /// ```compile_fail
    /// use xstore::account::{AccessTier, StorageAccountDefinition};
    ///
    /// let _ = StorageAccountDefinition::define("archive01")
    ///     .with_region("westus2")
    ///     .with_existing_resource_group("rg-archive")
    ///     .with_general_purpose_account_kind_v2()
    ///     .with_access_tier(AccessTier::Cool);
    /// ```
    pub fn with_access_tier(mut self, access_tier: AccessTier) -> Self {
        self.inner.access_tier = Some(access_tier);
        self
    }
}

impl StorageAccountDefinition<WithActiveDirectoryProperties> {
    fn update_active_directory<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(&mut ActiveDirectoryProperties),
    {
        let mut properties = match self.inner.directory_service.take() {
            Some(DirectoryService::ActiveDirectory(properties)) => properties,
            _ => ActiveDirectoryProperties::default(),
        };
        apply(&mut properties);
        self.inner.directory_service = Some(DirectoryService::ActiveDirectory(properties));
        self
    }

    pub fn with_azure_storage_sid<V: Into<String>>(self, sid: V) -> Self {
        let sid = sid.into();
        self.update_active_directory(|ad| ad.azure_storage_sid = Some(sid))
    }

    pub fn with_domain_guid<V: Into<String>>(self, guid: V) -> Self {
        let guid = guid.into();
        self.update_active_directory(|ad| ad.domain_guid = Some(guid))
    }

    pub fn with_domain_name<V: Into<String>>(self, name: V) -> Self {
        let name = name.into();
        self.update_active_directory(|ad| ad.domain_name = Some(name))
    }

    pub fn with_domain_sid<V: Into<String>>(self, sid: V) -> Self {
        let sid = sid.into();
        self.update_active_directory(|ad| ad.domain_sid = Some(sid))
    }

    pub fn with_forest_name<V: Into<String>>(self, name: V) -> Self {
        let name = name.into();
        self.update_active_directory(|ad| ad.forest_name = Some(name))
    }

    pub fn with_net_bios_domain_name<V: Into<String>>(self, name: V) -> Self {
        let name = name.into();
        self.update_active_directory(|ad| ad.net_bios_domain_name = Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> StorageAccountDefinition<WithCreate> {
        StorageAccountDefinition::define("acct1")
            .with_region("eastus")
            .with_existing_resource_group("rg-data")
    }

    #[test]
    fn test_required_stages_fill_region_and_group() {
        let blank = StorageAccountDefinition::define("acct1");
        assert_eq!(blank.stage(), "Blank");

        let definition = base().into_definition();
        assert_eq!(definition.name, "acct1");
        assert_eq!(definition.region.as_deref(), Some("eastus"));
        assert_eq!(
            definition.resource_group,
            Some(ResourceGroupRef {
                name: "rg-data".to_string(),
                is_new: false
            })
        );
    }

    #[test]
    fn test_new_resource_group_is_flagged() {
        let definition = StorageAccountDefinition::define("acct1")
            .with_region("westeurope")
            .with_new_resource_group("rg-new")
            .into_definition();
        assert!(definition.resource_group.map(|rg| rg.is_new).unwrap_or(false));
    }

    #[test]
    fn test_blob_kind_moves_to_access_tier_stage() {
        let definition = base().with_blob_storage_account_kind();
        assert_eq!(definition.stage(), "WithCreateAndAccessTier");
        assert_eq!(definition.definition().access_tier, Some(AccessTier::Hot));

        let definition = definition.with_access_tier(AccessTier::Cool).into_definition();
        assert_eq!(definition.kind, Some(Kind::BlobStorage));
        assert_eq!(definition.access_tier, Some(AccessTier::Cool));
    }

    #[test]
    fn test_leaving_blob_kind_clears_unsupported_tier() {
        let definition = base()
            .with_blob_storage_account_kind()
            .with_access_tier(AccessTier::Cool)
            .with_file_storage_account_kind()
            .into_definition();
        assert_eq!(definition.kind, Some(Kind::FileStorage));
        assert_eq!(definition.access_tier, None);

        let definition = base()
            .with_blob_storage_account_kind()
            .with_general_purpose_account_kind_v2()
            .into_definition();
        assert_eq!(definition.kind, Some(Kind::StorageV2));
        assert_eq!(definition.access_tier, Some(AccessTier::Hot));
    }

    #[test]
    fn test_common_setters_keep_current_stage() {
        let definition = base()
            .with_blob_storage_account_kind()
            .with_standard_grs()
            .with_only_https_traffic()
            .with_access_tier(AccessTier::Cool);
        assert_eq!(definition.stage(), "WithCreateAndAccessTier");
        assert_eq!(definition.definition().https_only, Some(true));
    }

    #[test]
    fn test_active_directory_properties_chain_in_any_order() {
        let definition = base()
            .with_active_directory()
            .with_net_bios_domain_name("CONTOSO")
            .with_domain_name("contoso.local")
            .with_forest_name("contoso.local")
            .with_domain_guid("aebfc118-9fa9-4732-a21f-d98e41a77ae1")
            .with_domain_sid("S-1-5-21-1")
            .with_azure_storage_sid("S-1-5-21-2");
        assert_eq!(definition.stage(), "WithActiveDirectoryProperties");

        match definition.into_definition().directory_service {
            Some(DirectoryService::ActiveDirectory(properties)) => {
                assert_eq!(properties.domain_name.as_deref(), Some("contoso.local"));
                assert_eq!(properties.net_bios_domain_name.as_deref(), Some("CONTOSO"));
                assert_eq!(properties.azure_storage_sid.as_deref(), Some("S-1-5-21-2"));
            }
            other => panic!("expected active directory, got {:?}", other),
        }
    }

    #[test]
    fn test_leaving_active_directory_stage_replaces_selection() {
        let definition = base()
            .with_active_directory()
            .with_domain_name("contoso.local")
            .with_azure_active_directory_domain_services()
            .into_definition();
        assert_eq!(
            definition.directory_service,
            Some(DirectoryService::AzureActiveDirectoryDomainServices)
        );
    }

    #[test]
    fn test_custom_domain_forms_converge() {
        let by_name = base().with_custom_domain_name("files.contoso.com").into_definition();
        let by_object = base()
            .with_custom_domain(CustomDomain::new("files.contoso.com"))
            .into_definition();
        assert_eq!(by_name.custom_domain, by_object.custom_domain);

        let with_sub = base()
            .with_custom_domain_and_subdomain("files.contoso.com", true)
            .into_definition();
        assert_eq!(
            with_sub.custom_domain,
            Some(CustomDomain {
                name: "files.contoso.com".to_string(),
                use_sub_domain: true
            })
        );
    }

    #[test]
    fn test_routing_is_last_write_wins() {
        let definition = base()
            .with_internet_routing()
            .with_microsoft_routing()
            .into_definition();
        assert_eq!(definition.routing_preference, Some(RoutingChoice::MicrosoftRouting));
    }

    #[test]
    fn test_key_vault_key_reference() {
        let definition = base()
            .with_encryption_key_from_key_vault("https://kv1.vault.azure.net/", "cmk", "v1")
            .without_file_encryption()
            .into_definition();
        let key = definition.encryption.key_vault_key.expect("key reference");
        assert_eq!(key.vault_uri, "https://kv1.vault.azure.net/");
        assert_eq!(key.key_name, "cmk");
        assert_eq!(key.key_version, "v1");
        assert_eq!(definition.encryption.file_enabled, Some(false));
        assert_eq!(definition.encryption.blob_enabled, None);
    }
}
