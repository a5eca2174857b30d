//! Storage account data models and types
//!
//! This module defines the value types a storage account definition is made
//! of (SKU, kind, access tier, encryption, network rules, directory service)
//! and the accumulated `AccountDefinition` record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::{Result, XstoreError};

/// Billing tier and replication strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum StorageAccountSkuType {
    #[serde(rename = "Standard_LRS")]
    #[value(name = "standard-lrs")]
    StandardLrs,
    #[serde(rename = "Standard_GRS")]
    #[value(name = "standard-grs")]
    StandardGrs,
    #[serde(rename = "Standard_RAGRS")]
    #[value(name = "standard-ragrs")]
    StandardRagrs,
    #[serde(rename = "Standard_ZRS")]
    #[value(name = "standard-zrs")]
    StandardZrs,
    #[serde(rename = "Standard_GZRS")]
    #[value(name = "standard-gzrs")]
    StandardGzrs,
    #[serde(rename = "Standard_RAGZRS")]
    #[value(name = "standard-ragzrs")]
    StandardRagzrs,
    #[serde(rename = "Premium_LRS")]
    #[value(name = "premium-lrs")]
    PremiumLrs,
    #[serde(rename = "Premium_ZRS")]
    #[value(name = "premium-zrs")]
    PremiumZrs,
}

impl StorageAccountSkuType {
    pub const ALL: [StorageAccountSkuType; 8] = [
        Self::StandardLrs,
        Self::StandardGrs,
        Self::StandardRagrs,
        Self::StandardZrs,
        Self::StandardGzrs,
        Self::StandardRagzrs,
        Self::PremiumLrs,
        Self::PremiumZrs,
    ];

    /// Name as the resource provider spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardLrs => "Standard_LRS",
            Self::StandardGrs => "Standard_GRS",
            Self::StandardRagrs => "Standard_RAGRS",
            Self::StandardZrs => "Standard_ZRS",
            Self::StandardGzrs => "Standard_GZRS",
            Self::StandardRagzrs => "Standard_RAGZRS",
            Self::PremiumLrs => "Premium_LRS",
            Self::PremiumZrs => "Premium_ZRS",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Self::PremiumLrs | Self::PremiumZrs)
    }
}

impl fmt::Display for StorageAccountSkuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageAccountSkuType {
    type Err = XstoreError;

    /// Accepts both `Standard_LRS` and `standard-lrs` spellings, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|sku| sku.as_str().to_lowercase() == normalized)
            .ok_or_else(|| XstoreError::invalid_argument(format!("Unknown storage SKU: {s}")))
    }
}

/// Data-service surface supported by the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Kind {
    /// General purpose v1
    #[value(name = "storage")]
    Storage,
    /// General purpose v2
    #[value(name = "storage-v2")]
    StorageV2,
    #[value(name = "blob-storage")]
    BlobStorage,
    #[value(name = "block-blob-storage")]
    BlockBlobStorage,
    #[value(name = "file-storage")]
    FileStorage,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "Storage",
            Self::StorageV2 => "StorageV2",
            Self::BlobStorage => "BlobStorage",
            Self::BlockBlobStorage => "BlockBlobStorage",
            Self::FileStorage => "FileStorage",
        }
    }

    /// Whether accounts of this kind carry an access tier
    pub fn supports_access_tier(&self) -> bool {
        matches!(self, Self::BlobStorage | Self::StorageV2)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hot/Cool designation for blob data.
///
/// The service rejects tier changes more often than once every 7 days; that
/// is checked remotely, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum AccessTier {
    Hot,
    Cool,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hot => write!(f, "Hot"),
            Self::Cool => write!(f, "Cool"),
        }
    }
}

/// Reference to a customer-managed key in Key Vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultKeyReference {
    pub vault_uri: String,
    pub key_name: String,
    pub key_version: String,
}

/// Encryption toggles accumulated on a definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionSettings {
    pub blob_enabled: Option<bool>,
    pub file_enabled: Option<bool>,
    pub key_vault_key: Option<KeyVaultKeyReference>,
}

impl EncryptionSettings {
    pub fn is_empty(&self) -> bool {
        self.blob_enabled.is_none() && self.file_enabled.is_none() && self.key_vault_key.is_none()
    }
}

/// Custom domain mapped onto the blob endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomain {
    pub name: String,
    pub use_sub_domain: bool,
}

impl CustomDomain {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            use_sub_domain: false,
        }
    }

    /// Use indirect CNAME validation (the `asverify` subdomain)
    pub fn with_sub_domain(mut self, use_sub_domain: bool) -> Self {
        self.use_sub_domain = use_sub_domain;
        self
    }
}

/// Action applied to traffic that matches no rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum DefaultAction {
    Allow,
    Deny,
}

impl fmt::Display for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "Allow"),
            Self::Deny => write!(f, "Deny"),
        }
    }
}

/// Traffic classes allowed through regardless of the network rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetworkBypass {
    AzureServices,
    Logging,
    Metrics,
}

impl fmt::Display for NetworkBypass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureServices => write!(f, "AzureServices"),
            Self::Logging => write!(f, "Logging"),
            Self::Metrics => write!(f, "Metrics"),
        }
    }
}

/// Network access rules accumulated on a definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRules {
    pub default_action: Option<DefaultAction>,
    pub subnet_ids: Vec<String>,
    /// Single addresses and CIDR ranges, in insertion order
    pub ip_rules: Vec<String>,
    pub bypass: BTreeSet<NetworkBypass>,
}

impl NetworkRules {
    pub fn is_empty(&self) -> bool {
        self.default_action.is_none()
            && self.subnet_ids.is_empty()
            && self.ip_rules.is_empty()
            && self.bypass.is_empty()
    }

    pub fn has_rules(&self) -> bool {
        !self.subnet_ids.is_empty() || !self.ip_rules.is_empty()
    }

    pub(crate) fn allow_subnet(&mut self, subnet_id: String) {
        if !self.subnet_ids.iter().any(|s| s.eq_ignore_ascii_case(&subnet_id)) {
            self.subnet_ids.push(subnet_id);
        }
    }

    pub(crate) fn allow_ip(&mut self, ip_or_range: String) {
        if !self.ip_rules.contains(&ip_or_range) {
            self.ip_rules.push(ip_or_range);
        }
    }
}

/// Active Directory domain the account's file shares authenticate against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDirectoryProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_storage_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_bios_domain_name: Option<String>,
}

/// Identity directory bound to Azure Files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryService {
    None,
    AzureActiveDirectoryDomainServices,
    ActiveDirectory(ActiveDirectoryProperties),
}

impl DirectoryService {
    /// Value of `directoryServiceOptions` in the provider payload
    pub fn options_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::AzureActiveDirectoryDomainServices => "AADDS",
            Self::ActiveDirectory(_) => "AD",
        }
    }
}

/// Network routing choice for data traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum RoutingChoice {
    #[value(name = "microsoft")]
    MicrosoftRouting,
    #[value(name = "internet")]
    InternetRouting,
}

impl fmt::Display for RoutingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MicrosoftRouting => write!(f, "MicrosoftRouting"),
            Self::InternetRouting => write!(f, "InternetRouting"),
        }
    }
}

/// Resource group the account is placed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupRef {
    pub name: String,
    /// The group is created alongside the account
    pub is_new: bool,
}

/// Accumulated storage account configuration.
///
/// Created empty when a definition starts, mutated only through the staged
/// builder, consumed once by the remote create call. `None` means "leave it
/// to the service".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDefinition {
    pub name: String,
    pub region: Option<String>,
    pub resource_group: Option<ResourceGroupRef>,
    pub sku: Option<StorageAccountSkuType>,
    pub kind: Option<Kind>,
    pub access_tier: Option<AccessTier>,
    pub encryption: EncryptionSettings,
    pub custom_domain: Option<CustomDomain>,
    pub network_rules: NetworkRules,
    pub managed_identity: bool,
    pub https_only: Option<bool>,
    pub hns_enabled: Option<bool>,
    pub azure_files_aad_integration: Option<bool>,
    pub directory_service: Option<DirectoryService>,
    pub large_file_shares: Option<bool>,
    pub routing_preference: Option<RoutingChoice>,
    pub tags: HashMap<String, String>,
}

impl AccountDefinition {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Flatten the definition into setting/value rows for table output
    pub fn summary_rows(&self) -> Vec<DefinitionField> {
        let mut rows = vec![DefinitionField::new("Name", &self.name)];
        let mut push = |setting: &str, value: Option<String>| {
            if let Some(value) = value {
                rows.push(DefinitionField::new(setting, value));
            }
        };

        push("Region", self.region.clone());
        push(
            "Resource Group",
            self.resource_group.as_ref().map(|rg| {
                if rg.is_new {
                    format!("{} (new)", rg.name)
                } else {
                    rg.name.clone()
                }
            }),
        );
        push("SKU", self.sku.map(|s| s.to_string()));
        push("Kind", self.kind.map(|k| k.to_string()));
        push("Access Tier", self.access_tier.map(|t| t.to_string()));
        push("Blob Encryption", self.encryption.blob_enabled.map(on_off));
        push("File Encryption", self.encryption.file_enabled.map(on_off));
        push(
            "Encryption Key",
            self.encryption
                .key_vault_key
                .as_ref()
                .map(|k| format!("{}keys/{}/{}", with_trailing_slash(&k.vault_uri), k.key_name, k.key_version)),
        );
        push(
            "Custom Domain",
            self.custom_domain.as_ref().map(|d| {
                if d.use_sub_domain {
                    format!("{} (subdomain)", d.name)
                } else {
                    d.name.clone()
                }
            }),
        );
        push(
            "Default Network Action",
            self.network_rules.default_action.map(|a| a.to_string()),
        );
        if !self.network_rules.subnet_ids.is_empty() {
            push("Allowed Subnets", Some(self.network_rules.subnet_ids.join(", ")));
        }
        if !self.network_rules.ip_rules.is_empty() {
            push("Allowed IPs", Some(self.network_rules.ip_rules.join(", ")));
        }
        if !self.network_rules.bypass.is_empty() {
            let bypass: Vec<String> = self.network_rules.bypass.iter().map(|b| b.to_string()).collect();
            push("Network Bypass", Some(bypass.join(", ")));
        }
        if self.managed_identity {
            push("Managed Identity", Some("SystemAssigned".to_string()));
        }
        push("HTTPS Only", self.https_only.map(on_off));
        push("Hierarchical Namespace", self.hns_enabled.map(on_off));
        push("Azure Files AAD", self.azure_files_aad_integration.map(on_off));
        push(
            "Directory Service",
            self.directory_service.as_ref().map(|d| d.options_name().to_string()),
        );
        push("Large File Shares", self.large_file_shares.map(on_off));
        push("Routing", self.routing_preference.map(|r| r.to_string()));

        let mut tags: Vec<_> = self.tags.iter().collect();
        tags.sort();
        for (key, value) in tags {
            rows.push(DefinitionField::new(&format!("Tag: {key}"), value));
        }

        rows
    }
}

fn on_off(flag: bool) -> String {
    if flag { "Enabled" } else { "Disabled" }.to_string()
}

fn with_trailing_slash(uri: &str) -> String {
    if uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{uri}/")
    }
}

/// One row of a definition summary table
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DefinitionField {
    #[tabled(rename = "Setting")]
    pub setting: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl DefinitionField {
    fn new<V: AsRef<str>>(setting: &str, value: V) -> Self {
        Self {
            setting: setting.to_string(),
            value: value.as_ref().to_string(),
        }
    }
}

/// Provisioning state reported by the resource provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Creating,
    ResolvingDns,
    Succeeded,
    Unknown,
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningState::Creating => write!(f, "Creating"),
            ProvisioningState::ResolvingDns => write!(f, "ResolvingDNS"),
            ProvisioningState::Succeeded => write!(f, "Succeeded"),
            ProvisioningState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Public service endpoints of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryEndpoints {
    pub blob: Option<String>,
    pub queue: Option<String>,
    pub table: Option<String>,
    pub file: Option<String>,
    pub dfs: Option<String>,
    pub web: Option<String>,
}

impl PrimaryEndpoints {
    /// Endpoints in the public cloud for the given account name
    pub fn for_account(name: &str) -> Self {
        let endpoint = |service: &str| Some(format!("https://{name}.{service}.core.windows.net/"));
        Self {
            blob: endpoint("blob"),
            queue: endpoint("queue"),
            table: endpoint("table"),
            file: endpoint("file"),
            dfs: endpoint("dfs"),
            web: endpoint("web"),
        }
    }
}

/// Handle to a created storage account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub id: String,
    pub name: String,
    pub region: String,
    pub resource_group: String,
    pub sku: StorageAccountSkuType,
    pub kind: Kind,
    pub access_tier: Option<AccessTier>,
    pub provisioning_state: ProvisioningState,
    pub primary_endpoints: PrimaryEndpoints,
    pub created_at: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
}

impl StorageAccount {
    /// ARM resource ID of a storage account
    pub fn resource_id(subscription_id: &str, resource_group: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
            subscription_id, resource_group, name
        )
    }
}
