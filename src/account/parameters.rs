//! Create-parameters document
//!
//! Projects an `AccountDefinition` onto the resource provider's
//! `StorageAccountCreateParameters` shape, filling in the service defaults
//! for anything the caller left unset. This is what `xs plan` prints.

use serde::Serialize;
use std::collections::HashMap;

use super::models::{
    AccessTier, AccountDefinition, ActiveDirectoryProperties, DefaultAction, DirectoryService,
    Kind, RoutingChoice, StorageAccountSkuType,
};

/// SKU used when the definition does not choose one
pub const DEFAULT_SKU: StorageAccountSkuType = StorageAccountSkuType::StandardRagrs;

/// Kind used when the definition does not choose one
pub const DEFAULT_KIND: Kind = Kind::StorageV2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountCreateParameters {
    pub location: String,
    pub sku: SkuParameter,
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityParameter>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    pub properties: StorageAccountPropertiesParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuParameter {
    pub name: StorageAccountSkuType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityParameter {
    #[serde(rename = "type")]
    pub identity_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountPropertiesParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_tier: Option<AccessTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<CustomDomainParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_acls: Option<NetworkAclsParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_https_traffic_only: Option<bool>,
    #[serde(rename = "isHnsEnabled", skip_serializing_if = "Option::is_none")]
    pub is_hns_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_files_identity_based_authentication: Option<FilesIdentityAuthenticationParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_file_shares_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<RoutingPreferenceParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainParameter {
    pub name: String,
    pub use_sub_domain_name: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionParameter {
    pub services: EncryptionServicesParameter,
    pub key_source: String,
    #[serde(rename = "keyvaultproperties", skip_serializing_if = "Option::is_none")]
    pub key_vault_properties: Option<KeyVaultPropertiesParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncryptionServicesParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<EncryptionServiceParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptionServiceParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncryptionServiceParameter {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyVaultPropertiesParameter {
    #[serde(rename = "keyname")]
    pub key_name: String,
    #[serde(rename = "keyversion")]
    pub key_version: String,
    #[serde(rename = "keyvaulturi")]
    pub key_vault_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAclsParameter {
    pub bypass: String,
    pub default_action: DefaultAction,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_network_rules: Vec<VirtualNetworkRuleParameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_rules: Vec<IpRuleParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualNetworkRuleParameter {
    pub id: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpRuleParameter {
    pub value: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesIdentityAuthenticationParameter {
    pub directory_service_options: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_directory_properties: Option<ActiveDirectoryProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPreferenceParameter {
    pub routing_choice: RoutingChoice,
}

impl AccountDefinition {
    /// Render the definition as the document sent to the resource provider
    pub fn to_create_parameters(&self) -> StorageAccountCreateParameters {
        StorageAccountCreateParameters {
            location: self.region.clone().unwrap_or_default(),
            sku: SkuParameter {
                name: self.sku.unwrap_or(DEFAULT_SKU),
            },
            kind: self.kind.unwrap_or(DEFAULT_KIND),
            identity: self.managed_identity.then(|| IdentityParameter {
                identity_type: "SystemAssigned".to_string(),
            }),
            tags: self.tags.clone(),
            properties: StorageAccountPropertiesParameter {
                access_tier: self.access_tier,
                custom_domain: self.custom_domain.as_ref().map(|d| CustomDomainParameter {
                    name: d.name.clone(),
                    use_sub_domain_name: d.use_sub_domain,
                }),
                encryption: self.encryption_parameter(),
                network_acls: self.network_acls_parameter(),
                supports_https_traffic_only: self.https_only,
                is_hns_enabled: self.hns_enabled,
                azure_files_identity_based_authentication: self.files_authentication_parameter(),
                large_file_shares_state: self
                    .large_file_shares
                    .map(|enabled| if enabled { "Enabled" } else { "Disabled" }.to_string()),
                routing_preference: self
                    .routing_preference
                    .map(|routing_choice| RoutingPreferenceParameter { routing_choice }),
            },
        }
    }

    fn encryption_parameter(&self) -> Option<EncryptionParameter> {
        let encryption = &self.encryption;
        if encryption.is_empty() {
            return None;
        }

        let service = |enabled: Option<bool>| enabled.map(|enabled| EncryptionServiceParameter { enabled });
        let key_vault_properties = encryption.key_vault_key.as_ref().map(|key| KeyVaultPropertiesParameter {
            key_name: key.key_name.clone(),
            key_version: key.key_version.clone(),
            key_vault_uri: key.vault_uri.clone(),
        });
        let key_source = if key_vault_properties.is_some() {
            "Microsoft.Keyvault"
        } else {
            "Microsoft.Storage"
        };

        Some(EncryptionParameter {
            services: EncryptionServicesParameter {
                blob: service(encryption.blob_enabled),
                file: service(encryption.file_enabled),
            },
            key_source: key_source.to_string(),
            key_vault_properties,
        })
    }

    fn network_acls_parameter(&self) -> Option<NetworkAclsParameter> {
        let rules = &self.network_rules;
        if rules.is_empty() {
            return None;
        }

        // Allow rules mean nothing under a default Allow, so an explicit rule
        // without an explicit default action implies Deny.
        let default_action = rules.default_action.unwrap_or(if rules.has_rules() {
            DefaultAction::Deny
        } else {
            DefaultAction::Allow
        });

        let bypass = if rules.bypass.is_empty() {
            "None".to_string()
        } else {
            rules
                .bypass
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        Some(NetworkAclsParameter {
            bypass,
            default_action,
            virtual_network_rules: rules
                .subnet_ids
                .iter()
                .map(|id| VirtualNetworkRuleParameter {
                    id: id.clone(),
                    action: "Allow".to_string(),
                })
                .collect(),
            ip_rules: rules
                .ip_rules
                .iter()
                .map(|value| IpRuleParameter {
                    value: value.clone(),
                    action: "Allow".to_string(),
                })
                .collect(),
        })
    }

    fn files_authentication_parameter(&self) -> Option<FilesIdentityAuthenticationParameter> {
        if let Some(directory) = &self.directory_service {
            let active_directory_properties = match directory {
                DirectoryService::ActiveDirectory(properties) => Some(properties.clone()),
                _ => None,
            };
            return Some(FilesIdentityAuthenticationParameter {
                directory_service_options: directory.options_name().to_string(),
                active_directory_properties,
            });
        }

        self.azure_files_aad_integration
            .map(|enabled| FilesIdentityAuthenticationParameter {
                directory_service_options: if enabled { "AADDS" } else { "None" }.to_string(),
                active_directory_properties: None,
            })
    }
}
