//! Storage account definition tests
//!
//! Tests for the staged builder: last-write-wins groups, tag merging,
//! directory service replacement, and the end-to-end blob account flow.

use std::collections::HashMap;

use xstore::account::{
    AccessTier, AccountDefinition, DefaultAction, DirectoryService, Kind, NetworkBypass,
    StorageAccountDefinition, StorageAccountSkuType, WithCreate,
};

fn new_definition() -> StorageAccountDefinition<WithCreate> {
    StorageAccountDefinition::define("logs01")
        .with_region("eastus")
        .with_existing_resource_group("rg-logs")
}

#[cfg(test)]
mod sku_tests {
    use super::*;

    #[test]
    fn test_last_sku_wins() {
        let definition = new_definition()
            .with_premium_lrs()
            .with_standard_gzrs()
            .with_standard_zrs()
            .into_definition();

        assert_eq!(definition.sku, Some(StorageAccountSkuType::StandardZrs));
    }

    #[test]
    fn test_every_sku_setter_sets_its_tier() {
        let cases: Vec<(AccountDefinition, StorageAccountSkuType)> = vec![
            (new_definition().with_standard_lrs().into_definition(), StorageAccountSkuType::StandardLrs),
            (new_definition().with_standard_grs().into_definition(), StorageAccountSkuType::StandardGrs),
            (new_definition().with_standard_ragrs().into_definition(), StorageAccountSkuType::StandardRagrs),
            (new_definition().with_standard_zrs().into_definition(), StorageAccountSkuType::StandardZrs),
            (new_definition().with_standard_gzrs().into_definition(), StorageAccountSkuType::StandardGzrs),
            (new_definition().with_standard_ragzrs().into_definition(), StorageAccountSkuType::StandardRagzrs),
            (new_definition().with_premium_lrs().into_definition(), StorageAccountSkuType::PremiumLrs),
            (new_definition().with_premium_zrs().into_definition(), StorageAccountSkuType::PremiumZrs),
        ];

        for (definition, expected) in cases {
            assert_eq!(definition.sku, Some(expected), "SKU setter for {} should set it", expected);
        }
    }

    #[test]
    fn test_sku_survives_stage_changes() {
        let definition = new_definition()
            .with_standard_grs()
            .with_blob_storage_account_kind()
            .with_access_tier(AccessTier::Cool)
            .with_active_directory()
            .with_domain_name("corp.contoso.com")
            .into_definition();

        assert_eq!(definition.sku, Some(StorageAccountSkuType::StandardGrs));
        assert_eq!(definition.kind, Some(Kind::BlobStorage));
        assert_eq!(definition.access_tier, Some(AccessTier::Cool));
    }
}

#[cfg(test)]
mod tag_tests {
    use super::*;

    #[test]
    fn test_reapplying_same_tag_is_idempotent() {
        let definition = new_definition()
            .with_tag("a", "1")
            .with_tag("a", "1")
            .into_definition();

        assert_eq!(definition.tags, HashMap::from([("a".to_string(), "1".to_string())]));
    }

    #[test]
    fn test_later_tag_value_overwrites() {
        let definition = new_definition()
            .with_tag("a", "1")
            .with_tag("a", "2")
            .into_definition();

        assert_eq!(definition.tags, HashMap::from([("a".to_string(), "2".to_string())]));
    }

    #[test]
    fn test_tag_maps_merge() {
        let definition = new_definition()
            .with_tags(HashMap::from([
                ("env".to_string(), "dev".to_string()),
                ("team".to_string(), "storage".to_string()),
            ]))
            .with_tags(HashMap::from([("env".to_string(), "prod".to_string())]))
            .with_tag("owner", "ops")
            .into_definition();

        assert_eq!(definition.tags.len(), 3);
        assert_eq!(definition.tags["env"], "prod");
        assert_eq!(definition.tags["team"], "storage");
        assert_eq!(definition.tags["owner"], "ops");
    }
}

#[cfg(test)]
mod network_tests {
    use super::*;

    #[test]
    fn test_default_action_last_write_wins() {
        let definition = new_definition()
            .with_access_from_all_networks()
            .with_access_from_selected_networks()
            .into_definition();
        assert_eq!(definition.network_rules.default_action, Some(DefaultAction::Deny));

        let definition = new_definition()
            .with_access_from_selected_networks()
            .with_access_from_all_networks()
            .into_definition();
        assert_eq!(definition.network_rules.default_action, Some(DefaultAction::Allow));
    }

    #[test]
    fn test_rules_are_additive() {
        let subnet = "/subscriptions/sub-1/resourceGroups/rg-net/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/default";
        let definition = new_definition()
            .with_access_from_network_subnet(subnet)
            .with_access_from_ip_address("198.51.100.7")
            .with_access_from_ip_address_range("203.0.113.0/24")
            .with_access_from_ip_address("198.51.100.7")
            .with_read_access_to_log_entries_from_any_network()
            .with_read_access_to_metrics_from_any_network()
            .with_access_from_azure_services()
            .into_definition();

        let rules = definition.network_rules;
        assert_eq!(rules.subnet_ids, vec![subnet.to_string()]);
        assert_eq!(
            rules.ip_rules,
            vec!["198.51.100.7".to_string(), "203.0.113.0/24".to_string()]
        );
        assert_eq!(rules.bypass.len(), 3);
        assert!(rules.bypass.contains(&NetworkBypass::Logging));
        assert!(rules.default_action.is_none());
    }

    #[test]
    fn test_no_local_validation_of_rule_syntax() {
        let definition = new_definition()
            .with_access_from_ip_address("not-an-ip")
            .into_definition();
        assert_eq!(definition.network_rules.ip_rules, vec!["not-an-ip".to_string()]);
    }
}

#[cfg(test)]
mod directory_service_tests {
    use super::*;

    #[test]
    fn test_active_directory_replaces_none() {
        let definition = new_definition()
            .with_none_directory_service()
            .with_active_directory()
            .with_domain_name("corp.contoso.com")
            .into_definition();

        match definition.directory_service {
            Some(DirectoryService::ActiveDirectory(properties)) => {
                assert_eq!(properties.domain_name.as_deref(), Some("corp.contoso.com"));
                assert!(properties.forest_name.is_none());
            }
            other => panic!("expected active directory, got {:?}", other),
        }
    }

    #[test]
    fn test_reselecting_active_directory_starts_empty() {
        let definition = new_definition()
            .with_active_directory()
            .with_domain_name("old.contoso.com")
            .with_none_directory_service()
            .with_active_directory()
            .with_forest_name("new.contoso.com")
            .into_definition();

        match definition.directory_service {
            Some(DirectoryService::ActiveDirectory(properties)) => {
                assert!(properties.domain_name.is_none());
                assert_eq!(properties.forest_name.as_deref(), Some("new.contoso.com"));
            }
            other => panic!("expected active directory, got {:?}", other),
        }
    }

    #[test]
    fn test_none_replaces_aadds() {
        let definition = new_definition()
            .with_azure_active_directory_domain_services()
            .with_none_directory_service()
            .into_definition();
        assert_eq!(definition.directory_service, Some(DirectoryService::None));
    }
}

#[cfg(test)]
mod end_to_end_tests {
    use super::*;

    #[test]
    fn test_blob_account_definition() {
        let definition = new_definition()
            .with_standard_lrs()
            .with_blob_storage_account_kind()
            .with_access_tier(AccessTier::Hot)
            .with_blob_encryption()
            .with_tag("env", "prod")
            .into_definition();

        let mut expected = AccountDefinition::new("logs01");
        expected.region = Some("eastus".to_string());
        expected.resource_group = new_definition().into_definition().resource_group;
        expected.sku = Some(StorageAccountSkuType::StandardLrs);
        expected.kind = Some(Kind::BlobStorage);
        expected.access_tier = Some(AccessTier::Hot);
        expected.encryption.blob_enabled = Some(true);
        expected.tags.insert("env".to_string(), "prod".to_string());

        assert_eq!(definition, expected);
    }

    #[test]
    fn test_blob_account_create_parameters() {
        let parameters = new_definition()
            .with_standard_lrs()
            .with_blob_storage_account_kind()
            .with_blob_encryption()
            .with_tag("env", "prod")
            .definition()
            .to_create_parameters();

        let value = serde_json::to_value(&parameters).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "location": "eastus",
                "sku": { "name": "Standard_LRS" },
                "kind": "BlobStorage",
                "tags": { "env": "prod" },
                "properties": {
                    "accessTier": "Hot",
                    "encryption": {
                        "services": { "blob": { "enabled": true } },
                        "keySource": "Microsoft.Storage"
                    }
                }
            })
        );
    }

    #[test]
    fn test_fully_loaded_general_purpose_account() {
        let definition = new_definition()
            .with_premium_zrs()
            .with_general_purpose_account_kind_v2()
            .with_only_https_traffic()
            .with_hns_enabled(true)
            .with_large_file_shares(true)
            .with_azure_files_aad_integration_enabled(true)
            .with_system_assigned_managed_service_identity()
            .with_custom_domain_name("data.contoso.com")
            .with_internet_routing()
            .with_encryption_key_from_key_vault("https://kv1.vault.azure.net", "cmk", "0001")
            .into_definition();

        let value = serde_json::to_value(definition.to_create_parameters()).unwrap();
        assert_eq!(value["kind"], "StorageV2");
        assert_eq!(value["identity"]["type"], "SystemAssigned");
        assert_eq!(value["properties"]["supportsHttpsTrafficOnly"], true);
        assert_eq!(value["properties"]["isHnsEnabled"], true);
        assert_eq!(value["properties"]["largeFileSharesState"], "Enabled");
        assert_eq!(
            value["properties"]["azureFilesIdentityBasedAuthentication"]["directoryServiceOptions"],
            "AADDS"
        );
        assert_eq!(value["properties"]["customDomain"]["useSubDomainName"], false);
        assert_eq!(value["properties"]["routingPreference"]["routingChoice"], "InternetRouting");
        assert_eq!(value["properties"]["encryption"]["keySource"], "Microsoft.Keyvault");
    }
}
