//! Name validation for Azure Storage compatibility
//!
//! Storage account names become part of public DNS names
//! (`{name}.blob.core.windows.net`), so the service restricts them to
//! 3-24 lowercase letters and digits.

use regex::Regex;

use crate::error::{Result, XstoreError};

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 24;

/// Azure Storage account naming rules
pub struct StorageAccountNameRules {
    pub min_length: usize,
    pub max_length: usize,
    pub allowed_pattern: &'static str,
    pub description: &'static str,
}

impl Default for StorageAccountNameRules {
    fn default() -> Self {
        Self {
            min_length: MIN_NAME_LENGTH,
            max_length: MAX_NAME_LENGTH,
            allowed_pattern: r"^[a-z0-9]+$",
            description: "Storage account names must be 3-24 characters, containing only lowercase letters and digits",
        }
    }
}

/// Check a storage account name, explaining the first rule it breaks
pub fn validate_storage_account_name(name: &str) -> Result<()> {
    let rules = StorageAccountNameRules::default();

    if name.len() < rules.min_length || name.len() > rules.max_length {
        return Err(XstoreError::invalid_account_name(
            name.to_string(),
            format!(
                "length must be between {} and {} characters",
                rules.min_length, rules.max_length
            ),
        ));
    }

    let re = Regex::new(rules.allowed_pattern)?;
    if !re.is_match(name) {
        let reason = if name.chars().any(|c| c.is_ascii_uppercase()) {
            "uppercase letters are not allowed"
        } else {
            "only lowercase letters and digits are allowed"
        };
        return Err(XstoreError::invalid_account_name(name, reason));
    }

    Ok(())
}

/// Suggest a valid account name derived from arbitrary input
pub fn suggest_storage_account_name(input: &str) -> String {
    let mut name: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_NAME_LENGTH)
        .collect();

    while name.len() < MIN_NAME_LENGTH {
        name.push('0');
    }

    name
}
