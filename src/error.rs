use thiserror::Error;

/// Main error type for xstore operations
#[derive(Debug, Error)]
pub enum XstoreError {
    #[error("Azure API error (HTTP {status}): {message}")]
    AzureApiError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid storage account name '{name}': {reason}")]
    InvalidAccountName { name: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl XstoreError {
    pub fn azure_api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::AzureApiError {
            status,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_account_name<S: Into<String>>(name: S, reason: S) -> Self {
        Self::InvalidAccountName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// HTTP status of a remote failure, if this error came from the control plane
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            Self::AzureApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for xstore operations
pub type Result<T> = std::result::Result<T, XstoreError>;

impl From<toml::ser::Error> for XstoreError {
    fn from(error: toml::ser::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_only_for_api_errors() {
        let err = XstoreError::azure_api(409, "StorageAccountAlreadyTaken");
        assert_eq!(err.remote_status(), Some(409));
        assert_eq!(
            err.to_string(),
            "Azure API error (HTTP 409): StorageAccountAlreadyTaken"
        );

        let err = XstoreError::config("missing region");
        assert_eq!(err.remote_status(), None);
    }

    #[test]
    fn test_invalid_account_name_message() {
        let err = XstoreError::invalid_account_name("Bad_Name", "uppercase letters are not allowed");
        assert_eq!(
            err.to_string(),
            "Invalid storage account name 'Bad_Name': uppercase letters are not allowed"
        );
    }
}
