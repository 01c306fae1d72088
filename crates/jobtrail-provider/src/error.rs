//! Error types for provider definitions and adapter operations.

use jobtrail_browser::BrowserError;
use thiserror::Error;

/// Result type alias for definition/registry operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors around provider definition files and the registry.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider definitions directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("provider not found: {provider_id}")]
    NotFound { provider_id: String },

    #[error("failed to parse {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid definition for {provider_id}: {reason}")]
    ValidationError { provider_id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single adapter fetch operation.
///
/// The taxonomy matters to callers: authentication problems are reported to
/// the operator and skip the authenticated paths for the run, while network
/// and parse failures degrade that one call to "no data".
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No credentials in the environment for this provider.
    #[error("credentials unavailable: set {0}")]
    CredentialsMissing(String),

    /// The provider rejected the supplied credentials.
    #[error("authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// Page load, navigation, or timeout problems.
    #[error("network failure: {0}")]
    Network(String),

    /// The provider responded with something we don't recognize.
    #[error("unrecognized response: {0}")]
    Parse(String),
}

impl AdapterError {
    /// Whether this error means the authenticated paths should be skipped
    /// for the rest of the run.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            AdapterError::CredentialsMissing(_) | AdapterError::AuthenticationFailed(_)
        )
    }
}

impl From<BrowserError> for AdapterError {
    fn from(err: BrowserError) -> Self {
        if err.is_network() {
            AdapterError::Network(err.to_string())
        } else {
            AdapterError::Parse(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth() {
        assert!(AdapterError::CredentialsMissing("TIKTOK_LOGIN_EMAIL".into()).is_auth());
        assert!(AdapterError::AuthenticationFailed("meta".into()).is_auth());
        assert!(!AdapterError::Network("timeout".into()).is_auth());
        assert!(!AdapterError::Parse("no data key".into()).is_auth());
    }

    #[test]
    fn test_browser_error_mapping() {
        let err: AdapterError = BrowserError::Timeout("navigation".into()).into();
        assert!(matches!(err, AdapterError::Network(_)));

        let err: AdapterError = BrowserError::SelectorNotFound("#login".into()).into();
        assert!(matches!(err, AdapterError::Parse(_)));
    }
}
