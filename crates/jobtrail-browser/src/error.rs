use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl BrowserError {
    /// Whether this error should be treated as a network failure by callers,
    /// degrading the current fetch to "no data" rather than aborting the run.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            BrowserError::NavigationError(_) | BrowserError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationError("page not found".to_string());
        assert_eq!(err.to_string(), "navigation failed: page not found");
    }

    #[test]
    fn test_is_network() {
        assert!(BrowserError::Timeout("goto".to_string()).is_network());
        assert!(!BrowserError::SelectorNotFound("#login".to_string()).is_network());
    }
}
