//! Browser session engine for JavaScript-heavy careers sites.
//!
//! Provides headless browser control with per-domain rate limiting and
//! per-call timeouts. Each adapter run owns one exclusive [`PageSession`];
//! sessions are never shared across providers.

pub mod engine;
pub mod error;

pub use engine::{BrowserEngine, PageSession};
pub use error::{BrowserError, Result};

/// Helper to extract the domain from a URL.
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}
