use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Unrecoverable setup failures for a run.
///
/// Everything else (a dead page, a bad response, a rejected login) degrades
/// to "fewer results this call" and lands in the run report instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] jobtrail_store::StoreError),

    #[error("provider error: {0}")]
    Provider(#[from] jobtrail_provider::ProviderError),

    #[error("browser error: {0}")]
    Browser(#[from] jobtrail_browser::BrowserError),

    #[error("configuration error: {0}")]
    Config(#[from] jobtrail_core::ConfigError),
}
