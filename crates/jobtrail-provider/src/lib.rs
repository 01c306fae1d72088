//! Provider definitions and site adapters.
//!
//! Providers differ arbitrarily in pagination, login flow, and response
//! shape. Everything that is data lives in `provider-definitions/*.toml`
//! (URLs, selectors, default filters); everything that is behavior lives
//! behind the [`SiteAdapter`] contract, one implementation per provider,
//! selected by the `adapter` tag in the definition. The rest of the engine
//! never branches on provider identity.

pub mod adapter;
pub mod adapters;
pub mod credentials;
pub mod definition;
pub mod error;
pub mod json_search;
pub mod loader;
pub mod registry;

pub use adapter::{AdapterResult, AppliedItem, SiteAdapter};
pub use adapters::build_adapter;
pub use credentials::Credentials;
pub use definition::{
    AdapterKind, AppliedConfig, DetailConfig, FilterDefaults, ListingsConfig, LoginSelectors,
    ProviderDefinition, ProviderMetadata,
};
pub use error::{AdapterError, ProviderError, Result};
pub use json_search::{extract_script_json, find_key, find_key_in_page};
pub use loader::ProviderLoader;
pub use registry::ProviderRegistry;
