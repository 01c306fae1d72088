//! Jobtrail Core - Foundation crate for the jobtrail application.
//!
//! This crate provides shared types, error handling, and configuration
//! management that all other jobtrail crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`ProviderId`, `JobId`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use jobtrail_core::{AppConfig, ProviderId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let provider = ProviderId::new("tiktok")?;
//! println!("probing at most {} jobs for {provider}", config.reconcile.probe_cap);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, ReconcileConfig, StorageConfig};
pub use error::{ConfigError, ConfigResult, JobtrailError, Result};
pub use types::{JobId, ProviderId, Timestamp};
