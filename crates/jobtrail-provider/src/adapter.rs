//! The polymorphic site adapter contract.
//!
//! Every provider implements these operations; the rest of the engine never
//! branches on provider identity.

use crate::error::AdapterError;
use async_trait::async_trait;
use jobtrail_core::{JobId, ProviderId};
use jobtrail_store::JobRecord;
use serde_json::Value;

/// Result type alias for adapter fetch operations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// One entry from a provider's authenticated applied-postings view.
///
/// Some providers' applied view exposes a different identifier than the
/// listing view; correlating the two is the adapter's job, so by the time an
/// item reaches the engine its `id` is already the canonical store id.
#[derive(Debug, Clone)]
pub struct AppliedItem {
    /// Canonical listing id this application maps to
    pub id: JobId,
    /// The provider's raw applied-view payload, preserved for diagnostics
    pub raw: Value,
}

/// Capability contract every careers-site adapter implements.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// The provider this adapter drives.
    fn provider_id(&self) -> &ProviderId;

    /// Retrieve up to `limit` current postings (all when `limit` is absent).
    ///
    /// Postings missing optional fields are still returned. Unreachable
    /// providers or unrecognizable responses surface as an error, never a
    /// panic; callers degrade to "no data for this call".
    async fn fetch_listings(&self, limit: Option<usize>) -> AdapterResult<Vec<JobRecord>>;

    /// Retrieve the user's applied postings from the authenticated view.
    ///
    /// Requires stored credentials. Missing credentials and rejected logins
    /// are reported distinctly from network failures so the operator can
    /// tell them apart.
    async fn fetch_applied(&self) -> AdapterResult<Vec<AppliedItem>>;

    /// Deeper per-job fetch for requirement-text backfill.
    ///
    /// Adapters without a usable detail view return an empty string rather
    /// than an error; an empty result is retried on a later run.
    async fn fetch_supplemental(&self, id: &JobId) -> AdapterResult<String>;

    /// Direct per-job applied-status check.
    ///
    /// One network round-trip per call; the reconciliation loop bounds how
    /// many of these run per run. `None` means the adapter cannot tell
    /// (or does not support probing), leaving the record's status unknown.
    async fn probe_applied(&self, id: &JobId) -> AdapterResult<Option<bool>>;

    /// The URL a human uses to apply to this posting.
    fn apply_url(&self, id: &JobId) -> String;
}
