//! Composes one run: fetch → merge → persist → filter → reconcile →
//! persist → report.
//!
//! Providers run one at a time, each over its own exclusive browser
//! session and its own store file, so no cross-provider locking exists
//! anywhere. Per-provider failures degrade into the run report; only setup
//! failures (store, definitions, browser launch) abort a run.

use crate::error::Result;
use crate::filter::{filter_records, FilterSpec};
use crate::reconcile::{ReconcileOptions, ReconciliationEngine};
use crate::report::{candidate_rows, CandidateRow};
use jobtrail_browser::BrowserEngine;
use jobtrail_core::{BrowserConfig, ProviderId, ReconcileConfig, Timestamp};
use jobtrail_provider::{build_adapter, Credentials, ProviderDefinition, ProviderRegistry};
use jobtrail_store::JobStore;
use std::path::PathBuf;
use tracing::{info, warn};

/// What happened for one provider during a run.
#[derive(Debug)]
pub struct ProviderRunReport {
    /// Provider this slice of the run belongs to
    pub provider: ProviderId,
    /// When this provider's slice started
    pub started_at: Timestamp,
    /// Postings returned by the listing fetch
    pub fetched: usize,
    /// Postings newly added to the store by the merge
    pub added: usize,
    /// Records newly marked applied
    pub newly_applied: usize,
    /// Records taken through the per-job probe
    pub probed: usize,
    /// Records whose requirement text was backfilled
    pub backfilled: usize,
    /// Authenticated paths were skipped this run
    pub auth_skipped: bool,
    /// Degraded calls, in operator-readable form
    pub errors: Vec<String>,
}

impl ProviderRunReport {
    fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            started_at: Timestamp::now(),
            fetched: 0,
            added: 0,
            newly_applied: 0,
            probed: 0,
            backfilled: 0,
            auth_skipped: false,
            errors: Vec::new(),
        }
    }
}

/// Per-run composition of registry, browser, store, filter, and
/// reconciliation.
pub struct Orchestrator {
    registry: ProviderRegistry,
    data_dir: PathBuf,
    browser_config: BrowserConfig,
    reconcile_config: ReconcileConfig,
}

impl Orchestrator {
    /// Create an orchestrator over a loaded registry.
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        data_dir: PathBuf,
        browser_config: BrowserConfig,
        reconcile_config: ReconcileConfig,
    ) -> Self {
        Self {
            registry,
            data_dir,
            browser_config,
            reconcile_config,
        }
    }

    /// Fetch current listings and merge them into each provider's store.
    pub async fn scrape(
        &self,
        provider: Option<&ProviderId>,
        max: Option<usize>,
    ) -> Result<Vec<ProviderRunReport>> {
        let definitions = self.targets(provider)?;
        let browser = BrowserEngine::launch(&self.browser_config).await?;

        let mut reports = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let mut report = ProviderRunReport::new(definition.id().clone());
            let mut store = JobStore::open(definition.id().clone(), &self.data_dir)?;

            let session = browser.new_session().await?;
            let credentials = Credentials::from_env(definition.id());
            let adapter = build_adapter(definition, session, credentials);

            match adapter.fetch_listings(max).await {
                Ok(records) => {
                    report.fetched = records.len();
                    report.added = store.merge(records);
                }
                Err(e) => {
                    warn!(provider = %report.provider, error = %e, "listing fetch failed, continuing");
                    report.errors.push(e.to_string());
                }
            }

            if let Err(e) = store.persist() {
                warn!(provider = %report.provider, error = %e, "persist failed, in-memory state retained");
                report.errors.push(format!("persist: {e}"));
            }

            info!(
                provider = %report.provider,
                fetched = report.fetched,
                added = report.added,
                "scrape finished"
            );
            reports.push(report);
        }

        if let Err(e) = browser.shutdown().await {
            warn!(error = %e, "browser shutdown failed");
        }
        Ok(reports)
    }

    /// Reconcile applied status (and optionally deep-probe + backfill) for
    /// each provider's store.
    pub async fn update(
        &self,
        provider: Option<&ProviderId>,
        skip_probe: bool,
    ) -> Result<Vec<ProviderRunReport>> {
        let definitions = self.targets(provider)?;
        let browser = BrowserEngine::launch(&self.browser_config).await?;

        let reconciler = ReconciliationEngine::new(ReconcileOptions {
            skip_probe,
            probe_cap: self.reconcile_config.probe_cap,
            persist_every: self.reconcile_config.persist_every,
        });

        let mut reports = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let mut report = ProviderRunReport::new(definition.id().clone());
            let mut store = JobStore::open(definition.id().clone(), &self.data_dir)?;
            let spec = FilterSpec::from_defaults(&definition.filters);

            let session = browser.new_session().await?;
            let credentials = Credentials::from_env(definition.id());
            let adapter = build_adapter(definition, session, credentials);

            let outcome = reconciler.run(&mut store, adapter.as_ref(), &spec).await;
            report.newly_applied = outcome.newly_applied;
            report.probed = outcome.probed;
            report.backfilled = outcome.backfilled;
            report.auth_skipped = outcome.auth_skipped;
            report.errors.extend(outcome.errors);

            // one persist after the whole batch of mutations
            if let Err(e) = store.persist() {
                warn!(provider = %report.provider, error = %e, "persist failed, in-memory state retained");
                report.errors.push(format!("persist: {e}"));
            }

            reports.push(report);
        }

        if let Err(e) = browser.shutdown().await {
            warn!(error = %e, "browser shutdown failed");
        }
        Ok(reports)
    }

    /// Filter each provider's store into its candidate rows. Pure read
    /// path: no browser, no network.
    pub fn candidates(
        &self,
        provider: Option<&ProviderId>,
    ) -> Result<Vec<(ProviderDefinition, Vec<CandidateRow>)>> {
        let definitions = self.targets(provider)?;

        let mut out = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let store = JobStore::open(definition.id().clone(), &self.data_dir)?;
            let spec = FilterSpec::from_defaults(&definition.filters);

            let matches = filter_records(&store, &spec);
            let rows = candidate_rows(&matches, |record| definition.apply_url(record.id.as_str()));
            out.push((definition, rows));
        }

        Ok(out)
    }

    /// Resolve which providers a command addresses.
    fn targets(&self, provider: Option<&ProviderId>) -> Result<Vec<ProviderDefinition>> {
        match provider {
            Some(id) => Ok(vec![self.registry.get(id)?]),
            None => Ok(self.registry.get_all()),
        }
    }
}
