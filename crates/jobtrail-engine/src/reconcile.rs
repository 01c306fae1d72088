//! Reconciliation of applied status and requirement-text backfill.
//!
//! Applied is terminal: once a record is observed as applied, no later
//! partial fetch un-observes it. The deep probe path costs one network
//! round-trip per record, so it is bounded per run and the store is
//! persisted incrementally along the way; an aborted run loses at most one
//! increment of in-memory progress and never a previously valid file.

use crate::filter::{filter_records, FilterSpec};
use jobtrail_core::JobId;
use jobtrail_provider::SiteAdapter;
use jobtrail_store::JobStore;
use tracing::{debug, info, warn};

/// Knobs for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Skip the per-job deep probe entirely
    pub skip_probe: bool,
    /// Upper bound on probed records per run
    pub probe_cap: usize,
    /// Persist the store after this many probed records (0 = only at the end)
    pub persist_every: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            skip_probe: false,
            probe_cap: 25,
            persist_every: 10,
        }
    }
}

/// What one reconciliation pass did.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Records newly marked applied (both paths combined)
    pub newly_applied: usize,
    /// Records probed through the slow per-job path
    pub probed: usize,
    /// Records whose requirement text was backfilled
    pub backfilled: usize,
    /// Authenticated paths were skipped (missing credentials or rejected login)
    pub auth_skipped: bool,
    /// Degraded calls, described for the run report
    pub errors: Vec<String>,
}

/// Drives the applied/backfill state machine once per run.
pub struct ReconciliationEngine {
    options: ReconcileOptions,
}

impl ReconciliationEngine {
    /// Create an engine with the given options.
    #[must_use]
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Run one reconciliation pass over `store` through `adapter`.
    ///
    /// Mutates the store in memory and persists incrementally during the
    /// probe loop; the final persist after all mutations belongs to the
    /// caller, so a pass that changed nothing costs no write.
    pub async fn run(
        &self,
        store: &mut JobStore,
        adapter: &dyn SiteAdapter,
        spec: &FilterSpec,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        self.sync_applied(store, adapter, &mut outcome).await;

        if !self.options.skip_probe && !outcome.auth_skipped {
            self.probe_statuses(store, adapter, spec, &mut outcome).await;
        }

        info!(
            provider = %store.provider(),
            newly_applied = outcome.newly_applied,
            probed = outcome.probed,
            backfilled = outcome.backfilled,
            "reconciliation pass finished"
        );
        outcome
    }

    /// Fast path: one authenticated fetch of the applied view, then mark
    /// every correlated record.
    async fn sync_applied(
        &self,
        store: &mut JobStore,
        adapter: &dyn SiteAdapter,
        outcome: &mut ReconcileOutcome,
    ) {
        match adapter.fetch_applied().await {
            Ok(items) => {
                debug!(provider = %store.provider(), count = items.len(), "applied view fetched");
                for item in items {
                    if store.mark_applied(&item.id) {
                        outcome.newly_applied += 1;
                    }
                }
            }
            Err(e) if e.is_auth() => {
                warn!(provider = %store.provider(), error = %e, "authentication unavailable, skipping applied sync and probes");
                outcome.auth_skipped = true;
                outcome.errors.push(e.to_string());
            }
            Err(e) => {
                warn!(provider = %store.provider(), error = %e, "applied view fetch failed");
                outcome.errors.push(e.to_string());
            }
        }
    }

    /// Slow path: probe still-unapplied candidates one by one, backfilling
    /// empty requirement text along the same traversal.
    async fn probe_statuses(
        &self,
        store: &mut JobStore,
        adapter: &dyn SiteAdapter,
        spec: &FilterSpec,
        outcome: &mut ReconcileOutcome,
    ) {
        let candidate_ids: Vec<JobId> = filter_records(store, spec)
            .into_iter()
            .map(|record| record.id.clone())
            .take(self.options.probe_cap)
            .collect();

        if candidate_ids.len() == self.options.probe_cap {
            debug!(
                provider = %store.provider(),
                cap = self.options.probe_cap,
                "probe cap reached, remaining candidates wait for the next run"
            );
        }

        for id in candidate_ids {
            // the applied sync above may already have settled this record
            let (already_applied, needs_backfill) = match store.get(&id) {
                Some(record) => (record.applied, record.requirement_text.is_empty()),
                None => continue,
            };

            if !already_applied {
                match adapter.probe_applied(&id).await {
                    Ok(Some(true)) => {
                        if store.mark_applied(&id) {
                            outcome.newly_applied += 1;
                        }
                    }
                    Ok(Some(false) | None) => {}
                    Err(e) if e.is_auth() => {
                        warn!(provider = %store.provider(), error = %e, "authentication lost, stopping probes");
                        outcome.auth_skipped = true;
                        outcome.errors.push(e.to_string());
                        break;
                    }
                    Err(e) => {
                        warn!(provider = %store.provider(), id = %id, error = %e, "status probe failed");
                        outcome.errors.push(format!("probe {id}: {e}"));
                    }
                }
            }

            if needs_backfill {
                match adapter.fetch_supplemental(&id).await {
                    Ok(text) if !text.is_empty() => {
                        if store.set_requirement_text(&id, &text) {
                            outcome.backfilled += 1;
                        }
                    }
                    // empty is a valid outcome, retried on a later run
                    Ok(_) => {}
                    Err(e) => {
                        warn!(provider = %store.provider(), id = %id, error = %e, "supplemental fetch failed");
                        outcome.errors.push(format!("supplemental {id}: {e}"));
                    }
                }
            }

            outcome.probed += 1;

            if self.options.persist_every > 0 && outcome.probed % self.options.persist_every == 0 {
                if let Err(e) = store.persist() {
                    warn!(provider = %store.provider(), error = %e, "incremental persist failed, keeping in-memory progress");
                    outcome.errors.push(format!("incremental persist: {e}"));
                }
            }
        }
    }
}
