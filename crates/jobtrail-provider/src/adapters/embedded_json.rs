//! Adapter for careers sites that embed their data as JSON script blocks.
//!
//! The listing page, the applied view, and the per-job detail pages all
//! carry `<script type="application/json">` state; the adapter pulls the
//! configured keys out of that state wherever they are nested.

use crate::adapter::{AdapterResult, AppliedItem, SiteAdapter};
use crate::adapters::{
    correlate_applied, ensure_login, probe_via_detail, shape_record, supplemental_via_detail,
};
use crate::credentials::Credentials;
use crate::definition::ProviderDefinition;
use crate::error::AdapterError;
use crate::json_search::{extract_script_json, find_key};
use async_trait::async_trait;
use jobtrail_browser::PageSession;
use jobtrail_core::{JobId, ProviderId};
use jobtrail_store::JobRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

/// Meta-style adapter: everything lives in embedded page JSON.
pub struct EmbeddedJsonAdapter {
    definition: ProviderDefinition,
    session: PageSession,
    credentials: Option<Credentials>,
    logged_in: AtomicBool,
}

impl EmbeddedJsonAdapter {
    /// Create the adapter around one exclusive page session.
    #[must_use]
    pub fn new(
        definition: ProviderDefinition,
        session: PageSession,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            definition,
            session,
            credentials,
            logged_in: AtomicBool::new(false),
        }
    }

    /// Posting objects from every embedded JSON block of the current page.
    fn listings_from_page(&self, html: &str) -> Vec<Value> {
        let blocks = extract_script_json(html);
        let mut items = Vec::new();
        for key in &self.definition.listings.items_keys {
            for block in &blocks {
                if let Some(arr) = find_key(block, key).and_then(Value::as_array) {
                    items.extend(arr.iter().cloned());
                    break;
                }
            }
        }
        items
    }
}

#[async_trait]
impl SiteAdapter for EmbeddedJsonAdapter {
    fn provider_id(&self) -> &ProviderId {
        self.definition.id()
    }

    async fn fetch_listings(&self, limit: Option<usize>) -> AdapterResult<Vec<JobRecord>> {
        self.session
            .goto(&self.definition.listings.search_url)
            .await?;
        let html = self.session.content().await?;

        let items = self.listings_from_page(&html);
        if items.is_empty() {
            return Err(AdapterError::Parse(format!(
                "no listing data under keys {:?}",
                self.definition.listings.items_keys
            )));
        }

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for item in &items {
            let Some(record) = shape_record(item) else {
                debug!(provider = %self.provider_id(), "skipping posting without an id");
                continue;
            };
            if seen.insert(record.id.clone()) {
                records.push(record);
            }
            if limit.is_some_and(|max| records.len() >= max) {
                break;
            }
        }

        info!(provider = %self.provider_id(), count = records.len(), "fetched listings");
        Ok(records)
    }

    async fn fetch_applied(&self) -> AdapterResult<Vec<AppliedItem>> {
        ensure_login(
            &self.session,
            &self.definition,
            self.credentials.as_ref(),
            &self.logged_in,
        )
        .await?;

        self.session.goto(&self.definition.applied.url).await?;
        let html = self.session.content().await?;
        let blocks = extract_script_json(&html);

        let items = blocks
            .iter()
            .find_map(|block| {
                find_key(block, &self.definition.applied.items_key).and_then(Value::as_array)
            })
            .cloned()
            .ok_or_else(|| {
                AdapterError::Parse(format!(
                    "applied view carries no '{}' array",
                    self.definition.applied.items_key
                ))
            })?;

        // the listing-view ids live in a parallel array on some providers
        let ids = self.definition.applied.ids_key.as_ref().and_then(|key| {
            blocks
                .iter()
                .find_map(|block| find_key(block, key).and_then(Value::as_array))
                .cloned()
        });

        let applied = correlate_applied(
            &items,
            ids.as_deref(),
            &self.definition.applied.item_id_path,
            self.provider_id().as_str(),
        );

        info!(provider = %self.provider_id(), count = applied.len(), "fetched applied postings");
        Ok(applied)
    }

    async fn fetch_supplemental(&self, id: &JobId) -> AdapterResult<String> {
        supplemental_via_detail(&self.session, &self.definition, id).await
    }

    async fn probe_applied(&self, id: &JobId) -> AdapterResult<Option<bool>> {
        // the applied/unapplied markers only render for a signed-in user
        ensure_login(
            &self.session,
            &self.definition,
            self.credentials.as_ref(),
            &self.logged_in,
        )
        .await?;

        probe_via_detail(&self.session, &self.definition, id).await
    }

    fn apply_url(&self, id: &JobId) -> String {
        self.definition.apply_url(id.as_str())
    }
}
