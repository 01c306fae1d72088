//! Adapter for careers sites whose listings come from a paged JSON API.
//!
//! The search page is visited once to establish session state, then the
//! listing API is walked page by page. The applied view sits behind a login
//! form and is read either from a JSON endpoint or from the page itself.

use crate::adapter::{AdapterResult, AppliedItem, SiteAdapter};
use crate::adapters::{
    collect_items, correlate_applied, ensure_login, probe_via_detail, shape_record,
    supplemental_via_detail,
};
use crate::credentials::Credentials;
use crate::definition::ProviderDefinition;
use crate::error::AdapterError;
use crate::json_search::{find_key, find_key_in_page};
use async_trait::async_trait;
use jobtrail_browser::PageSession;
use jobtrail_core::{JobId, ProviderId};
use jobtrail_store::JobRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// Hard ceiling on API pagination, in case a provider's count field lies.
const MAX_OFFSET: usize = 10_000;

/// TikTok-style adapter: paged listing API behind a search page.
pub struct PagedApiAdapter {
    definition: ProviderDefinition,
    session: PageSession,
    credentials: Option<Credentials>,
    logged_in: AtomicBool,
}

impl PagedApiAdapter {
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

    /// One page of the listing API as parsed JSON.
    async fn fetch_api_page(&self, offset: usize, limit: usize) -> AdapterResult<Value> {
        let url = self
            .definition
            .listings
            .api_url_template
            .replace("{offset}", &offset.to_string())
            .replace("{limit}", &limit.to_string());

        self.session.goto(&url).await?;
        let body = self.session.body_text().await?;

        serde_json::from_str(body.trim())
            .map_err(|e| AdapterError::Parse(format!("listing API page at offset {offset}: {e}")))
    }
}

#[async_trait]
impl SiteAdapter for PagedApiAdapter {
    fn provider_id(&self) -> &ProviderId {
        self.definition.id()
    }

    async fn fetch_listings(&self, limit: Option<usize>) -> AdapterResult<Vec<JobRecord>> {
        let listings = &self.definition.listings;

        // establishes cookies and any server-side search state
        self.session.goto(&listings.search_url).await?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        if listings.api_url_template.is_empty() {
            // no API; the search page itself carries the postings
            let html = self.session.content().await?;
            let mut items = Vec::new();
            for key in &listings.items_keys {
                if let Some(Value::Array(arr)) = find_key_in_page(&html, key) {
                    items.extend(arr);
                }
            }
            if items.is_empty() {
                return Err(AdapterError::Parse(format!(
                    "no listing data under keys {:?}",
                    listings.items_keys
                )));
            }
            for item in &items {
                if let Some(record) = shape_record(item) {
                    if seen.insert(record.id.clone()) {
                        records.push(record);
                    }
                }
                if limit.is_some_and(|max| records.len() >= max) {
                    break;
                }
            }
            info!(provider = %self.provider_id(), count = records.len(), "fetched listings");
            return Ok(records);
        }

        let page_size = listings.page_size;
        let mut offset = 0;
        let mut total: Option<usize> = None;

        loop {
            let page = self.fetch_api_page(offset, page_size).await?;

            if total.is_none() {
                total = listings
                    .count_key
                    .as_ref()
                    .and_then(|key| find_key(&page, key))
                    .and_then(Value::as_u64)
                    .map(|count| count as usize);
                if let Some(total) = total {
                    debug!(provider = %self.provider_id(), total, "provider reports total postings");
                }
            }

            let items = collect_items(&page, &listings.items_keys);
            if items.is_empty() {
                break;
            }

            for item in &items {
                let Some(record) = shape_record(item) else {
                    debug!(provider = %self.provider_id(), "skipping posting without an id");
                    continue;
                };
                if seen.insert(record.id.clone()) {
                    records.push(record);
                }
                if limit.is_some_and(|max| records.len() >= max) {
                    info!(provider = %self.provider_id(), count = records.len(), "reached listing limit");
                    return Ok(records);
                }
            }

            offset += page_size;
            if total.is_some_and(|total| offset >= total) {
                break;
            }
            if offset >= MAX_OFFSET {
                warn!(provider = %self.provider_id(), offset, "pagination ceiling reached, stopping");
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

        let applied_cfg = &self.definition.applied;

        let payload: Value = match &applied_cfg.api_url {
            Some(api_url) => {
                self.session.goto(api_url).await?;
                let body = self.session.body_text().await?;
                serde_json::from_str(body.trim())
                    .map_err(|e| AdapterError::Parse(format!("applications API: {e}")))?
            }
            None => {
                self.session.goto(&applied_cfg.url).await?;
                let html = self.session.content().await?;
                find_key_in_page(&html, &applied_cfg.items_key)
                    .map(|items| {
                        let mut wrapper = serde_json::Map::new();
                        wrapper.insert(applied_cfg.items_key.clone(), items);
                        Value::Object(wrapper)
                    })
                    .ok_or_else(|| {
                        AdapterError::Parse(format!(
                            "applied view carries no '{}' array",
                            applied_cfg.items_key
                        ))
                    })?
            }
        };

        let items = find_key(&payload, &applied_cfg.items_key)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                AdapterError::Parse(format!(
                    "applied payload carries no '{}' array",
                    applied_cfg.items_key
                ))
            })?;

        let applied = correlate_applied(
            &items,
            None,
            &applied_cfg.item_id_path,
            self.provider_id().as_str(),
        );

        info!(provider = %self.provider_id(), count = applied.len(), "fetched applied postings");
        Ok(applied)
    }

    async fn fetch_supplemental(&self, id: &JobId) -> AdapterResult<String> {
        supplemental_via_detail(&self.session, &self.definition, id).await
    }

    async fn probe_applied(&self, id: &JobId) -> AdapterResult<Option<bool>> {
        if self.definition.detail.is_none() {
            return Ok(None);
        }

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
