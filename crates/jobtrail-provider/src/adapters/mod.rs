//! Adapter implementations and the shared plumbing between them.
//!
//! Two families of careers sites are covered: pages that embed their data as
//! JSON script blocks ([`EmbeddedJsonAdapter`]) and search pages backed by a
//! paged JSON API ([`PagedApiAdapter`]). Both are driven entirely by the
//! provider definition; a new provider of either family is a TOML file, not
//! new code.

pub mod embedded_json;
pub mod paged_api;

pub use embedded_json::EmbeddedJsonAdapter;
pub use paged_api::PagedApiAdapter;

use crate::adapter::{AdapterResult, AppliedItem, SiteAdapter};
use crate::credentials::Credentials;
use crate::definition::{AdapterKind, ProviderDefinition};
use crate::error::AdapterError;
use crate::json_search::find_key;
use jobtrail_browser::PageSession;
use jobtrail_core::JobId;
use jobtrail_store::JobRecord;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Build the adapter implementation selected by the definition's
/// `adapter` tag.
#[must_use]
pub fn build_adapter(
    definition: ProviderDefinition,
    session: PageSession,
    credentials: Option<Credentials>,
) -> Box<dyn SiteAdapter> {
    match definition.provider.adapter {
        AdapterKind::EmbeddedJson => {
            Box::new(EmbeddedJsonAdapter::new(definition, session, credentials))
        }
        AdapterKind::PagedApi => Box::new(PagedApiAdapter::new(definition, session, credentials)),
    }
}

/// Turn a provider's posting object into a [`JobRecord`].
///
/// `id` is required; everything else is optional and tolerated when absent.
/// Location labels come from a `locations` string array or a
/// `city_info.en_name` object, whichever the provider uses; the raw fields
/// are preserved in `provider_fields` either way.
pub(crate) fn shape_record(obj: &Value) -> Option<JobRecord> {
    let map = obj.as_object()?;

    let id = map.get("id").and_then(json_id)?;
    let title = map
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut record = JobRecord::new(id, title);

    if let Some(arr) = map.get("locations").and_then(Value::as_array) {
        record.locations = arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect();
    } else if let Some(city) = map
        .get("city_info")
        .and_then(|c| c.get("en_name"))
        .and_then(Value::as_str)
    {
        record.locations = vec![city.to_string()];
    }

    for (key, value) in map {
        if key == "id" || key == "title" || key == "locations" {
            continue;
        }
        record.provider_fields.insert(key.clone(), value.clone());
    }

    Some(record)
}

/// A job id out of a JSON value. Providers serve ids as strings or numbers;
/// both become opaque text.
pub(crate) fn json_id(value: &Value) -> Option<JobId> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    JobId::new(text).ok()
}

/// Walk `path` into an applied item and read the id at its end.
pub(crate) fn id_at_path(item: &Value, path: &[String]) -> Option<JobId> {
    let mut current = item;
    for segment in path {
        current = current.get(segment)?;
    }
    json_id(current)
}

/// Collect posting objects from every configured items key.
pub(crate) fn collect_items(value: &Value, keys: &[String]) -> Vec<Value> {
    let mut items = Vec::new();
    for key in keys {
        if let Some(arr) = find_key(value, key).and_then(Value::as_array) {
            items.extend(arr.iter().cloned());
        }
    }
    items
}

/// Correlate applied-view items with canonical listing ids.
///
/// When `ids` is present the provider's applied view exposes different
/// identifiers than its listing view, and the two arrays line up
/// positionally; otherwise the id is read out of each item directly.
/// Items without a resolvable id are logged and skipped.
pub(crate) fn correlate_applied(
    items: &[Value],
    ids: Option<&[Value]>,
    id_path: &[String],
    provider: &str,
) -> Vec<AppliedItem> {
    let mut applied = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let id = match ids {
            Some(id_entries) => id_entries
                .get(position)
                .and_then(|entry| find_key(entry, "id"))
                .and_then(json_id),
            None => id_at_path(item, id_path),
        };

        match id {
            Some(id) => applied.push(AppliedItem {
                id,
                raw: item.clone(),
            }),
            None => {
                warn!(
                    provider,
                    position, "applied item without a resolvable listing id, skipping"
                );
            }
        }
    }

    applied
}

/// Log in through the provider's form, using the selectors in the
/// definition. Steps the definition leaves out are skipped.
pub(crate) async fn login(
    session: &PageSession,
    definition: &ProviderDefinition,
    credentials: &Credentials,
) -> AdapterResult<()> {
    let selectors = &definition.applied.login;

    session.goto(&definition.applied.url).await?;

    if let Some(entry) = &selectors.entry_link {
        session.click(entry).await?;
        sleep(Duration::from_millis(1500)).await;
    }

    session
        .fill(&selectors.email_input, &credentials.email)
        .await?;

    if let Some(step) = &selectors.password_step {
        session.click(step).await?;
        sleep(Duration::from_millis(1000)).await;
    }

    session
        .fill(&selectors.password_input, &credentials.password)
        .await?;

    if let Some(terms) = &selectors.terms_checkbox {
        session.click(terms).await?;
    }

    session.click(&selectors.submit_button).await?;

    match &selectors.success_indicator {
        Some(indicator) => {
            if session.wait_for(indicator, 15_000).await.is_err() {
                return Err(AdapterError::AuthenticationFailed(
                    definition.id().to_string(),
                ));
            }
        }
        None => {
            sleep(Duration::from_secs(5)).await;
            // the login form still being visible means we were rejected
            if session
                .exists(&selectors.password_input)
                .await
                .unwrap_or(false)
            {
                return Err(AdapterError::AuthenticationFailed(
                    definition.id().to_string(),
                ));
            }
        }
    }

    debug!(provider = %definition.id(), "login completed");
    Ok(())
}

/// Log in once per adapter lifetime; later calls are no-ops.
pub(crate) async fn ensure_login(
    session: &PageSession,
    definition: &ProviderDefinition,
    credentials: Option<&Credentials>,
    logged_in: &AtomicBool,
) -> AdapterResult<()> {
    if logged_in.load(Ordering::Acquire) {
        return Ok(());
    }

    let credentials = credentials.ok_or_else(|| {
        AdapterError::CredentialsMissing(Credentials::required_vars(definition.id()))
    })?;

    login(session, definition, credentials).await?;
    logged_in.store(true, Ordering::Release);
    Ok(())
}

/// Probe the detail page for the applied/unapplied markers.
///
/// `None` when the definition has no detail view or neither marker shows up.
pub(crate) async fn probe_via_detail(
    session: &PageSession,
    definition: &ProviderDefinition,
    id: &JobId,
) -> AdapterResult<Option<bool>> {
    let Some(detail) = &definition.detail else {
        return Ok(None);
    };

    session
        .goto(&definition.expand(&detail.url_template, id.as_str()))
        .await?;

    if let Some(selector) = &detail.applied_indicator {
        if session.exists(selector).await? {
            return Ok(Some(true));
        }
    }

    if let Some(selector) = &detail.unapplied_indicator {
        if session.exists(selector).await? {
            return Ok(Some(false));
        }
    }

    Ok(None)
}

/// Pull requirement text out of the detail page's embedded JSON.
///
/// Empty when the definition has no detail view, configures no requirement
/// keys, or the page simply doesn't carry them; none of those are errors.
pub(crate) async fn supplemental_via_detail(
    session: &PageSession,
    definition: &ProviderDefinition,
    id: &JobId,
) -> AdapterResult<String> {
    let Some(detail) = &definition.detail else {
        return Ok(String::new());
    };
    if detail.requirement_keys.is_empty() {
        return Ok(String::new());
    }

    session
        .goto(&definition.expand(&detail.url_template, id.as_str()))
        .await?;
    let html = session.content().await?;

    let mut parts: Vec<String> = Vec::new();
    for key in &detail.requirement_keys {
        if let Some(value) = crate::json_search::find_key_in_page(&html, key) {
            match value {
                Value::Array(items) => {
                    parts.extend(
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(ToString::to_string)),
                    );
                }
                Value::String(text) => parts.push(text),
                _ => {}
            }
        }
    }

    Ok(parts.join(" "))
}
