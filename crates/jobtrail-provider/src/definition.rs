//! Provider definition types and structures.
//!
//! This module defines the data structures for provider definitions loaded
//! from TOML files. Everything that varies per provider but is data rather
//! than behavior lives here: URLs, JSON payload keys, login selectors, and
//! default filter lists.

use crate::error::{ProviderError, Result};
use jobtrail_core::ProviderId;
use serde::{Deserialize, Serialize};

/// Complete provider definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDefinition {
    /// Core provider metadata
    pub provider: ProviderMetadata,

    /// Listing fetch configuration
    pub listings: ListingsConfig,

    /// Applied-view fetch configuration
    pub applied: AppliedConfig,

    /// Per-job detail probing and requirement-text backfill; absent when the
    /// provider has no usable detail view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailConfig>,

    /// Default filter lists for this provider
    #[serde(default)]
    pub filters: FilterDefaults,
}

impl ProviderDefinition {
    /// Get the provider ID.
    #[must_use]
    pub fn id(&self) -> &ProviderId {
        &self.provider.id
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.provider.name
    }

    /// Construct the apply URL for one posting id.
    #[must_use]
    pub fn apply_url(&self, job_id: &str) -> String {
        self.expand(&self.provider.apply_url_template, job_id)
    }

    /// Substitute `{base_url}` and `{id}` placeholders in a template.
    #[must_use]
    pub fn expand(&self, template: &str, job_id: &str) -> String {
        template
            .replace("{base_url}", self.provider.base_url.trim_end_matches('/'))
            .replace("{id}", job_id)
    }

    /// Validate the provider definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| {
            Err(ProviderError::ValidationError {
                provider_id: self.provider.id.to_string(),
                reason,
            })
        };

        if self.provider.name.is_empty() {
            return fail("provider name cannot be empty".to_string());
        }

        if self.provider.base_url.is_empty() {
            return fail("provider base URL cannot be empty".to_string());
        }

        if !self.provider.apply_url_template.contains("{id}") {
            return fail("apply_url_template must contain an {id} placeholder".to_string());
        }

        if self.listings.search_url.is_empty() {
            return fail("listings search URL cannot be empty".to_string());
        }

        if self.listings.page_size == 0 {
            return fail("listings page_size must be at least 1".to_string());
        }

        if self.listings.items_keys.is_empty() {
            return fail("listings items_keys cannot be empty".to_string());
        }

        if self.applied.url.is_empty() {
            return fail("applied URL cannot be empty".to_string());
        }

        if self.applied.items_key.is_empty() {
            return fail("applied items_key cannot be empty".to_string());
        }

        if self.applied.item_id_path.is_empty() {
            return fail("applied item_id_path cannot be empty".to_string());
        }

        if let Some(detail) = &self.detail {
            if !detail.url_template.contains("{id}") {
                return fail("detail url_template must contain an {id} placeholder".to_string());
            }
        }

        self.applied.login.validate(&self.provider.id)?;

        Ok(())
    }
}

/// Core provider metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Unique provider identifier (e.g., "meta", "tiktok")
    pub id: ProviderId,

    /// Human-readable provider name
    pub name: String,

    /// Careers site base URL
    pub base_url: String,

    /// Which adapter implementation drives this provider
    pub adapter: AdapterKind,

    /// Apply-link template; `{base_url}` and `{id}` are substituted
    pub apply_url_template: String,
}

/// The adapter implementation variants, selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// Listings and applied data embedded as JSON in the page itself
    /// (Meta-style careers sites)
    EmbeddedJson,
    /// Listings served by a paged JSON API behind a search page
    /// (TikTok-style careers sites)
    PagedApi,
}

/// Listing fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    /// Fully-formed search URL for the listing view
    pub search_url: String,

    /// Keys whose values are arrays of posting objects
    /// (e.g. `["all_jobs", "featured_jobs"]` or `["job_post_list"]`)
    pub items_keys: Vec<String>,

    /// Postings per page of the provider's listing API
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// URL template of the paged listing API with `{offset}` and `{limit}`
    /// placeholders; empty for providers whose listings are embedded in the
    /// search page itself
    #[serde(default)]
    pub api_url_template: String,

    /// Key holding the total posting count in API responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_key: Option<String>,
}

fn default_page_size() -> usize {
    12
}

/// Applied-view fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedConfig {
    /// URL of the authenticated applied-postings view (also the login page)
    pub url: String,

    /// Key whose value is the array of applied items
    /// (e.g. `"delivery_list"` or `"prospective_applications"`)
    pub items_key: String,

    /// Path within one applied item to the canonical listing id
    /// (e.g. `["job_post_info", "id"]` or `["id"]`)
    pub item_id_path: Vec<String>,

    /// Key of a parallel array carrying the listing-view ids when the
    /// applied view exposes different identifiers; correlated positionally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids_key: Option<String>,

    /// URL of a JSON endpoint listing applications, navigated after login;
    /// when absent the applied view's own page content is parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Login form selectors
    pub login: LoginSelectors,
}

/// Per-job detail view configuration for status probing and requirement
/// backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailConfig {
    /// Detail page template; `{base_url}` and `{id}` are substituted
    pub url_template: String,

    /// Selector that appears on the detail page when already applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_indicator: Option<String>,

    /// Selector that appears on the detail page when not yet applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unapplied_indicator: Option<String>,

    /// Keys whose values are arrays of requirement/qualification strings,
    /// concatenated into the record's requirement text
    #[serde(default)]
    pub requirement_keys: Vec<String>,
}

/// CSS selectors driving the provider's login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSelectors {
    /// Selector for the email input
    pub email_input: String,

    /// Selector for the password input
    pub password_input: String,

    /// Selector for the submit button
    pub submit_button: String,

    /// Selector for an entry link that reveals the login form
    /// (e.g. "Sign in with Email")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_link: Option<String>,

    /// Selector for an intermediate "continue with password" step between
    /// the email and password inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_step: Option<String>,

    /// Selector for a terms-of-service checkbox that must be checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_checkbox: Option<String>,

    /// Selector that only appears once login has succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_indicator: Option<String>,
}

impl LoginSelectors {
    fn validate(&self, provider_id: &ProviderId) -> Result<()> {
        for (field, value) in [
            ("email_input", &self.email_input),
            ("password_input", &self.password_input),
            ("submit_button", &self.submit_button),
        ] {
            if value.is_empty() {
                return Err(ProviderError::ValidationError {
                    provider_id: provider_id.to_string(),
                    reason: format!("login.{field} selector is required"),
                });
            }
        }
        Ok(())
    }
}

/// Default filter lists shipped with a provider definition.
///
/// These become the run's immutable filter spec; they are configuration,
/// not persisted job state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    /// Title must match at least one of these (case-insensitive substrings)
    pub title_include: Vec<String>,
    /// Title must match none of these
    pub title_exclude: Vec<String>,
    /// Requirement text must match at least one of these, when non-empty
    pub requirement_include: Vec<String>,
    /// Requirement text must match none of these
    pub requirement_exclude: Vec<String>,
    /// Acceptable location labels; empty means any location passes
    pub locations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_definition() -> ProviderDefinition {
        ProviderDefinition {
            provider: ProviderMetadata {
                id: ProviderId::new("acme").expect("valid provider ID"),
                name: "Acme Careers".to_string(),
                base_url: "https://careers.acme.com".to_string(),
                adapter: AdapterKind::PagedApi,
                apply_url_template: "{base_url}/search/{id}".to_string(),
            },
            listings: ListingsConfig {
                search_url: "https://careers.acme.com/search?keyword=engineer".to_string(),
                items_keys: vec!["job_post_list".to_string()],
                page_size: 12,
                api_url_template:
                    "https://careers.acme.com/api/posts?limit={limit}&offset={offset}".to_string(),
                count_key: Some("count".to_string()),
            },
            applied: AppliedConfig {
                url: "https://careers.acme.com/position/application".to_string(),
                items_key: "delivery_list".to_string(),
                item_id_path: vec!["job_post_info".to_string(), "id".to_string()],
                ids_key: None,
                api_url: None,
                login: LoginSelectors {
                    email_input: "input[placeholder=\"Email\"]".to_string(),
                    password_input: "input[placeholder=\"Password\"]".to_string(),
                    submit_button: "button[type=\"submit\"]".to_string(),
                    entry_link: None,
                    password_step: None,
                    terms_checkbox: None,
                    success_indicator: None,
                },
            },
            detail: None,
            filters: FilterDefaults::default(),
        }
    }

    #[test]
    fn test_definition_valid() {
        assert!(test_definition().validate().is_ok());
    }

    #[test]
    fn test_definition_rejects_empty_name() {
        let mut def = test_definition();
        def.provider.name = String::new();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_template_without_id() {
        let mut def = test_definition();
        def.provider.apply_url_template = "{base_url}/jobs".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_zero_page_size() {
        let mut def = test_definition();
        def.listings.page_size = 0;
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_empty_items_keys() {
        let mut def = test_definition();
        def.listings.items_keys.clear();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_empty_id_path() {
        let mut def = test_definition();
        def.applied.item_id_path.clear();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_missing_login_selector() {
        let mut def = test_definition();
        def.applied.login.password_input = String::new();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_definition_rejects_detail_without_id_placeholder() {
        let mut def = test_definition();
        def.detail = Some(DetailConfig {
            url_template: "{base_url}/job_details".to_string(),
            applied_indicator: None,
            unapplied_indicator: None,
            requirement_keys: Vec::new(),
        });
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_apply_url_substitution() {
        let def = test_definition();
        assert_eq!(
            def.apply_url("00123"),
            "https://careers.acme.com/search/00123"
        );
    }

    #[test]
    fn test_adapter_kind_serde() {
        let json = serde_json::to_string(&AdapterKind::EmbeddedJson).expect("serialize kind");
        assert_eq!(json, "\"embedded-json\"");
        let parsed: AdapterKind = serde_json::from_str("\"paged-api\"").expect("parse kind");
        assert_eq!(parsed, AdapterKind::PagedApi);
    }

    #[test]
    fn test_definition_from_toml() {
        let toml_src = r#"
            [provider]
            id = "acme"
            name = "Acme Careers"
            base_url = "https://careers.acme.com"
            adapter = "paged-api"
            apply_url_template = "{base_url}/search/{id}"

            [listings]
            search_url = "https://careers.acme.com/search"
            items_keys = ["job_post_list"]

            [applied]
            url = "https://careers.acme.com/position/application"
            items_key = "delivery_list"
            item_id_path = ["job_post_info", "id"]

            [applied.login]
            email_input = 'input[placeholder="Email"]'
            password_input = 'input[placeholder="Password"]'
            submit_button = 'button[type="submit"]'

            [filters]
            title_include = ["Software Engineer"]
            title_exclude = ["Intern"]
            locations = ["Austin", "Seattle"]
        "#;

        let def: ProviderDefinition = toml::from_str(toml_src).expect("parse definition");
        assert!(def.validate().is_ok());
        assert_eq!(def.listings.page_size, 12); // default
        assert_eq!(def.filters.title_include, vec!["Software Engineer"]);
        assert!(def.filters.requirement_include.is_empty());
        assert!(def.detail.is_none());
    }
}
