//! The unit of storage: one observed job posting.

use jobtrail_core::JobId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One observed posting from a provider's careers site.
///
/// `id` is the provider-native identifier and the dedup key. Everything the
/// provider reported beyond the core fields is preserved verbatim in
/// `provider_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Provider-native identifier, stable across runs for the same posting
    pub id: JobId,
    /// Posting title as reported
    pub title: String,
    /// Location labels in the order the provider reported them
    pub locations: Vec<String>,
    /// Concatenated qualification/requirement text; empty until backfilled
    pub requirement_text: String,
    /// Whether the user has applied; false on creation, false→true only
    pub applied: bool,
    /// All other provider-specific attributes, keys unique
    pub provider_fields: BTreeMap<String, Value>,
}

impl JobRecord {
    /// Create a record for a newly observed posting.
    #[must_use]
    pub fn new(id: JobId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            locations: Vec::new(),
            requirement_text: String::new(),
            applied: false,
            provider_fields: BTreeMap::new(),
        }
    }

    /// Attach a provider-specific field, returning `self` for chaining.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.provider_fields.insert(key.into(), value);
        self
    }

    /// Fold a re-fetched version of the same posting into this record.
    ///
    /// `applied` and `requirement_text` are left untouched; `title` and
    /// `locations` are only filled when currently empty; provider fields are
    /// union-only (previously-absent keys added, known keys kept as-is).
    /// Calling this twice with the same input changes nothing the second time.
    pub fn absorb(&mut self, incoming: &JobRecord) {
        debug_assert_eq!(self.id, incoming.id);

        if self.title.is_empty() && !incoming.title.is_empty() {
            self.title = incoming.title.clone();
        }
        if self.locations.is_empty() && !incoming.locations.is_empty() {
            self.locations = incoming.locations.clone();
        }
        for (key, value) in &incoming.provider_fields {
            self.provider_fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str) -> JobRecord {
        JobRecord::new(JobId::new(id).expect("valid job ID"), "Software Engineer")
    }

    #[test]
    fn test_new_record_defaults() {
        let rec = record("123");
        assert!(!rec.applied);
        assert!(rec.requirement_text.is_empty());
        assert!(rec.locations.is_empty());
        assert!(rec.provider_fields.is_empty());
    }

    #[test]
    fn test_absorb_keeps_applied_and_requirement() {
        let mut existing = record("123");
        existing.applied = true;
        existing.requirement_text = "BS required".to_string();

        let mut incoming = record("123");
        incoming.requirement_text = "something else".to_string();

        existing.absorb(&incoming);
        assert!(existing.applied);
        assert_eq!(existing.requirement_text, "BS required");
    }

    #[test]
    fn test_absorb_adds_only_absent_fields() {
        let mut existing = record("123").with_field("code", json!("A100"));
        let incoming = record("123")
            .with_field("code", json!("B200"))
            .with_field("team", json!("Infra"));

        existing.absorb(&incoming);
        assert_eq!(existing.provider_fields["code"], json!("A100"));
        assert_eq!(existing.provider_fields["team"], json!("Infra"));
    }

    #[test]
    fn test_absorb_is_idempotent() {
        let mut existing = record("123");
        let incoming = record("123")
            .with_field("team", json!("Infra"))
            .with_field("city_info", json!({"en_name": "Austin"}));

        existing.absorb(&incoming);
        let after_once = existing.clone();
        existing.absorb(&incoming);
        assert_eq!(existing, after_once);
    }

    #[test]
    fn test_absorb_fills_empty_title_and_locations() {
        let mut existing = JobRecord::new(JobId::new("123").expect("valid job ID"), "");
        let mut incoming = record("123");
        incoming.locations = vec!["Austin".to_string()];

        existing.absorb(&incoming);
        assert_eq!(existing.title, "Software Engineer");
        assert_eq!(existing.locations, vec!["Austin".to_string()]);

        // A later fetch with different values does not overwrite
        let mut later = record("123");
        later.title = "Other Title".to_string();
        later.locations = vec!["Remote".to_string()];
        existing.absorb(&later);
        assert_eq!(existing.title, "Software Engineer");
        assert_eq!(existing.locations, vec!["Austin".to_string()]);
    }
}
