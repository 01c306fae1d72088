//! Pure filter pipeline over the job store.
//!
//! No network, no I/O: a spec and a store go in, a reduced ordered view
//! comes out, so the whole thing is testable in isolation.

use jobtrail_provider::FilterDefaults;
use jobtrail_store::{JobRecord, JobStore};
use tracing::warn;

/// Immutable filter criteria for one run.
///
/// Constructed once (usually from a provider definition's filter defaults)
/// and passed by reference; never held as shared mutable state.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Title must match at least one (case-insensitive substring)
    pub title_include: Vec<String>,
    /// Title must match none
    pub title_exclude: Vec<String>,
    /// Requirement text must match at least one, when any are configured
    pub requirement_include: Vec<String>,
    /// Requirement text must match none
    pub requirement_exclude: Vec<String>,
    /// Acceptable location labels; empty passes every location
    pub locations: Vec<String>,
}

impl FilterSpec {
    /// Build a spec from a provider definition's filter defaults.
    #[must_use]
    pub fn from_defaults(defaults: &FilterDefaults) -> Self {
        Self {
            title_include: defaults.title_include.clone(),
            title_exclude: defaults.title_exclude.clone(),
            requirement_include: defaults.requirement_include.clone(),
            requirement_exclude: defaults.requirement_exclude.clone(),
            locations: defaults.locations.clone(),
        }
    }

    /// Whether a single record passes every clause.
    #[must_use]
    pub fn matches(&self, record: &JobRecord) -> bool {
        if record.applied {
            return false;
        }

        // An empty include list matches nothing: include terms are an
        // allowlist, and no allowlist means no candidates.
        if !self
            .title_include
            .iter()
            .any(|term| contains_ci(&record.title, term))
        {
            return false;
        }
        if self
            .title_exclude
            .iter()
            .any(|term| contains_ci(&record.title, term))
        {
            return false;
        }

        if !self.requirement_include.is_empty()
            && !self
                .requirement_include
                .iter()
                .any(|term| contains_ci(&record.requirement_text, term))
        {
            return false;
        }
        if self
            .requirement_exclude
            .iter()
            .any(|term| contains_ci(&record.requirement_text, term))
        {
            return false;
        }

        // Location clause passes vacuously when no locations are configured
        if !self.locations.is_empty()
            && !record
                .locations
                .iter()
                .any(|loc| self.locations.iter().any(|want| loc.contains(want)))
        {
            return false;
        }

        true
    }
}

/// Apply the spec to the whole store, preserving store iteration order.
#[must_use]
pub fn filter_records<'a>(store: &'a JobStore, spec: &FilterSpec) -> Vec<&'a JobRecord> {
    if spec.title_include.is_empty() && !store.is_empty() {
        warn!(
            provider = %store.provider(),
            "title include list is empty; the filter will match nothing"
        );
    }

    store.iter().filter(|record| spec.matches(record)).collect()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_core::{JobId, ProviderId};
    use tempfile::TempDir;

    fn record(id: &str, title: &str, locations: &[&str], requirement: &str) -> JobRecord {
        let mut rec = JobRecord::new(JobId::new(id).expect("valid job ID"), title);
        rec.locations = locations.iter().map(ToString::to_string).collect();
        rec.requirement_text = requirement.to_string();
        rec
    }

    fn store_with(records: Vec<JobRecord>) -> (TempDir, JobStore) {
        let dir = TempDir::new().expect("create temp dir");
        let provider = ProviderId::new("acme").expect("valid provider ID");
        let mut store = JobStore::open(provider, dir.path()).expect("open store");
        store.merge(records);
        (dir, store)
    }

    fn spec() -> FilterSpec {
        FilterSpec {
            title_include: vec!["Software Engineer".to_string()],
            title_exclude: vec!["PhD".to_string()],
            requirement_include: Vec::new(),
            requirement_exclude: Vec::new(),
            locations: vec!["Austin".to_string()],
        }
    }

    #[test]
    fn test_title_and_location_filtering() {
        let (_dir, store) = store_with(vec![
            record("1", "Software Engineer", &["Austin"], "BS required"),
            record("2", "Senior Software Engineer (PhD)", &["Austin"], ""),
        ]);

        let result = filter_records(&store, &spec());
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let (_dir, store) = store_with(vec![record(
            "1",
            "software engineer, backend",
            &["Austin"],
            "",
        )]);
        assert_eq!(filter_records(&store, &spec()).len(), 1);
    }

    #[test]
    fn test_applied_records_are_excluded() {
        let mut applied = record("1", "Software Engineer", &["Austin"], "");
        applied.applied = true;
        let (_dir, store) = store_with(vec![
            applied,
            record("2", "Software Engineer", &["Austin"], ""),
        ]);

        let result = filter_records(&store, &spec());
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_empty_include_list_matches_nothing() {
        let (_dir, store) = store_with(vec![record("1", "Software Engineer", &["Austin"], "")]);

        let mut empty_include = spec();
        empty_include.title_include.clear();
        assert!(filter_records(&store, &empty_include).is_empty());
    }

    #[test]
    fn test_vacuous_location_pass() {
        let (_dir, store) = store_with(vec![
            record("1", "Software Engineer", &["Remote, Antarctica"], ""),
            record("2", "Software Engineer", &[], ""),
        ]);

        let mut any_location = spec();
        any_location.locations.clear();
        assert_eq!(filter_records(&store, &any_location).len(), 2);
    }

    #[test]
    fn test_location_substring_match() {
        let (_dir, store) = store_with(vec![
            record("1", "Software Engineer", &["Austin, TX"], ""),
            record("2", "Software Engineer", &["Boston, MA"], ""),
        ]);

        let result = filter_records(&store, &spec());
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_requirement_exclude() {
        let mut banned = spec();
        banned.requirement_exclude = vec!["does not provide sponsorship".to_string()];

        let (_dir, store) = store_with(vec![
            record(
                "1",
                "Software Engineer",
                &["Austin"],
                "This role does not provide sponsorship.",
            ),
            record("2", "Software Engineer", &["Austin"], "BS required"),
        ]);

        let result = filter_records(&store, &banned);
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_requirement_include_skips_empty_text() {
        let mut wants_experience = spec();
        wants_experience.requirement_include = vec!["5 years".to_string()];

        let (_dir, store) = store_with(vec![
            record("1", "Software Engineer", &["Austin"], "5 years experience"),
            // empty requirement text cannot satisfy a configured include term
            record("2", "Software Engineer", &["Austin"], ""),
        ]);

        let result = filter_records(&store, &wants_experience);
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_result_preserves_store_order() {
        let (_dir, store) = store_with(vec![
            record("9", "Software Engineer", &["Austin"], ""),
            record("3", "Software Engineer", &["Austin"], ""),
            record("7", "Software Engineer", &["Austin"], ""),
        ]);

        let result = filter_records(&store, &spec());
        let ids: Vec<&str> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "3", "7"]);
    }
}
