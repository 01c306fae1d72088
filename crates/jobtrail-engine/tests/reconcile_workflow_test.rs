//! End-to-end pass over a real on-disk store with a scripted adapter:
//! merge → reconcile → persist → reload → filter → report.

use async_trait::async_trait;
use jobtrail_core::{JobId, ProviderId};
use jobtrail_engine::{
    candidate_rows, filter_records, render_candidates, FilterSpec, ReconcileOptions,
    ReconciliationEngine,
};
use jobtrail_provider::{AdapterResult, AppliedItem, SiteAdapter};
use jobtrail_store::{JobRecord, JobStore};
use serde_json::json;
use tempfile::TempDir;

struct ScriptedAdapter {
    provider: ProviderId,
    applied_ids: Vec<String>,
    supplemental: String,
}

#[async_trait]
impl SiteAdapter for ScriptedAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    async fn fetch_listings(&self, limit: Option<usize>) -> AdapterResult<Vec<JobRecord>> {
        let mut records = vec![
            job("00123", "Software Engineer", &["Austin"]),
            job("2", "Senior Software Engineer (PhD)", &["Austin"]),
            job("3", "Software Engineer", &["Seattle"]),
        ];
        if let Some(max) = limit {
            records.truncate(max);
        }
        Ok(records)
    }

    async fn fetch_applied(&self) -> AdapterResult<Vec<AppliedItem>> {
        Ok(self
            .applied_ids
            .iter()
            .map(|id| AppliedItem {
                id: JobId::new(id.clone()).expect("valid job ID"),
                raw: json!({"job_post_info": {"id": id}}),
            })
            .collect())
    }

    async fn fetch_supplemental(&self, _id: &JobId) -> AdapterResult<String> {
        Ok(self.supplemental.clone())
    }

    async fn probe_applied(&self, _id: &JobId) -> AdapterResult<Option<bool>> {
        Ok(None)
    }

    fn apply_url(&self, id: &JobId) -> String {
        format!("https://careers.acme.com/search/{id}")
    }
}

fn job(id: &str, title: &str, locations: &[&str]) -> JobRecord {
    let mut record = JobRecord::new(JobId::new(id).expect("valid job ID"), title);
    record.locations = locations.iter().map(ToString::to_string).collect();
    record
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

#[tokio::test]
async fn full_pass_marks_applied_backfills_and_survives_reload() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = ProviderId::new("acme").expect("valid provider ID");
    let adapter = ScriptedAdapter {
        provider: provider.clone(),
        applied_ids: vec!["3".to_string()],
        supplemental: "5 years experience".to_string(),
    };

    // fetch → merge → persist
    let mut store = JobStore::open(provider.clone(), dir.path()).expect("open store");
    let fetched = adapter.fetch_listings(None).await.expect("fetch listings");
    assert_eq!(store.merge(fetched), 3);
    store.persist().expect("persist after merge");

    // reconcile (fast path only) → persist
    let reconciler = ReconciliationEngine::new(ReconcileOptions {
        skip_probe: false,
        probe_cap: 10,
        persist_every: 1,
    });
    let outcome = reconciler.run(&mut store, &adapter, &spec()).await;
    assert_eq!(outcome.newly_applied, 1);
    assert!(outcome.backfilled >= 1);
    store.persist().expect("persist after reconcile");

    // a second identical pass changes nothing
    let second = reconciler.run(&mut store, &adapter, &spec()).await;
    assert_eq!(second.newly_applied, 0);
    store.persist().expect("persist after second pass");

    // reload from disk and check everything survived
    let reloaded = JobStore::open(provider, dir.path()).expect("reload store");
    let id3 = JobId::new("3").expect("valid job ID");
    assert!(reloaded.get(&id3).expect("record 3").applied);
    let id1 = JobId::new("00123").expect("valid job ID");
    let record1 = reloaded.get(&id1).expect("record 00123");
    assert!(!record1.applied);
    assert_eq!(record1.requirement_text, "5 years experience");

    // filter → report: only the unapplied Austin engineer remains
    let matches = filter_records(&reloaded, &spec());
    let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["00123"]);

    let rows = candidate_rows(&matches, |r| adapter.apply_url(&r.id));
    let table = render_candidates("Acme Careers", &rows);
    assert!(table.contains("00123"));
    assert!(table.contains("https://careers.acme.com/search/00123"));
}

#[tokio::test]
async fn scrape_limit_caps_fetched_listings() {
    let dir = TempDir::new().expect("create temp dir");
    let provider = ProviderId::new("acme").expect("valid provider ID");
    let adapter = ScriptedAdapter {
        provider: provider.clone(),
        applied_ids: Vec::new(),
        supplemental: String::new(),
    };

    let mut store = JobStore::open(provider, dir.path()).expect("open store");
    let fetched = adapter.fetch_listings(Some(2)).await.expect("fetch listings");
    assert_eq!(fetched.len(), 2);
    assert_eq!(store.merge(fetched), 2);
}
