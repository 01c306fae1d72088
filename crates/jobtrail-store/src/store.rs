//! Load, merge, and persist the per-provider record set.

use crate::error::{Result, StoreError};
use crate::record::JobRecord;
use jobtrail_core::{JobId, ProviderId};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Stable column prefix every store file starts with. Provider-specific
/// columns follow, in sorted order.
const BASE_COLUMNS: [&str; 5] = ["id", "title", "locations", "requirement_text", "applied"];

/// The persistent, de-duplicated collection of postings for one provider.
///
/// Records keep their insertion order; the index maps ids to positions.
pub struct JobStore {
    provider: ProviderId,
    path: PathBuf,
    records: Vec<JobRecord>,
    index: HashMap<JobId, usize>,
}

impl JobStore {
    /// Open the store for `provider` under `data_dir`.
    ///
    /// A missing file yields an empty store. A file that exists but cannot
    /// be parsed is an error: a corrupt store must surface to the operator
    /// rather than silently start over.
    pub fn open(provider: ProviderId, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(format!("{provider}_jobs.csv"));

        let records = if path.exists() {
            Self::read_csv(&path)?
        } else {
            debug!(provider = %provider, path = %path.display(), "no prior store, starting empty");
            Vec::new()
        };

        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), pos).is_some() {
                return Err(StoreError::Corrupt {
                    path,
                    reason: format!("duplicate id '{}'", record.id),
                });
            }
        }

        info!(provider = %provider, count = records.len(), "loaded job store");

        Ok(Self {
            provider,
            path,
            records,
            index,
        })
    }

    /// The provider this store belongs to.
    #[must_use]
    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    /// Path of the backing CSV file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &JobId) -> Option<&JobRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Merge a fetched batch into the store.
    ///
    /// Unseen ids are inserted with `applied = false`; seen ids keep their
    /// `applied` and `requirement_text` and only gain previously-absent
    /// provider fields. Merging the same batch twice equals merging it once.
    ///
    /// Returns the number of newly added records.
    pub fn merge(&mut self, incoming: Vec<JobRecord>) -> usize {
        let mut added = 0;

        for mut record in incoming {
            match self.index.get(&record.id) {
                Some(&pos) => {
                    self.records[pos].absorb(&record);
                }
                None => {
                    record.applied = false;
                    self.index.insert(record.id.clone(), self.records.len());
                    self.records.push(record);
                    added += 1;
                }
            }
        }

        if added > 0 {
            info!(provider = %self.provider, added, total = self.records.len(), "merged new postings");
        } else {
            debug!(provider = %self.provider, "merge added no new postings");
        }

        added
    }

    /// Mark a record as applied. Returns whether the flag changed.
    ///
    /// Applied is terminal: there is no inverse operation, so a partial
    /// fetch on a later run can never un-observe an application.
    pub fn mark_applied(&mut self, id: &JobId) -> bool {
        match self.index.get(id) {
            Some(&pos) if !self.records[pos].applied => {
                self.records[pos].applied = true;
                true
            }
            _ => false,
        }
    }

    /// Store backfilled requirement text. Empty input is ignored: an empty
    /// supplemental fetch is a valid outcome, retried on a later run.
    /// Returns whether the record changed.
    pub fn set_requirement_text(&mut self, id: &JobId, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.index.get(id) {
            Some(&pos) => {
                self.records[pos].requirement_text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Write the full record set to the backing file.
    ///
    /// Writes into a temp file in the same directory and atomically renames
    /// it over the target, so a crash mid-write never corrupts prior state.
    /// In-memory records are untouched on failure, allowing a retry.
    pub fn persist(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::Persist {
                path: self.path.clone(),
                reason: "store path has no parent directory".to_string(),
            })?;
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        self.write_csv(tmp.as_file_mut())?;
        tmp.as_file_mut().flush()?;

        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(provider = %self.provider, count = self.records.len(), path = %self.path.display(), "persisted store");
        Ok(())
    }

    /// Sorted union of provider-field keys across all records.
    fn extra_columns(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.provider_fields.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn write_csv(&self, out: &mut dyn Write) -> Result<()> {
        let extra = self.extra_columns();
        let mut writer = csv::Writer::from_writer(out);

        let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
        header.extend(extra.iter().map(String::as_str));
        writer.write_record(&header)?;

        for record in &self.records {
            let mut row: Vec<String> = Vec::with_capacity(header.len());
            row.push(record.id.as_str().to_string());
            row.push(record.title.clone());
            row.push(serde_json::to_string(&record.locations).map_err(|e| {
                StoreError::Persist {
                    path: self.path.clone(),
                    reason: format!("serialize locations: {e}"),
                }
            })?);
            row.push(record.requirement_text.clone());
            row.push(record.applied.to_string());

            for key in &extra {
                match record.provider_fields.get(key) {
                    Some(value) => row.push(value.to_string()),
                    None => row.push(String::new()),
                }
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn read_csv(path: &Path) -> Result<Vec<JobRecord>> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let columns: Vec<String> = headers.iter().map(ToString::to_string).collect();
        if columns.len() < BASE_COLUMNS.len()
            || columns[..BASE_COLUMNS.len()] != BASE_COLUMNS.map(str::to_string)
        {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "expected column prefix {:?}, found {:?}",
                    BASE_COLUMNS,
                    &columns[..columns.len().min(BASE_COLUMNS.len())]
                ),
            });
        }
        let extra = &columns[BASE_COLUMNS.len()..];

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;

            // `id` is text, never a number; leading zeros stay intact
            let id = JobId::new(row.get(0).unwrap_or_default()).map_err(|e| {
                StoreError::Corrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;

            let locations_cell = row.get(2).unwrap_or_default();
            let locations: Vec<String> = if locations_cell.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(locations_cell).map_err(|e| StoreError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("bad locations cell for id '{id}': {e}"),
                })?
            };

            let applied_cell = row.get(4).unwrap_or_default();
            let applied = applied_cell.eq_ignore_ascii_case("true");

            let mut record = JobRecord {
                id,
                title: row.get(1).unwrap_or_default().to_string(),
                locations,
                requirement_text: row.get(3).unwrap_or_default().to_string(),
                applied,
                provider_fields: std::collections::BTreeMap::new(),
            };

            for (offset, key) in extra.iter().enumerate() {
                let cell = row.get(BASE_COLUMNS.len() + offset).unwrap_or_default();
                if cell.is_empty() {
                    continue;
                }
                // Cells are JSON; tolerate hand-edited plain text as a string
                let value = serde_json::from_str(cell)
                    .unwrap_or_else(|_| Value::String(cell.to_string()));
                record.provider_fields.insert(key.clone(), value);
            }

            records.push(record);
        }

        if records.is_empty() {
            warn!(path = %path.display(), "store file present but holds no records");
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn provider() -> ProviderId {
        ProviderId::new("acme").expect("valid provider ID")
    }

    fn record(id: &str, title: &str) -> JobRecord {
        JobRecord::new(JobId::new(id).expect("valid job ID"), title)
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().expect("create temp dir");
        let store = JobStore::open(provider(), dir.path()).expect("open store");
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_inserts_and_counts() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        let added = store.merge(vec![
            record("1", "Software Engineer"),
            record("2", "Machine Learning Engineer"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        let batch = vec![
            record("1", "Software Engineer").with_field("code", json!("A100")),
            record("2", "Machine Learning Engineer"),
        ];
        let added_first = store.merge(batch.clone());
        let snapshot: Vec<JobRecord> = store.iter().cloned().collect();

        let added_second = store.merge(batch);
        let after: Vec<JobRecord> = store.iter().cloned().collect();

        assert_eq!(added_first, 2);
        assert_eq!(added_second, 0);
        assert_eq!(snapshot, after);
    }

    #[test]
    fn test_merge_never_duplicates_ids() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        store.merge(vec![record("1", "Software Engineer")]);
        store.merge(vec![record("1", "Software Engineer")]);
        store.merge(vec![record("1", "Renamed Role"), record("1", "Again")]);

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_preserves_applied_and_requirement() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        store.merge(vec![record("1", "Software Engineer")]);
        let id = JobId::new("1").expect("valid job ID");
        assert!(store.mark_applied(&id));
        assert!(store.set_requirement_text(&id, "BS required"));

        // Re-fetch of the same posting must not reset reconciled state
        store.merge(vec![record("1", "Software Engineer")]);
        let rec = store.get(&id).expect("record present");
        assert!(rec.applied);
        assert_eq!(rec.requirement_text, "BS required");
    }

    #[test]
    fn test_mark_applied_is_monotonic() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");
        store.merge(vec![record("1", "Software Engineer")]);

        let id = JobId::new("1").expect("valid job ID");
        assert!(store.mark_applied(&id));
        // Second identical reconciliation is a no-op
        assert!(!store.mark_applied(&id));
        assert!(store.get(&id).expect("record present").applied);
    }

    #[test]
    fn test_set_requirement_text_ignores_empty() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");
        store.merge(vec![record("1", "Software Engineer")]);

        let id = JobId::new("1").expect("valid job ID");
        assert!(!store.set_requirement_text(&id, ""));
        assert!(store
            .get(&id)
            .expect("record present")
            .requirement_text
            .is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        let mut rec = record("00123", "Software Engineer")
            .with_field("code", json!("A100"))
            .with_field("city_info", json!({"en_name": "Austin"}));
        rec.locations = vec!["Austin".to_string(), "Seattle".to_string()];
        rec.requirement_text = "BS required".to_string();

        let mut other = record("2", "Machine Learning Engineer");
        other.applied = true;

        store.merge(vec![rec]);
        store.merge(vec![other]);
        let id2 = JobId::new("2").expect("valid job ID");
        store.mark_applied(&id2);

        let before: Vec<JobRecord> = store.iter().cloned().collect();
        store.persist().expect("persist store");

        let reloaded = JobStore::open(provider(), dir.path()).expect("reload store");
        let after: Vec<JobRecord> = reloaded.iter().cloned().collect();

        assert_eq!(before, after);
        // Leading zeros survive the trip as text
        assert_eq!(after[0].id.as_str(), "00123");
    }

    #[test]
    fn test_persist_then_open_keeps_order() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = JobStore::open(provider(), dir.path()).expect("open store");

        for id in ["9", "3", "7", "1"] {
            store.merge(vec![record(id, "Software Engineer")]);
        }
        store.persist().expect("persist store");

        let reloaded = JobStore::open(provider(), dir.path()).expect("reload store");
        let ids: Vec<&str> = reloaded.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "3", "7", "1"]);
    }

    #[test]
    fn test_open_rejects_duplicate_ids() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("acme_jobs.csv");
        std::fs::write(
            &path,
            "id,title,locations,requirement_text,applied\n1,A,,,false\n1,B,,,false\n",
        )
        .expect("write fixture");

        let result = JobStore::open(provider(), dir.path());
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_open_rejects_wrong_header() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("acme_jobs.csv");
        std::fs::write(&path, "job,name\n1,A\n").expect("write fixture");

        let result = JobStore::open(provider(), dir.path());
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
