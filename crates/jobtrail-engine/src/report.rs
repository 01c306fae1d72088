//! Human-readable candidate tables for the CLI.

use jobtrail_store::JobRecord;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// One row of the filtered-candidates table.
#[derive(Debug, Clone, Tabled)]
pub struct CandidateRow {
    /// Provider-native posting id
    #[tabled(rename = "Job ID")]
    pub id: String,
    /// Posting title
    #[tabled(rename = "Role")]
    pub title: String,
    /// Provider-specific apply link
    #[tabled(rename = "Apply Link")]
    pub apply_url: String,
}

/// Build table rows from filtered records, constructing the apply URL
/// through the provider's formatting rule.
pub fn candidate_rows<F>(records: &[&JobRecord], apply_url: F) -> Vec<CandidateRow>
where
    F: Fn(&JobRecord) -> String,
{
    records
        .iter()
        .map(|record| CandidateRow {
            id: record.id.as_str().to_string(),
            title: record.title.clone(),
            apply_url: apply_url(record),
        })
        .collect()
}

/// Render the candidate table for one provider.
#[must_use]
pub fn render_candidates(provider_name: &str, rows: &[CandidateRow]) -> String {
    if rows.is_empty() {
        return format!("No filtered applications found for {provider_name}.");
    }

    let mut table = Table::new(rows);
    table.with(Style::sharp());

    format!(
        "Filtered applications found for {provider_name}: {}\n{table}",
        rows.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_core::JobId;

    fn record(id: &str, title: &str) -> JobRecord {
        JobRecord::new(JobId::new(id).expect("valid job ID"), title)
    }

    #[test]
    fn test_candidate_rows_use_apply_rule() {
        let a = record("00123", "Software Engineer");
        let b = record("456", "Machine Learning Engineer");
        let records = vec![&a, &b];

        let rows = candidate_rows(&records, |r| {
            format!("https://careers.acme.com/search/{}", r.id)
        });

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "00123");
        assert_eq!(rows[0].apply_url, "https://careers.acme.com/search/00123");
    }

    #[test]
    fn test_render_empty() {
        let out = render_candidates("Acme Careers", &[]);
        assert!(out.contains("No filtered applications found"));
    }

    #[test]
    fn test_render_table_contains_rows() {
        let rows = vec![CandidateRow {
            id: "00123".to_string(),
            title: "Software Engineer".to_string(),
            apply_url: "https://careers.acme.com/search/00123".to_string(),
        }];

        let out = render_candidates("Acme Careers", &rows);
        assert!(out.contains("Filtered applications found for Acme Careers: 1"));
        assert!(out.contains("00123"));
        assert!(out.contains("Software Engineer"));
    }
}
