//! The acquisition-and-reconciliation engine.
//!
//! Composes the per-run pipeline over the other crates:
//! fetch → merge into store → persist → filter → reconcile → persist →
//! report. The filter is a pure function; reconciliation is the only place
//! the `applied` flag and requirement-text backfill are mutated.

pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod reconcile;
pub mod report;

pub use error::{EngineError, Result};
pub use filter::{filter_records, FilterSpec};
pub use orchestrator::{Orchestrator, ProviderRunReport};
pub use reconcile::{ReconcileOptions, ReconcileOutcome, ReconciliationEngine};
pub use report::{candidate_rows, render_candidates, CandidateRow};
