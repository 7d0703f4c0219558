//! Storage layer: source CSV loading, the resumable prediction ledger, and
//! the curated demo artifact.

pub mod demo;
mod error;
pub mod ledger;
pub mod source;
mod table;

pub use demo::{join_examples, load_demo, write_demo};
pub use error::StoreError;
pub use ledger::{Ledger, LedgerMap, OnLedgerCorrupt, Reconciled, load_ledger, merge_results};
pub use source::{load_source, pending};
