//! Report lifecycle manager — the canonical store of truth for reports.
//!
//! `ReportStore` is the single write path: creation, status transitions,
//! priority edits, retention archiving. Two implementations: `SqliteStore`
//! for deployments, `MemoryStore` for tests and ephemeral runs.

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{DashboardStats, ReportFilter, ReportStore, Result, StoreError};
