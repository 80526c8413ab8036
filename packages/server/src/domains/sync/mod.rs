//! Full MLS refresh: agent listings, brokerage scan, photos, upsert.

pub mod merge;
pub mod models;
pub mod service;

pub use models::sync_run::{SyncRun, SyncStatus};
pub use service::{SyncError, SyncOptions, SyncOutcome, SyncService};
