// crates/provisioner-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Job Store
// Description: Durable JobStore backend using SQLite WAL.
// Purpose: Persist job records across broker restarts.
// Dependencies: provisioner-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`provisioner_core::JobStore`]. Every
//! save appends a canonical JSON snapshot of the job record to a version
//! history, so a job's transitions stay auditable after the fact. Job rows
//! are never deleted; optional retention only prunes old versions.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_RECORD_BYTES;
pub use store::SqliteJobStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
