// crates/edon-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Gateway Store
// Description: Durable persistence backend using SQLite WAL.
// Purpose: Give the gateway a single, transactional backing store for
// tenants, intents, decisions, audit events, credentials, and the active
// policy preset.
// Dependencies: edon-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed implementation of the gateway's
//! durable state. It persists canonical JSON snapshots of domain types
//! defined in `edon-core` rather than re-deriving a parallel schema from
//! scratch, and enforces the strict-tenant credential lookup rule at the
//! query level (every credential read carries an explicit tenant
//! predicate; there is no code path that can omit it).

pub mod store;

pub use store::MAX_CREDENTIAL_DATA_BYTES;
pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
