//! # Tradelog Storage Crate
//!
//! This crate is the journal's persistence layer: trades, free-form settings and
//! saved report views.
//!
//! ## Architectural Principles
//!
//! - **One Contract:** Everything above this crate talks to the `TradeStore` trait,
//!   so the CLI and tests do not care which backend they are given.
//! - **Idempotent Operations:** Saves upsert by id, deletes of missing records
//!   succeed, and listings come back ordered by id.
//! - **Safe Writes:** The file backend writes through on every mutation using a
//!   temporary file and a rename.
//!
//! ## Public API
//!
//! - `TradeStore`: The async persistence contract.
//! - `MemoryStore`: An in-memory backend.
//! - `JsonFileStore`: A single-file JSON backend, loaded lazily.
//! - `JournalSnapshot`, `read_snapshot`, `write_snapshot`: The on-disk document.
//! - `StorageError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod file;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use error::StorageError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use snapshot::{JournalSnapshot, read_snapshot, write_snapshot};
pub use store::{SavedView, TradeStore};
