//! SQLite backend for the Tally sales analytics store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The single connection thread
//! also serializes ingestion batches, which keeps the insert-if-absent
//! normalization free of duplicate-entity races.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
