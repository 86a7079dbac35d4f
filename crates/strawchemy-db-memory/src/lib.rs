//! In-memory relational engine for strawchemy.
//!
//! Implements the [`Database`] / [`Session`] contract from
//! `strawchemy-storage` over a synthesized [`StorageSchema`]. Writes are
//! checked against the schema (column types, nullability, foreign keys) and
//! deletes follow each foreign key's delete rule.
//!
//! # Example
//!
//! ```ignore
//! use strawchemy_db_memory::MemoryDatabase;
//! use strawchemy_storage::Database;
//!
//! let db = MemoryDatabase::new(schema);
//! let mut session = db.open().await?;
//! let row = session.insert("crs", row).await?;
//! session.commit().await?;
//! ```

mod database;
mod integrity;
mod session;
mod state;

pub use database::MemoryDatabase;
pub use session::MemorySession;

pub use strawchemy_core::StorageSchema;
pub use strawchemy_storage::{Database, DynDatabase, Row, Session, StorageError};

/// Creates a shareable in-memory database for `schema`.
pub fn create_database(schema: std::sync::Arc<StorageSchema>) -> DynDatabase {
    std::sync::Arc::new(MemoryDatabase::new(schema))
}
