//! # strawchemy-storage
//!
//! Unit-of-work contract between the generated resolvers and a relational
//! engine.
//!
//! A [`Database`] hands out exclusively owned [`Session`]s. Each request runs
//! under exactly one session: reads see the session's own pending writes,
//! [`Session::commit`] publishes them, and [`Session::close`] discards whatever
//! was not committed.
//!
//! ## Example
//!
//! ```ignore
//! use strawchemy_storage::{Database, Row, StorageError};
//!
//! async fn rename(db: &dyn Database, id: i64, name: &str) -> Result<Row, StorageError> {
//!     let mut session = db.open().await?;
//!     let mut changes = Row::new();
//!     changes.insert("name".into(), name.into());
//!     let row = session.update("dataset", id, changes).await?;
//!     session.commit().await?;
//!     session.close();
//!     Ok(row)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{Database, DynDatabase, Session};
pub use types::{Row, row_id, row_reference};
