//! Storage traits implemented by engines.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::Row;

/// Source of sessions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Opens a new session with a private view of committed state.
    async fn open(&self) -> Result<Box<dyn Session>, StorageError>;

    /// Returns the name of this backend, for logging.
    fn backend_name(&self) -> &'static str;
}

pub type DynDatabase = Arc<dyn Database>;

/// One unit of work.
///
/// Writes are validated against the schema when issued and become visible to
/// other sessions only on [`Session::commit`]. Deletes apply the schema's
/// delete rules transitively.
#[async_trait]
pub trait Session: Send + Sync {
    /// Inserts a row and returns it with its `id` assigned.
    ///
    /// A row that already carries an `id` is inserted under that id.
    async fn insert(&mut self, table: &str, row: Row) -> Result<Row, StorageError>;

    async fn get(&self, table: &str, id: i64) -> Result<Option<Row>, StorageError>;

    /// All rows of a table, ordered by id.
    async fn scan(&self, table: &str) -> Result<Vec<Row>, StorageError>;

    /// Rows whose integer `column` equals `value`, ordered by id.
    async fn find_by(&self, table: &str, column: &str, value: i64) -> Result<Vec<Row>, StorageError>;

    /// Applies `changes` to an existing row and returns the new state.
    async fn update(&mut self, table: &str, id: i64, changes: Row) -> Result<Row, StorageError>;

    /// Deletes a row, returning its last state.
    async fn delete(&mut self, table: &str, id: i64) -> Result<Row, StorageError>;

    async fn commit(&mut self) -> Result<(), StorageError>;

    /// Discards pending writes.
    async fn rollback(&mut self) -> Result<(), StorageError>;

    /// Discards pending writes and refuses further use.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
