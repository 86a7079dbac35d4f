use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use strawchemy_core::{ID_FIELD, StorageSchema};
use strawchemy_storage::{Row, Session, StorageError, row_id};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::integrity::{check_known_columns, check_value, delete_cascading, lookup_table};
use crate::state::{EngineState, TableData};

/// A session over [`crate::MemoryDatabase`].
///
/// Reads see a private copy of the committed state taken when the session was
/// opened (or last committed / rolled back). The first write takes the
/// database's writer lock and refreshes the copy; the lock is held until
/// commit, rollback or close, so writing sessions never overlap.
#[derive(Debug)]
pub struct MemorySession {
    schema: Arc<StorageSchema>,
    shared: Arc<RwLock<EngineState>>,
    writer: Arc<Mutex<()>>,
    write_guard: Option<OwnedMutexGuard<()>>,
    working: EngineState,
    dirty: bool,
    open: bool,
}

impl MemorySession {
    pub(crate) fn new(
        schema: Arc<StorageSchema>,
        shared: Arc<RwLock<EngineState>>,
        writer: Arc<Mutex<()>>,
        snapshot: EngineState,
    ) -> Self {
        Self {
            schema,
            shared,
            writer,
            write_guard: None,
            working: snapshot,
            dirty: false,
            open: true,
        }
    }

    /// Whether there are uncommitted writes.
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }

    /// Acquires the writer lock once per unit of work and rebases the working
    /// copy onto the latest committed state.
    async fn begin_write(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        if self.write_guard.is_some() {
            return Ok(());
        }
        let guard = Arc::clone(&self.writer).lock_owned().await;
        self.working = self.shared.read().await.clone();
        self.write_guard = Some(guard);
        tracing::trace!(version = self.working.version, "Session acquired writer lock");
        Ok(())
    }

    fn data(&self, table_name: &str) -> Result<&TableData, StorageError> {
        lookup_table(&self.schema, table_name)?;
        self.working
            .tables
            .get(table_name)
            .ok_or_else(|| StorageError::UnknownTable(table_name.to_string()))
    }

    fn data_mut(&mut self, table_name: &str) -> Result<&mut TableData, StorageError> {
        self.working
            .tables
            .get_mut(table_name)
            .ok_or_else(|| StorageError::UnknownTable(table_name.to_string()))
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn insert(&mut self, table_name: &str, row: Row) -> Result<Row, StorageError> {
        self.begin_write().await?;
        let schema = Arc::clone(&self.schema);
        let table = lookup_table(&schema, table_name)?;
        check_known_columns(table, &row)?;

        let explicit_id = match row.get(ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                StorageError::invalid_value(format!("'{table_name}.id' must be an integer"))
            })?),
        };

        let mut stored = Row::new();
        for column in table.columns.iter().filter(|c| !c.primary_key) {
            let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
            check_value(&self.working, table, column, &value)?;
            stored.insert(column.name.clone(), value);
        }

        let data = self.data_mut(table_name)?;
        let id = match explicit_id {
            Some(id) if data.rows.contains_key(&id) => {
                return Err(StorageError::integrity(format!(
                    "duplicate primary key {table_name}/{id}"
                )));
            }
            Some(id) => {
                data.observe_id(id);
                id
            }
            None => data.allocate_id(),
        };

        stored.insert(ID_FIELD.to_string(), Value::from(id));
        data.rows.insert(id, stored.clone());
        self.dirty = true;

        tracing::trace!(table = %table_name, id, "Inserted row");
        Ok(stored)
    }

    async fn get(&self, table_name: &str, id: i64) -> Result<Option<Row>, StorageError> {
        self.ensure_open()?;
        Ok(self.data(table_name)?.rows.get(&id).cloned())
    }

    async fn scan(&self, table_name: &str) -> Result<Vec<Row>, StorageError> {
        self.ensure_open()?;
        Ok(self.data(table_name)?.rows.values().cloned().collect())
    }

    async fn find_by(&self, table_name: &str, column: &str, value: i64) -> Result<Vec<Row>, StorageError> {
        self.ensure_open()?;
        let table = lookup_table(&self.schema, table_name)?;
        if !table.has_column(column) {
            return Err(StorageError::unknown_column(table_name, column));
        }
        let data = self.data(table_name)?;
        Ok(data
            .ids_where(column, value)
            .into_iter()
            .filter_map(|id| data.rows.get(&id).cloned())
            .collect())
    }

    async fn update(&mut self, table_name: &str, id: i64, changes: Row) -> Result<Row, StorageError> {
        self.begin_write().await?;
        let schema = Arc::clone(&self.schema);
        let table = lookup_table(&schema, table_name)?;
        check_known_columns(table, &changes)?;

        if !self.data(table_name)?.rows.contains_key(&id) {
            return Err(StorageError::not_found(table_name, id));
        }

        for (name, value) in &changes {
            if name == ID_FIELD {
                if row_id(&changes) != Some(id) {
                    return Err(StorageError::invalid_value(format!(
                        "primary key of {table_name}/{id} cannot change"
                    )));
                }
                continue;
            }
            if let Some(column) = table.column(name) {
                check_value(&self.working, table, column, value)?;
            }
        }

        let data = self.data_mut(table_name)?;
        let row = data
            .rows
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(table_name, id))?;
        for (name, value) in changes {
            row.insert(name, value);
        }
        let updated = row.clone();
        self.dirty = true;

        tracing::trace!(table = %table_name, id, "Updated row");
        Ok(updated)
    }

    async fn delete(&mut self, table_name: &str, id: i64) -> Result<Row, StorageError> {
        self.begin_write().await?;
        lookup_table(&self.schema, table_name)?;

        let mut scratch = self.working.clone();
        let mut visited = HashSet::new();
        let row = delete_cascading(&self.schema, &mut scratch, table_name, id, &mut visited)?;
        self.working = scratch;
        self.dirty = true;

        tracing::trace!(table = %table_name, id, removed = visited.len(), "Deleted row");
        Ok(row)
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        let mut shared = self.shared.write().await;

        if self.dirty {
            if shared.version != self.working.version {
                return Err(StorageError::transaction(
                    "committed state changed under this session's writer lock",
                ));
            }
            self.working.version += 1;
            *shared = self.working.clone();
            tracing::debug!(version = shared.version, "Committed session");
        } else {
            self.working = shared.clone();
        }

        self.dirty = false;
        self.write_guard = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.working = self.shared.read().await.clone();
        if self.dirty {
            tracing::debug!("Rolled back session");
        }
        self.dirty = false;
        self.write_guard = None;
        Ok(())
    }

    fn close(&mut self) {
        if self.dirty {
            tracing::debug!("Closing session with uncommitted changes, discarding them");
        }
        self.working = EngineState::default();
        self.dirty = false;
        self.write_guard = None;
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
