use std::sync::Arc;

use async_trait::async_trait;
use strawchemy_core::StorageSchema;
use strawchemy_storage::{Database, Session, StorageError};
use tokio::sync::{Mutex, RwLock};

use crate::session::MemorySession;
use crate::state::EngineState;

/// In-memory database holding committed rows for every table of a schema.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    schema: Arc<StorageSchema>,
    state: Arc<RwLock<EngineState>>,
    /// Held by the one session currently allowed to write.
    writer: Arc<Mutex<()>>,
}

impl MemoryDatabase {
    pub fn new(schema: Arc<StorageSchema>) -> Self {
        let state = EngineState::for_schema(&schema);
        Self {
            schema,
            state: Arc::new(RwLock::new(state)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn schema(&self) -> &Arc<StorageSchema> {
        &self.schema
    }

    /// Number of committed rows in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map_or(0, |data| data.rows.len())
    }

    /// Opens a session with the concrete session type.
    pub async fn open_session(&self) -> MemorySession {
        let snapshot = self.state.read().await.clone();
        MemorySession::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.state),
            Arc::clone(&self.writer),
            snapshot,
        )
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn open(&self) -> Result<Box<dyn Session>, StorageError> {
        tracing::trace!("Opening in-memory session");
        Ok(Box::new(self.open_session().await))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
