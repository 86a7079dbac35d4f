use std::collections::{BTreeMap, HashMap};

use strawchemy_core::StorageSchema;
use strawchemy_storage::{Row, row_reference};

/// Rows of one table, keyed by id.
#[derive(Debug, Clone)]
pub(crate) struct TableData {
    pub(crate) rows: BTreeMap<i64, Row>,
    pub(crate) next_id: i64,
}

impl Default for TableData {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl TableData {
    /// Reserves the next generated id.
    pub(crate) fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Records an explicitly supplied id so generated ids never collide with it.
    pub(crate) fn observe_id(&mut self, id: i64) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    pub(crate) fn ids_where(&self, column: &str, value: i64) -> Vec<i64> {
        self.rows
            .iter()
            .filter(|(_, row)| row_reference(row, column) == Some(value))
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Committed (or working) contents of every table.
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineState {
    pub(crate) tables: HashMap<String, TableData>,
    /// Bumped on every commit that changed data.
    pub(crate) version: u64,
}

impl EngineState {
    pub(crate) fn for_schema(schema: &StorageSchema) -> Self {
        Self {
            tables: schema
                .tables()
                .map(|t| (t.name.clone(), TableData::default()))
                .collect(),
            version: 0,
        }
    }
}
