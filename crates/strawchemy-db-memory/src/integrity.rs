//! Schema enforcement: value checks, foreign keys and delete rules.

use std::collections::HashSet;

use serde_json::Value;
use strawchemy_core::{Column, ColumnType, OnDelete, StorageSchema, Table};
use strawchemy_storage::{Row, StorageError};

use crate::state::EngineState;

pub(crate) fn lookup_table<'s>(schema: &'s StorageSchema, name: &str) -> Result<&'s Table, StorageError> {
    schema
        .table(name)
        .ok_or_else(|| StorageError::UnknownTable(name.to_string()))
}

fn accepts(column_type: ColumnType, value: &Value) -> bool {
    match column_type {
        ColumnType::Integer => value.as_i64().is_some(),
        ColumnType::Float => value.is_number(),
        ColumnType::Boolean => value.is_boolean(),
        ColumnType::Text
        | ColumnType::Date
        | ColumnType::Time
        | ColumnType::DateTime
        | ColumnType::Blob => value.is_string(),
    }
}

/// Checks one column value against type, nullability and foreign key.
pub(crate) fn check_value(
    state: &EngineState,
    table: &Table,
    column: &Column,
    value: &Value,
) -> Result<(), StorageError> {
    if value.is_null() {
        if column.nullable {
            return Ok(());
        }
        return Err(StorageError::invalid_value(format!(
            "column '{}.{}' may not be null",
            table.name, column.name
        )));
    }

    if !accepts(column.column_type, value) {
        return Err(StorageError::invalid_value(format!(
            "column '{}.{}' expects {}, got {value}",
            table.name,
            column.name,
            column.column_type.sql_name()
        )));
    }

    if let Some(fk) = &column.foreign_key {
        let target = value.as_i64().unwrap_or_default();
        let exists = state
            .tables
            .get(&fk.table)
            .is_some_and(|data| data.rows.contains_key(&target));
        if !exists {
            return Err(StorageError::integrity(format!(
                "'{}.{}' references missing row {}/{target}",
                table.name, column.name, fk.table
            )));
        }
    }

    Ok(())
}

/// Rejects columns a table does not define.
pub(crate) fn check_known_columns(table: &Table, row: &Row) -> Result<(), StorageError> {
    match row.keys().find(|key| !table.has_column(key)) {
        Some(unknown) => Err(StorageError::unknown_column(&table.name, unknown)),
        None => Ok(()),
    }
}

/// Deletes `id` from `table_name` and applies delete rules transitively.
///
/// Works on `state` in place; callers pass a scratch copy so a refused delete
/// leaves nothing half-applied.
pub(crate) fn delete_cascading(
    schema: &StorageSchema,
    state: &mut EngineState,
    table_name: &str,
    id: i64,
    visited: &mut HashSet<(String, i64)>,
) -> Result<Row, StorageError> {
    let row = state
        .tables
        .get(table_name)
        .and_then(|data| data.rows.get(&id))
        .cloned()
        .ok_or_else(|| StorageError::not_found(table_name, id))?;

    visited.insert((table_name.to_string(), id));

    let referencing: Vec<(String, String, OnDelete)> = schema
        .referencing(table_name)
        .filter_map(|(t, c)| {
            c.foreign_key
                .as_ref()
                .map(|fk| (t.name.clone(), c.name.clone(), fk.on_delete))
        })
        .collect();

    for (ref_table, ref_column, on_delete) in referencing {
        let ids: Vec<i64> = state
            .tables
            .get(&ref_table)
            .map(|data| data.ids_where(&ref_column, id))
            .unwrap_or_default()
            .into_iter()
            .filter(|rid| !visited.contains(&(ref_table.clone(), *rid)))
            .collect();

        if ids.is_empty() {
            continue;
        }

        match on_delete {
            OnDelete::Cascade => {
                for rid in ids {
                    tracing::trace!(table = %ref_table, id = rid, "Cascading delete");
                    delete_cascading(schema, state, &ref_table, rid, visited)?;
                }
            }
            OnDelete::SetNull => {
                if let Some(data) = state.tables.get_mut(&ref_table) {
                    for rid in ids {
                        if let Some(child) = data.rows.get_mut(&rid) {
                            child.insert(ref_column.clone(), Value::Null);
                        }
                    }
                }
            }
            OnDelete::NoAction => {
                return Err(StorageError::integrity(format!(
                    "row {table_name}/{id} is still referenced by {ref_table}.{ref_column}"
                )));
            }
        }
    }

    if let Some(data) = state.tables.get_mut(table_name) {
        data.rows.remove(&id);
    }
    Ok(row)
}
