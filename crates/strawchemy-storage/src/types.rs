use serde_json::{Map, Value};

/// A stored row: column name to JSON value, `id` included once persisted.
pub type Row = Map<String, Value>;

/// Primary key of a row, if it has been assigned.
pub fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// Integer held by a foreign-key column; `None` when the column is null or missing.
pub fn row_reference(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}
