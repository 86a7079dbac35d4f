//! Turning mutation inputs into persisted rows.
//!
//! Inputs arrive as JSON objects shaped like the derived `Create` / `Update`
//! types: scalar fields by name, references as nested objects and
//! collections as lists of nested objects. A key that is missing from an
//! input object means "not supplied", which is distinct from an explicit
//! `null`.
//!
//! All writes go through the request session and are committed by the
//! calling resolver.

use std::collections::HashSet;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use strawchemy_core::{ID_FIELD, Relationship, RelationshipKind, StorageSchema, Table};
use strawchemy_storage::{Row, Session, row_id, row_reference};
use tracing::{debug, trace};

use crate::error::ResolveError;

pub type Input = Map<String, Value>;

pub struct Materializer<'a> {
    schema: &'a StorageSchema,
    session: &'a mut dyn Session,
}

impl<'a> Materializer<'a> {
    pub fn new(schema: &'a StorageSchema, session: &'a mut dyn Session) -> Self {
        Self { schema, session }
    }

    fn table(&self, model: &str) -> Result<&'a Table, ResolveError> {
        self.schema
            .table_for_model(model)
            .ok_or_else(|| ResolveError::internal(format!("no table for model '{model}'")))
    }

    /// Persists a new object graph from a `Create` input.
    ///
    /// An `id` on the top-level input is used as the new row's primary key.
    /// Nested inputs carrying an `id` attach the existing row instead of
    /// inserting a copy.
    pub async fn create(&mut self, model: &str, input: &Input) -> Result<Row, ResolveError> {
        self.materialize(model, input, false).await
    }

    /// Applies an `Update` input onto the row `id` of `model`.
    pub async fn update(&mut self, model: &str, id: i64, input: &Input) -> Result<Row, ResolveError> {
        self.merge(model, id, input).await
    }

    fn materialize<'s>(
        &'s mut self,
        model: &'s str,
        input: &'s Input,
        nested: bool,
    ) -> BoxFuture<'s, Result<Row, ResolveError>> {
        async move {
            let table = self.table(model)?;
            let supplied_id = input.get(ID_FIELD).and_then(Value::as_i64);

            if nested {
                if let Some(id) = supplied_id {
                    trace!(model, id, "Attaching existing row");
                    return self
                        .session
                        .get(&table.name, id)
                        .await?
                        .ok_or_else(|| ResolveError::not_found(model, id));
                }
            }

            let mut row = Row::new();
            if let Some(id) = supplied_id {
                row.insert(ID_FIELD.to_string(), Value::from(id));
            }
            copy_scalars(table, input, &mut row);

            for relationship in &table.relationships {
                let RelationshipKind::ToOne { fk_column } = &relationship.kind else {
                    continue;
                };
                if let Some(Value::Object(child)) = input.get(&relationship.field) {
                    let target = self.materialize(&relationship.target_model, child, true).await?;
                    row.insert(fk_column.clone(), id_value(&target)?);
                }
            }

            let stored = self.session.insert(&table.name, row).await?;
            let parent_id = row_id(&stored)
                .ok_or_else(|| ResolveError::internal("insert returned a row without id"))?;
            trace!(model, id = parent_id, "Inserted row");

            for relationship in &table.relationships {
                if !relationship.is_collection() {
                    continue;
                }
                if let Some(Value::Array(items)) = input.get(&relationship.field) {
                    for item in items {
                        let Value::Object(child) = item else {
                            continue;
                        };
                        let child = self.materialize(&relationship.target_model, child, true).await?;
                        self.adopt(relationship, &child, parent_id).await?;
                    }
                }
            }

            Ok(stored)
        }
        .boxed()
    }

    fn merge<'s>(
        &'s mut self,
        model: &'s str,
        id: i64,
        input: &'s Input,
    ) -> BoxFuture<'s, Result<Row, ResolveError>> {
        async move {
            let table = self.table(model)?;
            let existing = self
                .session
                .get(&table.name, id)
                .await?
                .ok_or_else(|| ResolveError::not_found(model, id))?;

            let mut changes = Row::new();
            for column in table.columns.iter().filter(|c| is_scalar_column(c)) {
                match input.get(&column.name) {
                    None => {}
                    Some(Value::Null) if !column.nullable => {
                        debug!(model, field = %column.name, "Ignoring null for required field");
                    }
                    Some(value) => {
                        changes.insert(column.name.clone(), value.clone());
                    }
                }
            }

            for relationship in &table.relationships {
                match &relationship.kind {
                    RelationshipKind::ToOne { fk_column } => {
                        match input.get(&relationship.field) {
                            None => {}
                            Some(Value::Null) => {
                                if relationship.optional {
                                    changes.insert(fk_column.clone(), Value::Null);
                                } else {
                                    debug!(model, field = %relationship.field, "Ignoring null for required reference");
                                }
                            }
                            Some(Value::Object(child)) => {
                                let target = self.merge_reference(relationship, &existing, child).await?;
                                changes.insert(fk_column.clone(), Value::from(target));
                            }
                            Some(_) => {
                                return Err(ResolveError::validation(format!(
                                    "Field '{}' of {model} expects an object",
                                    relationship.field
                                )));
                            }
                        }
                    }
                    RelationshipKind::ToMany { .. } => match input.get(&relationship.field) {
                        None | Some(Value::Null) => {}
                        Some(Value::Array(items)) => {
                            self.merge_collection(relationship, id, items).await?;
                        }
                        Some(_) => {
                            return Err(ResolveError::validation(format!(
                                "Field '{}' of {model} expects a list",
                                relationship.field
                            )));
                        }
                    },
                }
            }

            if changes.is_empty() {
                return Ok(existing);
            }
            trace!(model, id, columns = changes.len(), "Updating row");
            Ok(self.session.update(&table.name, id, changes).await?)
        }
        .boxed()
    }

    /// Resolves the row a to-one reference should point to after the merge.
    async fn merge_reference(
        &mut self,
        relationship: &Relationship,
        existing: &Row,
        child: &Input,
    ) -> Result<i64, ResolveError> {
        match child.get(ID_FIELD).and_then(Value::as_i64) {
            None => {
                let created = self.materialize(&relationship.target_model, child, true).await?;
                row_id(&created).ok_or_else(|| ResolveError::internal("insert returned a row without id"))
            }
            Some(target_id) => {
                if row_reference(existing, relationship.fk_column()) != Some(target_id) {
                    trace!(field = %relationship.field, target_id, "Re-pointing reference");
                }
                self.merge(&relationship.target_model, target_id, child).await?;
                Ok(target_id)
            }
        }
    }

    /// Merges list elements into a parent's current collection.
    ///
    /// Elements with an `id` must already belong to the collection; elements
    /// without one are created and appended.
    async fn merge_collection(
        &mut self,
        relationship: &Relationship,
        parent_id: i64,
        items: &[Value],
    ) -> Result<(), ResolveError> {
        let current: HashSet<i64> = self
            .session
            .find_by(&relationship.target_table, relationship.fk_column(), parent_id)
            .await?
            .iter()
            .filter_map(row_id)
            .collect();

        for item in items {
            let Value::Object(child) = item else {
                continue;
            };
            match child.get(ID_FIELD).and_then(Value::as_i64) {
                Some(child_id) => {
                    if !current.contains(&child_id) {
                        return Err(ResolveError::NotInCollection {
                            model: relationship.target_model.clone(),
                            id: child_id,
                        });
                    }
                    self.merge(&relationship.target_model, child_id, child).await?;
                }
                None => {
                    let created = self.materialize(&relationship.target_model, child, true).await?;
                    self.adopt(relationship, &created, parent_id).await?;
                }
            }
        }
        Ok(())
    }

    /// Points a child's back-reference at its parent.
    async fn adopt(&mut self, relationship: &Relationship, child: &Row, parent_id: i64) -> Result<(), ResolveError> {
        let child_id = row_id(child).ok_or_else(|| ResolveError::internal("child row without id"))?;
        let mut changes = Row::new();
        changes.insert(relationship.fk_column().to_string(), Value::from(parent_id));
        self.session
            .update(&relationship.target_table, child_id, changes)
            .await?;
        Ok(())
    }
}

fn is_scalar_column(column: &strawchemy_core::Column) -> bool {
    !column.primary_key && column.foreign_key.is_none()
}

fn copy_scalars(table: &Table, input: &Input, row: &mut Row) {
    for column in table.columns.iter().filter(|c| is_scalar_column(c)) {
        if let Some(value) = input.get(&column.name) {
            row.insert(column.name.clone(), value.clone());
        }
    }
}

fn id_value(row: &Row) -> Result<Value, ResolveError> {
    row_id(row)
        .map(Value::from)
        .ok_or_else(|| ResolveError::internal("row without id"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use strawchemy_core::{FieldType, ModelRegistry, ModelType, synthesize};
    use strawchemy_db_memory::MemoryDatabase;
    use strawchemy_storage::Database;

    use super::*;

    fn input(value: Value) -> Input {
        value.as_object().cloned().unwrap()
    }

    fn schema() -> Arc<StorageSchema> {
        let registry = ModelRegistry::from_models([
            ModelType::new("Dataset")
                .field("id", FieldType::int())
                .field("name", FieldType::string())
                .field("notes", FieldType::optional(FieldType::string()))
                .field("datafiles", FieldType::list(FieldType::model("Datafile")))
                .field("crs", FieldType::optional(FieldType::model("Crs"))),
            ModelType::new("Datafile")
                .field("id", FieldType::int())
                .field("name", FieldType::string()),
            ModelType::new("Crs")
                .lookup()
                .field("id", FieldType::int())
                .field("name", FieldType::string()),
        ])
        .unwrap();
        Arc::new(synthesize(&registry).unwrap())
    }

    #[tokio::test]
    async fn test_create_nested_graph() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();

        let row = Materializer::new(&schema, &mut *session)
            .create(
                "Dataset",
                &input(json!({
                    "name": "rivers",
                    "crs": {"name": "WGS84"},
                    "datafiles": [{"name": "a.csv"}, {"name": "b.csv"}]
                })),
            )
            .await
            .unwrap();

        let id = row_id(&row).unwrap();
        assert_eq!(row["crs_id"], json!(1));
        let files = session.find_by("datafile", "dataset_id", id).await.unwrap();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_nested_id_attaches_existing_row() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();
        let crs = session
            .insert("crs", input(json!({"name": "WGS84"})))
            .await
            .unwrap();

        let row = Materializer::new(&schema, &mut *session)
            .create(
                "Dataset",
                &input(json!({"name": "rivers", "crs": {"id": crs["id"], "name": "ignored"}})),
            )
            .await
            .unwrap();

        assert_eq!(row["crs_id"], crs["id"]);
        assert_eq!(session.scan("crs").await.unwrap().len(), 1);

        let err = Materializer::new(&schema, &mut *session)
            .create("Dataset", &input(json!({"name": "x", "crs": {"id": 40}})))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref model, id: 40 } if model == "Crs"));
    }

    #[tokio::test]
    async fn test_merge_scalars_and_nulls() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();
        let dataset = session
            .insert("dataset", input(json!({"name": "rivers", "notes": "draft"})))
            .await
            .unwrap();
        let id = row_id(&dataset).unwrap();

        let row = Materializer::new(&schema, &mut *session)
            .update("Dataset", id, &input(json!({"notes": null, "name": null})))
            .await
            .unwrap();
        assert_eq!(row["notes"], Value::Null);
        assert_eq!(row["name"], json!("rivers"));

        let row = Materializer::new(&schema, &mut *session)
            .update("Dataset", id, &input(json!({"name": "lakes"})))
            .await
            .unwrap();
        assert_eq!(row["name"], json!("lakes"));
    }

    #[tokio::test]
    async fn test_merge_collection_elements() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();
        let dataset = Materializer::new(&schema, &mut *session)
            .create("Dataset", &input(json!({"name": "rivers", "datafiles": [{"name": "a.csv"}]})))
            .await
            .unwrap();
        let id = row_id(&dataset).unwrap();
        let file_id = row_id(&session.find_by("datafile", "dataset_id", id).await.unwrap()[0]).unwrap();

        Materializer::new(&schema, &mut *session)
            .update(
                "Dataset",
                id,
                &input(json!({"datafiles": [{"id": file_id, "name": "renamed.csv"}, {"name": "new.csv"}]})),
            )
            .await
            .unwrap();

        let files = session.find_by("datafile", "dataset_id", id).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["name"], json!("renamed.csv"));
        assert_eq!(files[1]["name"], json!("new.csv"));
    }

    #[tokio::test]
    async fn test_merge_rejects_foreign_collection_element() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();
        let dataset = session
            .insert("dataset", input(json!({"name": "rivers"})))
            .await
            .unwrap();
        let stray = session
            .insert("datafile", input(json!({"name": "stray.csv"})))
            .await
            .unwrap();

        let err = Materializer::new(&schema, &mut *session)
            .update(
                "Dataset",
                row_id(&dataset).unwrap(),
                &input(json!({"datafiles": [{"id": stray["id"], "name": "x"}]})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotInCollection { ref model, .. } if model == "Datafile"));
    }

    #[tokio::test]
    async fn test_merge_missing_row() {
        let schema = schema();
        let db = MemoryDatabase::new(schema.clone());
        let mut session = db.open().await.unwrap();

        let err = Materializer::new(&schema, &mut *session)
            .update("Dataset", 5, &input(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { id: 5, .. }));
    }
}
