//! Loading persisted rows into resolver entities.
//!
//! An [`Entity`] is the parent value handed to object field resolvers. It
//! carries the row plus any relations loaded ahead of time; relations that
//! were not pre-loaded are fetched lazily when their field is resolved.

use std::collections::HashMap;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use strawchemy_core::{ID_FIELD, Relationship, RelationshipKind, StorageSchema, Table};
use strawchemy_storage::{Row, Session, row_id, row_reference};
use tracing::trace;

use crate::error::ResolveError;
use crate::selection::SelectionPaths;

/// A persisted instance of a model type.
#[derive(Debug, Clone)]
pub struct Entity {
    model: String,
    row: Row,
    relations: HashMap<String, Relation>,
}

/// A loaded relation of an [`Entity`].
#[derive(Debug, Clone)]
pub enum Relation {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

impl Entity {
    pub fn new(model: impl Into<String>, row: Row) -> Self {
        Self {
            model: model.into(),
            row,
            relations: HashMap::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn id(&self) -> Option<i64> {
        row_id(&self.row)
    }

    /// Column value, `None` when absent or null.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.row.get(column).filter(|v| !v.is_null())
    }

    /// Pre-loaded relation for `field`, if any.
    pub fn relation(&self, field: &str) -> Option<&Relation> {
        self.relations.get(field)
    }

    pub fn with_relation(mut self, field: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(field.into(), relation);
        self
    }
}

/// Reads entities and their relations through one session.
pub struct Loader<'a> {
    schema: &'a StorageSchema,
    session: &'a dyn Session,
}

impl<'a> Loader<'a> {
    pub fn new(schema: &'a StorageSchema, session: &'a dyn Session) -> Self {
        Self { schema, session }
    }

    pub(crate) fn table(&self, model: &str) -> Result<&'a Table, ResolveError> {
        self.schema
            .table_for_model(model)
            .ok_or_else(|| ResolveError::internal(format!("no table for model '{model}'")))
    }

    /// Loads one row by id.
    pub async fn get(&self, model: &str, id: i64) -> Result<Option<Row>, ResolveError> {
        let table = self.table(model)?;
        Ok(self.session.get(&table.name, id).await?)
    }

    /// Loads all rows of a model, ordered by id.
    pub async fn scan(&self, model: &str) -> Result<Vec<Row>, ResolveError> {
        let table = self.table(model)?;
        Ok(self.session.scan(&table.name).await?)
    }

    /// Loads one relation of `entity`, without pre-loading below it.
    pub async fn relation(&self, entity: &Entity, field: &str) -> Result<Relation, ResolveError> {
        let table = self.table(entity.model())?;
        let relationship = table.relationship(field).ok_or_else(|| {
            ResolveError::internal(format!("'{}' has no relation '{field}'", entity.model()))
        })?;
        self.fetch_relation(entity.row(), relationship).await
    }

    /// Wraps `row` into an entity, pre-loading every relation whose path
    /// below `prefix` appears in `paths`.
    pub fn load<'s>(
        &'s self,
        model: &'s str,
        row: Row,
        paths: Option<&'s SelectionPaths>,
        prefix: String,
    ) -> BoxFuture<'s, Result<Entity, ResolveError>> {
        async move {
            let mut entity = Entity::new(model, row);
            let Some(paths) = paths else {
                return Ok(entity);
            };

            let table = self.table(model)?;
            for relationship in &table.relationships {
                let nested = format!("{prefix}{}/", relationship.field);
                if !paths.is_selected(&nested) {
                    continue;
                }
                trace!(model, field = %relationship.field, "Pre-loading relation");

                let relation = match self.fetch_rows(entity.row(), relationship).await? {
                    RelationRows::One(None) => Relation::One(None),
                    RelationRows::One(Some(row)) => {
                        let child = self
                            .load(&relationship.target_model, row, Some(paths), nested)
                            .await?;
                        Relation::One(Some(Box::new(child)))
                    }
                    RelationRows::Many(rows) => {
                        let mut children = Vec::with_capacity(rows.len());
                        for row in rows {
                            children.push(
                                self.load(&relationship.target_model, row, Some(paths), nested.clone())
                                    .await?,
                            );
                        }
                        Relation::Many(children)
                    }
                };
                entity = entity.with_relation(relationship.field.clone(), relation);
            }
            Ok(entity)
        }
        .boxed()
    }

    async fn fetch_relation(&self, row: &Row, relationship: &Relationship) -> Result<Relation, ResolveError> {
        Ok(match self.fetch_rows(row, relationship).await? {
            RelationRows::One(row) => Relation::One(
                row.map(|r| Box::new(Entity::new(relationship.target_model.clone(), r))),
            ),
            RelationRows::Many(rows) => Relation::Many(
                rows.into_iter()
                    .map(|r| Entity::new(relationship.target_model.clone(), r))
                    .collect(),
            ),
        })
    }

    async fn fetch_rows(&self, row: &Row, relationship: &Relationship) -> Result<RelationRows, ResolveError> {
        match &relationship.kind {
            RelationshipKind::ToOne { fk_column } => match row_reference(row, fk_column) {
                Some(id) => Ok(RelationRows::One(
                    self.session.get(&relationship.target_table, id).await?,
                )),
                None => Ok(RelationRows::One(None)),
            },
            RelationshipKind::ToMany { child_fk_column } => {
                let id = row_id(row).ok_or_else(|| {
                    ResolveError::internal(format!("row without '{ID_FIELD}' in relation load"))
                })?;
                Ok(RelationRows::Many(
                    self.session
                        .find_by(&relationship.target_table, child_fk_column, id)
                        .await?,
                ))
            }
        }
    }
}

enum RelationRows {
    One(Option<Row>),
    Many(Vec<Row>),
}
