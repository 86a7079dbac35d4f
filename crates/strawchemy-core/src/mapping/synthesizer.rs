//! Relational mapping synthesis.
//!
//! Two passes over the closed model set:
//!
//! 1. every type gets its table: primary key, scalar columns and to-one FK
//!    columns (targets are resolved by name, so forward references need no
//!    ordering);
//! 2. every collection field adds a back-reference column to its child table.
//!
//! Each type is synthesized once; rerunning over the same registry is a no-op.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::SynthesisError;
use crate::mapping::table::{
    Cascade, Column, OnDelete, Relationship, RelationshipKind, StorageSchema, Table,
};
use crate::model::{FieldKind, ModelRegistry, ModelType};
use crate::naming::{back_reference_column, qualified_back_reference_column, reference_column, snake_it};
use crate::ID_FIELD;

/// Collection field waiting for its back-reference column.
#[derive(Debug, Clone)]
struct PendingCollection {
    parent_model: String,
    parent_table: String,
    field: String,
    child_model: String,
    optional: bool,
}

/// Accumulates tables across synthesis calls.
///
/// Replaces an ambient table registry: callers own the context and take the
/// finished schema out with [`SchemaBuilderContext::finish`].
#[derive(Debug, Default)]
pub struct SchemaBuilderContext {
    tables: IndexMap<String, Table>,
    model_tables: IndexMap<String, String>,
    synthesized: HashSet<String>,
    wired: HashSet<(String, String)>,
    pending: Vec<PendingCollection>,
}

impl SchemaBuilderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_synthesized(&self, model: &str) -> bool {
        self.synthesized.contains(model)
    }

    /// Synthesizes every type of `registry` not already present.
    pub fn synthesize(&mut self, registry: &ModelRegistry) -> Result<(), SynthesisError> {
        tracing::debug!(models = registry.len(), "Synthesizing storage schema");

        for model in registry.iter() {
            self.build_table(registry, model)?;
        }

        let pending = std::mem::take(&mut self.pending);
        for collection in pending {
            self.wire_collection(registry, collection)?;
        }

        tracing::debug!(tables = self.tables.len(), "Storage schema synthesized");
        Ok(())
    }

    pub fn finish(self) -> StorageSchema {
        StorageSchema {
            tables: self.tables,
            model_tables: self.model_tables,
        }
    }

    fn build_table(&mut self, registry: &ModelRegistry, model: &ModelType) -> Result<(), SynthesisError> {
        if !self.synthesized.insert(model.name.clone()) {
            return Ok(());
        }

        let table_name = snake_it(&model.name);
        if let Some(existing) = self.tables.get(&table_name) {
            return Err(SynthesisError::TableConflict {
                table: table_name,
                first: existing.model.clone(),
                second: model.name.clone(),
            });
        }

        let mut table = Table {
            name: table_name.clone(),
            model: model.name.clone(),
            lookup: model.lookup,
            columns: vec![Column::primary_key()],
            relationships: Vec::new(),
        };

        for field in &model.fields {
            if field.name == ID_FIELD {
                continue;
            }

            let kind = field.ty.kind().ok_or_else(|| {
                SynthesisError::integrity(format!(
                    "field '{}.{}' has unsupported type '{}'",
                    model.name, field.name, field.ty
                ))
            })?;

            match kind {
                FieldKind::Scalar { scalar, optional } => {
                    push_column(&mut table, Column::scalar(&field.name, scalar.into(), optional))?;
                }
                FieldKind::Reference { target, optional } => {
                    let target_model = registry
                        .get(target)
                        .ok_or_else(|| SynthesisError::UnknownModel(target.to_string()))?;
                    let target_table = snake_it(target);
                    let fk_column = reference_column(&field.name);
                    let on_delete = if target_model.lookup {
                        OnDelete::NoAction
                    } else {
                        OnDelete::Cascade
                    };

                    tracing::trace!(
                        table = %table_name,
                        column = %fk_column,
                        target = %target_table,
                        ?on_delete,
                        "Adding to-one foreign key"
                    );

                    push_column(
                        &mut table,
                        Column::foreign_key(&fk_column, &target_table, optional, on_delete),
                    )?;
                    table.relationships.push(Relationship {
                        field: field.name.clone(),
                        target_model: target.to_string(),
                        target_table,
                        kind: RelationshipKind::ToOne { fk_column },
                        cascade: Cascade::None,
                        optional,
                    });
                }
                FieldKind::Collection { target, optional } => {
                    if !registry.contains(target) {
                        return Err(SynthesisError::UnknownModel(target.to_string()));
                    }
                    self.pending.push(PendingCollection {
                        parent_model: model.name.clone(),
                        parent_table: table_name.clone(),
                        field: field.name.clone(),
                        child_model: target.to_string(),
                        optional,
                    });
                }
            }
        }

        self.model_tables.insert(model.name.clone(), table_name.clone());
        self.tables.insert(table_name, table);
        Ok(())
    }

    fn wire_collection(
        &mut self,
        registry: &ModelRegistry,
        collection: PendingCollection,
    ) -> Result<(), SynthesisError> {
        let key = (collection.parent_model.clone(), collection.field.clone());
        if self.wired.contains(&key) {
            return Ok(());
        }

        let child_lookup = registry.is_lookup(&collection.child_model);
        let child_table_name = self
            .model_tables
            .get(&collection.child_model)
            .cloned()
            .ok_or_else(|| SynthesisError::UnknownModel(collection.child_model.clone()))?;
        let child_table = self
            .tables
            .get_mut(&child_table_name)
            .ok_or_else(|| SynthesisError::integrity(format!("table '{child_table_name}' missing")))?;

        let mut column_name = back_reference_column(&collection.parent_table);
        if child_table.has_column(&column_name) {
            column_name = qualified_back_reference_column(&collection.parent_table, &collection.field);
        }

        let on_delete = if child_lookup {
            OnDelete::SetNull
        } else {
            OnDelete::Cascade
        };

        tracing::trace!(
            parent = %collection.parent_table,
            child = %child_table_name,
            column = %column_name,
            ?on_delete,
            "Adding back-reference column"
        );

        push_column(
            child_table,
            Column::foreign_key(&column_name, &collection.parent_table, true, on_delete),
        )?;

        let parent_table = self
            .tables
            .get_mut(&collection.parent_table)
            .ok_or_else(|| {
                SynthesisError::integrity(format!("table '{}' missing", collection.parent_table))
            })?;
        parent_table.relationships.push(Relationship {
            field: collection.field,
            target_model: collection.child_model,
            target_table: child_table_name,
            kind: RelationshipKind::ToMany {
                child_fk_column: column_name,
            },
            cascade: Cascade::for_back_reference(on_delete),
            optional: collection.optional,
        });

        self.wired.insert(key);
        Ok(())
    }
}

fn push_column(table: &mut Table, column: Column) -> Result<(), SynthesisError> {
    if table.has_column(&column.name) {
        return Err(SynthesisError::column_conflict(&table.name, &column.name));
    }
    table.columns.push(column);
    Ok(())
}

/// Synthesizes the storage schema for a validated registry.
pub fn synthesize(registry: &ModelRegistry) -> Result<StorageSchema, SynthesisError> {
    let mut ctx = SchemaBuilderContext::new();
    ctx.synthesize(registry)?;
    Ok(ctx.finish())
}
