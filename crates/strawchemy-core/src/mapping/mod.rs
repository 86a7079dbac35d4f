//! Relational mapping: tables, foreign keys and delete rules derived from models.

mod ddl;
mod synthesizer;
mod table;

pub use synthesizer::{SchemaBuilderContext, synthesize};
pub use table::{
    Cascade, Column, ColumnType, ForeignKey, OnDelete, Relationship, RelationshipKind, StorageSchema,
    Table,
};
