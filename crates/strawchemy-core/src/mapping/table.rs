use indexmap::IndexMap;
use serde::Serialize;

use crate::ID_FIELD;
use crate::model::ScalarType;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
    Blob,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Text => "VARCHAR",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Blob => "BLOB",
        }
    }
}

impl From<ScalarType> for ColumnType {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Integer => Self::Integer,
            ScalarType::Float => Self::Float,
            ScalarType::String => Self::Text,
            ScalarType::Boolean => Self::Boolean,
            ScalarType::Date => Self::Date,
            ScalarType::Time => Self::Time,
            ScalarType::DateTime => Self::DateTime,
            ScalarType::Binary => Self::Blob,
        }
    }
}

/// What happens to a referencing row when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OnDelete {
    /// Delete the referencing row too.
    Cascade,
    /// Null out the referencing column.
    SetNull,
    /// Refuse the delete while the row is referenced.
    NoAction,
}

impl OnDelete {
    pub fn sql_clause(self) -> Option<&'static str> {
        match self {
            Self::Cascade => Some("ON DELETE CASCADE"),
            Self::SetNull => Some("ON DELETE SET NULL"),
            Self::NoAction => None,
        }
    }
}

/// Relationship-level cascade, applied when the owning object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cascade {
    None,
    /// `all, delete`: owned children follow the parent.
    AllDelete,
}

impl Cascade {
    /// Cascade a collection carries given its back-reference's delete rule.
    pub fn for_back_reference(on_delete: OnDelete) -> Self {
        match on_delete {
            OnDelete::Cascade => Self::AllDelete,
            OnDelete::NoAction | OnDelete::SetNull => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn primary_key() -> Self {
        Self {
            name: ID_FIELD.to_string(),
            column_type: ColumnType::Integer,
            nullable: false,
            primary_key: true,
            foreign_key: None,
        }
    }

    pub fn scalar(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        table: impl Into<String>,
        nullable: bool,
        on_delete: OnDelete,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Integer,
            nullable,
            primary_key: false,
            foreign_key: Some(ForeignKey {
                table: table.into(),
                column: ID_FIELD.to_string(),
                on_delete,
            }),
        }
    }

    pub fn references(&self, table: &str) -> bool {
        self.foreign_key.as_ref().is_some_and(|fk| fk.table == table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RelationshipKind {
    /// FK column lives on this table.
    ToOne { fk_column: String },
    /// FK column lives on the target (child) table and points back here.
    ToMany { child_fk_column: String },
}

/// A model field wired to a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub field: String,
    pub target_model: String,
    pub target_table: String,
    pub kind: RelationshipKind,
    /// Descriptive only. Storage engines act on the child column's
    /// `on_delete`, which this always mirrors for collections.
    pub cascade: Cascade,
    pub optional: bool,
}

impl Relationship {
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, RelationshipKind::ToMany { .. })
    }

    /// Name of the FK column backing this relationship.
    pub fn fk_column(&self) -> &str {
        match &self.kind {
            RelationshipKind::ToOne { fk_column } => fk_column,
            RelationshipKind::ToMany { child_fk_column } => child_fk_column,
        }
    }
}

/// Synthesized table for one model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    pub model: String,
    pub lookup: bool,
    pub columns: Vec<Column>,
    pub relationships: Vec<Relationship>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn relationship(&self, field: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.field == field)
    }
}

/// The immutable relational schema derived from a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageSchema {
    pub(crate) tables: IndexMap<String, Table>,
    pub(crate) model_tables: IndexMap<String, String>,
}

impl StorageSchema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_for_model(&self, model: &str) -> Option<&Table> {
        self.model_tables.get(model).and_then(|t| self.tables.get(t))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Every `(table, column)` pair holding a foreign key into `table`.
    pub fn referencing<'a>(&'a self, table: &'a str) -> impl Iterator<Item = (&'a Table, &'a Column)> + 'a {
        self.tables.values().flat_map(move |t| {
            t.columns
                .iter()
                .filter(move |c| c.references(table))
                .map(move |c| (t, c))
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
