use thiserror::Error;

/// Errors raised while reading model declarations (before validation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("Invalid type expression '{expression}': {reason}")]
    InvalidTypeExpression { expression: String, reason: String },

    #[error("Model type '{0}' is declared more than once")]
    DuplicateModel(String),
}

impl DeclarationError {
    /// Create a new InvalidTypeExpression error
    pub fn invalid_type_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypeExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// A model declaration that breaks one of the data-model invariants.
///
/// Raised by [`crate::validate`] on the first violation found. Every variant
/// names the offending type; field-level variants also name the field and the
/// inner type that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelValidationError {
    #[error("Type {type_name} does not define an 'id' member of type 'int'")]
    MissingId { type_name: String },

    #[error("Type {type_name} declares field '{field}' more than once")]
    DuplicateField { type_name: String, field: String },

    #[error(
        "Type {type_name} has a list of optional or a optional of list type on field '{field}' \
         with type '{inner_type}' and nesting these types isn't allowed"
    )]
    NestedModifier {
        type_name: String,
        field: String,
        inner_type: String,
    },

    #[error("Type {type_name} has a list field with a disallowed type '{inner_type}' on field '{field}'")]
    DisallowedListType {
        type_name: String,
        field: String,
        inner_type: String,
    },

    #[error(
        "Type {type_name} has an optional field with a disallowed type '{inner_type}' on field '{field}'"
    )]
    DisallowedOptionalType {
        type_name: String,
        field: String,
        inner_type: String,
    },

    #[error("Type {type_name} has field with a disallowed type '{inner_type}' on field '{field}'")]
    DisallowedType {
        type_name: String,
        field: String,
        inner_type: String,
    },

    #[error("Types {other_type} and {type_name} both map to table '{table}'")]
    TableNameCollision {
        type_name: String,
        other_type: String,
        table: String,
    },
}

impl ModelValidationError {
    /// Name of the model type that failed validation.
    pub fn type_name(&self) -> &str {
        match self {
            Self::MissingId { type_name }
            | Self::DuplicateField { type_name, .. }
            | Self::NestedModifier { type_name, .. }
            | Self::DisallowedListType { type_name, .. }
            | Self::DisallowedOptionalType { type_name, .. }
            | Self::DisallowedType { type_name, .. }
            | Self::TableNameCollision { type_name, .. } => type_name,
        }
    }

    /// Name of the offending field, if the violation is field-level.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingId { .. } | Self::TableNameCollision { .. } => None,
            Self::DuplicateField { field, .. }
            | Self::NestedModifier { field, .. }
            | Self::DisallowedListType { field, .. }
            | Self::DisallowedOptionalType { field, .. }
            | Self::DisallowedType { field, .. } => Some(field),
        }
    }

    /// Inner type that was rejected, if any.
    pub fn inner_type(&self) -> Option<&str> {
        match self {
            Self::MissingId { .. } | Self::DuplicateField { .. } | Self::TableNameCollision { .. } => None,
            Self::NestedModifier { inner_type, .. }
            | Self::DisallowedListType { inner_type, .. }
            | Self::DisallowedOptionalType { inner_type, .. }
            | Self::DisallowedType { inner_type, .. } => Some(inner_type),
        }
    }
}

/// Errors raised while synthesizing the storage schema or API types.
///
/// These are contract failures: a registry that passed validation never
/// produces them except for column name clashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("Unknown model type '{0}'")]
    UnknownModel(String),

    #[error("Column '{column}' is defined more than once on table '{table}'")]
    ColumnConflict { table: String, column: String },

    #[error("Models '{first}' and '{second}' both map to table '{table}'")]
    TableConflict {
        table: String,
        first: String,
        second: String,
    },

    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl SynthesisError {
    /// Create a new Integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Create a new ColumnConflict error
    pub fn column_conflict(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnConflict {
            table: table.into(),
            column: column.into(),
        }
    }
}
