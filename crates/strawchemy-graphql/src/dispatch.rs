//! Binding of root fields to generic resolvers.
//!
//! Root fields are matched by name, case-insensitively:
//!
//! | root     | name                               | operation            |
//! |----------|------------------------------------|----------------------|
//! | Query    | contains `fetchall`                | [`Operation::FetchAll`]  |
//! | Query    | contains `fetch` and `byid`        | [`Operation::FetchById`] |
//! | Mutation | starts with `create`               | [`Operation::Create`]    |
//! | Mutation | starts with `update`               | [`Operation::Update`]    |
//! | Mutation | starts with `delete`               | [`Operation::Delete`]    |
//!
//! Binding runs once while the schema is built; any field that does not fit
//! aborts construction.

use std::collections::HashSet;

use strawchemy_core::{FieldDef, FieldType, ModelRegistry, RootDeclaration};
use tracing::{debug, trace};

use crate::error::BindingError;

/// Generic operation a root field is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchById,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchAll => "fetch_all",
            Self::FetchById => "fetch_by_id",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A root field bound to an operation on one model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub field: String,
    pub operation: Operation,
    /// The operated-on model type.
    pub model: String,
    /// Declared type of the root field.
    pub return_type: FieldType,
}

impl Binding {
    /// Whether a missing row may resolve to `null`.
    pub fn is_nullable(&self) -> bool {
        self.return_type.is_optional()
    }
}

/// Classifies a Query field name.
pub fn classify_query_field(name: &str) -> Option<Operation> {
    let lower = name.to_lowercase();
    if lower.contains("fetchall") {
        Some(Operation::FetchAll)
    } else if lower.contains("fetch") && lower.contains("byid") {
        Some(Operation::FetchById)
    } else {
        None
    }
}

/// Classifies a Mutation field name.
pub fn classify_mutation_field(name: &str) -> Option<Operation> {
    let lower = name.to_lowercase();
    if lower.starts_with("create") {
        Some(Operation::Create)
    } else if lower.starts_with("update") {
        Some(Operation::Update)
    } else if lower.starts_with("delete") {
        Some(Operation::Delete)
    } else {
        None
    }
}

/// Binds every field of the Query and (optional) Mutation declarations.
///
/// # Errors
///
/// Returns the first field that breaks a naming or shape rule, or refers to
/// an undeclared model type.
pub fn bind_roots(
    query: &RootDeclaration,
    mutation: Option<&RootDeclaration>,
    registry: &ModelRegistry,
) -> Result<Vec<Binding>, BindingError> {
    let mut bindings = Vec::with_capacity(
        query.fields.len() + mutation.map_or(0, |m| m.fields.len()),
    );

    check_unique(query)?;
    for field in &query.fields {
        bindings.push(bind_query_field(field, registry)?);
    }

    if let Some(mutation) = mutation {
        check_unique(mutation)?;
        for field in &mutation.fields {
            bindings.push(bind_mutation_field(field, registry)?);
        }
    }

    debug!(count = bindings.len(), "Root fields bound");
    Ok(bindings)
}

fn check_unique(root: &RootDeclaration) -> Result<(), BindingError> {
    let mut seen = HashSet::new();
    for field in &root.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(BindingError::DuplicateField {
                root: root.name.clone(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

fn bind_query_field(field: &FieldDef, registry: &ModelRegistry) -> Result<Binding, BindingError> {
    let operation = classify_query_field(&field.name).ok_or_else(|| BindingError::UnknownQueryField {
        field: field.name.clone(),
    })?;

    match operation {
        Operation::FetchAll if !returns_list(&field.ty) => {
            return Err(BindingError::FetchAllNotList {
                field: field.name.clone(),
            });
        }
        Operation::FetchById if returns_list(&field.ty) => {
            return Err(BindingError::ListByIdReturn {
                field: field.name.clone(),
            });
        }
        _ => {}
    }

    let model = field
        .ty
        .element_model()
        .filter(|m| registry.contains(m))
        .ok_or_else(|| BindingError::UnknownModel {
            field: field.name.clone(),
            model: field.ty.base_name().to_string(),
        })?;

    trace!(field = %field.name, %operation, model, "Query field bound");
    Ok(Binding {
        field: field.name.clone(),
        operation,
        model: model.to_string(),
        return_type: field.ty.clone(),
    })
}

fn returns_list(ty: &FieldType) -> bool {
    ty.is_list() || ty.of_type().is_list()
}

fn bind_mutation_field(field: &FieldDef, registry: &ModelRegistry) -> Result<Binding, BindingError> {
    let operation =
        classify_mutation_field(&field.name).ok_or_else(|| BindingError::UnknownMutationField {
            field: field.name.clone(),
        })?;

    let FieldType::Model(model) = &field.ty else {
        return Err(BindingError::InvalidMutationType {
            field: field.name.clone(),
            ty: field.ty.to_string(),
        });
    };

    if !registry.contains(model) {
        return Err(BindingError::UnknownModel {
            field: field.name.clone(),
            model: model.clone(),
        });
    }

    trace!(field = %field.name, %operation, model = %model, "Mutation field bound");
    Ok(Binding {
        field: field.name.clone(),
        operation,
        model: model.clone(),
        return_type: field.ty.clone(),
    })
}
