//! Caller-declared root operation types (Query and Mutation).

use serde::{Deserialize, Serialize};

use crate::model::{FieldDef, FieldType};

/// A root operation type whose fields are bound to generic resolvers by name.
///
/// For Query fields `ty` is the declared return type; for Mutation fields it
/// names the operated-on model type (the return type is always that model).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDeclaration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl RootDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn query() -> Self {
        Self::new("Query")
    }

    pub fn mutation() -> Self {
        Self::new("Mutation")
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
