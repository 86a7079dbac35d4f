//! Declared model types and their field metadata.
//!
//! Declarations are plain data: each field carries a [`FieldType`] expression
//! that the validator and synthesizers inspect through [`FieldType::kind`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ID_FIELD;
use crate::error::DeclarationError;

/// Scalar kinds a field can hold directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Time,
    DateTime,
    Binary,
}

impl ScalarType {
    pub const ALL: [ScalarType; 8] = [
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Boolean,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Binary,
    ];

    /// Keyword used for this scalar in type expressions.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Float => "float",
            Self::String => "str",
            Self::Boolean => "bool",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Binary => "bytes",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.keyword() == keyword)
    }

    /// GraphQL scalar this type is exposed as.
    pub fn graphql_name(self) -> &'static str {
        match self {
            Self::Integer => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Binary => "Base64",
        }
    }
}

/// Declared type of a field, as written by the model author.
///
/// The textual form is `int`, `Datafile`, `Optional<Datafile>`,
/// `List<Datafile>` and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Scalar(ScalarType),
    Model(String),
    Optional(Box<FieldType>),
    List(Box<FieldType>),
}

/// Normalized shape of a field, available once a field passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind<'a> {
    Scalar { scalar: ScalarType, optional: bool },
    Reference { target: &'a str, optional: bool },
    Collection { target: &'a str, optional: bool },
}

impl FieldKind<'_> {
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Scalar { optional, .. }
            | Self::Reference { optional, .. }
            | Self::Collection { optional, .. } => *optional,
        }
    }

    /// Target model type for references and collections.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Scalar { .. } => None,
            Self::Reference { target, .. } | Self::Collection { target, .. } => Some(target),
        }
    }
}

impl FieldType {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarType::Integer)
    }

    pub fn string() -> Self {
        Self::Scalar(ScalarType::String)
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn list(inner: FieldType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The type below one modifier, or `self` when unwrapped.
    pub fn of_type(&self) -> &FieldType {
        match self {
            Self::Optional(inner) | Self::List(inner) => inner,
            other => other,
        }
    }

    /// Innermost named type (scalar keyword or model name).
    pub fn base_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.keyword(),
            Self::Model(name) => name,
            Self::Optional(inner) | Self::List(inner) => inner.base_name(),
        }
    }

    /// Innermost model name, if the base type is a model.
    pub fn element_model(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Model(name) => Some(name),
            Self::Optional(inner) | Self::List(inner) => inner.element_model(),
        }
    }

    /// Classifies the field into scalar / reference / collection.
    ///
    /// Returns `None` for shapes the data model does not allow (nested
    /// modifiers, lists of scalars).
    pub fn kind(&self) -> Option<FieldKind<'_>> {
        match self {
            Self::Scalar(scalar) => Some(FieldKind::Scalar {
                scalar: *scalar,
                optional: false,
            }),
            Self::Model(target) => Some(FieldKind::Reference {
                target,
                optional: false,
            }),
            Self::List(inner) => match inner.as_ref() {
                Self::Model(target) => Some(FieldKind::Collection {
                    target,
                    optional: false,
                }),
                _ => None,
            },
            Self::Optional(inner) => match inner.as_ref() {
                Self::Scalar(scalar) => Some(FieldKind::Scalar {
                    scalar: *scalar,
                    optional: true,
                }),
                Self::Model(target) => Some(FieldKind::Reference {
                    target,
                    optional: true,
                }),
                Self::List(element) => match element.as_ref() {
                    Self::Model(target) => Some(FieldKind::Collection {
                        target,
                        optional: true,
                    }),
                    _ => None,
                },
                Self::Optional(_) => None,
            },
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s.keyword()),
            Self::Model(name) => f.write_str(name),
            Self::Optional(inner) => write!(f, "Optional<{inner}>"),
            Self::List(inner) => write!(f, "List<{inner}>"),
        }
    }
}

impl FromStr for FieldType {
    type Err = DeclarationError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let trimmed = expression.trim();

        if let Some(inner) = strip_modifier(trimmed, "Optional") {
            return Ok(Self::optional(parse_inner(expression, inner)?));
        }
        if let Some(inner) = strip_modifier(trimmed, "List") {
            return Ok(Self::list(parse_inner(expression, inner)?));
        }

        if let Some(scalar) = ScalarType::from_keyword(trimmed) {
            return Ok(Self::Scalar(scalar));
        }

        if is_identifier(trimmed) {
            Ok(Self::Model(trimmed.to_string()))
        } else {
            Err(DeclarationError::invalid_type_expression(
                expression,
                "expected a scalar keyword, a model name, Optional<...> or List<...>",
            ))
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = DeclarationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

fn strip_modifier<'a>(expression: &'a str, modifier: &str) -> Option<&'a str> {
    expression
        .strip_prefix(modifier)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
}

fn parse_inner(expression: &str, inner: &str) -> Result<FieldType, DeclarationError> {
    if inner.trim().is_empty() {
        return Err(DeclarationError::invalid_type_expression(
            expression,
            "modifier is missing its inner type",
        ));
    }
    inner.parse().map_err(|_| {
        DeclarationError::invalid_type_expression(expression, format!("invalid inner type '{inner}'"))
    })
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A named field of a model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A declared entity: a name, an ordered field list and an optional lookup marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelType {
    pub name: String,
    /// Reference/enumeration data that never cascade-deletes its referencing parents.
    #[serde(default)]
    pub lookup: bool,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lookup: false,
            fields: Vec::new(),
        }
    }

    /// Marks this type as a lookup type.
    #[must_use]
    pub fn lookup(mut self) -> Self {
        self.lookup = true;
        self
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the type declares `id: int`.
    pub fn has_integer_id(&self) -> bool {
        self.get_field(ID_FIELD)
            .is_some_and(|f| f.ty == FieldType::Scalar(ScalarType::Integer))
    }
}

/// The closed set of declared model types, in declaration order.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelType>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from declarations, rejecting duplicate names.
    pub fn from_models(models: impl IntoIterator<Item = ModelType>) -> Result<Self, DeclarationError> {
        let mut registry = Self::new();
        for model in models {
            registry.register(model)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, model: ModelType) -> Result<(), DeclarationError> {
        if self.models.contains_key(&model.name) {
            return Err(DeclarationError::DuplicateModel(model.name));
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    /// Builder-style variant of [`ModelRegistry::register`].
    pub fn with_model(mut self, model: ModelType) -> Result<Self, DeclarationError> {
        self.register(model)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ModelType> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn is_lookup(&self, name: &str) -> bool {
        self.get(name).is_some_and(|m| m.lookup)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelType> {
        self.models.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
