//! API type derivation.
//!
//! Each model type yields three descriptors: the queryable object type, a
//! `Create` input type (recursive, `id` optional) and an `Update` input type
//! (recursive, every field optional). Nested fields refer to other derived
//! types by name only, so derivation of self- or mutually-referential graphs
//! terminates: a type is built once and queued dependencies are drained
//! afterwards.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::ID_FIELD;
use crate::error::SynthesisError;
use crate::model::{FieldKind, ModelRegistry, ScalarType};
use crate::naming::{create_type_name, update_type_name};

/// GraphQL-style type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ApiTypeRef {
    Named(String),
    NonNull(Box<ApiTypeRef>),
    List(Box<ApiTypeRef>),
}

impl ApiTypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null(inner: ApiTypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    pub fn list(inner: ApiTypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            Self::NonNull(inner) => inner.is_list(),
            Self::List(_) => true,
            Self::Named(_) => false,
        }
    }

    /// The named type at the bottom of the wrappers.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for ApiTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ApiTypeKind {
    Object,
    CreateInput,
    UpdateInput,
}

impl ApiTypeKind {
    pub fn type_name(self, model: &str) -> String {
        match self {
            Self::Object => model.to_string(),
            Self::CreateInput => create_type_name(model),
            Self::UpdateInput => update_type_name(model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFieldDef {
    pub name: String,
    pub ty: ApiTypeRef,
    /// Scalar carried by the field, when it is not a nested model.
    pub scalar: Option<ScalarType>,
    /// Model type behind a nested reference or collection.
    pub target: Option<String>,
    pub collection: bool,
}

impl ApiFieldDef {
    pub fn is_nested(&self) -> bool {
        self.target.is_some()
    }
}

/// A derived object or input type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiTypeDef {
    pub name: String,
    /// Model type this was derived from.
    pub origin: String,
    pub kind: ApiTypeKind,
    pub fields: Vec<ApiFieldDef>,
}

impl ApiTypeDef {
    pub fn field(&self, name: &str) -> Option<&ApiFieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All derived types, in derivation order.
#[derive(Debug, Clone, Default)]
pub struct ApiTypes {
    types: IndexMap<String, Arc<ApiTypeDef>>,
}

impl ApiTypes {
    pub fn get(&self, name: &str) -> Option<&Arc<ApiTypeDef>> {
        self.types.get(name)
    }

    pub fn of(&self, kind: ApiTypeKind, model: &str) -> Option<&Arc<ApiTypeDef>> {
        self.types.get(&kind.type_name(model))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ApiTypeDef>> {
        self.types.values()
    }

    pub fn of_kind(&self, kind: ApiTypeKind) -> impl Iterator<Item = &Arc<ApiTypeDef>> {
        self.types.values().filter(move |t| t.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Memoizing deriver for object, `Create` and `Update` types.
pub struct ApiTypeSynthesizer<'r> {
    registry: &'r ModelRegistry,
    generated: HashMap<String, Arc<ApiTypeDef>>,
    order: Vec<String>,
    generating: HashSet<String>,
    pending: VecDeque<(ApiTypeKind, String)>,
}

impl<'r> ApiTypeSynthesizer<'r> {
    pub fn new(registry: &'r ModelRegistry) -> Self {
        Self {
            registry,
            generated: HashMap::new(),
            order: Vec::new(),
            generating: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn derive_object(&mut self, model: &str) -> Result<Arc<ApiTypeDef>, SynthesisError> {
        self.derive(ApiTypeKind::Object, model)
    }

    pub fn derive_create(&mut self, model: &str) -> Result<Arc<ApiTypeDef>, SynthesisError> {
        self.derive(ApiTypeKind::CreateInput, model)
    }

    pub fn derive_update(&mut self, model: &str) -> Result<Arc<ApiTypeDef>, SynthesisError> {
        self.derive(ApiTypeKind::UpdateInput, model)
    }

    /// Derives all three families for every registered model type.
    pub fn derive_all(&mut self) -> Result<(), SynthesisError> {
        let registry = self.registry;
        for model in registry.names() {
            self.derive_object(model)?;
            self.derive_create(model)?;
            self.derive_update(model)?;
        }
        Ok(())
    }

    /// Returns the derived types, in the order they were built.
    pub fn finish(mut self) -> ApiTypes {
        let types = self
            .order
            .iter()
            .filter_map(|name| self.generated.remove(name).map(|t| (name.clone(), t)))
            .collect();
        ApiTypes { types }
    }

    /// Derives `kind` for `model`, then drains any nested types it queued.
    pub fn derive(&mut self, kind: ApiTypeKind, model: &str) -> Result<Arc<ApiTypeDef>, SynthesisError> {
        let name = kind.type_name(model);
        if let Some(existing) = self.generated.get(&name) {
            return Ok(Arc::clone(existing));
        }

        self.build(kind, model)?;
        while let Some((kind, model)) = self.pending.pop_front() {
            self.build(kind, &model)?;
        }

        self.generated
            .get(&name)
            .cloned()
            .ok_or_else(|| SynthesisError::integrity(format!("type '{name}' was not derived")))
    }

    fn is_known(&self, name: &str) -> bool {
        self.generated.contains_key(name) || self.generating.contains(name)
    }

    fn queue_if_needed(&mut self, kind: ApiTypeKind, model: &str) {
        let name = kind.type_name(model);
        let queued = self.pending.iter().any(|(k, m)| *k == kind && m == model);
        if !self.is_known(&name) && !queued {
            self.pending.push_back((kind, model.to_string()));
        }
    }

    fn build(&mut self, kind: ApiTypeKind, model_name: &str) -> Result<(), SynthesisError> {
        let name = kind.type_name(model_name);
        if self.is_known(&name) {
            return Ok(());
        }

        let registry = self.registry;
        let model = registry
            .get(model_name)
            .ok_or_else(|| SynthesisError::UnknownModel(model_name.to_string()))?;

        self.generating.insert(name.clone());
        tracing::trace!(model = %model_name, type_name = %name, ?kind, "Deriving API type");

        let fields = model
            .fields
            .iter()
            .map(|field| {
                let field_kind = field.ty.kind().ok_or_else(|| {
                    SynthesisError::integrity(format!(
                        "field '{}.{}' has unsupported type '{}'",
                        model.name, field.name, field.ty
                    ))
                })?;
                if let Some(target) = field_kind.target() {
                    self.queue_if_needed(kind, target);
                }
                Ok(derive_field(kind, &field.name, field_kind))
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        let def = Arc::new(ApiTypeDef {
            name: name.clone(),
            origin: model.name.clone(),
            kind,
            fields,
        });

        self.generating.remove(&name);
        self.order.push(name.clone());
        self.generated.insert(name, def);
        Ok(())
    }
}

fn derive_field(kind: ApiTypeKind, name: &str, field: FieldKind<'_>) -> ApiFieldDef {
    let (named, scalar, target, collection, optional) = match field {
        FieldKind::Scalar { scalar, optional } => {
            (ApiTypeRef::named(scalar.graphql_name()), Some(scalar), None, false, optional)
        }
        FieldKind::Reference { target, optional } => (
            ApiTypeRef::named(kind.type_name(target)),
            None,
            Some(target.to_string()),
            false,
            optional,
        ),
        FieldKind::Collection { target, optional } => (
            ApiTypeRef::named(kind.type_name(target)),
            None,
            Some(target.to_string()),
            true,
            optional,
        ),
    };

    let ty = match kind {
        ApiTypeKind::Object => wrap(named, collection, optional),
        ApiTypeKind::CreateInput if name == ID_FIELD => named,
        ApiTypeKind::CreateInput => wrap(named, collection, optional),
        // Update elements stay nullable: an element without id means "append".
        ApiTypeKind::UpdateInput if collection => ApiTypeRef::list(named),
        ApiTypeKind::UpdateInput => named,
    };

    ApiFieldDef {
        name: name.to_string(),
        ty,
        scalar,
        target,
        collection,
    }
}

fn wrap(named: ApiTypeRef, collection: bool, optional: bool) -> ApiTypeRef {
    let ty = if collection {
        ApiTypeRef::list(ApiTypeRef::non_null(named))
    } else {
        named
    };
    if optional { ty } else { ApiTypeRef::non_null(ty) }
}

/// Derives every API type for a validated registry.
pub fn derive_api_types(registry: &ModelRegistry) -> Result<ApiTypes, SynthesisError> {
    let mut synthesizer = ApiTypeSynthesizer::new(registry);
    synthesizer.derive_all()?;
    let types = synthesizer.finish();
    tracing::debug!(types = types.len(), "API types derived");
    Ok(types)
}
