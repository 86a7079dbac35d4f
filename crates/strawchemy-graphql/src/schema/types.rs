//! Conversion of derived API types into dynamic GraphQL types.

use std::sync::Arc;

use async_graphql::dynamic::{Field, InputObject, InputValue, Object, TypeRef};
use strawchemy_core::{ApiTypeDef, ApiTypeRef, FieldType};

use crate::resolvers::{FieldResolver, ResolverEnv};

/// Name of the paging input type accepted by fetch-all fields.
pub const PAGE_INPUT: &str = "PageInput";

pub(crate) fn type_ref(ty: &ApiTypeRef) -> TypeRef {
    match ty {
        ApiTypeRef::Named(name) => TypeRef::Named(name.clone().into()),
        ApiTypeRef::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
        ApiTypeRef::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    }
}

/// Output type of a root field declared as `ty`.
///
/// Unwrapped types are non-null; `Optional<...>` drops that, and list
/// elements are always non-null.
pub(crate) fn root_type_ref(ty: &FieldType) -> TypeRef {
    match ty {
        FieldType::Optional(inner) => match root_type_ref(inner) {
            TypeRef::NonNull(inner) => *inner,
            other => other,
        },
        FieldType::List(inner) => TypeRef::NonNull(Box::new(TypeRef::List(Box::new(root_type_ref(inner))))),
        other => TypeRef::named_nn(other.base_name()),
    }
}

/// Builds the queryable object type for a model.
pub(crate) fn object_type(def: &ApiTypeDef, env: &Arc<ResolverEnv>) -> Object {
    let mut object = Object::new(&def.name);
    for field in &def.fields {
        let ty = type_ref(&field.ty);
        let resolved = if field.is_nested() {
            Field::new(&field.name, ty, FieldResolver::relation(Arc::clone(env), field.name.clone()))
        } else {
            Field::new(&field.name, ty, FieldResolver::scalar(field.name.clone()))
        };
        object = object.field(resolved);
    }
    object
}

/// Builds a `Create` or `Update` input type.
pub(crate) fn input_type(def: &ApiTypeDef) -> InputObject {
    def.fields.iter().fold(InputObject::new(&def.name), |input, field| {
        input.field(InputValue::new(&field.name, type_ref(&field.ty)))
    })
}

pub(crate) fn page_input() -> InputObject {
    InputObject::new(PAGE_INPUT)
        .description("1-based page selection")
        .field(InputValue::new("page", TypeRef::named_nn(TypeRef::INT)))
        .field(InputValue::new("pageSize", TypeRef::named_nn(TypeRef::INT)))
}
