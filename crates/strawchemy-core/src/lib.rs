//! # strawchemy-core
//!
//! Model-to-schema derivation engine.
//!
//! A closed set of declared [`ModelType`]s is held in a [`ModelRegistry`],
//! checked by [`validate`], and then compiled into two artifacts that must
//! agree with each other:
//!
//! - a relational [`StorageSchema`] (tables, foreign keys, delete rules), see [`mapping`];
//! - API type descriptors (object, `Create` and `Update` input types), see [`api_types`].
//!
//! Neither step mutates the declarations; both build new descriptors.

pub mod api_types;
pub mod error;
pub mod mapping;
pub mod model;
pub mod naming;
pub mod roots;
pub mod validation;

pub use api_types::{
    ApiFieldDef, ApiTypeDef, ApiTypeKind, ApiTypeRef, ApiTypeSynthesizer, ApiTypes, derive_api_types,
};
pub use error::{DeclarationError, ModelValidationError, SynthesisError};
pub use mapping::{
    Cascade, Column, ColumnType, ForeignKey, OnDelete, Relationship, RelationshipKind,
    SchemaBuilderContext, StorageSchema, Table, synthesize,
};
pub use model::{FieldDef, FieldKind, FieldType, ModelRegistry, ModelType, ScalarType};
pub use naming::snake_it;
pub use roots::RootDeclaration;
pub use validation::validate;

/// Name of the primary key field every model type must declare.
pub const ID_FIELD: &str = "id";
