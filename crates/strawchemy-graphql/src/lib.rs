//! # strawchemy-graphql
//!
//! GraphQL layer for strawchemy model types.
//!
//! Given a [`ModelRegistry`](strawchemy_core::ModelRegistry) and a Query (and
//! optional Mutation) declaration whose fields follow the naming convention
//! (`FetchAll...`, `Fetch...ById`, `Create...`, `Update...`, `Delete...`),
//! this crate builds an async-graphql dynamic schema and binds every root
//! field to a generic resolver:
//!
//! - fetch resolvers read rows through the request session, optionally
//!   pre-loading the relations named in the selection set
//! - create and update resolvers turn nested inputs into rows, attaching
//!   existing rows referenced by id
//! - delete resolvers remove a row and let the storage delete rules cascade
//!
//! ## Configuration
//!
//! ```toml
//! eager_load = true
//! fetch_by_ids_partial_miss = "skip"
//!
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`dispatch`] - Binding of root fields to operations
//! - [`schema`] - Dynamic schema building and custom scalars
//! - [`resolvers`] - Generic resolvers
//! - [`materializer`] - Create / update input handling
//! - [`loader`] - Row loading and relation pre-loading
//! - [`selection`] - Flattened selection paths
//! - [`context`] - Per-request session handle
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod materializer;
pub mod resolvers;
pub mod schema;
pub mod selection;
pub mod service;

// Re-export main types
pub use config::{GraphQLConfig, LoggingConfig, PartialMissPolicy, StrawchemyConfig};
pub use context::SessionHandle;
pub use dispatch::{Binding, Operation, bind_roots};
pub use error::{BindingError, GraphQLError, ResolveError, UNHANDLED_ERROR_MESSAGE};
pub use loader::{Entity, Relation};
pub use schema::{GraphQLSchemaBuilder, SchemaBuilderConfig};
pub use selection::SelectionPaths;
pub use service::{StrawchemyBuilder, StrawchemySchema};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
