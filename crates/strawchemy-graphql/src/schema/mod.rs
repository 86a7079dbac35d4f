//! GraphQL schema building.
//!
//! - [`GraphQLSchemaBuilder`] assembles the dynamic schema from derived API
//!   types and bound root fields
//! - `scalars` registers `Date`, `Time`, `DateTime` and `Base64`
//! - `types` maps derived type descriptors onto dynamic objects and inputs

mod builder;
mod scalars;
mod types;

pub use builder::{GraphQLSchemaBuilder, SchemaBuilderConfig};
pub use scalars::{is_valid_base64, is_valid_date, is_valid_datetime, is_valid_time};
pub use types::PAGE_INPUT;
