//! Dynamic GraphQL schema builder.
//!
//! Turns derived API types and bound root fields into an async-graphql
//! dynamic [`Schema`]: one object type per model, one `Create` and one
//! `Update` input type per model, custom scalars, and the Query / Mutation
//! roots wired to the generic resolvers.

use std::sync::Arc;

use async_graphql::dynamic::{Field, InputValue, Object, Schema, SchemaBuilder, TypeRef};
use strawchemy_core::{ApiTypeKind, ApiTypes};
use tracing::{debug, trace};

use super::scalars::register_scalars;
use super::types::{PAGE_INPUT, input_type, object_type, page_input, root_type_ref};
use crate::dispatch::{Binding, Operation};
use crate::error::GraphQLError;
use crate::resolvers::{
    CreateResolver, DeleteResolver, FetchAllResolver, FetchByIdResolver, IDS_ARGUMENT, PAGE_ARGUMENT,
    ResolverEnv, UpdateResolver,
};

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Builds the dynamic schema for a set of bound root fields.
pub struct GraphQLSchemaBuilder<'a> {
    query_name: &'a str,
    mutation_name: &'a str,
    api_types: &'a ApiTypes,
    bindings: &'a [Binding],
    env: Arc<ResolverEnv>,
    config: SchemaBuilderConfig,
}

impl<'a> GraphQLSchemaBuilder<'a> {
    #[must_use]
    pub fn new(
        api_types: &'a ApiTypes,
        bindings: &'a [Binding],
        env: Arc<ResolverEnv>,
        config: SchemaBuilderConfig,
    ) -> Self {
        Self {
            query_name: "Query",
            mutation_name: "Mutation",
            api_types,
            bindings,
            env,
            config,
        }
    }

    /// Overrides the root type names.
    #[must_use]
    pub fn root_names(mut self, query: &'a str, mutation: &'a str) -> Self {
        self.query_name = query;
        self.mutation_name = mutation;
        self
    }

    /// Builds the GraphQL schema.
    ///
    /// The Mutation root is only registered when at least one mutation field
    /// is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if async-graphql rejects the assembled types.
    pub fn build(&self) -> Result<Schema, GraphQLError> {
        debug!("Starting GraphQL schema build");

        let has_mutations = self.bindings.iter().any(|b| b.operation.is_mutation());
        let mut schema_builder = Schema::build(
            self.query_name,
            has_mutations.then_some(self.mutation_name),
            None,
        );

        schema_builder = register_scalars(schema_builder);
        schema_builder = schema_builder.register(page_input());
        schema_builder = self.register_model_types(schema_builder);

        let query = self.build_root(self.query_name, false);
        schema_builder = schema_builder.register(query);
        if has_mutations {
            let mutation = self.build_root(self.mutation_name, true);
            schema_builder = schema_builder.register(mutation);
        }

        let mut schema_builder = schema_builder.limit_depth(self.config.max_depth);
        schema_builder = schema_builder.limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        debug!("GraphQL schema build complete");
        Ok(schema)
    }

    fn register_model_types(&self, mut builder: SchemaBuilder) -> SchemaBuilder {
        for def in self.api_types.iter() {
            trace!(type_name = %def.name, kind = ?def.kind, "Registering type");
            builder = match def.kind {
                ApiTypeKind::Object => builder.register(object_type(def, &self.env)),
                ApiTypeKind::CreateInput | ApiTypeKind::UpdateInput => builder.register(input_type(def)),
            };
        }
        builder
    }

    fn build_root(&self, name: &str, mutations: bool) -> Object {
        self.bindings
            .iter()
            .filter(|b| b.operation.is_mutation() == mutations)
            .fold(Object::new(name), |root, binding| root.field(self.root_field(binding)))
    }

    fn root_field(&self, binding: &Binding) -> Field {
        let env = Arc::clone(&self.env);
        let shared = Arc::new(binding.clone());
        let ty = root_type_ref(&binding.return_type);

        match binding.operation {
            Operation::FetchAll => Field::new(&binding.field, ty, FetchAllResolver::resolve(env, shared))
                .description(format!("All {} objects, ordered by id", binding.model))
                .argument(InputValue::new(IDS_ARGUMENT, TypeRef::named_nn_list(TypeRef::INT)))
                .argument(InputValue::new(PAGE_ARGUMENT, TypeRef::named(PAGE_INPUT))),
            Operation::FetchById => Field::new(&binding.field, ty, FetchByIdResolver::resolve(env, shared))
                .description(format!("One {} by id", binding.model))
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::INT))),
            Operation::Create => {
                Field::new(&binding.field, ty, CreateResolver::resolve(env, shared)).argument(InputValue::new(
                    "input",
                    TypeRef::named_nn(ApiTypeKind::CreateInput.type_name(&binding.model)),
                ))
            }
            Operation::Update => {
                Field::new(&binding.field, ty, UpdateResolver::resolve(env, shared)).argument(InputValue::new(
                    "input",
                    TypeRef::named_nn(ApiTypeKind::UpdateInput.type_name(&binding.model)),
                ))
            }
            Operation::Delete => Field::new(&binding.field, ty, DeleteResolver::resolve(env, shared))
                .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::INT))),
        }
    }
}
