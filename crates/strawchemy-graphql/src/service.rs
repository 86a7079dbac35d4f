//! The assembled schema and its request entry point.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, ServerError};
use strawchemy_core::{
    ApiTypes, ModelRegistry, RootDeclaration, StorageSchema, derive_api_types, synthesize, validate,
};
use strawchemy_storage::DynDatabase;
use tracing::{debug, info};

use crate::config::StrawchemyConfig;
use crate::context::SessionHandle;
use crate::dispatch::{Binding, bind_roots};
use crate::error::{GraphQLError, ResolveError};
use crate::resolvers::ResolverEnv;
use crate::schema::GraphQLSchemaBuilder;

/// Builder for [`StrawchemySchema`].
///
/// # Example
///
/// ```ignore
/// let schema = StrawchemyBuilder::new(registry)
///     .query(RootDeclaration::query().field("FetchAllDatasets", FieldType::list(FieldType::model("Dataset"))))
///     .build()?;
/// let schema = schema.with_database(create_database(schema.storage_schema().clone()));
/// ```
#[derive(Debug, Clone)]
pub struct StrawchemyBuilder {
    registry: ModelRegistry,
    query: RootDeclaration,
    mutation: Option<RootDeclaration>,
    config: StrawchemyConfig,
}

impl StrawchemyBuilder {
    #[must_use]
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            query: RootDeclaration::query(),
            mutation: None,
            config: StrawchemyConfig::default(),
        }
    }

    #[must_use]
    pub fn query(mut self, query: RootDeclaration) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn mutation(mut self, mutation: RootDeclaration) -> Self {
        self.mutation = Some(mutation);
        self
    }

    #[must_use]
    pub fn config(mut self, config: StrawchemyConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the declarations, binds the root fields, synthesizes the
    /// storage schema and API types, and builds the GraphQL schema.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, invalid model types, root fields that
    /// cannot be bound, or a schema async-graphql rejects. Nothing is served
    /// from a partially built schema.
    pub fn build(self) -> Result<StrawchemySchema, GraphQLError> {
        let Self {
            registry,
            query,
            mutation,
            config,
        } = self;

        config.validate().map_err(GraphQLError::Config)?;

        debug!(models = registry.len(), "Validating model types");
        validate(&registry)?;

        let mutation = mutation.filter(|m| !m.is_empty());
        let bindings = bind_roots(&query, mutation.as_ref(), &registry)?;

        let storage = Arc::new(synthesize(&registry)?);
        let api_types = derive_api_types(&registry)?;

        let env = Arc::new(ResolverEnv {
            storage: Arc::clone(&storage),
            config: config.clone(),
        });
        let query_name = root_name(&query, "Query");
        let mutation_name = mutation.as_ref().map_or("Mutation", |m| root_name(m, "Mutation"));
        let schema = GraphQLSchemaBuilder::new(&api_types, &bindings, env, config.graphql.to_schema_builder_config())
            .root_names(query_name, mutation_name)
            .build()?;

        info!(
            models = registry.len(),
            tables = storage.len(),
            root_fields = bindings.len(),
            "Strawchemy schema ready"
        );

        Ok(StrawchemySchema {
            schema,
            storage,
            registry: Arc::new(registry),
            api_types: Arc::new(api_types),
            bindings,
            config,
            database: None,
        })
    }
}

fn root_name<'a>(root: &'a RootDeclaration, default: &'a str) -> &'a str {
    if root.name.is_empty() { default } else { &root.name }
}

/// A built schema, ready to execute requests.
#[derive(Clone)]
pub struct StrawchemySchema {
    schema: Schema,
    storage: Arc<StorageSchema>,
    registry: Arc<ModelRegistry>,
    api_types: Arc<ApiTypes>,
    bindings: Vec<Binding>,
    config: StrawchemyConfig,
    database: Option<DynDatabase>,
}

impl StrawchemySchema {
    /// Attaches the database sessions are opened from.
    #[must_use]
    pub fn with_database(mut self, database: DynDatabase) -> Self {
        self.database = Some(database);
        self
    }

    pub fn storage_schema(&self) -> &Arc<StorageSchema> {
        &self.storage
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn api_types(&self) -> &ApiTypes {
        &self.api_types
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn config(&self) -> &StrawchemyConfig {
        &self.config
    }

    /// The underlying dynamic schema. Requests executed on it directly carry
    /// no session.
    pub fn dynamic_schema(&self) -> &Schema {
        &self.schema
    }

    /// GraphQL SDL of the schema.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// `CREATE TABLE` statements of the storage schema.
    pub fn ddl(&self) -> String {
        self.storage.to_ddl()
    }

    /// Executes one request under its own session.
    ///
    /// The session is closed once execution finishes; anything a mutation
    /// did not commit is discarded.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let Some(database) = &self.database else {
            return error_response(ResolveError::MissingDatabase);
        };

        let session = match database.open().await {
            Ok(session) => SessionHandle::new(session),
            Err(e) => return error_response(ResolveError::from(e)),
        };
        debug!(backend = database.backend_name(), "Session opened");

        let request = request.into().data(session.clone());
        let response = self.schema.execute(request).await;

        session.close().await;
        response
    }
}

impl std::fmt::Debug for StrawchemySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrawchemySchema")
            .field("tables", &self.storage.len())
            .field("bindings", &self.bindings)
            .field("has_database", &self.database.is_some())
            .finish_non_exhaustive()
    }
}

fn error_response(error: ResolveError) -> Response {
    let error = error.into_graphql_error();
    let mut server_error = ServerError::new(error.message, None);
    server_error.extensions = error.extensions;
    Response::from_errors(vec![server_error])
}
