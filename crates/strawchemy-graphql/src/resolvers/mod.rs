//! Generic resolvers bound to root fields.
//!
//! - `fetch`: `FetchAll...` and `Fetch...ById` queries
//! - `create`, `update`, `delete`: mutations
//! - `fields`: object fields (scalars and relations) of model types
//!
//! Every root resolver runs its work through [`guarded`], which rolls back
//! the request session on failure and normalizes the error.

mod create;
mod delete;
mod fetch;
mod fields;
mod update;

pub use create::CreateResolver;
pub use delete::DeleteResolver;
pub use fetch::{FetchAllResolver, FetchByIdResolver, IDS_ARGUMENT, PAGE_ARGUMENT, Page};
pub use fields::FieldResolver;
pub use update::UpdateResolver;

use std::future::Future;
use std::sync::Arc;

use async_graphql::dynamic::{FieldValue, ResolverContext};
use strawchemy_core::StorageSchema;

use crate::config::StrawchemyConfig;
use crate::context::{SessionHandle, session_from_context};
use crate::error::ResolveError;
use crate::loader::Entity;
use crate::materializer::Input;
use crate::selection::SelectionPaths;

/// Shared, read-only state captured by every resolver.
#[derive(Debug)]
pub struct ResolverEnv {
    pub storage: Arc<StorageSchema>,
    pub config: StrawchemyConfig,
}

impl ResolverEnv {
    /// Selection paths below the current root field, when eager loading is on.
    pub(crate) fn eager_paths(&self, ctx: &ResolverContext<'_>) -> Option<SelectionPaths> {
        self.config
            .eager_load
            .then(|| SelectionPaths::from_field(ctx.ctx.field()))
    }
}

/// Fetches the request session, mapping a missing one to a GraphQL error.
pub(crate) fn request_session(ctx: &ResolverContext<'_>) -> Result<SessionHandle, async_graphql::Error> {
    session_from_context(ctx.ctx).map_err(ResolveError::into_graphql_error)
}

/// Runs resolver work, rolling back the session if it fails.
pub(crate) async fn guarded<T, F>(session: &SessionHandle, work: F) -> Result<T, async_graphql::Error>
where
    F: Future<Output = Result<T, ResolveError>>,
{
    match work.await {
        Ok(value) => Ok(value),
        Err(e) => {
            session.rollback().await;
            Err(e.into_graphql_error())
        }
    }
}

/// Prefix under which a root field's selections are recorded.
pub(crate) fn root_prefix(ctx: &ResolverContext<'_>) -> String {
    format!("/{}/", ctx.ctx.field().name())
}

pub(crate) fn entity_value<'a>(entity: Entity) -> FieldValue<'a> {
    FieldValue::owned_any(entity)
}

/// Reads an integer argument.
pub(crate) fn int_argument(ctx: &ResolverContext<'_>, name: &str) -> Result<i64, async_graphql::Error> {
    ctx.args
        .get(name)
        .and_then(|v| v.i64().ok())
        .ok_or_else(|| async_graphql::Error::new(format!("Missing required argument '{name}'")))
}

/// Reads an input-object argument as a JSON object.
///
/// Keys missing from the input stay missing, so "not supplied" and an
/// explicit `null` remain distinguishable.
pub(crate) fn input_argument(ctx: &ResolverContext<'_>, name: &str) -> Result<Input, async_graphql::Error> {
    ctx.args
        .get(name)
        .ok_or_else(|| async_graphql::Error::new(format!("Missing required argument '{name}'")))?
        .deserialize::<Input>()
        .map_err(|e| async_graphql::Error::new(format!("Invalid argument '{name}': {}", e.message)))
}
