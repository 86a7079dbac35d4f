//! Delete mutation resolver.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use tracing::debug;

use super::{ResolverEnv, entity_value, guarded, int_argument, request_session, root_prefix};
use crate::dispatch::Binding;
use crate::error::ResolveError;
use crate::loader::Loader;
use crate::selection::SelectionPaths;

/// Resolver for `Delete...` mutations.
///
/// Returns the deleted object's last state. Selected relations are loaded
/// before the delete runs, since cascading deletes remove them.
pub struct DeleteResolver;

impl DeleteResolver {
    pub fn resolve(
        env: Arc<ResolverEnv>,
        binding: Arc<Binding>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let env = Arc::clone(&env);
            let binding = Arc::clone(&binding);

            FieldFuture::new(async move {
                let id = int_argument(&ctx, "id")?;
                let paths = SelectionPaths::from_field(ctx.ctx.field());
                let prefix = root_prefix(&ctx);
                let session = request_session(&ctx)?;

                debug!(field = %binding.field, model = %binding.model, id, "Processing delete mutation");

                let entity = guarded(&session, async {
                    let mut guard = session.lock().await;
                    let loader = Loader::new(&env.storage, &**guard);
                    let table = loader.table(&binding.model)?.name.clone();
                    let row = loader
                        .get(&binding.model, id)
                        .await?
                        .ok_or_else(|| ResolveError::not_found(binding.model.clone(), id))?;
                    let entity = loader.load(&binding.model, row, Some(&paths), prefix).await?;

                    guard.delete(&table, id).await?;
                    guard.commit().await?;
                    debug!(model = %binding.model, id, "Object deleted");
                    Ok(entity)
                })
                .await?;

                Ok(Some(entity_value(entity)))
            })
        }
    }
}
