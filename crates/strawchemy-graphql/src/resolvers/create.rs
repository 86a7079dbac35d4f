//! Create mutation resolver.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use strawchemy_storage::row_id;
use tracing::debug;

use super::{ResolverEnv, entity_value, guarded, input_argument, request_session, root_prefix};
use crate::dispatch::Binding;
use crate::error::ResolveError;
use crate::loader::Loader;
use crate::materializer::Materializer;

/// Resolver for `Create...` mutations.
///
/// Handles mutations like:
/// ```graphql
/// mutation {
///   CreateDataset(input: {name: "rivers", datafiles: [{name: "a.csv"}]}) {
///     id
///     datafiles { id }
///   }
/// }
/// ```
pub struct CreateResolver;

impl CreateResolver {
    pub fn resolve(
        env: Arc<ResolverEnv>,
        binding: Arc<Binding>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let env = Arc::clone(&env);
            let binding = Arc::clone(&binding);

            FieldFuture::new(async move {
                let input = input_argument(&ctx, "input")?;
                let paths = env.eager_paths(&ctx);
                let prefix = root_prefix(&ctx);
                let session = request_session(&ctx)?;

                debug!(field = %binding.field, model = %binding.model, "Processing create mutation");

                let entity = guarded(&session, async {
                    let mut guard = session.lock().await;
                    let created = Materializer::new(&env.storage, &mut **guard)
                        .create(&binding.model, &input)
                        .await?;
                    guard.commit().await?;

                    let id = row_id(&created)
                        .ok_or_else(|| ResolveError::internal("created row has no id"))?;
                    debug!(model = %binding.model, id, "Object graph created");

                    let loader = Loader::new(&env.storage, &**guard);
                    let row = loader
                        .get(&binding.model, id)
                        .await?
                        .ok_or_else(|| ResolveError::not_found(binding.model.clone(), id))?;
                    loader.load(&binding.model, row, paths.as_ref(), prefix).await
                })
                .await?;

                Ok(Some(entity_value(entity)))
            })
        }
    }
}
