//! Update mutation resolver.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use strawchemy_core::ID_FIELD;
use tracing::debug;

use super::{ResolverEnv, entity_value, guarded, input_argument, request_session, root_prefix};
use crate::dispatch::Binding;
use crate::error::ResolveError;
use crate::loader::Loader;
use crate::materializer::Materializer;

/// Resolver for `Update...` mutations.
///
/// The input's top-level `id` selects the row to merge onto; fields left out
/// of the input are not touched.
pub struct UpdateResolver;

impl UpdateResolver {
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

                let entity = guarded(&session, async {
                    let id = input
                        .get(ID_FIELD)
                        .and_then(serde_json::Value::as_i64)
                        .ok_or(ResolveError::MissingUpdateId)?;
                    debug!(field = %binding.field, model = %binding.model, id, "Processing update mutation");

                    let mut guard = session.lock().await;
                    Materializer::new(&env.storage, &mut **guard)
                        .update(&binding.model, id, &input)
                        .await?;
                    guard.commit().await?;

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
