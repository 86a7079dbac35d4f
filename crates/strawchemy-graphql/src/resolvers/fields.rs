//! Object field resolvers for model types.
//!
//! The parent value of every model object is an [`Entity`]. Scalars are read
//! from its row; relations come from the entity's pre-loaded set when the
//! root resolver loaded them, and from the request session otherwise.

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use tracing::trace;

use super::{ResolverEnv, entity_value, guarded, request_session};
use crate::loader::{Entity, Loader, Relation};

pub struct FieldResolver;

impl FieldResolver {
    /// Resolver for a scalar field; null columns resolve to `null`.
    pub fn scalar(field: String) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let field = field.clone();
            FieldFuture::new(async move {
                let entity = parent_entity(&ctx)?;
                match entity.value(&field) {
                    Some(value) => Ok(Some(FieldValue::value(Value::from_json(value.clone())?))),
                    None => Ok(None),
                }
            })
        }
    }

    /// Resolver for a reference or collection field.
    pub fn relation(
        env: Arc<ResolverEnv>,
        field: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let env = Arc::clone(&env);
            let field = field.clone();
            FieldFuture::new(async move {
                let entity = parent_entity(&ctx)?;
                if let Some(relation) = entity.relation(&field) {
                    return Ok(borrowed_relation(relation));
                }

                trace!(model = entity.model(), field = %field, "Loading relation lazily");
                let session = request_session(&ctx)?;
                let relation = guarded(&session, async {
                    let guard = session.lock().await;
                    Loader::new(&env.storage, &**guard).relation(entity, &field).await
                })
                .await?;

                Ok(owned_relation(relation))
            })
        }
    }
}

fn parent_entity<'a>(ctx: &ResolverContext<'a>) -> Result<&'a Entity, async_graphql::Error> {
    ctx.parent_value.try_downcast_ref::<Entity>()
}

fn borrowed_relation(relation: &Relation) -> Option<FieldValue<'_>> {
    match relation {
        Relation::One(None) => None,
        Relation::One(Some(entity)) => Some(FieldValue::borrowed_any(&**entity)),
        Relation::Many(entities) => Some(FieldValue::list(
            entities.iter().map(|e| FieldValue::borrowed_any(e)),
        )),
    }
}

fn owned_relation<'a>(relation: Relation) -> Option<FieldValue<'a>> {
    match relation {
        Relation::One(entity) => entity.map(|e| entity_value(*e)),
        Relation::Many(entities) => Some(FieldValue::list(entities.into_iter().map(entity_value))),
    }
}
