//! Query resolvers: fetch-all and fetch-by-id.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use strawchemy_storage::Row;
use tracing::debug;

use super::{ResolverEnv, entity_value, guarded, int_argument, request_session, root_prefix};
use crate::config::PartialMissPolicy;
use crate::dispatch::Binding;
use crate::error::ResolveError;
use crate::loader::Loader;

/// Name of the `ids` argument of fetch-all fields.
pub const IDS_ARGUMENT: &str = "ids";
/// Name of the `page` argument of fetch-all fields.
pub const PAGE_ARGUMENT: &str = "page";

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    fn apply(self, rows: Vec<Row>) -> Result<Vec<Row>, ResolveError> {
        if self.page < 1 || self.page_size < 1 {
            return Err(ResolveError::validation("page and pageSize must be at least 1"));
        }
        let skip = usize::try_from((self.page - 1).saturating_mul(self.page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }
}

/// Resolver for `FetchAll...` fields.
///
/// Returns every row of the model ordered by id, optionally restricted to
/// `ids` and paged with `page`.
pub struct FetchAllResolver;

impl FetchAllResolver {
    pub fn resolve(
        env: Arc<ResolverEnv>,
        binding: Arc<Binding>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let env = Arc::clone(&env);
            let binding = Arc::clone(&binding);

            FieldFuture::new(async move {
                let ids = ids_argument(&ctx)?;
                let page = page_argument(&ctx)?;
                let paths = env.eager_paths(&ctx);
                let prefix = root_prefix(&ctx);
                let session = request_session(&ctx)?;

                debug!(field = %binding.field, model = %binding.model, "Resolving fetch-all query");

                let entities = guarded(&session, async {
                    let guard = session.lock().await;
                    let loader = Loader::new(&env.storage, &**guard);

                    let rows = match ids {
                        Some(ids) => {
                            fetch_ids(&loader, &binding.model, ids, env.config.fetch_by_ids_partial_miss).await?
                        }
                        None => loader.scan(&binding.model).await?,
                    };
                    let rows = match page {
                        Some(page) => page.apply(rows)?,
                        None => rows,
                    };

                    let mut entities = Vec::with_capacity(rows.len());
                    for row in rows {
                        entities.push(loader.load(&binding.model, row, paths.as_ref(), prefix.clone()).await?);
                    }
                    Ok(entities)
                })
                .await?;

                Ok(Some(FieldValue::list(entities.into_iter().map(entity_value))))
            })
        }
    }
}

/// Resolver for `Fetch...ById` fields.
///
/// A missing row resolves to `null` when the field is declared optional and
/// to a not-found error otherwise.
pub struct FetchByIdResolver;

impl FetchByIdResolver {
    pub fn resolve(
        env: Arc<ResolverEnv>,
        binding: Arc<Binding>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let env = Arc::clone(&env);
            let binding = Arc::clone(&binding);

            FieldFuture::new(async move {
                let id = int_argument(&ctx, "id")?;
                let paths = env.eager_paths(&ctx);
                let prefix = root_prefix(&ctx);
                let session = request_session(&ctx)?;

                debug!(field = %binding.field, model = %binding.model, id, "Resolving fetch-by-id query");

                let entity = guarded(&session, async {
                    let guard = session.lock().await;
                    let loader = Loader::new(&env.storage, &**guard);

                    match loader.get(&binding.model, id).await? {
                        Some(row) => Ok(Some(loader.load(&binding.model, row, paths.as_ref(), prefix).await?)),
                        None if binding.is_nullable() => {
                            debug!(model = %binding.model, id, "Row not found");
                            Ok(None)
                        }
                        None => Err(ResolveError::not_found(binding.model.clone(), id)),
                    }
                })
                .await?;

                Ok(entity.map(entity_value))
            })
        }
    }
}

async fn fetch_ids(
    loader: &Loader<'_>,
    model: &str,
    mut ids: Vec<i64>,
    policy: PartialMissPolicy,
) -> Result<Vec<Row>, ResolveError> {
    ids.sort_unstable();
    ids.dedup();

    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        match loader.get(model, id).await? {
            Some(row) => rows.push(row),
            None => match policy {
                PartialMissPolicy::Error => return Err(ResolveError::not_found(model, id)),
                PartialMissPolicy::Skip => debug!(model, id, "Skipping missing id"),
            },
        }
    }
    Ok(rows)
}

fn ids_argument(ctx: &ResolverContext<'_>) -> Result<Option<Vec<i64>>, async_graphql::Error> {
    let Some(value) = ctx.args.get(IDS_ARGUMENT) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let ids = value
        .list()?
        .iter()
        .map(|v| v.i64())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(ids))
}

fn page_argument(ctx: &ResolverContext<'_>) -> Result<Option<Page>, async_graphql::Error> {
    let Some(value) = ctx.args.get(PAGE_ARGUMENT) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let page = value.object()?;
    Ok(Some(Page {
        page: page.try_get("page")?.i64()?,
        page_size: page.try_get("pageSize")?.i64()?,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strawchemy_storage::row_id;

    use super::*;

    fn rows(count: i64) -> Vec<Row> {
        (1..=count)
            .map(|id| json!({"id": id}).as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_page_apply() {
        let page = Page { page: 2, page_size: 2 };
        let ids: Vec<_> = page.apply(rows(5)).unwrap().iter().filter_map(row_id).collect();
        assert_eq!(ids, vec![3, 4]);

        let last = Page { page: 3, page_size: 2 };
        assert_eq!(last.apply(rows(5)).unwrap().len(), 1);

        let beyond = Page { page: 9, page_size: 2 };
        assert!(beyond.apply(rows(5)).unwrap().is_empty());
    }

    #[test]
    fn test_page_rejects_non_positive_values() {
        let zero = Page { page: 0, page_size: 2 };
        assert!(matches!(zero.apply(rows(1)), Err(ResolveError::Validation(_))));

        let empty = Page { page: 1, page_size: 0 };
        assert!(matches!(empty.apply(rows(1)), Err(ResolveError::Validation(_))));
    }
}
