//! Per-request session scoping.
//!
//! Every request runs under one [`SessionHandle`], injected as request data
//! by [`crate::StrawchemySchema::execute`] and closed when execution ends.
//! Resolvers fetch it with [`session_from_context`]; a request executed
//! without one fails with a configuration error.

use std::sync::Arc;

use async_graphql::Context;
use strawchemy_storage::Session;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::ResolveError;

/// Shared handle to the request's session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Box<dyn Session>>>,
}

impl SessionHandle {
    pub fn new(session: Box<dyn Session>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Locks the session for exclusive use by one resolver step.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn Session>> {
        self.inner.lock().await
    }

    /// Discards pending work after a failed resolver.
    pub async fn rollback(&self) {
        let mut session = self.inner.lock().await;
        if session.is_open() {
            if let Err(e) = session.rollback().await {
                tracing::error!(error = %e, "Failed to roll back session");
            }
        }
    }

    /// Closes the session; uncommitted work is discarded.
    pub async fn close(&self) {
        let mut session = self.inner.lock().await;
        if session.is_open() {
            session.close();
            tracing::debug!("Session closed");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_open()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

/// Returns the request's session handle.
pub(crate) fn session_from_context(ctx: &Context<'_>) -> Result<SessionHandle, ResolveError> {
    ctx.data::<SessionHandle>()
        .cloned()
        .map_err(|_| ResolveError::MissingSession)
}
