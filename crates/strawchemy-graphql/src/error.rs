//! Error types for the GraphQL layer.
//!
//! Startup errors ([`GraphQLError`], [`BindingError`]) abort schema
//! construction. Request errors ([`ResolveError`]) are normalized at the
//! resolver boundary: domain errors keep their message, everything else is
//! logged and replaced by a generic message.

use async_graphql::ErrorExtensions;
use strawchemy_core::{ModelValidationError, SynthesisError};
use strawchemy_storage::StorageError;

/// Message returned to callers for any error that is not a domain error.
pub const UNHANDLED_ERROR_MESSAGE: &str = "An unhandled error occurred";

/// A root field that cannot be bound to a generic resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Fetch..ById Query members cannot be lists (field '{field}')")]
    ListByIdReturn { field: String },

    #[error("FetchAll Query members must return lists (field '{field}')")]
    FetchAllNotList { field: String },

    #[error(
        "Query members must have FetchAll or FetchById in their names (type insensitive), got '{field}'"
    )]
    UnknownQueryField { field: String },

    #[error(
        "Mutation members must start with Create, Update or Delete (type insensitive), got '{field}'"
    )]
    UnknownMutationField { field: String },

    #[error("Mutation member '{field}' must name a single model type, got '{ty}'")]
    InvalidMutationType { field: String, ty: String },

    #[error("Field '{field}' refers to undeclared model type '{model}'")]
    UnknownModel { field: String, model: String },

    #[error("Field '{field}' is declared more than once on {root}")]
    DuplicateField { root: String, field: String },
}

impl BindingError {
    /// Name of the offending root field.
    pub fn field(&self) -> &str {
        match self {
            Self::ListByIdReturn { field }
            | Self::FetchAllNotList { field }
            | Self::UnknownQueryField { field }
            | Self::UnknownMutationField { field }
            | Self::InvalidMutationType { field, .. }
            | Self::UnknownModel { field, .. }
            | Self::DuplicateField { field, .. } => field,
        }
    }
}

/// Errors that abort schema construction.
#[derive(Debug, thiserror::Error)]
pub enum GraphQLError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("Schema synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GraphQLError {
    /// Returns a stable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "MODEL_VALIDATION_ERROR",
            Self::Binding(_) => "BINDING_ERROR",
            Self::Synthesis(_) => "SYNTHESIS_ERROR",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Errors raised while resolving a request.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Could not find {model} with id: '{id}'")]
    NotFound { model: String, id: i64 },

    #[error("Could not find {model} with id: '{id}' in the parent's current collection")]
    NotInCollection { model: String, id: i64 },

    #[error("Missing 'id' on update mutation input parameter")]
    MissingUpdateId,

    #[error("{0}")]
    Validation(String),

    #[error("No database session available in the request context")]
    MissingSession,

    #[error("No database configured for this schema")]
    MissingDatabase,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn not_found(model: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            model: model.into(),
            id,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Domain errors are shown to the caller as they are.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotInCollection { .. }
                | Self::MissingUpdateId
                | Self::Validation(_)
        )
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::NotInCollection { .. } => "NOT_FOUND",
            Self::MissingUpdateId | Self::Validation(_) => "VALIDATION_ERROR",
            _ => "UNHANDLED_ERROR",
        }
    }

    /// Converts into the error returned to the caller.
    ///
    /// Non-domain errors are logged with their detail and replaced by
    /// [`UNHANDLED_ERROR_MESSAGE`].
    pub fn into_graphql_error(self) -> async_graphql::Error {
        let code = self.error_code();
        let message = if self.is_domain() {
            tracing::warn!(error = %self, code, "Request rejected");
            self.to_string()
        } else {
            tracing::error!(error = %self, "Unhandled error while resolving field");
            UNHANDLED_ERROR_MESSAGE.to_string()
        };

        async_graphql::Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_message() {
        let err = ResolveError::not_found("Dataset", 5).into_graphql_error();
        assert_eq!(err.message, "Could not find Dataset with id: '5'");

        let err = ResolveError::MissingUpdateId.into_graphql_error();
        assert_eq!(err.message, "Missing 'id' on update mutation input parameter");
    }

    #[test]
    fn test_other_errors_are_genericized() {
        let err = ResolveError::from(StorageError::integrity("dangling key")).into_graphql_error();
        assert_eq!(err.message, UNHANDLED_ERROR_MESSAGE);

        let err = ResolveError::MissingSession.into_graphql_error();
        assert_eq!(err.message, UNHANDLED_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ResolveError::not_found("Dataset", 1).error_code(), "NOT_FOUND");
        assert_eq!(ResolveError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(ResolveError::internal("boom").error_code(), "UNHANDLED_ERROR");
    }

    #[test]
    fn test_binding_error_field() {
        let err = BindingError::ListByIdReturn {
            field: "fetchDatasetById".into(),
        };
        assert_eq!(err.field(), "fetchDatasetById");
        assert!(err.to_string().starts_with("Fetch..ById Query members cannot be lists"));
    }
}
