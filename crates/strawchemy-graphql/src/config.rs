//! Strawchemy configuration.
//!
//! Can be loaded from `strawchemy.toml` and overridden by `STRAWCHEMY__...`
//! environment variables (see the CLI).
//!
//! # Example Configuration
//!
//! ```toml
//! eager_load = true
//! fetch_by_ids_partial_miss = "skip"
//!
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::SchemaBuilderConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrawchemyConfig {
    #[serde(default)]
    pub graphql: GraphQLConfig,

    /// Pre-load relations named by the request's selection set.
    /// Default: true
    #[serde(default = "default_eager_load")]
    pub eager_load: bool,

    /// What a fetch-all field does with `ids` that match no row.
    /// Default: skip
    #[serde(default)]
    pub fetch_by_ids_partial_miss: PartialMissPolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Policy for ids passed to a fetch-all field that do not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialMissPolicy {
    /// Fail the field with a not-found error.
    Error,
    /// Return the rows that exist.
    #[default]
    Skip,
}

/// GraphQL execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    /// Default: info
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_eager_load() -> bool {
    true
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StrawchemyConfig {
    fn default() -> Self {
        Self {
            graphql: GraphQLConfig::default(),
            eager_load: default_eager_load(),
            fetch_by_ids_partial_miss: PartialMissPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StrawchemyConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.graphql.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.graphql.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        Ok(())
    }
}

impl GraphQLConfig {
    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }
}
