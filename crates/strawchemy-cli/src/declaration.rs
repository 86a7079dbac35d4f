//! Declaration files: models plus Query / Mutation roots in TOML.
//!
//! ```toml
//! [[models]]
//! name = "Crs"
//! lookup = true
//! fields = [{ name = "id", type = "int" }, { name = "name", type = "str" }]
//!
//! [query]
//! fields = [{ name = "FetchAllCrs", type = "List<Crs>" }]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use strawchemy_core::{ModelRegistry, ModelType, RootDeclaration};
use strawchemy_graphql::{StrawchemyBuilder, StrawchemyConfig, StrawchemySchema};

#[derive(Debug, Deserialize)]
pub struct Declaration {
    #[serde(default)]
    pub models: Vec<ModelType>,
    #[serde(default)]
    pub query: RootDeclaration,
    #[serde(default)]
    pub mutation: Option<RootDeclaration>,
}

impl Declaration {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read declaration file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid declaration file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Runs the full pipeline: registry, validation, binding and synthesis.
    pub fn build(self, config: StrawchemyConfig) -> Result<StrawchemySchema> {
        let registry = ModelRegistry::from_models(self.models)?;
        let mut builder = StrawchemyBuilder::new(registry).query(self.query).config(config);
        if let Some(mutation) = self.mutation {
            builder = builder.mutation(mutation);
        }
        Ok(builder.build()?)
    }
}
