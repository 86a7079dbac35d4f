use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use strawchemy_graphql::StrawchemyConfig;

const DEFAULT_CONFIG_FILE: &str = "strawchemy.toml";

/// Loads the configuration from `path` (or `./strawchemy.toml` when present),
/// then applies `STRAWCHEMY__...` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<StrawchemyConfig> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            builder = builder.add_source(File::from(p.to_path_buf()));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    // e.g. STRAWCHEMY__GRAPHQL__MAX_DEPTH=20
    builder = builder.add_source(
        Environment::with_prefix("STRAWCHEMY")
            .try_parsing(true)
            .separator("__"),
    );

    let config: StrawchemyConfig = builder
        .build()
        .context("config build error")?
        .try_deserialize()
        .context("config deserialize error")?;
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}
