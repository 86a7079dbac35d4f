use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "strawchemy")]
#[command(about = "Validate model declarations and render the derived GraphQL and relational schemas")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./strawchemy.toml when present)
    #[arg(short, long, global = true, env = "STRAWCHEMY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a declaration file and summarize what it derives
    Validate(ModelsArgs),
    /// Print the GraphQL SDL
    Sdl(ModelsArgs),
    /// Print the CREATE TABLE statements
    Ddl(ModelsArgs),
}

impl Commands {
    pub fn models(&self) -> &ModelsArgs {
        match self {
            Self::Validate(args) | Self::Sdl(args) | Self::Ddl(args) => args,
        }
    }
}

#[derive(clap::Args)]
pub struct ModelsArgs {
    /// TOML file declaring the models and root operations
    #[arg(short, long)]
    pub models: PathBuf,
}
