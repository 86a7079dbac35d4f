mod cli;
mod config;
mod declaration;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use declaration::Declaration;
use output::{print_error, print_success};

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    let models = &cli.command.models().models;
    debug!(path = %models.display(), "Loading declarations");
    let schema = Declaration::load(models)?.build(config)?;

    match &cli.command {
        Commands::Validate(_) => {
            print_success(&format!("{} is valid", models.display()));
            println!("{}: {}", "Models".cyan(), schema.registry().len());
            println!("{}: {}", "Tables".cyan(), schema.storage_schema().len());
            println!("{}: {}", "API types".cyan(), schema.api_types().len());
            for binding in schema.bindings() {
                println!("  {} -> {} ({})", binding.field, binding.operation, binding.model);
            }
        }
        Commands::Sdl(_) => println!("{}", schema.sdl()),
        Commands::Ddl(_) => println!("{}", schema.ddl()),
    }

    Ok(())
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
