use clap::Parser;
use dynabase_core::{Error, config::DynabaseConfig};
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.display_with_class());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => DynabaseConfig::load(path)?,
        None => DynabaseConfig::default(),
    };
    if let Some(path) = cli.db {
        config.store.path = path;
    }
    if cli.debug {
        config.log.debug = true;
    }

    let ctx = commands::Context::new(config, cli.table.as_deref());

    match cli.command {
        Commands::Schema { sqlite } => commands::schema(sqlite),
        Commands::Setup => commands::setup(&ctx),
        Commands::Normalize { field, embedding } => commands::normalize(&ctx, &field, embedding),
        Commands::Check { field } => commands::check(&ctx, &field),
        Commands::Register {
            field,
            no_normalize,
            timeout_ms,
        } => commands::register(&ctx, &field, !no_normalize, timeout_ms),
        Commands::Lookup { label } => commands::lookup(&ctx, &label),
        Commands::Unregister { label } => commands::unregister(&ctx, &label),
        Commands::CatalogLabel { field } => commands::catalog_label(&ctx, &field),
        Commands::CatalogField { label } => commands::catalog_field(&ctx, &label),
    }
}
