mod cli;
mod config;
mod export;
mod import;
mod init;
mod model;
mod save;
mod show;
mod store;
mod template;
mod translate;
mod utils;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init::run(args)?,
        Commands::Show(args) => show::run(args)?,
        Commands::Save(args) => save::run(args)?,
        Commands::Export(args) => export::run(args)?,
        Commands::Template(args) => template::run(args)?,
        Commands::Import(args) => import::run(args)?,
        Commands::Translate(args) => translate::run(args)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}
