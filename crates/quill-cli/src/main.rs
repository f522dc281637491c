//! quill - local-first notebooks for the terminal
//!
//! Notes live in books inside a local `SQLite` store and are synced with a
//! quill server on demand.

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::list::run_list;
use crate::commands::remove::run_remove;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive: Directive = "quill=info"
        .parse()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Add { book, content } => run_add(&book, &content, &db_path)?,
        Commands::List { book, json } => run_list(book.as_deref(), json, &db_path)?,
        Commands::Remove { id } => run_remove(&id, &db_path)?,
        Commands::Sync { full, pull_only } => {
            run_sync(full, pull_only, cli.profile.as_deref(), &db_path).await?;
        }
        Commands::Config { command } => run_config(command, cli.profile.as_deref())?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
