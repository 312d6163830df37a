//! Veld CLI - capture solar leads and quotes from the terminal
//!
//! Works fully offline against the local store; remote configuration enables
//! write-through and background sync.

mod cli;
mod commands;
mod error;

use std::sync::Arc;

use clap::Parser;

use cli::{Cli, Commands, LeadCommands, QuoteCommands};
use commands::common::{build_repository, build_rest_client, resolve_db_path};
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("veld=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    // Completions need no database or identity
    if let Commands::Completions { shell, output } = &cli.command {
        return commands::completions::run_completions(*shell, output.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path);
    let repository = build_repository(&db_path).await?;

    match cli.command {
        Commands::Quote(QuoteCommands::Add(args)) => {
            let rest = build_rest_client()?;
            commands::quote::run_add(&repository, rest.as_ref(), args).await?;
        }
        Commands::Quote(QuoteCommands::List { json }) => {
            commands::quote::run_list(&repository, json).await?;
        }
        Commands::Quote(QuoteCommands::Delete { id }) => {
            commands::quote::run_delete(&repository, &id).await?;
        }
        Commands::Lead(LeadCommands::Add(args)) => {
            commands::lead::run_add(&repository, args).await?;
        }
        Commands::Lead(LeadCommands::List { json }) => {
            commands::lead::run_list(&repository, json).await?;
        }
        Commands::Lead(LeadCommands::Delete { id }) => {
            commands::lead::run_delete(&repository, &id).await?;
        }
        Commands::Sync => commands::sync::run_sync(&repository).await?,
        Commands::Status { json } => commands::sync::run_status(&repository, json).await?,
        Commands::Watch {
            probe_url,
            interval,
        } => {
            commands::watch::run_watch(Arc::new(repository), probe_url, interval).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
