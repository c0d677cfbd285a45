pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{LazyDatabase, PgStore, PoolSettings, ShelterStore};

#[derive(Parser)]
#[command(name = "shelterctl")]
#[command(about = "OpenShelter administration - staff accounts and maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Staff account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Run against the database named by the environment.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let db = Arc::new(LazyDatabase::from_env(PoolSettings::from(&config.database)));
    let store = PgStore::new(db.clone());

    let result = run_with(cli, &store).await;
    db.close().await;
    result
}

/// Run against an already constructed store.
pub async fn run_with(cli: Cli, store: &dyn ShelterStore) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::User { cmd } => commands::user::handle(cmd, store, output_format).await,
    }
}
