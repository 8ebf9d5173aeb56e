//! erpgw
//!
//! Read-only HTTP gateway in front of an ERP's SQL Server database

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use erpgw_core::logging_facility;
use erpgw_server::secrets::{resolve_db_password, DB_PASSWORD_ENV};
use erpgw_server::{FileSecretStore, SecretStore};

#[derive(Debug, Parser)]
#[command(name = "erpgw")]
#[command(about = "ERP gateway - read-only SQL and price/stock over HTTP", long_about = None)]
struct Cli {
    /// Path to the config file (YAML, TOML or JSON)
    #[arg(short, long, default_value = "erpgw.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the gateway (default)
    Serve,
    /// Store the database password for the configured ERP, read from stdin
    SetDbPassword,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cli.config).await,
        Commands::SetDbPassword => set_db_password(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let config = erpgw_server::load(config_path)?;
    logging_facility::init(config.logging_profile()?);
    tracing::debug!(config = ?config, "configuration loaded");

    let store = FileSecretStore::beside(config_path);
    let password = resolve_db_password(
        &store,
        &config.db_password_key(),
        std::env::var(DB_PASSWORD_ENV).ok(),
    )?;

    erpgw_server::app::run(config, password).await
}

fn set_db_password(config_path: &Path) -> anyhow::Result<()> {
    let config = erpgw_server::load(config_path)?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);

    let key = config.db_password_key();
    FileSecretStore::beside(config_path).set(&key, password.as_bytes())?;
    println!("Stored {}", key);
    Ok(())
}
