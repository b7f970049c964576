//! Operator entry point for the establishment store.
//!
//! # Responsibility
//! - Load configuration, initialise logging and open the configured database.
//! - Offer small maintenance commands: liveness, migrations, row counts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use establishment_core::db::migrations::{current_user_version, latest_version};
use establishment_core::db::{open_configured, Connection};
use establishment_core::repo::EstablishmentKind;
use establishment_core::{
    init_logging_from_config, AttractionDetails, Config, EstablishmentRepository, HotelDetails,
    Page, RestaurantDetails, SqliteEstablishmentRepository,
};
use std::path::PathBuf;

/// Establishment store maintenance tool
#[derive(Parser)]
#[command(name = "establishment")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults to ./establishment.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core liveness and version
    Ping,
    /// Open the database, apply pending migrations and print the schema version
    Migrate,
    /// Print active row counts per establishment kind
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            anyhow::bail!("config file does not exist: {}", path.display());
        }
    }

    match cli.command {
        Commands::Ping => {
            println!("establishment_core ping={}", establishment_core::ping());
            println!(
                "establishment_core version={}",
                establishment_core::core_version()
            );
            Ok(())
        }
        Commands::Migrate => {
            let config = load(cli.config)?;
            let conn = open_configured(&config.db).context("failed to open database")?;
            println!(
                "schema version={} latest={}",
                current_user_version(&conn)?,
                latest_version()
            );
            Ok(())
        }
        Commands::Stats => {
            let config = load(cli.config)?;
            let conn = open_configured(&config.db).context("failed to open database")?;
            print_count::<AttractionDetails>(&conn, &config)?;
            print_count::<HotelDetails>(&conn, &config)?;
            print_count::<RestaurantDetails>(&conn, &config)?;
            Ok(())
        }
    }
}

fn load(path: Option<PathBuf>) -> Result<Config> {
    let config = Config::try_load_from_file_or_default(path).context("failed to load config")?;
    if init_logging_from_config(&config.log).map_err(anyhow::Error::msg)? {
        log::info!("event=cli_start module=cli status=ok");
    }
    Ok(config)
}

fn print_count<K: EstablishmentKind>(conn: &Connection, config: &Config) -> Result<()> {
    let repo = SqliteEstablishmentRepository::<K>::with_options(conn, config.store.options)?;
    let listing = repo.list(Page::new(0, 1), config.store.deadline())?;
    println!("{}={}", K::CATEGORY, listing.total);
    Ok(())
}
