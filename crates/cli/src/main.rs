//! Pinmap CLI - Database migrations and geocode cache tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pinmap-cli migrate
//!
//! # Resolve an address through the cache (and the provider on a miss)
//! pinmap-cli geocode "東京都千代田区１−１"
//!
//! # Show the cache key an address normalizes to
//! pinmap-cli normalize "東京都千代田区１−１"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `geocode` - Warm or inspect the geocode cache
//! - `normalize` - Print the normalized form of an address

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pinmap-cli")]
#[command(author, version, about = "Pinmap CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Resolve addresses and store them in the geocode cache
    Geocode {
        /// Addresses to resolve, as they would be submitted
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Print the normalized form of an address
    Normalize {
        /// Raw address text
        address: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Geocode { addresses } => commands::geocode::run(&addresses).await?,
        Commands::Normalize { address } => commands::normalize::run(&address),
    }
    Ok(())
}
