//! Bozor CLI - database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront and session-store migrations
//! bozor-cli migrate
//!
//! # Load categories and products from a YAML file
//! bozor-cli seed catalog.yaml
//!
//! # Delete a row, cascading to its dependents
//! bozor-cli delete category 3
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bozor_core::relations::Entity;

mod commands;

#[derive(Parser)]
#[command(name = "bozor-cli")]
#[command(author, version, about = "Bozor CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert categories, products and gallery images from a YAML file
    Seed {
        /// Path to the catalog file
        file: PathBuf,
    },
    /// Delete a row; dependent rows are deleted or detached
    Delete {
        /// Entity name, e.g. `category`, `product`, `user`, `order`
        entity: Entity,
        /// Primary key
        id: i32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Delete { entity, id } => commands::delete::run(entity, id).await?,
    }
    Ok(())
}
