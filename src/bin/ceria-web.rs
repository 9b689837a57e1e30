// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ceria API server
//!
//! Standalone HTTP server without the rest of the command line.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use ceria::config::AppConfig;
use ceria::db::Database;
use ceria::{seed, Result};

#[derive(Parser, Debug)]
#[command(name = "ceria-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Ceria API Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Seed the catalog on startup
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Ceria API v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&args.config)?;

    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    config.validate()?;

    let db = Database::open(&config.database.path)?;
    info!("Database: {}", config.database.path);

    if args.seed {
        let report = seed::seed_all(&db)?;
        info!("Seeded {} activities", report.activities);
    }

    ceria::web::start_server(config, db).await
}
