// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ceria: gamified multilingual learning backend
//!
//! Command line for serving the API, seeding the curriculum, managing
//! accounts and running asset generation batches.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ceria::ai::{GeminiClient, GenerativeAi};
use ceria::config::AppConfig;
use ceria::db::{Database, NewKid};
use ceria::generation::{BatchRequest, BatchResponse, Generator, ItemStatus};
use ceria::locale::Locale;
use ceria::media::MediaStore;
use ceria::prompts::Prompts;
use ceria::{seed, web, Result};

/// Ceria CLI - gamified learning backend
#[derive(Parser, Debug)]
#[command(name = "ceria")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Gamified multilingual learning backend", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Seed the catalog before serving
        #[arg(long)]
        seed: bool,
    },

    /// Insert or refresh the starter curriculum and reward catalogs
    Seed,

    /// Parent account operations
    Parent {
        #[command(subcommand)]
        action: ParentCommands,
    },

    /// Kid profile operations
    Kid {
        #[command(subcommand)]
        action: KidCommands,
    },

    /// Show the global leaderboard
    Leaderboard {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Generate media assets with the AI service
    Generate {
        /// What to generate
        target: GenerateTarget,

        /// First list index to process
        #[arg(long, default_value = "0")]
        start: usize,

        /// Items per batch
        #[arg(long)]
        count: Option<usize>,

        /// Language (audio only)
        #[arg(short, long)]
        locale: Option<Locale>,

        /// Keep going until the list is exhausted
        #[arg(long)]
        all: bool,

        /// Skip items that already have a file
        #[arg(long)]
        skip_existing: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show AI and database status
    Status {
        /// Send a short request to the text model
        #[arg(long)]
        probe: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum GenerateTarget {
    Audio,
    Vocab,
    Equipment,
    Pets,
    Alphabet,
}

#[derive(Subcommand, Debug)]
enum ParentCommands {
    /// Register a parent and print their API token
    Create {
        email: String,

        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum KidCommands {
    /// List all kids
    List,

    /// Add a kid to a parent account
    Create {
        /// Owning parent id
        #[arg(long)]
        parent: String,

        name: String,

        #[arg(short, long, default_value = "ms")]
        locale: Locale,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Show database statistics
    Stats,

    /// Vacuum database (reclaim space)
    Vacuum,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if !cli.quiet {
        info!("Ceria v{}", env!("CARGO_PKG_VERSION"));
    }

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Serve { host, port, seed }) => run_serve(config, host, port, seed).await,
        Some(Commands::Seed) => run_seed(&config),
        Some(Commands::Parent { action }) => run_parent_command(&config, action),
        Some(Commands::Kid { action }) => run_kid_command(&config, action),
        Some(Commands::Leaderboard { limit }) => run_leaderboard(&config, limit),
        Some(Commands::Generate { target, start, count, locale, all, skip_existing }) => {
            let request = BatchRequest { start_index: start, count, locale, skip_existing };
            run_generate(&config, target, request, all).await
        }
        Some(Commands::Db { action }) => run_db_command(&config, action),
        Some(Commands::Config { action }) => run_config_command(&config, action, &cli.config),
        Some(Commands::Status { probe }) => run_status(&config, probe).await,
        None => run_serve(config, None, None, false).await,
    }
}

async fn run_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>, seed: bool) -> Result<()> {
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }
    config.validate()?;

    let db = Database::open(&config.database.path)?;
    info!("Database: {}", config.database.path);
    if seed {
        seed::seed_all(&db)?;
    }
    if config.auth.service_key.is_none() {
        warn!("CERIA_SERVICE_KEY not set; generation endpoints are disabled");
    }

    web::start_server(config, db).await
}

fn run_seed(config: &AppConfig) -> Result<()> {
    let db = Database::open(&config.database.path)?;
    let report = seed::seed_all(&db)?;
    println!(
        "Seeded {} subjects, {} themes, {} activities, {} equipment, {} pets",
        report.subjects, report.themes, report.activities, report.equipment, report.pets
    );
    Ok(())
}

fn run_parent_command(config: &AppConfig, action: ParentCommands) -> Result<()> {
    let db = Database::open(&config.database.path)?;
    match action {
        ParentCommands::Create { email, name } => {
            let (parent, token) = db.create_parent(&email, &name)?;
            println!("Parent created: {}", parent.id);
            println!("  Email: {}", parent.email);
            println!("  Token: {}", token);
            println!("\nThe token is shown once; store it now.");
        }
    }
    Ok(())
}

fn run_kid_command(config: &AppConfig, action: KidCommands) -> Result<()> {
    let db = Database::open(&config.database.path)?;
    match action {
        KidCommands::List => {
            let kids = db.list_all_kids()?;
            println!("Kids ({}):", kids.len());
            for kid in kids {
                println!(
                    "  {} {:<20} [{}] level {} ({} XP)",
                    kid.id, kid.name, kid.locale, kid.level, kid.total_xp
                );
            }
        }
        KidCommands::Create { parent, name, locale } => {
            let kid = db.create_kid(&parent, &NewKid { name, avatar_url: None, locale })?;
            println!("Kid created: {} ({})", kid.id, kid.name);
        }
    }
    Ok(())
}

fn run_leaderboard(config: &AppConfig, limit: usize) -> Result<()> {
    let db = Database::open(&config.database.path)?;
    for entry in db.leaderboard(limit)? {
        println!("{:>3}. {:<20} level {:>3}  {:>6} XP", entry.rank, entry.name, entry.level, entry.total_xp);
    }
    Ok(())
}

fn print_batch(response: &BatchResponse) {
    for item in &response.results {
        match item.status {
            ItemStatus::Generated => println!("  ✓ {} → {}", item.key, item.url.as_deref().unwrap_or("-")),
            ItemStatus::Skipped => println!("  - {} (exists)", item.key),
            ItemStatus::Failed => println!("  ✗ {}: {}", item.key, item.error.as_deref().unwrap_or("unknown error")),
        }
    }
}

async fn run_generate(config: &AppConfig, target: GenerateTarget, mut request: BatchRequest, all: bool) -> Result<()> {
    let client = GeminiClient::new(&config.ai)?;
    let db = Database::open(&config.database.path)?;
    let media = MediaStore::from_config(&config.media);
    let prompts = Prompts::new()?;
    let generator = Generator::new(&client, &db, &media, &prompts, config);

    loop {
        let response = match target {
            GenerateTarget::Audio => generator.audio_batch(&request).await?,
            GenerateTarget::Vocab => generator.vocab_batch(&request).await?,
            GenerateTarget::Equipment => generator.equipment_batch(&request).await?,
            GenerateTarget::Pets => generator.pets_batch(&request).await?,
            GenerateTarget::Alphabet => generator.alphabet_batch(&request).await?,
        };
        print_batch(&response);
        println!(
            "Processed {} of {} (next index: {})",
            response.processed,
            response.total,
            response.next_index.map(|i| i.to_string()).unwrap_or_else(|| "done".to_string())
        );

        match response.next_index {
            Some(next) if all => request.start_index = next,
            _ => break,
        }
    }
    Ok(())
}

fn run_db_command(config: &AppConfig, action: DbCommands) -> Result<()> {
    let db = Database::open(&config.database.path)?;

    match action {
        DbCommands::Stats => {
            let stats = db.get_stats()?;
            println!("Database Statistics:");
            println!("  Parents: {}", stats.parents);
            println!("  Kids: {}", stats.kids);
            println!("  Subjects / themes / activities: {} / {} / {}", stats.subjects, stats.themes, stats.activities);
            println!("  Completed activities: {}", stats.completed_activities);
            println!("  Equipment: {}", stats.equipment);
            println!("  Pets: {}", stats.pets);
            println!("  Media assets: {}", stats.media_assets);
        }
        DbCommands::Vacuum => {
            db.vacuum()?;
            println!("Database vacuumed successfully");
        }
    }

    Ok(())
}

fn run_config_command(config: &AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Text model: {}", config.ai.models.text);
            println!("  Database: {}", config.database.path);
            println!("  AI key: {}", if config.ai_available() { "set" } else { "missing" });
        }
    }

    Ok(())
}

async fn run_status(config: &AppConfig, probe: bool) -> Result<()> {
    println!("Ceria v{} Status", env!("CARGO_PKG_VERSION"));
    println!("======================");

    if config.ai_available() {
        println!("AI: key configured ({})", config.ai.base_url);
        if probe {
            let client = GeminiClient::new(&config.ai)?;
            match client.generate_text("Reply with the single word: ok").await {
                Ok(reply) => println!("  Probe: {}", reply.trim()),
                Err(e) => println!("  Probe failed: {}", e),
            }
        }
    } else {
        println!("AI: unavailable (set GEMINI_API_KEY)");
    }

    match Database::open(&config.database.path) {
        Ok(db) => {
            let stats = db.get_stats()?;
            println!("\nDatabase ({}):", config.database.path);
            println!("  Kids: {}", stats.kids);
            println!("  Activities: {}", stats.activities);
            println!("  Media assets: {}", stats.media_assets);
        }
        Err(e) => println!("\nDatabase: ✗ Error - {}", e),
    }

    println!("\nModels:");
    println!("  Text: {}", config.ai.models.text);
    println!("  Vision: {}", config.ai.models.vision);
    println!("  Speech: {}", config.ai.models.tts);
    println!("  Image: {}", config.ai.models.image);

    if config.auth.service_key.is_none() {
        println!("\nAdmin: disabled (set CERIA_SERVICE_KEY)");
    }

    Ok(())
}
