mod config;
mod parse_cmd;
mod serve_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use triplan_db::config::DbConfig;
use triplan_db::pool;

use config::{CliOverrides, TriplanConfig};

#[derive(Parser)]
#[command(name = "triplan", about = "Trip planning service: itinerary extraction and trip storage")]
struct Cli {
    /// Database URL (overrides TRIPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a triplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Base URL of the trip plan generator
        #[arg(long, default_value = config::DEFAULT_PLANNER_URL)]
        planner_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the triplan database (requires config file or env vars)
    DbInit,
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides config file)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Extract a daily plan from a route summary file and print it as JSON
    Parse {
        /// Path to the route summary text
        file: PathBuf,
        /// Trip start date (YYYY-MM-DD); day N falls on start + N - 1
        #[arg(long)]
        start_date: String,
    },
}

/// Execute the `triplan init` command: write config file.
fn cmd_init(db_url: &str, planner_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    cfg.database.url = db_url.to_string();
    cfg.planner.url = planner_url.to_string();

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  planner.url = {planner_url}");
    println!();
    println!("Next: run `triplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `triplan db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &TriplanConfig) -> anyhow::Result<()> {
    println!("Initializing triplan database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("triplan db-init complete.");
    Ok(())
}

/// Execute the `triplan serve` command: run the HTTP API until Ctrl+C.
async fn cmd_serve(resolved: &TriplanConfig) -> anyhow::Result<()> {
    let cors = serve_cmd::cors_layer(&resolved.allowed_origin)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    let state = serve_cmd::AppState {
        pool: db_pool.clone(),
        planner: Arc::new(resolved.planner()),
        extractor: Arc::new(resolved.extractor()?),
    };
    tracing::info!(
        planner = %resolved.planner_url,
        timeout = ?resolved.planner_timeout,
        "using trip planner"
    );

    let result = serve_cmd::run_serve(state, cors, &resolved.bind, resolved.port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `triplan parse` output stays valid JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            planner_url,
            force,
        } => {
            cmd_init(&db_url, &planner_url, force)?;
        }
        Commands::DbInit => {
            let resolved = TriplanConfig::resolve(&CliOverrides {
                database_url: cli.database_url,
                ..CliOverrides::default()
            })?;
            cmd_db_init(&resolved).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = TriplanConfig::resolve(&CliOverrides {
                database_url: cli.database_url,
                bind,
                port,
            })?;
            cmd_serve(&resolved).await?;
        }
        Commands::Parse { file, start_date } => {
            let resolved = TriplanConfig::resolve(&CliOverrides::default())?;
            let extractor = resolved.extractor()?;
            parse_cmd::run_parse(&extractor, &file, &start_date)?;
        }
    }

    Ok(())
}
