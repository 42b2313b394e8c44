//! zit - signal-timing backend
//!
//! Entry point for the `zit` binary:
//! - `zit serve` runs the HTTP API
//! - `zit migrate` creates the schema and exits
//!
//! Configuration comes from `zit.toml`, `.env`/`.env.dev` and `BACKEND__*`
//! environment variables.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use zit_core::db::migrations;
use zit_core::Config;
use zit_server::http::{run_server, ServerConfig};
use zit_server::tracing_setup::{init_tracing, TracingConfig};
use zit_server::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "zit",
    author,
    version,
    about = "Traffic-signal timing projects over a JSON API"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Create tables and indexes, then exit
    Migrate,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Run migrations before serving
    #[arg(long)]
    migrate: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    cors_permissive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_with_dotenv().context("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.db.url = Some(url);
    }

    init_tracing(&TracingConfig {
        debug: cli.debug,
        sql_echo: config.db.echo,
    })?;

    let state = AppState::new(config);
    state
        .db
        .connect()
        .await
        .context("Failed to connect to database")?;

    let outcome = match cli.command {
        Commands::Serve(args) => run_serve(Arc::clone(&state), args).await,
        Commands::Migrate => migrations::run(&state.db)
            .await
            .context("Failed to run migrations"),
    };

    state.db.disconnect().await;
    outcome
}

/// Run the HTTP server
async fn run_serve(state: Arc<AppState>, args: ServeArgs) -> Result<()> {
    if args.migrate {
        migrations::run(&state.db)
            .await
            .context("Failed to run migrations")?;
    }

    info!("Starting zit server on {}", args.bind);

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Run server (blocks until shutdown)
    run_server(state, config).await.context("Server error")?;

    Ok(())
}
