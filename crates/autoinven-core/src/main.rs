//! AutoInven CLI
//!
//! Command-line interface for the AutoInven inventory backend.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use autoinven::alerting::{AlertService, AlertSource};
use autoinven::api::HttpServer;
use autoinven::db::Database;
use autoinven::models::AlertCheck;
use autoinven::Config;

/// AutoInven - Inventory and bill management
#[derive(Parser)]
#[command(name = "autoinven")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "AUTOINVEN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate, run startup alert checks and serve the HTTP API
    Serve {
        /// HTTP API port (overrides server.port)
        #[arg(long, env = "AUTOINVEN_HTTP_PORT")]
        port: Option<u16>,
    },

    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Alert checks
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run database migrations, then the startup alert checks
    Migrate,
}

#[derive(Subcommand)]
enum AlertsCommands {
    /// Run both alert checks once and print the outcome
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Execute command
    let result = match cli.command {
        Commands::Serve { port } => run_serve(config, port).await,
        Commands::Db {
            command: DbCommands::Migrate,
        } => run_migrate(config).await,
        Commands::Alerts {
            command: AlertsCommands::Check,
        } => run_alerts_check(config, cli.format).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn connect(config: &Config) -> anyhow::Result<(Database, AlertService)> {
    let db = Database::new(config).await?;
    db.health_check().await?;

    let source: Arc<dyn AlertSource> = Arc::new(db.inventory());
    let alerts = AlertService::from_config(config, source)?;

    Ok((db, alerts))
}

async fn run_serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let (db, alerts) = connect(&config).await?;

    db.migrate().await?;
    info!("Database migrations applied");

    if config.alerting.check_on_startup {
        alerts.on_startup().await;
    }

    let addr = format!(
        "{}:{}",
        config.server.host,
        port.unwrap_or(config.server.port)
    );
    info!("Starting AutoInven on {}", addr);

    let server = HttpServer::new(db.inventory(), alerts);

    tokio::select! {
        result = server.serve(&addr) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}

async fn run_migrate(config: Config) -> anyhow::Result<()> {
    let (db, alerts) = connect(&config).await?;

    db.migrate().await?;
    println!("Migrations applied.");

    if config.alerting.check_on_startup {
        alerts.on_startup().await;
    }

    Ok(())
}

async fn run_alerts_check(config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let (_db, alerts) = connect(&config).await?;

    let checks = alerts.check_all().await;
    print_checks(&checks, format)?;

    Ok(())
}

fn print_checks(checks: &[AlertCheck], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(checks)?),
        OutputFormat::Text => {
            for check in checks {
                println!("{:<14} {}", check.kind.as_str(), check.result);
            }
        }
    }
    Ok(())
}
