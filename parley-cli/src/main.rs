//! # Parley CLI
//!
//! Command-line chat client for the Parley server.
//!
//! This CLI provides commands for:
//! - Account management (login, register, logout, whoami)
//! - Browsing message history and the user list
//! - Interactive chat over the real-time channel

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod commands;
mod session;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use parley_core::config::{ConfigLoader, ParleyConfig};
use parley_telemetry::logging::{LogConfig, LogFormat, init_logging};
use parley_telemetry::spans::command_span;
use tracing::Instrument;
use tracing_appender::non_blocking::WorkerGuard;

use commands::{Context, auth, chat, history};

/// Parley - terminal client for the Parley chat server
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (YAML, TOML or JSON)
    #[arg(short, long, global = true, default_value = "parley.yaml")]
    config: String,

    /// Override the REST API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Override the WebSocket endpoint
    #[arg(long, global = true)]
    ws_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login(auth::LoginArgs),

    /// Create an account and store the session token
    Register(auth::RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List registered users
    Users,

    /// Show message history
    History(history::HistoryArgs),

    /// Join the live chat
    Chat(chat::ChatArgs),

    /// Show configuration and server status
    Info,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Users => "users",
            Self::History(_) => "history",
            Self::Chat(_) => "chat",
            Self::Info => "info",
        }
    }
}

fn load_config(cli: &Cli) -> Result<ParleyConfig> {
    let mut config: ParleyConfig = ConfigLoader::new()
        .with_env_prefix("PARLEY")
        .load_or_default(Some(&cli.config))
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    if let Some(url) = &cli.api_url {
        config.server.api_url.clone_from(url);
    }
    if let Some(url) = &cli.ws_url {
        config.server.ws_url.clone_from(url);
    }
    Ok(config)
}

fn setup_logging(config: &ParleyConfig, verbose: bool) -> Result<Vec<WorkerGuard>> {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let format: LogFormat = config
        .logging
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut log_config = LogConfig::new(level, format);
    if let Some(directory) = &config.logging.directory {
        log_config = log_config.with_file(directory.clone());
    }
    init_logging(&log_config).context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let _guards = setup_logging(&config, cli.verbose)?;
    let ctx = Context::new(config);

    let span = command_span(cli.command.name());
    run(&ctx, cli.command).instrument(span).await
}

async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => auth::login(ctx, args).await?,
        Commands::Register(args) => auth::register(ctx, args).await?,
        Commands::Logout => auth::logout(ctx)?,
        Commands::Whoami => auth::whoami(ctx)?,
        Commands::Users => history::users(ctx).await?,
        Commands::History(args) => history::history(ctx, args).await?,
        Commands::Chat(args) => chat::run(ctx, args).await?,
        Commands::Info => print_info(ctx).await,
    }
    Ok(())
}

async fn print_info(ctx: &Context) {
    let config = ctx.config();
    println!("Parley Chat Client");
    println!("==================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Server:");
    println!("  REST API:  {}", config.server.api_url);
    println!("  WebSocket: {}", config.server.ws_url);

    let status = match ctx.api() {
        Ok(api) => match api.health().await {
            Ok(status) => status,
            Err(e) => format!("unreachable ({e})"),
        },
        Err(e) => format!("unavailable ({e})"),
    };
    println!("  Status:    {status}");
    println!();
    println!("Connection:");
    println!(
        "  Reconnect: {} (up to {} attempts, {}ms base delay)",
        if config.connection.reconnect_enabled { "on" } else { "off" },
        config.connection.max_reconnect_attempts,
        config.connection.reconnect_delay_ms
    );
    println!("  Heartbeat: {}ms", config.connection.heartbeat_interval_ms);
    println!();
    println!("Session file: {}", ctx.session().path().display());
    match ctx.session().load() {
        Ok(Some(stored)) => println!("Logged in as: {}", stored.user.username),
        Ok(None) => println!("Logged in as: (nobody)"),
        Err(e) => println!("Logged in as: unknown ({e:#})"),
    }
}
