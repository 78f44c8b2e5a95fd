//! CLI entry and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mlrec_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "MLREC_LOG";

#[derive(Parser)]
#[command(name = "mlrec")]
#[command(version)]
#[command(about = "Command-line client for the movie recommendation ML service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the ML service (overrides config)
    #[arg(long, global = true, env = "MLREC_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Bearer token to use instead of the stored credential
    #[arg(long, global = true, env = "MLREC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Write the rendered HTML to a file instead of stdout
    #[arg(long, global = true, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Train the recommendation model on the server
    Train,
    /// Show personalized movie recommendations
    Recommend,
    /// Show the ML system status
    Status,
    /// Predict your rating for a movie
    Predict {
        /// Movie identifier
        #[arg(value_name = "MOVIE_ID")]
        movie_id: i64,
    },
    /// Show status and recommendations side by side
    Dashboard,

    /// Log in and store the access token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "MLREC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the stored access token
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print the effective configuration
    Show,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = config::Config::load().context("load config")?;

    let Cli {
        command,
        base_url,
        token,
        out,
        verbose: _,
    } = cli;

    let ctx = commands::RunContext {
        config: &config,
        base_url: base_url.as_deref(),
        token: token.as_deref(),
        out: out.as_deref(),
    };

    match command {
        Commands::Train => commands::ml::train(&ctx).await,
        Commands::Recommend => commands::ml::recommend(&ctx).await,
        Commands::Status => commands::ml::status(&ctx).await,
        Commands::Predict { movie_id } => commands::ml::predict(&ctx, movie_id).await,
        Commands::Dashboard => commands::ml::dashboard(&ctx).await,

        Commands::Login { username, password } => {
            commands::auth::login(&ctx, &username, &password).await
        }
        Commands::Logout => commands::auth::logout(),

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(ExitCode::SUCCESS)
            }
            ConfigCommands::Init => commands::config::init().map(|()| ExitCode::SUCCESS),
            ConfigCommands::Show => commands::config::show(&config).map(|()| ExitCode::SUCCESS),
        },
    }
}
