//! iotsim - operator console for the IoT simulator
//!
//! Picks a monitored person, manages which of their devices take part in a
//! simulation, runs the simulation while following its statistics, and
//! triggers one-off sensor readings.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iotsim_client::{DirectoryClient, SimulatorClient};
use iotsim_session::{FileStore, SessionController};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{CliOverrides, Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "iotsim")]
#[command(author, version, about = "IoT Simulator operator console")]
#[command(propagate_version = true)]
struct Cli {
    /// Simulator backend URL
    #[arg(short, long, env = "IOTSIM_BACKEND")]
    backend: Option<String>,

    /// Directory service URL
    #[arg(short, long, env = "IOTSIM_DIRECTORY")]
    directory: Option<String>,

    /// Directory API key
    #[arg(long, env = "IOTSIM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "IOTSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List monitored persons
    People,

    /// Show the devices of a person and which are selected
    Devices {
        /// Person email
        email: String,

        /// List the devices the simulator backend resolves for the person
        #[arg(long)]
        backend: bool,
    },

    /// Flip the selection of devices
    Toggle {
        /// Person email
        email: String,

        /// Device ID(s)
        #[arg(required = true)]
        devices: Vec<String>,
    },

    /// Select all or none of a person's devices
    Select {
        /// Person email
        email: String,

        /// Select every device
        #[arg(long, conflicts_with = "none")]
        all: bool,

        /// Clear the selection (a simulation then includes all devices)
        #[arg(long)]
        none: bool,
    },

    /// List data types of the single selected device
    Types {
        /// Person email
        email: String,
    },

    /// Run a simulation and follow its statistics
    Run {
        /// Person email
        email: String,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Generate one sensor reading for the single selected device
    Generate {
        /// Person email
        email: String,

        /// Data type (e.g. heart_rate)
        data_type: String,
    },

    /// Show the server-side status of a simulation
    Status {
        /// Simulation ID
        simulation_id: String,
    },

    /// Stop a simulation by ID
    Stop {
        /// Simulation ID
        simulation_id: String,
    },

    /// List the geofence places of a person
    Places {
        /// Person email
        email: String,
    },

    /// Forget the saved person and device selection
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(CliOverrides {
        backend_url: cli.backend.as_deref(),
        directory_url: cli.directory.as_deref(),
        api_key: cli.api_key.as_deref(),
        output: cli.output,
        no_color: cli.no_color,
    });

    // Create output context
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);

    // Execute command
    match &cli.command {
        Commands::People => {
            let directory = create_directory(&merged)?;
            commands::people(&directory, &ctx).await?;
        }

        Commands::Devices {
            email,
            backend: true,
        } => {
            let client = create_client(&merged)?;
            let directory = create_directory(&merged)?;
            commands::backend_devices(&client, &directory, email, &ctx).await?;
        }

        Commands::Devices {
            email,
            backend: false,
        } => {
            let mut session = create_session(&merged)?;
            let result = commands::devices(&mut session, email, &ctx).await;
            session.dispose().await;
            result?;
        }

        Commands::Toggle { email, devices } => {
            let mut session = create_session(&merged)?;
            let result = commands::toggle(&mut session, email, devices, &ctx).await;
            session.dispose().await;
            result?;
        }

        Commands::Select { email, all, none } => {
            let mut session = create_session(&merged)?;
            let result = commands::select(&mut session, email, *all, *none, &ctx).await;
            session.dispose().await;
            result?;
        }

        Commands::Types { email } => {
            let mut session = create_session(&merged)?;
            let result = commands::types(&mut session, email, &ctx).await;
            session.dispose().await;
            result?;
        }

        Commands::Run { email, duration } => {
            let mut session = create_session(&merged)?;
            let result = commands::run(
                &mut session,
                email,
                *duration,
                merged.session.poll_interval(),
                &ctx,
            )
            .await;
            session.dispose().await;
            result?;
        }

        Commands::Generate { email, data_type } => {
            let mut session = create_session(&merged)?;
            let result = commands::generate(&mut session, email, data_type, &ctx).await;
            session.dispose().await;
            result?;
        }

        Commands::Status { simulation_id } => {
            let client = create_client(&merged)?;
            commands::status(&client, simulation_id, &ctx).await?;
        }

        Commands::Stop { simulation_id } => {
            let client = create_client(&merged)?;
            commands::stop(&client, simulation_id, &ctx).await?;
        }

        Commands::Places { email } => {
            let client = create_client(&merged)?;
            let directory = create_directory(&merged)?;
            commands::places(&client, &directory, email, &ctx).await?;
        }

        Commands::Reset => {
            commands::reset(&merged.preferences_path, &ctx)?;
        }
    }

    Ok(())
}

/// Create a simulator backend client
fn create_client(config: &MergedConfig) -> Result<SimulatorClient> {
    SimulatorClient::new(&config.backend_url).context("Failed to create simulator client")
}

/// Create a directory client, authenticated when an API key is configured
fn create_directory(config: &MergedConfig) -> Result<DirectoryClient> {
    let client = match &config.api_key {
        Some(key) => DirectoryClient::with_api_key(&config.directory_url, key),
        None => DirectoryClient::new(&config.directory_url),
    };
    client.context("Failed to create directory client")
}

/// Create a session backed by the configured services and preferences file
fn create_session(config: &MergedConfig) -> Result<SessionController> {
    Ok(SessionController::new(
        Arc::new(create_directory(config)?),
        Arc::new(create_client(config)?),
        Arc::new(FileStore::new(&config.preferences_path)),
        config.session.clone(),
    ))
}
