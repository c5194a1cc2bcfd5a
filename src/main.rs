//! Hearthboard - Family Message Board Backend
//!
//! Serves a shared family message board: notes and recorded media stored as
//! plain files in a git-versioned directory, synchronized across devices
//! through an ordinary git remote.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hearthboard::{
    bridge::BridgeBuilder,
    config::BoardConfig,
    device::device_identity,
    history::{GitCli, HistoryBackend},
    store::{types, ArtifactStore},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hearthboard")]
#[command(version)]
#[command(about = "Family message board backend")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HEARTHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Store directory override
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Disable the background sync poller
        #[arg(long)]
        no_sync: bool,
    },

    /// Post a note to the board from the command line
    Post {
        /// Note content
        message: String,

        /// Store directory override
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List board artifacts, oldest first
    List {
        /// Store directory override
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Run diagnostics
    Doctor,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hearthboard={},tower_http=warn", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            dir,
            no_sync,
        } => {
            run_serve(config, host, port, dir, no_sync).await?;
        }
        Commands::Post { message, dir } => {
            run_post(config, &message, dir).await?;
        }
        Commands::List { dir } => {
            run_list(config, dir).await?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<BoardConfig> {
    if let Some(path) = path {
        return Ok(BoardConfig::load(path)?);
    }
    if let Some(path) = default_config_path() {
        if path.exists() {
            return Ok(BoardConfig::load(&path)?);
        }
    }
    Ok(BoardConfig::default())
}

fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join("hearthboard").join("config.toml"))
}

async fn run_serve(
    mut config: BoardConfig,
    host: Option<String>,
    port: Option<u16>,
    dir: Option<PathBuf>,
    no_sync: bool,
) -> Result<()> {
    if let Some(host) = host {
        config.bridge.host = host;
    }
    if let Some(port) = port {
        config.bridge.port = port;
    }
    if let Some(dir) = dir {
        config.store.dir = dir;
    }
    if no_sync {
        config.sync.enabled = false;
    }

    tracing::info!("Starting Hearthboard bridge");
    let bridge = BridgeBuilder::new().config(config).build().await?;
    bridge.start().await?;

    tracing::info!("Hearthboard is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    bridge.stop().await;

    Ok(())
}

/// Open a store directly for the one-shot CLI commands.
async fn open_store(config: &BoardConfig, dir: Option<PathBuf>) -> Result<ArtifactStore> {
    let dir = dir.unwrap_or_else(|| config.store.dir.clone());
    let device = config
        .store
        .device
        .clone()
        .unwrap_or_else(device_identity);
    let history: Arc<dyn HistoryBackend> = Arc::new(
        GitCli::new(&dir)
            .remote(&config.sync.remote)
            .branches(config.sync.branches.clone()),
    );
    Ok(ArtifactStore::open(dir, device, history).await?)
}

async fn run_post(config: BoardConfig, message: &str, dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(&config, dir).await?;
    let filename = types::note_filename(chrono::Utc::now());
    let path = store.write_note(&filename, message).await?;
    println!("Posted {}", path.display());
    Ok(())
}

async fn run_list(config: BoardConfig, dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(&config, dir).await?;
    let artifacts = store.list().await?;

    if artifacts.is_empty() {
        println!("The board is empty.");
        return Ok(());
    }
    for artifact in artifacts {
        println!(
            "{}  {:<5}  {:>8}  {}",
            artifact.modified_at.format("%Y-%m-%d %H:%M"),
            artifact.kind,
            artifact.size_bytes,
            artifact.filename
        );
        if let Some(content) = artifact.content {
            for line in content.lines().take(3) {
                println!("    {}", line);
            }
        }
    }
    Ok(())
}

async fn run_doctor(config: &BoardConfig) -> Result<()> {
    println!("Hearthboard Doctor");
    println!();

    println!("Checking git...");
    match command_version("git", &["--version"]).await {
        Some(version) => println!("  ✓ {}", version),
        None => println!("  ✗ git not found - history and sync will not work"),
    }
    match command_version("git", &["lfs", "version"]).await {
        Some(version) => println!("  ✓ {}", version),
        None => println!("  ℹ git-lfs not found - media files will be committed directly"),
    }

    println!();
    println!("Checking configuration...");
    match default_config_path() {
        Some(path) if path.exists() => {
            println!("  ✓ Configuration file found: {}", path.display())
        }
        _ => println!("  ℹ No configuration file found (using defaults)"),
    }

    println!();
    println!("Checking store...");
    println!("  Device identity: {}", device_identity());
    if config.store.dir.exists() {
        println!("  ✓ Store directory exists: {}", config.store.dir.display());
    } else {
        println!(
            "  ℹ Store directory not yet created: {}",
            config.store.dir.display()
        );
    }

    println!();
    println!("Doctor check complete!");

    Ok(())
}

async fn command_version(program: &str, args: &[&str]) -> Option<String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(|line| line.trim().to_string())
}

fn show_config(config: Option<&BoardConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
