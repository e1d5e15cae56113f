//! SnapSync - Disaster-Recovery Snapshot Replication Coordinator
//!
//! Coordinates snapshot production, restore and retention between two
//! search clusters sharing a snapshot repository.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snapsync::admin::HttpAdminClient;
use snapsync::config::{sample_config, Role, SnapSyncConfig};
use snapsync::marker::{MarkerStore, RemotePeer};
use snapsync::probe::CommandEngine;
use snapsync::reconcile::Reconciler;
use snapsync::scheduler::{shutdown_channel, RunEnd, Scheduler};

/// Exit code for any fatal error
const EXIT_FAILURE: i32 = 1;

/// Exit code when a daemon run is terminated by a signal
const EXIT_SIGNALLED: i32 = 255;

/// SnapSync - Disaster-Recovery Snapshot Replication Coordinator
#[derive(Parser)]
#[command(name = "snapsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "snapsync.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation engine for one role
    Run {
        /// Replication role for this process
        #[arg(long, value_enum)]
        mode: Role,

        /// Keep running, one tick per polling interval
        #[arg(long)]
        daemon: bool,

        /// Polling interval in seconds for daemon mode
        #[arg(long, default_value_t = 3600)]
        frequency: u64,

        /// Snapshots to retain in cleanup mode
        #[arg(long, default_value_t = 1)]
        keep: usize,

        /// Write this role's marker on the peer host instead of locally
        #[arg(long)]
        remote_marker: bool,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "snapsync.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Run {
            mode,
            daemon,
            frequency,
            keep,
            remote_marker,
        } => run_role(cli.config, mode, daemon, frequency, keep, remote_marker).await,
        Commands::Validate => run_validate(cli.config),
        Commands::Init { output } => run_init(output),
    };

    std::process::exit(code);
}

/// Initialize logging
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the reconciliation engine as the given role
async fn run_role(
    config_path: PathBuf,
    mode: Role,
    daemon: bool,
    frequency: u64,
    keep: usize,
    remote_marker: bool,
) -> i32 {
    tracing::info!("Starting SnapSync in {} mode", mode);

    let config = match SnapSyncConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            return EXIT_FAILURE;
        }
    };

    let node = match config.role(mode, remote_marker) {
        Ok(n) => n.clone(),
        Err(e) => {
            tracing::error!("Invalid configuration for {} mode: {}", mode, e);
            return EXIT_FAILURE;
        }
    };
    tracing::info!(
        "Repository {} at {}, admin API {}",
        node.repo_name,
        node.repo_dir.display(),
        node.api_url
    );

    let markers = match (remote_marker, &node.peer_host, &node.peer_repo_dir) {
        (true, Some(host), Some(repo_dir)) => {
            tracing::info!("Marker writes go to peer host {}", host);
            MarkerStore::remote(
                node.repo_dir.clone(),
                RemotePeer {
                    host: host.clone(),
                    repo_dir: repo_dir.clone(),
                },
            )
        }
        (true, _, _) => {
            // Validation guarantees both peer fields in remote mode
            tracing::error!("Remote marker mode requires peer_host and peer_repo_dir");
            return EXIT_FAILURE;
        }
        (false, _, _) => MarkerStore::local(node.repo_dir.clone()),
    };

    let engine = CommandEngine::new(node.snaptool_path(), node.repo_name.clone());
    let admin = match HttpAdminClient::new(&node.api_url) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to create admin API client: {}", e);
            return EXIT_FAILURE;
        }
    };

    let reconciler = Reconciler::new(mode, node, markers, engine, admin, keep);

    // One-time repository registration; nothing ticks if this fails
    if let Err(e) = reconciler.register_repository().await {
        tracing::error!("Repository registration failed: {}", e);
        return EXIT_FAILURE;
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    spawn_signal_listener(shutdown_tx);

    let mut scheduler = if daemon {
        tracing::info!("Running as daemon, one tick every {} seconds", frequency);
        Scheduler::daemon(Duration::from_secs(frequency), shutdown_rx)
    } else {
        Scheduler::once(shutdown_rx)
    };

    match scheduler.run(&reconciler).await {
        Ok(RunEnd::Completed) => 0,
        Ok(RunEnd::Interrupted) => EXIT_SIGNALLED,
        Err(e) => {
            tracing::error!("Tick failed: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Flip the shutdown channel on SIGINT/SIGTERM
fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Cannot install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Validate the configuration file for every role it defines
fn run_validate(config_path: PathBuf) -> i32 {
    let config = match SnapSyncConfig::from_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let mut defined = 0;
    for role in [Role::Primary, Role::Secondary, Role::Cleanup] {
        match config.role(role, false) {
            Ok(node) => {
                defined += 1;
                let remote_ready = node.validate(role, true).is_ok();
                println!(
                    "[{}] ok (remote marker writes: {})",
                    role,
                    if remote_ready { "configured" } else { "not configured" }
                );
            }
            Err(snapsync::Error::Config(msg)) if msg.contains("missing") => {
                println!("[{}] not configured", role);
            }
            Err(e) => {
                eprintln!("[{}] invalid: {}", role, e);
                return EXIT_FAILURE;
            }
        }
    }

    if defined == 0 {
        eprintln!("Configuration defines no roles");
        return EXIT_FAILURE;
    }

    println!("Configuration OK ({:?})", config_path);
    0
}

/// Write a sample configuration file
fn run_init(output: PathBuf) -> i32 {
    if output.exists() {
        eprintln!("Refusing to overwrite existing file {:?}", output);
        return EXIT_FAILURE;
    }

    match std::fs::write(&output, sample_config()) {
        Ok(()) => {
            println!("Wrote sample configuration to {:?}", output);
            println!("Edit the per-role sections, then check with: snapsync validate");
            0
        }
        Err(e) => {
            eprintln!("Failed to write {:?}: {}", output, e);
            EXIT_FAILURE
        }
    }
}
