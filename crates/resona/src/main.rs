// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resona - engagement-automation client.
//!
//! This is the binary entry point. It loads configuration, restores any
//! persisted session, and drives the automation panel from subcommands.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use resona_api::ApiClient;
use resona_core::{ResonaError, SystemClock};
use resona_engage::EngagePanel;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;
mod session_store;

/// Resona - engagement-automation client.
#[derive(Parser, Debug)]
#[command(name = "resona", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in to the backend.
    Login {
        /// Account email address.
        email: String,
    },
    /// Sign out and drop the stored session.
    Logout,
    /// Dashboard counters, rate limits, and the action queue.
    Status,
    /// Current rate-limit buckets.
    Limits,
    /// The server's action queue.
    Queue,
    /// Analyze the users who engaged with a tweet.
    Analyze {
        /// Full tweet URL, e.g. https://x.com/user/status/123.
        url: String,
    },
    /// Analyze, select, and dispatch like/repost actions.
    Engage {
        /// Full tweet URL.
        url: String,
        /// Select these user ids (comma-separated).
        #[arg(long, value_delimiter = ',', conflicts_with = "random")]
        users: Vec<String>,
        /// Select 2-4 candidates at random.
        #[arg(long)]
        random: bool,
        /// Seed for --random, for reproducible sampling.
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },
    /// Manage the platform credentials in the server-side vault.
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
    /// Manage the blocked-user list.
    Blocklist {
        #[command(subcommand)]
        command: BlocklistCommands,
    },
    /// Keep reconciling and printing panel state until interrupted.
    Watch,
}

#[derive(Subcommand, Debug)]
enum KeysCommands {
    /// Store the four platform credentials (prompted, never echoed).
    Set,
    /// Show stored-credential status.
    Status,
    /// Validate the stored credentials against the platform.
    Test,
    /// Delete the stored credentials.
    Delete,
}

#[derive(Subcommand, Debug)]
enum BlocklistCommands {
    /// List blocked users.
    List,
    /// Block a user.
    Add {
        username: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Unblock a user.
    Remove { username: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match resona_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("resona: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, config).await {
        eprintln!("resona: {e}");
        if matches!(e, ResonaError::AuthRequired) {
            let _ = session_store::clear();
            eprintln!("session expired; run `resona login <email>`");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: resona_config::ResonaConfig) -> Result<(), ResonaError> {
    let api = Arc::new(ApiClient::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.timeout_secs),
    )?);
    let panel = Arc::new(EngagePanel::new(Arc::clone(&api), Arc::new(SystemClock)));

    // Restore the persisted session for everything except a fresh login.
    if !matches!(cli.command, Commands::Login { .. })
        && let Some(stored) = session_store::load()
    {
        debug!(username = %stored.user.username, "restoring persisted session");
        panel
            .restore_session(stored.access_token, stored.user)
            .await;
    }

    match cli.command {
        Commands::Login { email } => commands::login(&panel, &api, &email).await,
        Commands::Logout => commands::logout(&panel).await,
        Commands::Status => commands::status(&panel).await,
        Commands::Limits => commands::limits(&panel).await,
        Commands::Queue => commands::queue(&panel).await,
        Commands::Analyze { url } => commands::analyze(&panel, &url).await.map(|_| ()),
        Commands::Engage {
            url,
            users,
            random,
            seed,
        } => commands::engage(&panel, &url, &users, random, seed).await,
        Commands::Keys { command } => match command {
            KeysCommands::Set => commands::keys_set(&panel).await,
            KeysCommands::Status => commands::keys_status(&panel).await,
            KeysCommands::Test => commands::keys_test(&panel).await,
            KeysCommands::Delete => commands::keys_delete(&panel).await,
        },
        Commands::Blocklist { command } => match command {
            BlocklistCommands::List => commands::blocklist_list(&panel).await,
            BlocklistCommands::Add { username, reason } => {
                commands::blocklist_add(&panel, &username, reason.as_deref()).await
            }
            BlocklistCommands::Remove { username } => {
                commands::blocklist_remove(&panel, &username).await
            }
        },
        Commands::Watch => watch(&panel, config.reconcile.interval_secs).await,
    }
}

/// Reconcile on the configured cadence and render every published snapshot
/// until Ctrl-C. Navigating away cancels the reconciliation timer.
async fn watch(panel: &Arc<EngagePanel>, interval_secs: u64) -> Result<(), ResonaError> {
    if !panel.authenticated() {
        return Err(ResonaError::AuthRequired);
    }

    panel.reconcile_once().await;
    render::print_snapshot(&panel.snapshot().await);

    let cancel = CancellationToken::new();
    let handle = panel.spawn_reconciler(Duration::from_secs(interval_secs), cancel.clone());
    let mut snapshots = panel.subscribe();

    let mut auth_lost = false;
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                render::print_snapshot(&snapshot);
                if !snapshot.authenticated {
                    auth_lost = true;
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.map_err(|e| ResonaError::Internal(e.to_string()))?;
                break;
            }
        }
    }

    cancel.cancel();
    let _ = handle.await;
    if auth_lost {
        return Err(ResonaError::AuthRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn engage_parses_comma_separated_users() {
        let cli = Cli::parse_from([
            "resona",
            "engage",
            "https://x.com/a/status/1",
            "--users",
            "1,2,3",
        ]);
        match cli.command {
            Commands::Engage { users, random, .. } => {
                assert_eq!(users, vec!["1", "2", "3"]);
                assert!(!random);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn engage_seed_requires_random() {
        let result = Cli::try_parse_from([
            "resona",
            "engage",
            "https://x.com/a/status/1",
            "--seed",
            "7",
        ]);
        assert!(result.is_err());
    }
}
