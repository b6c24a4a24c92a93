// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations for the Resona CLI.
//!
//! The CLI plays the role of the automation panel's presentation layer: it
//! hosts the password prompt, renders state snapshots, and wires user input
//! into [`EngagePanel`] operations. The re-prompt-on-reject rule lives here:
//! a ticket is attached only when the cache is cold, and a server
//! password-required rejection prompts once more and retries once.

use std::io::{self, Write};

use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use resona_core::{ResonaError, UserId};
use resona_engage::{Analysis, EngagePanel};
use resona_vault::{PlatformKeys, UnlockTicket, VaultState};
use secrecy::SecretString;

use crate::render;
use crate::session_store;

/// Outcome of the password prompt.
pub enum TicketFlow {
    /// Vault cache is warm; omit the password.
    NotNeeded,
    Supplied(UnlockTicket),
    /// User dismissed the prompt.
    Cancelled,
}

/// Prompt for the vault password when the cache is cold (or unconditionally
/// when `force` is set, for the re-prompt-after-reject path). An empty entry
/// cancels.
async fn acquire_ticket(panel: &EngagePanel, force: bool) -> Result<TicketFlow, ResonaError> {
    if !force && !panel.needs_password().await? {
        return Ok(TicketFlow::NotNeeded);
    }
    panel.begin_password_prompt().await;
    let password = rpassword::prompt_password("vault password (empty to cancel): ")
        .map_err(|e| ResonaError::Internal(format!("could not read password: {e}")))?;
    if password.is_empty() {
        panel.cancel_password_prompt().await;
        return Ok(TicketFlow::Cancelled);
    }
    match UnlockTicket::new(SecretString::from(password)) {
        Ok(ticket) => {
            panel.close_password_prompt().await;
            Ok(TicketFlow::Supplied(ticket))
        }
        Err(e) => {
            panel.cancel_password_prompt().await;
            Err(e)
        }
    }
}

pub async fn login(
    panel: &EngagePanel,
    api: &resona_api::ApiClient,
    email: &str,
) -> Result<(), ResonaError> {
    let password = rpassword::prompt_password("account password: ")
        .map_err(|e| ResonaError::Internal(format!("could not read password: {e}")))?;
    let profile = panel.sign_in(email, SecretString::from(password)).await?;

    if let Some(token) = api.token() {
        let stored = session_store::StoredSession {
            access_token: token,
            user: profile.clone(),
        };
        if let Err(e) = session_store::save(&stored) {
            eprintln!("warning: could not persist session: {e}");
        }
    }
    println!("signed in as @{}", profile.username.bold());
    Ok(())
}

pub async fn logout(panel: &EngagePanel) -> Result<(), ResonaError> {
    panel.sign_out().await;
    session_store::clear()
        .map_err(|e| ResonaError::Internal(format!("could not clear session file: {e}")))?;
    println!("signed out");
    Ok(())
}

pub async fn status(panel: &EngagePanel) -> Result<(), ResonaError> {
    let stats = panel.dashboard().await?;
    println!(
        "totals: {} likes, {} reposts, {} actions today, {} queued ({:.0}% success)",
        stats.total_likes,
        stats.total_retweets,
        stats.today_actions,
        stats.queued_actions,
        stats.success_rate * 100.0
    );
    panel.reconcile_once().await;
    render::print_snapshot(&panel.snapshot().await);
    Ok(())
}

pub async fn limits(panel: &EngagePanel) -> Result<(), ResonaError> {
    panel.reconcile_once().await;
    render::print_limits(&panel.snapshot().await.limits);
    Ok(())
}

pub async fn queue(panel: &EngagePanel) -> Result<(), ResonaError> {
    panel.reconcile_once().await;
    render::print_queue(&panel.snapshot().await.queue);
    Ok(())
}

/// Analyze with the unified ticket rule: send a password only when the cache
/// is cold; on a password-required rejection, re-prompt and retry once.
pub async fn analyze(panel: &EngagePanel, url: &str) -> Result<Option<Analysis>, ResonaError> {
    let ticket = match acquire_ticket(panel, false).await? {
        TicketFlow::Cancelled => {
            println!("cancelled");
            return Ok(None);
        }
        TicketFlow::NotNeeded => None,
        TicketFlow::Supplied(ticket) => Some(ticket),
    };

    let analysis = match panel.analyze(url, ticket).await {
        Ok(analysis) => analysis,
        Err(ResonaError::VaultPasswordRequired) => {
            eprintln!("{}", "the vault needs your password".yellow());
            match acquire_ticket(panel, true).await? {
                TicketFlow::Supplied(ticket) => panel.analyze(url, Some(ticket)).await?,
                _ => {
                    println!("cancelled");
                    return Ok(None);
                }
            }
        }
        Err(e) => return Err(e),
    };
    render::print_engagers(&analysis);
    Ok(Some(analysis))
}

/// The full pipeline: analyze, select (explicit ids or random sample),
/// dispatch, report.
pub async fn engage(
    panel: &EngagePanel,
    url: &str,
    users: &[String],
    random: bool,
    seed: Option<u64>,
) -> Result<(), ResonaError> {
    let Some(analysis) = analyze(panel, url).await? else {
        return Ok(());
    };
    if analysis.engagers.is_empty() {
        println!("no actionable engagers for this tweet");
        return Ok(());
    }

    if random {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let picked = panel.select_random(&mut rng).await?;
        println!("randomly selected {} candidates", picked.len());
    } else {
        for id in users {
            panel.toggle_selection(&UserId(id.clone())).await?;
        }
    }

    let selected = panel.selected_user_ids().await;
    if selected.is_empty() {
        return Err(ResonaError::Validation(
            "no candidates selected; pass --random or --users".to_string(),
        ));
    }
    if !confirm(&format!("dispatch {} actions?", selected.len()))? {
        panel.clear_selection().await;
        println!("cancelled");
        return Ok(());
    }

    let ticket = match acquire_ticket(panel, false).await? {
        TicketFlow::Cancelled => {
            println!("cancelled");
            return Ok(());
        }
        TicketFlow::NotNeeded => None,
        TicketFlow::Supplied(ticket) => Some(ticket),
    };
    let report = match panel.dispatch_selected(ticket).await {
        Ok(report) => report,
        Err(ResonaError::VaultPasswordRequired) => {
            eprintln!("{}", "the vault needs your password".yellow());
            match acquire_ticket(panel, true).await? {
                TicketFlow::Supplied(ticket) => panel.dispatch_selected(Some(ticket)).await?,
                _ => {
                    println!("cancelled");
                    return Ok(());
                }
            }
        }
        Err(e) => return Err(e),
    };
    render::print_report(&report);
    Ok(())
}

pub async fn keys_set(panel: &EngagePanel) -> Result<(), ResonaError> {
    let read = |label: &str| -> Result<SecretString, ResonaError> {
        rpassword::prompt_password(format!("{label}: "))
            .map(SecretString::from)
            .map_err(|e| ResonaError::Internal(format!("could not read {label}: {e}")))
    };
    let keys = PlatformKeys {
        api_key: read("api key")?,
        api_secret: read("api secret")?,
        access_token: read("access token")?,
        access_token_secret: read("access token secret")?,
    };

    let TicketFlow::Supplied(ticket) = acquire_ticket(panel, true).await? else {
        println!("cancelled");
        return Ok(());
    };
    panel.vault().save(&keys, ticket).await?;
    println!("credentials stored in the vault");
    Ok(())
}

pub async fn keys_status(panel: &EngagePanel) -> Result<(), ResonaError> {
    match panel.vault().status().await? {
        None => println!("no credentials stored"),
        Some(status) => {
            println!(
                "configured: {}, valid: {}, used {} times",
                status.configured, status.valid, status.usage_count
            );
            if let Some(created) = status.created_at {
                println!("stored at {created}");
            }
            if let Some(last_used) = status.last_used {
                println!("last used {last_used}");
            }
            let cached = panel.vault().state().await? == VaultState::StoredCached;
            println!("cache: {}", if cached { "warm" } else { "cold" });
        }
    }
    Ok(())
}

pub async fn keys_test(panel: &EngagePanel) -> Result<(), ResonaError> {
    let TicketFlow::Supplied(ticket) = acquire_ticket(panel, true).await? else {
        println!("cancelled");
        return Ok(());
    };
    let outcome = panel.vault().test(ticket).await?;
    if outcome.is_valid {
        match outcome.upstream_handle {
            Some(handle) => println!("{} connected as @{handle}", "valid:".green()),
            None => println!("{}", "valid".green()),
        }
    } else {
        println!(
            "{} {}",
            "invalid:".red(),
            outcome
                .error_message
                .unwrap_or_else(|| "the platform rejected the credentials".to_string())
        );
    }
    Ok(())
}

pub async fn keys_delete(panel: &EngagePanel) -> Result<(), ResonaError> {
    if !confirm("delete the stored credentials?")? {
        println!("cancelled");
        return Ok(());
    }
    panel.vault().delete().await?;
    println!("credentials deleted");
    Ok(())
}

pub async fn blocklist_list(panel: &EngagePanel) -> Result<(), ResonaError> {
    let users = panel.blocklist().await?;
    if users.is_empty() {
        println!("blocklist is empty");
        return Ok(());
    }
    for user in users {
        let reason = user.reason.map(|r| format!("  ({r})")).unwrap_or_default();
        println!("@{}{}", user.username, reason);
    }
    Ok(())
}

pub async fn blocklist_add(
    panel: &EngagePanel,
    username: &str,
    reason: Option<&str>,
) -> Result<(), ResonaError> {
    panel.block(username, reason).await?;
    println!("blocked @{}", username.trim_start_matches('@'));
    Ok(())
}

pub async fn blocklist_remove(panel: &EngagePanel, username: &str) -> Result<(), ResonaError> {
    panel.unblock(username).await?;
    println!("unblocked @{}", username.trim_start_matches('@'));
    Ok(())
}

fn confirm(question: &str) -> Result<bool, ResonaError> {
    print!("{question} [y/N] ");
    io::stdout()
        .flush()
        .map_err(|e| ResonaError::Internal(e.to_string()))?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .map_err(|e| ResonaError::Internal(e.to_string()))?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
