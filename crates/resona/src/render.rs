// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering for panel state.

use colored::Colorize;
use resona_core::ActionStatus;
use resona_engage::{Analysis, DispatchReport, QueuedAction, RiskTier, StateSnapshot};
use resona_limits::{OpKind, RateLimits};

const ALL_OPS: [OpKind; 3] = [OpKind::EngagerFetch, OpKind::Like, OpKind::Repost];

pub fn print_limits(limits: &RateLimits) {
    println!("{}", "rate limits".bold());
    for op in ALL_OPS {
        let bucket = limits.bucket(op);
        let cooldown = if bucket.next_available_seconds > 0 {
            format!(" (next in {}s)", bucket.next_available_seconds)
                .yellow()
                .to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<14} 15m {:>4}/{:<4}  24h {:>5}/{:<5}{}",
            op.to_string(),
            bucket.short_remaining,
            bucket.short_limit,
            bucket.long_remaining,
            bucket.long_limit,
            cooldown
        );
    }
}

pub fn print_queue(queue: &[QueuedAction]) {
    if queue.is_empty() {
        println!("queue is empty");
        return;
    }
    println!("{}", "action queue".bold());
    for action in queue {
        let status = match action.status {
            ActionStatus::Completed => "completed".green(),
            ActionStatus::Failed => "failed".red(),
            ActionStatus::Running => "running".yellow(),
            ActionStatus::Pending => "pending".normal(),
        };
        let error = action
            .error
            .as_deref()
            .map(|e| format!("  [{e}]"))
            .unwrap_or_default();
        println!(
            "  {:<10} {:<8} @{:<16} {}{}",
            action.id, action.action_type, action.target, status, error
        );
    }
}

pub fn print_engagers(analysis: &Analysis) {
    println!(
        "{} ({} engagements, {} candidates)",
        "analysis".bold(),
        analysis.total_engagement_count,
        analysis.engagers.len()
    );
    for engager in &analysis.engagers {
        let risk = match engager.risk {
            RiskTier::Low => "low".green(),
            RiskTier::Medium => "medium".yellow(),
            RiskTier::High => "high".red(),
        };
        let action = engager
            .recommended_actions
            .first()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        let preview: String = engager
            .recent_tweets
            .first()
            .map(|t| t.text.chars().take(48).collect())
            .unwrap_or_default();
        println!(
            "  {:<10} @{:<16} score {:.2}  risk {:<8} {:<7} {}",
            engager.user_id, engager.username, engager.ai_score, risk, action, preview
        );
    }
}

pub fn print_report(report: &DispatchReport) {
    println!(
        "dispatched: {} succeeded, {} failed",
        report.executed.to_string().green(),
        if report.failed > 0 {
            report.failed.to_string().red().to_string()
        } else {
            report.failed.to_string()
        }
    );
    for (username, error) in &report.failures {
        println!("  @{username}: {}", error.red());
    }
}

pub fn print_snapshot(snapshot: &StateSnapshot) {
    if let Some(profile) = &snapshot.profile {
        println!("signed in as @{}", profile.username.bold());
    }
    println!(
        "analyzed {} tweets, processed {} users, today {} likes / {} reposts",
        snapshot.counters.total_analyzed,
        snapshot.counters.processed_users,
        snapshot.counters.likes_today,
        snapshot.counters.reposts_today
    );
    print_limits(&snapshot.limits);
    print_queue(&snapshot.queue);
    if let Some(error) = &snapshot.last_error {
        println!("{} {error}", "last error:".red());
    }
}
