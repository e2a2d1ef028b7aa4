//! History and user listing commands.

use anyhow::{Context as _, Result};
use clap::Parser;
use parley_gateway::rest::DEFAULT_HISTORY_LIMIT;

use super::Context;

/// Arguments for the history command
#[derive(Parser)]
pub struct HistoryArgs {
    /// Number of messages to fetch
    #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: u32,

    /// Number of most recent messages to skip
    #[arg(short, long, default_value_t = 0)]
    pub offset: u32,

    /// Print raw JSON envelopes
    #[arg(long)]
    pub json: bool,
}

/// Prints a page of message history, oldest first.
///
/// # Errors
///
/// Returns error if not logged in or the request fails.
pub async fn history(ctx: &Context, args: HistoryArgs) -> Result<()> {
    let stored = ctx.require_session()?;
    let mut messages = ctx
        .api()?
        .authenticated(stored.token)
        .messages(args.limit, args.offset)
        .await
        .context("Failed to fetch history")?;
    messages.sort_by_key(|m| m.created_at);

    if messages.is_empty() {
        println!("No messages");
    }
    for message in &messages {
        let envelope = message.to_envelope();
        if args.json {
            println!("{}", envelope.to_json()?);
        } else {
            println!("{envelope}");
        }
    }
    Ok(())
}

/// Lists registered users.
///
/// # Errors
///
/// Returns error if not logged in or the request fails.
pub async fn users(ctx: &Context) -> Result<()> {
    let stored = ctx.require_session()?;
    let users = ctx
        .api()?
        .authenticated(stored.token)
        .users()
        .await
        .context("Failed to fetch users")?;

    println!("{:<6} {:<20} {}", "ID", "USERNAME", "EMAIL");
    for user in users {
        let marker = if user.username == stored.user.username { " (you)" } else { "" };
        println!("{:<6} {:<20} {}{marker}", user.id, user.username, user.email);
    }
    Ok(())
}
