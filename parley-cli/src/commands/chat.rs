//! Interactive chat over the real-time channel.

use anyhow::{Context as _, Result};
use clap::Parser;
use parley_core::types::MessageEnvelope;
use parley_gateway::ws::{ConnectionEvent, ConnectionManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::Context;

/// Arguments for the chat command
#[derive(Parser)]
pub struct ChatArgs {
    /// Number of history messages to show before joining
    #[arg(long, default_value_t = 20)]
    pub history: u32,
}

/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message(String),
    Quit,
    Status,
    Reconnect,
    Help,
    Unknown(String),
    Empty,
}

impl Input {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if let Some(command) = trimmed.strip_prefix('/') {
            return match command {
                "quit" | "exit" | "q" => Self::Quit,
                "status" => Self::Status,
                "reconnect" => Self::Reconnect,
                "help" => Self::Help,
                other => Self::Unknown(other.to_string()),
            };
        }
        Self::Message(trimmed.to_string())
    }
}

const HELP: &str = "Commands: /status, /reconnect, /help, /quit";

/// Joins the chat: prints history, then relays stdin lines and inbound frames
/// until `/quit`, end of input or Ctrl-C.
///
/// # Errors
///
/// Returns error if not logged in, the first connect fails or stdin breaks.
pub async fn run(ctx: &Context, args: ChatArgs) -> Result<()> {
    let stored = ctx.require_session()?;

    if args.history > 0 {
        match ctx
            .api()?
            .authenticated(stored.token.clone())
            .messages(args.history, 0)
            .await
        {
            Ok(mut messages) => {
                messages.sort_by_key(|m| m.created_at);
                for message in &messages {
                    println!("{}", message.to_envelope());
                }
            }
            Err(e) => warn!(error = %e, "Could not load history"),
        }
    }

    let manager = ConnectionManager::from_config(ctx.config());
    let _subscription = manager.on_message(|envelope: &MessageEnvelope| println!("{envelope}"));
    let mut events = manager.events();

    manager
        .connect_as(stored.user.username.clone(), stored.token.clone())
        .await
        .context("Failed to join chat")?;
    println!("Joined as {}. {HELP}", stored.user.username);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match Input::parse(&line) {
                    Input::Message(text) => {
                        if let Err(e) = manager.send_chat(text) {
                            println!("! not sent: {e}");
                        }
                    }
                    Input::Quit => break,
                    Input::Status => println!(
                        "* {} (reconnect attempts: {})",
                        manager.state(),
                        manager.reconnect_attempts()
                    ),
                    Input::Reconnect => {
                        match manager
                            .connect_as(stored.user.username.clone(), stored.token.clone())
                            .await
                        {
                            Ok(()) => println!("* {}", manager.state()),
                            Err(e) => println!("! reconnect failed: {e}"),
                        }
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Unknown(command) => println!("! unknown command /{command}. {HELP}"),
                    Input::Empty => {}
                }
            }
            event = events.recv() => match event {
                Ok(ConnectionEvent::MessageDropped { .. }) => {}
                Ok(event @ ConnectionEvent::GaveUp { .. }) => {
                    println!("* {event}; type /reconnect to try again");
                }
                Ok(event) => println!("* {event}"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Missed connection events"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => break,
        }
    }

    manager.disconnect();
    println!("Left chat");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse("  hello there \n"), Input::Message("hello there".to_string()));
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("/q"), Input::Quit);
        assert_eq!(Input::parse("/status"), Input::Status);
        assert_eq!(Input::parse("/reconnect"), Input::Reconnect);
        assert_eq!(Input::parse("/dance"), Input::Unknown("dance".to_string()));
        assert_eq!(Input::parse("   "), Input::Empty);
    }
}
