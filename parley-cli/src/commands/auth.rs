//! Account commands.

use std::io::{self, BufRead, Write};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;

use super::Context;
use crate::session::StoredSession;

/// Arguments for the login command
#[derive(Parser)]
pub struct LoginArgs {
    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Password; read from stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for the register command
#[derive(Parser)]
pub struct RegisterArgs {
    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Contact address
    #[arg(short, long)]
    pub email: String,

    /// Password (at least 6 characters); read from stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,
}

const MIN_PASSWORD_LEN: usize = 6;

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Logs in and stores the session.
///
/// # Errors
///
/// Returns error if the credentials are rejected or the session cannot be saved.
pub async fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let password = password_or_prompt(args.password)?;
    let session = ctx
        .api()?
        .login(&args.username, &password)
        .await
        .context("Login failed")?;

    let stored = StoredSession::new(session, &ctx.config().server.api_url);
    ctx.session().save(&stored)?;
    info!(username = %stored.user.username, "Session stored");
    println!("Logged in as {}", stored.user.username);
    Ok(())
}

/// Creates an account and stores the session.
///
/// # Errors
///
/// Returns error if registration is rejected or the session cannot be saved.
pub async fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let password = password_or_prompt(args.password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }

    let session = ctx
        .api()?
        .register(&args.username, &args.email, &password)
        .await
        .context("Registration failed")?;

    let stored = StoredSession::new(session, &ctx.config().server.api_url);
    ctx.session().save(&stored)?;
    println!("Registered and logged in as {}", stored.user.username);
    Ok(())
}

/// Forgets the stored session.
///
/// # Errors
///
/// Returns error if the session file cannot be removed.
pub fn logout(ctx: &Context) -> Result<()> {
    if ctx.session().clear()? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

/// Prints the stored identity.
///
/// # Errors
///
/// Returns error if the session file is unreadable.
pub fn whoami(ctx: &Context) -> Result<()> {
    match ctx.session().load()? {
        Some(stored) => {
            println!("{} <{}>", stored.user.username, stored.user.email);
            println!("  server:    {}", stored.api_url);
            println!("  logged in: {}", stored.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("Not logged in"),
    }
    Ok(())
}
