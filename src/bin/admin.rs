//! CLI administration tool for shortly.
//!
//! Inspects accounts and links and revokes sessions without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List the newest accounts
//! cargo run --bin admin -- accounts list --limit 20
//!
//! # Show one account
//! cargo run --bin admin -- accounts show ann@x.com
//!
//! # Log an account out everywhere
//! cargo run --bin admin -- accounts revoke-sessions ann@x.com
//!
//! # List an account's links
//! cargo run --bin admin -- links list ann@x.com
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`
//! - `BASE_URL` (optional): prefix shown next to link codes

use shortly::config::Config;
use shortly::domain::entities::Account;
use shortly::domain::repositories::{AccountRepository, LinkRepository};
use shortly::infrastructure::persistence::{PgAccountRepository, PgLinkRepository};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shortly.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect accounts and sessions
    Accounts {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Inspect short links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// List accounts, newest first
    List {
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },

    /// Show one account
    Show { email: String },

    /// Invalidate every session issued to an account so far
    RevokeSessions {
        email: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// List the links owned by an account
    List { email: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let database_url = Config::load_database_url()?;
    let base_url = std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);
    let accounts = PgAccountRepository::new(pool.clone());
    let links = PgLinkRepository::new(pool);

    match cli.command {
        Commands::Accounts { action } => handle_account_action(action, &accounts).await?,
        Commands::Links { action } => handle_link_action(action, &accounts, &links, &base_url).await?,
        Commands::Db { action } => handle_db_action(action, &accounts).await?,
    }

    Ok(())
}

async fn handle_account_action(action: AccountAction, repo: &PgAccountRepository) -> Result<()> {
    match action {
        AccountAction::List { limit } => list_accounts(repo, limit).await,
        AccountAction::Show { email } => show_account(repo, &email).await,
        AccountAction::RevokeSessions { email, yes } => revoke_sessions(repo, &email, yes).await,
    }
}

async fn find_account(repo: &PgAccountRepository, email: &str) -> Result<Account> {
    repo.find_by_email(email)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("No account with email {email}"))
}

/// Lists accounts with verification status.
///
/// ```text
///   ID    Email                          Created              Status
///   ───────────────────────────────────────────────────────────────────────
///   12    ann@x.com                      2025-01-15 10:30     VERIFIED
/// ```
async fn list_accounts(repo: &PgAccountRepository, limit: i64) -> Result<()> {
    println!("{}", "Accounts".bright_blue().bold());
    println!();

    let accounts = repo
        .list(limit)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list accounts: {}", e))?;

    if accounts.is_empty() {
        println!("{}", "  No accounts found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<30} {:<20} {:<10}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(71).bright_black());

    for account in &accounts {
        println!(
            "  {:<5} {:<30} {:<20} {}",
            account.id.to_string().bright_black(),
            account.email.cyan(),
            account
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status_label(account)
        );
    }

    println!();
    println!(
        "  Total: {}",
        accounts.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn show_account(repo: &PgAccountRepository, email: &str) -> Result<()> {
    let account = find_account(repo, email).await?;

    println!("{}", "Account".bright_blue().bold());
    println!();
    println!("  ID:        {}", account.id.to_string().bright_black());
    println!("  Name:      {}", account.display_name().cyan());
    println!("  Email:     {}", account.email.cyan());
    println!("  Status:    {}", status_label(&account));
    println!(
        "  Created:   {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    match account.password_changed_at {
        Some(at) => println!("  Sessions valid after: {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => println!("  Sessions valid after: {}", "-".bright_black()),
    }
    if let Some(expires_at) = account.otp_expires_at {
        let state = if expires_at > Utc::now() {
            "pending".yellow()
        } else {
            "expired".bright_black()
        };
        println!("  OTP:       {} (expires {})", state, expires_at.format("%H:%M:%S"));
    }
    println!();

    Ok(())
}

/// Stamps `password_changed_at = now` so every token issued so far is rejected.
async fn revoke_sessions(repo: &PgAccountRepository, email: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "Revoke sessions".bright_blue().bold());
    println!();

    let account = find_account(repo, email).await?;

    println!("  Account: {}", account.email.cyan());
    println!("  ID:      {}", account.id.to_string().bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Log this account out of every session?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let updated = repo
        .invalidate_sessions(account.id, Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke sessions: {}", e))?;

    if !updated {
        anyhow::bail!("Account disappeared before sessions could be revoked");
    }

    println!("{}", "Sessions revoked".green().bold());
    println!();

    Ok(())
}

async fn handle_link_action(
    action: LinkAction,
    accounts: &PgAccountRepository,
    links: &PgLinkRepository,
    base_url: &str,
) -> Result<()> {
    let LinkAction::List { email } = action;
    let account = find_account(accounts, &email).await?;

    println!(
        "{} {}",
        "Links of".bright_blue().bold(),
        account.email.cyan()
    );
    println!();

    let owned = links
        .list_by_owner(account.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if owned.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<10} {:<8} {:<20} {}",
        "Code".bright_white().bold(),
        "Visits".bright_white().bold(),
        "Created".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(71).bright_black());

    for link in &owned {
        println!(
            "  {:<10} {:<8} {:<20} {}",
            link.code.cyan(),
            link.visit_count().to_string().bright_green(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            link.original_url
        );
    }

    println!();
    println!(
        "  Total: {}   Short URL prefix: {}/",
        owned.len().to_string().bright_white().bold(),
        base_url.trim_end_matches('/')
    );
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, repo: &PgAccountRepository) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            repo.ping()
                .await
                .map_err(|e| anyhow::anyhow!("Database check failed: {}", e))?;

            println!("{}", "Database connection OK".green().bold());
        }
    }

    Ok(())
}

fn status_label(account: &Account) -> ColoredString {
    if account.verified {
        "VERIFIED".green()
    } else {
        "UNVERIFIED".yellow()
    }
}
