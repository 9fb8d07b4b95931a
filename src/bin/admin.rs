//! CLI administration tool for shortlink.
//!
//! # Usage
//!
//! ```bash
//! # Check the database and show row counts
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db info
//!
//! # Load the demo users, links and tokens
//! cargo run --bin admin -- db seed -y
//!
//! # Manage users
//! cargo run --bin admin -- user create --username iivanov
//! cargo run --bin admin -- user list
//! cargo run --bin admin -- user passwd iivanov
//!
//! # Inspect tokens
//! cargo run --bin admin -- token encode 1
//! cargo run --bin admin -- token decode p2z68d
//!
//! # Generate a SESSION_SECRET
//! cargo run --bin admin -- secret
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or the `DB_*` parts): required by `db` and `user`
//! - `TOKEN_SALT`, `TOKEN_MIN_LENGTH`: used by `token`, same defaults as the server

use shortlink::domain::entities::User;
use shortlink::infrastructure::persistence::{PgStore, seed_demo_data};
use shortlink::prelude::UserService;
use shortlink::utils::token_generator::{DEFAULT_MIN_LENGTH, TokenGenerator};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use rand::Rng;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shortlink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Encode and decode short link tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Print a random value suitable for SESSION_SECRET
    Secret,
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database version and row counts
    Info,

    /// Insert demo users, links and short links
    Seed {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        #[arg(short, long)]
        username: Option<String>,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List,

    /// Set a new password
    Passwd {
        username: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Token for a link id
    Encode { id: u64 },

    /// Link id behind a token
    Decode { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
        Commands::User { action } => handle_user_action(action, connect().await?).await?,
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Secret => println!("{}", generate_secret()),
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            let part = |name: &str| std::env::var(name).with_context(|| format!("{name} must be set"));
            format!(
                "postgres://{}:{}@{}:{}/{}",
                part("DB_USER")?,
                part("DB_PASSWORD")?,
                std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                std::env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                part("DB_NAME")?,
            )
        }
    };

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            println!("  PostgreSQL: {}", version.bright_white());
            println!();

            for table in ["users", "links", "shortlinks"] {
                let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                    .fetch_one(pool)
                    .await?;
                println!(
                    "  {:<12} {}",
                    table,
                    count.to_string().bright_green().bold()
                );
            }

            let clicks: Option<i64> =
                sqlx::query_scalar("SELECT SUM(click_counter)::BIGINT FROM links")
                    .fetch_one(pool)
                    .await?;
            println!(
                "  {:<12} {}",
                "clicks",
                clicks.unwrap_or(0).to_string().bright_green().bold()
            );
            println!();
        }
        DbAction::Seed { yes } => {
            println!("{}", "🌱 Seed demo data".bright_blue().bold());
            println!();
            println!("  5 users, 10 links and 10 short links will be inserted.");
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Insert demo data?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            seed_demo_data(pool)
                .await
                .context("Failed to insert demo data (already seeded?)")?;

            println!("{}", "✅ Demo data inserted".green().bold());
        }
    }

    Ok(())
}

/// Dispatches user management commands.
async fn handle_user_action(action: UserAction, pool: PgPool) -> Result<()> {
    let users = UserService::new(Arc::new(PgStore::new(Arc::new(pool))));

    match action {
        UserAction::Create { username, password } => create_user(&users, username, password).await,
        UserAction::List => list_users(&users).await,
        UserAction::Passwd { username } => change_password(&users, &username).await,
    }
}

async fn create_user(
    users: &UserService,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    println!("{}", "👤 Create User".bright_blue().bold());
    println!();

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    };

    let user = users
        .create(User::new(username, password))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {e}"))?;

    println!();
    println!(
        "{} {} (id {})",
        "✅ Created".green().bold(),
        user.username.cyan(),
        user.id.to_string().bright_white()
    );
    println!();

    Ok(())
}

async fn list_users(users: &UserService) -> Result<()> {
    println!("{}", "📋 Users".bright_blue().bold());
    println!();

    let all = users
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {e}"))?;

    if all.is_empty() {
        println!("{}", "  No users found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<20} {:<30} {:<10}",
        "ID".bright_white().bold(),
        "Username".bright_white().bold(),
        "Email".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(68).bright_black());

    for user in &all {
        let status = if user.user_status {
            "ACTIVE".green()
        } else {
            "INACTIVE".red()
        };

        println!(
            "  {:<5} {:<20} {:<30} {}",
            user.id.to_string().bright_black(),
            user.username.cyan(),
            user.email,
            status
        );
    }

    println!();
    println!("  Total: {}", all.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn change_password(users: &UserService, username: &str) -> Result<()> {
    let user = users
        .find_by_username(username)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {e}"))?
        .with_context(|| format!("User '{username}' not found"))?;

    let password: String = Password::new()
        .with_prompt(format!("New password for {username}"))
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let mut patch = Map::new();
    patch.insert("password".to_string(), Value::String(password));

    users
        .update(user.id, &patch)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update password: {e}"))?;

    println!("{}", "✅ Password changed".green().bold());

    Ok(())
}

fn token_generator() -> Result<TokenGenerator> {
    let salt = std::env::var("TOKEN_SALT").unwrap_or_else(|_| "shortlink".to_string());
    let min_length = std::env::var("TOKEN_MIN_LENGTH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MIN_LENGTH);

    TokenGenerator::with_default_alphabet(&salt, min_length).context("Invalid token configuration")
}

fn handle_token_action(action: TokenAction) -> Result<()> {
    let tokens = token_generator()?;

    match action {
        TokenAction::Encode { id } => {
            println!("{}", tokens.encode(id).bright_yellow().bold());
        }
        TokenAction::Decode { token } => match tokens.decode(&token) {
            Some(id) => println!("{}", id.to_string().bright_green().bold()),
            None => anyhow::bail!("'{token}' is not a token of this salt and alphabet"),
        },
    }

    Ok(())
}

/// 32 random bytes, hex-encoded.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
