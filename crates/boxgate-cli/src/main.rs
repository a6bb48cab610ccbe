//! boxgate - terminal client for the sing-box web console.
//!
//! Logs in against the console API, keeps the session on disk, and runs
//! authorized requests and route checks with it.

mod prompt;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boxgate_core::auth::Credentials;
use boxgate_core::{Config, Console};

#[derive(Parser)]
#[command(name = "boxgate", version, about = "Session client for the sing-box web console")]
struct Cli {
    /// Console address, e.g. http://127.0.0.1:8080
    #[arg(long, env = "BOXGATE_SERVER", global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(short, long, env = "BOXGATE_USERNAME")]
        username: Option<String>,
    },
    /// End the session (always succeeds locally)
    Logout,
    /// Show the current session
    Status,
    /// Change the console password
    Passwd,
    /// Resolve a console route through the navigation guard
    Open { path: String },
    /// Run an authorized GET against an API path and print the JSON
    Get { path: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let console = Console::new(config).context("Failed to set up console client")?;
    info!(server = %console.config.server_url, "boxgate starting");

    let result = run(&console, cli.command).await;

    for message in console.notifications.drain() {
        eprintln!("Error: {}", message);
    }

    result
}

async fn run(console: &Console, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => login(console, username).await,
        Command::Logout => {
            console.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            if console.is_logged_in() {
                println!("Logged in as {}", console.username());
            } else {
                println!("Not logged in");
            }
            Ok(())
        }
        Command::Passwd => change_password(console).await,
        Command::Open { path } => {
            let location = console.router.navigate(&path)?;
            match location.title {
                Some(title) => println!("{} ({})", location.path, title),
                None => println!("{}", location.path),
            }
            Ok(())
        }
        Command::Get { path } => {
            let value: serde_json::Value = console.api.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    }
}

async fn login(console: &Console, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt::username(console.config.last_username.as_deref())?,
    };
    let password = match std::env::var("BOXGATE_PASSWORD") {
        Ok(password) => password,
        Err(_) => prompt::password("Password")?,
    };

    println!("Authenticating...");
    if let Err(e) = console.login(&Credentials::new(username.clone(), password)).await {
        // The login form reports its own message instead of the raw notification
        console.notifications.drain();
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }

    let mut config = console.config.clone();
    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", console.username());
    Ok(())
}

async fn change_password(console: &Console) -> Result<()> {
    if !console.is_logged_in() {
        anyhow::bail!("Not logged in");
    }

    let old_password = prompt::password("Current password")?;
    let new_password = prompt::password("New password")?;
    let confirm = prompt::password("Repeat new password")?;
    if new_password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    console.change_password(&old_password, &new_password).await?;
    println!("Password changed");
    Ok(())
}
