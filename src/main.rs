//! Stride CLI
//!
//! Command-line front end for the fitness tracker:
//! - Sign in, sign up and sign out
//! - Show the signed-in account
//! - List, log and delete activities
//! - Generate a config file

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use std::path::PathBuf;
use std::sync::Arc;
use stride::config::{generate_default_config, Config, LoggingConfig};
use stride::{
    ActivitiesClient, ActivityStatus, ActivityType, AuthBackend, FileTokenStore, HttpAuthClient,
    NewActivity, RouteGuard, SessionManager, SessionOptions,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stride")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal fitness tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/stride/config.toml or ./stride.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API server URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Password (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Password (prompted twice if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out
    Logout {
        /// Only forget the local token; do not revoke it on the server
        #[arg(long)]
        local: bool,
    },

    /// Show the signed-in account
    Whoami,

    /// Manage activities
    Activities {
        #[command(subcommand)]
        command: ActivityCommands,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ActivityCommands {
    /// List activities, newest first
    List,

    /// Log an activity
    Add {
        /// workout, meal or steps
        activity_type: String,
        /// Short title
        title: String,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// planned, in_progress or completed
        #[arg(short, long, default_value = "planned")]
        status: String,
        /// Notes
        #[arg(long, default_value = "")]
        description: String,
        /// Workout length in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Workout kind (e.g. Running)
        #[arg(long, default_value = "General")]
        workout_type: String,
        /// Meal calories
        #[arg(long)]
        calories: Option<u32>,
        /// Meal kind (e.g. lunch)
        #[arg(long, default_value = "meal")]
        meal_type: String,
        /// Step count
        #[arg(long)]
        steps: Option<u32>,
    },

    /// Show one activity
    Show {
        /// Activity id
        id: u64,
    },

    /// Change an activity's status or title
    Update {
        /// Activity id
        id: u64,
        /// planned, in_progress or completed
        #[arg(short, long)]
        status: Option<String>,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Delete an activity
    Delete {
        /// Activity id
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let backend = Arc::new(HttpAuthClient::from_config(&config.api)?);
    let store = Arc::new(FileTokenStore::new(config.session.token_path()));
    let session = SessionManager::new(
        Arc::clone(&backend) as Arc<dyn AuthBackend>,
        store,
        SessionOptions::from(&config.session),
    );
    let state = session.ready().await;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => Password::new().with_prompt("Password").interact()?,
            };

            match session.login(&email, &password).await {
                Ok(_) => {
                    if let Some(user) = session.user() {
                        println!("Signed in as {}", user);
                    }
                }
                Err(e) => {
                    eprintln!("Sign-in failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()?,
            };

            match session.register(&name, &email, &password).await {
                Ok(_) => {
                    if let Some(user) = session.user() {
                        println!("Welcome, {}! You are signed in as {}.", name.trim(), user.email());
                    }
                }
                Err(e) => {
                    eprintln!("Registration failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Logout { local } => {
            if !local {
                if let Some(token) = session.token() {
                    if let Err(e) = backend.revoke(&token).await {
                        tracing::warn!("Server-side sign-out failed: {}", e);
                    }
                }
            }
            let had_user = state.user.is_some();
            session.logout();
            if had_user {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
        }

        Commands::Whoami => match state.user {
            Some(user) => match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&user)?),
                _ => {
                    println!("Name:  {}", user.display_name());
                    println!("Email: {}", user.email());
                    println!("Id:    {}", user.id());
                }
            },
            None => {
                eprintln!("Not signed in. Run: stride login --email <email>");
                std::process::exit(1);
            }
        },

        Commands::Activities { command } => {
            if !RouteGuard::new(&session).private("/activities").await.is_allowed() {
                eprintln!("Not signed in. Run: stride login --email <email>");
                std::process::exit(1);
            }

            let client = ActivitiesClient::new(
                config.api.base_url.clone(),
                session.token(),
                config.api.request_timeout(),
            )?;

            run_activities(&client, command, &cli.format).await?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn run_activities(
    client: &ActivitiesClient,
    command: ActivityCommands,
    format: &str,
) -> anyhow::Result<()> {
    match command {
        ActivityCommands::List => {
            let activities = client.list().await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&activities)?);
            } else if activities.is_empty() {
                println!("No activities logged yet.");
                println!();
                println!("Log your first one with:");
                println!("  stride activities add workout \"Morning Run\" --minutes 30");
            } else {
                println!(
                    "{:<6} {:<12} {:<9} {:<28} {:<12} {}",
                    "ID", "Date", "Type", "Title", "Status", "Amount"
                );
                println!("{}", "-".repeat(80));
                for a in activities {
                    println!(
                        "{:<6} {:<12} {:<9} {:<28} {:<12} {}",
                        a.id,
                        a.date,
                        a.activity_type,
                        truncate(&a.title, 28),
                        a.status,
                        a.measurement()
                    );
                }
            }
        }

        ActivityCommands::Add {
            activity_type,
            title,
            date,
            status,
            description,
            minutes,
            workout_type,
            calories,
            meal_type,
            steps,
        } => {
            let activity_type: ActivityType = activity_type.parse()?;
            let status: ActivityStatus = status.parse()?;
            let date = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .with_context(|| format!("invalid date '{}'", d))?,
                None => Utc::now().date_naive(),
            };

            let mut activity = NewActivity::new(activity_type, title, date)
                .description(description)
                .status(status);
            if let Some(m) = minutes {
                activity = activity.workout(workout_type, m);
            }
            if let Some(c) = calories {
                activity = activity.meal(meal_type, c);
            }
            if let Some(s) = steps {
                activity = activity.steps(s);
            }

            let created = client.create(&activity).await?;
            println!("Logged activity {}: {} on {}", created.id, created.title, created.date);
        }

        ActivityCommands::Show { id } => {
            let a = client.get(id).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&a)?);
            } else {
                println!("Activity {}: {}", a.id, a.title);
                println!("  Type:   {}", a.activity_type);
                println!("  Date:   {}", a.date);
                println!("  Status: {}", a.status);
                let amount = a.measurement();
                if !amount.is_empty() {
                    println!("  Amount: {}", amount);
                }
                if !a.description.is_empty() {
                    println!("  Notes:  {}", a.description);
                }
            }
        }

        ActivityCommands::Update { id, status, title } => {
            let current = client.get(id).await?;
            let mut changed = NewActivity::from(&current);
            if let Some(status) = status {
                changed = changed.status(status.parse()?);
            }
            if let Some(title) = title {
                changed.title = title;
            }

            let updated = client.update(id, &changed).await?;
            println!("Updated activity {}: {} ({})", updated.id, updated.title, updated.status);
        }

        ActivityCommands::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted activity {}", id);
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("stride={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_without_password_flag_prompts() {
        let cli = Cli::try_parse_from(["stride", "login", "--email", "ana@example.com"]).unwrap();
        match cli.command {
            Commands::Login { email, password } => {
                assert_eq!(email, "ana@example.com");
                assert!(password.is_none());
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_register_accepts_password_flag() {
        let cli = Cli::try_parse_from([
            "stride", "register", "-n", "Ana", "-e", "ana@example.com", "-p", "secret",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Register { password: Some(ref p), .. } if p == "secret"
        ));
    }

    #[test]
    fn test_activity_update_args() {
        let cli = Cli::try_parse_from([
            "stride", "activities", "update", "3", "--status", "completed",
        ])
        .unwrap();
        match cli.command {
            Commands::Activities {
                command: ActivityCommands::Update { id, status, title },
            } => {
                assert_eq!(id, 3);
                assert_eq!(status.as_deref(), Some("completed"));
                assert!(title.is_none());
            }
            _ => panic!("expected activities update"),
        }
    }
}
