//! Command-line front end for `devgate_core`.
//!
//! # Responsibility
//! - Print the aggregated activity feed of a database as JSON.
//! - Seed a database with demo users for local sanity checks.

use clap::{Parser, Subcommand};
use devgate_core::{
    ActivityFeed, FeedConfig, LogOptions, NewObjective, NewProject, NewSkill, NewUser,
    ObjectiveStatus, ProfileService, SqliteRecordStore,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "devgate_cli", version, about = "DevGate activity feed tool")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "devgate.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the global feed, or one user's feed, as JSON.
    Feed {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        deadline_ms: Option<u64>,
        #[arg(long)]
        max_in_flight: Option<usize>,
    },
    /// Create demo users with a few skills, projects and objectives.
    Seed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir {
        devgate_core::init_logging_with(&LogOptions {
            level: cli.log_level,
            log_dir,
            echo_warnings: true,
        })?;
    }

    let store = SqliteRecordStore::open(&cli.db)?;
    match cli.command {
        Command::Feed {
            user,
            deadline_ms,
            max_in_flight,
        } => {
            let defaults = FeedConfig::default();
            let config = FeedConfig {
                max_in_flight: max_in_flight.unwrap_or(defaults.max_in_flight),
                default_deadline_ms: deadline_ms.unwrap_or(defaults.default_deadline_ms),
            };
            let feed = ActivityFeed::with_config(Arc::new(store), config)?;
            let report = match user {
                Some(username) => {
                    let deadline =
                        tokio::time::Instant::now() + feed.config().default_deadline();
                    feed.user_activity(&username, deadline).await?
                }
                None => feed.activity_feed_default().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_complete() {
                eprintln!(
                    "warning: {} issues, {} partitions unreadable",
                    report.issues.len(),
                    report.unreadable_partitions()
                );
            }
        }
        Command::Seed => seed(ProfileService::new(store))?,
    }
    Ok(())
}

fn seed(profiles: ProfileService<SqliteRecordStore>) -> Result<(), Box<dyn Error>> {
    for (username, name) in [("ada", "Ada"), ("grace", "Grace"), ("linus", "Linus")] {
        if !profiles.username_available(username)? {
            continue;
        }
        profiles.register_user(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: Some(name.to_string()),
        })?;
    }

    profiles.add_skill(
        "ada",
        &NewSkill {
            title: "Rust".to_string(),
            level: 3,
        },
    )?;
    profiles.add_project(
        "grace",
        &NewProject {
            title: "devgate".to_string(),
            description: "Developer activity feed".to_string(),
            stack: "Rust, SQLite, Tokio".to_string(),
            github_link: "https://github.com/example/devgate".to_string(),
        },
    )?;
    profiles.add_objective(
        "ada",
        &NewObjective {
            title: "Publish the feed".to_string(),
            status: ObjectiveStatus::InProgress,
        },
    )?;

    println!("seeded demo profiles");
    Ok(())
}
