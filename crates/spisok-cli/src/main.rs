//! spisok - weekly reminder scheduler
//!
//! Edits the reminder store and runs the daemon that fires reminders.

mod config;
mod daemon;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use spisok_scheduler::{Reminder, ReminderId, ReminderStore, upcoming};
use spisok_store::JsonReminderStore;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, default_config_path, load_config};

#[derive(Parser)]
#[command(name = "spisok", version, about = "Weekly recurring reminders")]
struct Cli {
    /// Path to the TOML config file (default: ~/.spisok/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reminder store file, overriding the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a reminder
    Add {
        #[arg(short, long)]
        message: String,
        /// Local time of day, HH:mm
        #[arg(short, long)]
        time: String,
        /// Weekdays, 1 = Monday .. 7 = Sunday
        #[arg(short, long, value_delimiter = ',', required = true)]
        days: Vec<u8>,
    },
    /// List stored reminders
    List,
    /// Turn a reminder on
    Enable { id: String },
    /// Turn a reminder off
    Disable { id: String },
    /// Delete reminders
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Turn all reminders on or off
    Global { state: Toggle },
    /// Show when each reminder fires next
    Next,
    /// Run the scheduler until interrupted
    Run,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;
    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());
    let store = JsonReminderStore::open(&store_path);

    match cli.command {
        Command::Add { message, time, days } => {
            let days: BTreeSet<u8> = days.into_iter().collect();
            let reminder = store.add(&message, &time, &days)?;
            println!("Added {}", reminder.id);
            if !reminder.is_enabled {
                println!("Reminders are globally off; it starts disabled.");
            }
        }
        Command::List => list(&store)?,
        Command::Enable { id } => set_enabled(&store, &id, true)?,
        Command::Disable { id } => set_enabled(&store, &id, false)?,
        Command::Delete { ids } => {
            let ids: Vec<ReminderId> = ids.into_iter().map(ReminderId::from).collect();
            let removed = store.delete(&ids)?;
            println!("Deleted {} reminder(s)", removed);
        }
        Command::Global { state } => {
            let enabled = matches!(state, Toggle::On);
            store.set_global(enabled)?;
            println!("Reminders globally {}", if enabled { "on" } else { "off" });
        }
        Command::Next => next(&store)?,
        Command::Run => run(&config, &store_path).await?,
    }

    Ok(())
}

async fn run(config: &Config, store_path: &std::path::Path) -> Result<()> {
    println!("spisok v{}", env!("CARGO_PKG_VERSION"));
    println!("Press Ctrl+C to stop.");
    daemon::run(config, store_path).await
}

fn list(store: &JsonReminderStore) -> Result<()> {
    let snapshot = store.snapshot().context("Failed to read reminders")?;
    if !snapshot.global_enabled {
        println!("(reminders are globally off)");
    }
    if snapshot.reminders.is_empty() {
        println!("No reminders.");
        return Ok(());
    }

    for reminder in &snapshot.reminders {
        println!(
            "{}  {}  {:<27}  {}  {}",
            reminder.id,
            reminder.time,
            format_days(reminder),
            if reminder.is_enabled { "on " } else { "off" },
            reminder.message
        );
    }
    Ok(())
}

fn set_enabled(store: &JsonReminderStore, id: &str, enabled: bool) -> Result<()> {
    let reminder = store.set_enabled(&ReminderId::from(id), enabled)?;
    if enabled && !reminder.is_enabled {
        println!("Reminders are globally off; {} stays disabled.", reminder.id);
    } else {
        println!("{} {}", reminder.id, if reminder.is_enabled { "enabled" } else { "disabled" });
    }
    Ok(())
}

fn next(store: &JsonReminderStore) -> Result<()> {
    let snapshot = store.snapshot().context("Failed to read reminders")?;
    let slots = upcoming(&snapshot.reminders, snapshot.global_enabled, &Local::now());
    if slots.is_empty() {
        println!("Nothing scheduled.");
        return Ok(());
    }

    for (tag, fire_at) in slots {
        let message = snapshot
            .reminders
            .iter()
            .find(|r| r.id == tag.reminder_id)
            .map(|r| r.message.as_str())
            .unwrap_or_default();
        println!("{}  {}  {}", fire_at.format("%a %Y-%m-%d %H:%M"), tag, message);
    }
    Ok(())
}

fn format_days(reminder: &Reminder) -> String {
    let (days, _) = reminder.weekdays();
    days.iter().map(|d| d.short_name()).collect::<Vec<_>>().join(",")
}
