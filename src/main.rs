//! # tf - team task and time CLI
//!
//! Command-line front end for the `taskflow` engine: tasks with comments, attachments
//! and subtasks, start/stop timers and manual time entries, recurring task batches,
//! workload statistics and goals.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task for yourself
//! tf add "Write release notes" --project docs --due friday --estimate 3
//!
//! # Track time on it
//! tf timer start "Write release notes"
//! tf timer stop
//!
//! # Fortnightly review for someone else
//! tf recur "Sprint review" --every weekly --interval 2 --count 6 --assignee u2
//!
//! # How busy is everyone?
//! tf workload --team
//! ```
//!
//! Data is stored in `~/.taskflow/taskflow.json`, with `config.json` alongside it.
//! Notifications produced by a command are logged (set `RUST_LOG=info` to see them)
//! and kept in the inbox shown by `tf inbox`.

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use taskflow::actor::{Actor, StaticActor};
use taskflow::clock::SystemClock;
use taskflow::config::Config;
use taskflow::db::Database;
use taskflow::engine::Engine;
use taskflow::notify::LogSink;

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    // Determine data directory
    let data_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".taskflow")
    };
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    let db_path = cli.db.clone().unwrap_or_else(|| default_db_path(&data_dir));
    let config_path = data_dir.join("config.json");

    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    // First run: write the defaults out so they can be edited.
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("could not write default config: {e}");
        }
    }
    if let Some(id) = cli.actor {
        let name = cli.actor_name.unwrap_or_else(|| id.clone());
        config.actor = Actor::new(id, name);
    }
    debug!(db = %db_path.display(), actor = %config.actor.id, "starting");

    let mut db = Database::load(&db_path).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    let sink = LogSink::new(std::mem::take(&mut db.notifications));
    let mut actors = StaticActor::new(config.actor.clone(), config.owner_recipient.clone());
    actors.delete_requires_owner = config.delete_requires_owner;
    let mut eng = Engine::from_database(db, &config, Box::new(actors), Box::new(SystemClock), sink);

    let mutates = cli.command.mutates();
    match cli.command {
        Commands::Add {
            name, desc, assignee, assignee_name, project, project_name, tags, due,
            priority, status, estimate,
        } => cmd_add(&mut eng, name, desc, assignee, assignee_name, project, project_name,
                     tags, due, priority, status, estimate),

        Commands::List { project, assignee, overdue, status, sort, limit } =>
            cmd_list(&eng, project, assignee, overdue, status, sort, limit),

        Commands::View { id } => cmd_view(&eng, id),

        Commands::Update {
            id, name, desc, status, priority, assignee, assignee_name, due, project,
            project_name, tags, estimate, actual,
        } => cmd_update(&mut eng, id, name, desc, status, priority, assignee, assignee_name,
                        due, project, project_name, tags, estimate, actual),

        Commands::Delete { id } => cmd_delete(&mut eng, id),

        Commands::Comment { id, text } => cmd_comment(&mut eng, id, text),

        Commands::Attach { id, file, url, size, mime } => cmd_attach(&mut eng, id, file, url, size, mime),

        Commands::Detach { id, attachment } => cmd_detach(&mut eng, id, attachment),

        Commands::Subtask { action } => cmd_subtask(&mut eng, action),

        Commands::Timer { action } => cmd_timer(&mut eng, action),

        Commands::Log { id, minutes, desc, on, non_billable, rate } =>
            cmd_log(&mut eng, id, minutes, desc, on, non_billable, rate),

        Commands::Entries { task, user } => cmd_entries(&eng, task, user),

        Commands::Entry { action } => cmd_entry(&mut eng, action),

        Commands::Total { task, user, from, to } => cmd_total(&eng, task, user, from, to),

        Commands::Recur {
            name, every, interval, on, day_of_month, until, count, desc, assignee,
            assignee_name, project, project_name, priority, estimate,
        } => cmd_recur(&mut eng, name, every, interval, on, day_of_month, until, count, desc,
                       assignee, assignee_name, project, project_name, priority, estimate),

        Commands::Workload { user, team } => cmd_workload(&eng, user, team),

        Commands::Goal { action } => cmd_goal(&mut eng, action),

        Commands::Projects => cmd_projects(&eng),

        Commands::Inbox { all, mark_read } => cmd_inbox(&mut eng, all, mark_read),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }

    if mutates {
        let (mut db, sink) = eng.into_database();
        db.notifications = sink.inbox;
        if let Err(e) = db.save(&db_path) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
