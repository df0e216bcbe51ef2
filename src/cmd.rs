//! Command implementations for the CLI interface.
//!
//! Each subcommand resolves its arguments against the current records, calls one
//! engine operation and prints the result. Skipped operations are reported on
//! stderr and are not fatal.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local, Utc, Weekday};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use uuid::Uuid;

use taskflow::actor::initials_of;
use taskflow::db::*;
use taskflow::engine::Engine;
use taskflow::fields::*;
use taskflow::goal::{GoalDraft, GoalUpdate};
use taskflow::notify::LogSink;
use taskflow::outcome::Outcome;
use taskflow::recurrence::{RecurrenceRule, OCCURRENCE_CEILING};
use taskflow::store::status_label;
use taskflow::task::*;
use taskflow::time_tracking::{end_after, format_elapsed, ManualEntry, TimeEntryUpdate};
use taskflow::workload::UserWorkload;

use crate::cli::Cli;

type Eng = Engine<LogSink>;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Task name.
        name: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Assignee user id (defaults to the actor).
        #[arg(long)]
        assignee: Option<String>,
        /// Assignee display name, if the id is new.
        #[arg(long)]
        assignee_name: Option<String>,
        /// Project id.
        #[arg(long, default_value = "general")]
        project: String,
        /// Project display name, if the id is new.
        #[arg(long)]
        project_name: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "next friday"...
        #[arg(long, default_value = "in 7d")]
        due: String,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Status::Pending)]
        status: Status,
        /// Estimated hours.
        #[arg(long, default_value_t = 0.0)]
        estimate: f64,
    },

    /// List tasks with optional filters.
    List {
        /// Only tasks in this project.
        #[arg(long)]
        project: Option<String>,
        /// Only tasks assigned to this user id.
        #[arg(long)]
        assignee: Option<String>,
        /// Only overdue tasks.
        #[arg(long)]
        overdue: bool,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by id, id prefix or name.
    View { id: String },

    /// Update fields on a task.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Reassign to this user id.
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        assignee_name: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        project_name: Option<String>,
        /// Replace tags. May be repeated and comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long)]
        actual: Option<f64>,
    },

    /// Delete a task.
    Delete { id: String },

    /// Comment on a task as the actor.
    Comment { id: String, text: String },

    /// Attach an uploaded file to a task.
    Attach {
        id: String,
        /// File name as shown to users.
        file: String,
        /// Storage locator returned by the upload service.
        #[arg(long)]
        url: String,
        #[arg(long, default_value_t = 0)]
        size: u64,
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Remove an attachment from a task.
    Detach {
        id: String,
        /// Attachment id or prefix.
        attachment: String,
    },

    /// Manage subtasks.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Start, stop and list timers.
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Log time by hand.
    Log {
        id: String,
        /// Minutes worked.
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
        #[arg(long, default_value = "")]
        desc: String,
        /// Day the work started (defaults to now).
        #[arg(long)]
        on: Option<String>,
        #[arg(long)]
        non_billable: bool,
        #[arg(long)]
        rate: Option<f64>,
    },

    /// List time entries.
    Entries {
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },

    /// Correct or remove a time entry.
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Total logged minutes for a task or a user.
    Total {
        #[arg(long, conflicts_with = "user")]
        task: Option<String>,
        #[arg(long)]
        user: Option<String>,
        /// Inclusive lower bound on entry start (user totals only).
        #[arg(long)]
        from: Option<String>,
        /// Inclusive upper bound on entry start (user totals only).
        #[arg(long)]
        to: Option<String>,
    },

    /// Create a batch of recurring tasks.
    Recur {
        /// Template name; each occurrence is named "<name> (<date>)".
        name: String,
        #[arg(long, value_enum)]
        every: RecurrenceType,
        #[arg(long, default_value_t = 1)]
        interval: u32,
        /// Days of week, comma-separated (recorded on the rule).
        #[arg(long, value_delimiter = ',')]
        on: Vec<Weekday>,
        /// Day of month (recorded on the rule).
        #[arg(long)]
        day_of_month: Option<u32>,
        /// Last date an occurrence may fall on.
        #[arg(long)]
        until: Option<String>,
        /// Maximum occurrences.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(OCCURRENCE_CEILING)))]
        count: Option<u32>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        assignee_name: Option<String>,
        #[arg(long, default_value = "general")]
        project: String,
        #[arg(long)]
        project_name: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, default_value_t = 0.0)]
        estimate: f64,
    },

    /// Workload and utilisation statistics.
    Workload {
        /// User id (defaults to the actor).
        #[arg(long, conflicts_with = "team")]
        user: Option<String>,
        /// Every assignee, busiest first.
        #[arg(long)]
        team: bool,
    },

    /// Manage goals.
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// List projects with completion percentage.
    Projects,

    /// Show notifications addressed to the actor.
    Inbox {
        /// Include notifications already read.
        #[arg(long)]
        all: bool,
        /// Mark the listed notifications read.
        #[arg(long)]
        mark_read: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    Add { id: String, name: String },
    /// Flip a subtask between done and not done.
    Toggle { id: String, subtask: String },
}

#[derive(Subcommand)]
pub enum TimerAction {
    Start {
        id: String,
        #[arg(long, default_value = "")]
        desc: String,
    },
    /// Stop a timer; without an id, stops the actor's only running timer.
    Stop { timer: Option<String> },
    List,
}

#[derive(Subcommand)]
pub enum EntryAction {
    Set {
        entry: String,
        #[arg(long)]
        minutes: Option<u64>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        billable: Option<bool>,
        #[arg(long)]
        rate: Option<f64>,
        #[arg(long, value_enum)]
        status: Option<EntryStatus>,
    },
    Delete { entry: String },
}

#[derive(Subcommand)]
pub enum GoalAction {
    Add {
        title: String,
        #[arg(long)]
        target: f64,
        #[arg(long, default_value_t = 0.0)]
        progress: f64,
        #[arg(long, default_value = "in 1m")]
        due: String,
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long)]
        desc: Option<String>,
    },
    Update {
        goal: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        progress: Option<f64>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long, value_enum)]
        status: Option<GoalStatus>,
    },
    List,
    Delete { goal: String },
}

impl Commands {
    /// Whether the command can change stored records.
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Commands::List { .. }
                | Commands::View { .. }
                | Commands::Entries { .. }
                | Commands::Total { .. }
                | Commands::Workload { .. }
                | Commands::Projects
                | Commands::Completions { .. }
                | Commands::Timer { action: TimerAction::List }
                | Commands::Goal { action: GoalAction::List }
                | Commands::Inbox { mark_read: false, .. }
        )
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

/// Print a skipped outcome; hand an applied value to `ok`.
fn report<T>(outcome: Outcome<T>, ok: impl FnOnce(T)) {
    match outcome {
        Outcome::Applied(v) => ok(v),
        Outcome::Skipped(skip) => eprintln!("Skipped: {skip}"),
    }
}

fn resolve_task(eng: &Eng, identifier: &str) -> TaskId {
    resolve_task_identifier(identifier, eng.tasks().tasks()).unwrap_or_else(|e| fail(e))
}

/// Find the one id starting with `prefix`.
fn resolve_prefix(prefix: &str, ids: impl IntoIterator<Item = Uuid>, what: &str) -> Uuid {
    let prefix = prefix.trim().to_lowercase();
    let matches: Vec<Uuid> = ids.into_iter().filter(|id| id.to_string().starts_with(&prefix)).collect();
    match matches.as_slice() {
        [one] => *one,
        [] => fail(format!("No {what} matches '{prefix}'")),
        _ => fail(format!("'{prefix}' matches {} {what}s, use a longer prefix", matches.len())),
    }
}

fn parse_due(input: &str) -> DateTime<Utc> {
    parse_due_input(input, Local::now().date_naive())
        .map(end_of_day)
        .unwrap_or_else(|| fail(format!("Cannot understand date '{input}'")))
}

/// Start of the given day, for lower bounds.
fn parse_day_start(input: &str) -> DateTime<Utc> {
    parse_due(input)
        .checked_sub_signed(chrono::Duration::seconds(86_399))
        .unwrap_or_else(|| fail(format!("Date '{input}' is out of range")))
}

/// An assignee for `id`, reusing the name already on record for that user.
fn assignee_for(eng: &Eng, id: Option<String>, name: Option<String>) -> Assignee {
    let actor = eng.actor();
    let id = id.unwrap_or(actor.id.clone());
    if let Some(name) = name {
        return Assignee { initials: initials_of(&name), id, name };
    }
    if id == actor.id {
        return actor.as_assignee();
    }
    eng.tasks_by_assignee(&id)
        .first()
        .map(|t| t.assignee.clone())
        .unwrap_or_else(|| Assignee { initials: initials_of(&id), name: id.clone(), id })
}

fn project_for(eng: &Eng, id: String, name: Option<String>) -> ProjectRef {
    if let Some(name) = name {
        return ProjectRef { id, name };
    }
    eng.tasks_by_project(&id)
        .first()
        .map(|t| t.project.clone())
        .unwrap_or_else(|| ProjectRef { name: id.clone(), id })
}

pub fn cmd_add(
    eng: &mut Eng,
    name: String,
    desc: Option<String>,
    assignee: Option<String>,
    assignee_name: Option<String>,
    project: String,
    project_name: Option<String>,
    tags: Vec<String>,
    due: String,
    priority: Priority,
    status: Status,
    estimate: f64,
) {
    if name.trim().is_empty() {
        fail("Task name cannot be empty");
    }
    let draft = TaskDraft {
        name: name.trim().to_string(),
        description: desc,
        status,
        priority,
        assignee: assignee_for(eng, assignee, assignee_name),
        due_date: parse_due(&due),
        project: project_for(eng, project, project_name),
        tags,
        estimated_hours: estimate,
        dependencies: Vec::new(),
        subtasks: Vec::new(),
        comments: Vec::new(),
        attachments: Vec::new(),
    };
    report(eng.create_task(draft), |id| println!("Added task {}", short_id(&id)));
}

pub fn cmd_list(
    eng: &Eng,
    project: Option<String>,
    assignee: Option<String>,
    overdue: bool,
    status: Option<Status>,
    sort: SortKey,
    limit: Option<usize>,
) {
    let mut rows: Vec<&Task> = if overdue { eng.overdue_tasks() } else { eng.tasks().tasks().iter().collect() };
    rows.retain(|t| {
        project.as_deref().map_or(true, |p| t.project.id == p)
            && assignee.as_deref().map_or(true, |a| t.assignee.id == a)
            && status.map_or(true, |s| t.status == s)
    });

    match sort {
        SortKey::Due => rows.sort_by_key(|t| (t.due_date, t.name.clone())),
        SortKey::Priority => rows.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.due_date.cmp(&b.due_date))),
        SortKey::Name => rows.sort_by_key(|t| t.name.to_lowercase()),
    }
    if let Some(n) = limit {
        rows.truncate(n);
    }
    print_table(&rows);
}

pub fn cmd_view(eng: &Eng, id: String) {
    let task_id = resolve_task(eng, &id);
    let Some(task) = eng.tasks().get(task_id) else {
        fail(format!("Task {id} not found."));
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Name:         {}", task.name);
    println!("Status:       {}", status_label(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Assignee:     {} ({})", task.assignee.name, task.assignee.id);
    println!("Project:      {} ({})", task.project.name, task.project.id);
    println!("Due:          {} ({})", task.due_date.format("%Y-%m-%d %H:%M"), format_due_relative(task.due_date, today));
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!("Estimate:     {:.1}h", task.estimated_hours);
    println!("Actual:       {:.1}h", task.actual_hours);
    println!("Logged:       {} min", eng.task_total_time(task.id));
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!("Updated UTC:  {}", task.updated_at.to_rfc3339());
    println!("Description:\n{}\n", task.description.as_deref().unwrap_or("-"));

    if !task.subtasks.is_empty() {
        println!("Subtasks:");
        for s in &task.subtasks {
            println!("  [{}] {} (#{})", if s.completed { "x" } else { " " }, s.name, short_id(&s.id));
        }
    }
    if !task.attachments.is_empty() {
        println!("Attachments:");
        for a in &task.attachments {
            println!("  {} {} ({} bytes, {}) by {}", short_id(&a.id), a.file_name, a.size_bytes, a.mime_type, a.uploaded_by);
        }
    }
    if !task.comments.is_empty() {
        println!("Comments:");
        for c in &task.comments {
            println!("  [{}] {}: {}", c.created_at.format("%Y-%m-%d %H:%M"), c.author, c.content);
        }
    }
}

pub fn cmd_update(
    eng: &mut Eng,
    id: String,
    name: Option<String>,
    desc: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    assignee: Option<String>,
    assignee_name: Option<String>,
    due: Option<String>,
    project: Option<String>,
    project_name: Option<String>,
    tags: Vec<String>,
    estimate: Option<f64>,
    actual: Option<f64>,
) {
    let task_id = resolve_task(eng, &id);
    let update = TaskUpdate {
        name,
        description: desc,
        status,
        priority,
        assignee: assignee.map(|a| assignee_for(eng, Some(a), assignee_name)),
        due_date: due.as_deref().map(parse_due),
        project: project.map(|p| project_for(eng, p, project_name)),
        tags: if tags.is_empty() { None } else { Some(tags) },
        estimated_hours: estimate,
        actual_hours: actual,
        dependencies: None,
        subtasks: None,
    };
    report(eng.update_task(task_id, update), |()| println!("Updated task {}", short_id(&task_id)));
}

pub fn cmd_delete(eng: &mut Eng, id: String) {
    let task_id = resolve_task(eng, &id);
    report(eng.delete_task(task_id), |task| println!("Deleted task {} ({})", short_id(&task.id), task.name));
}

pub fn cmd_comment(eng: &mut Eng, id: String, text: String) {
    let task_id = resolve_task(eng, &id);
    report(eng.comment(task_id, &text), |_| println!("Comment added"));
}

pub fn cmd_attach(eng: &mut Eng, id: String, file: String, url: String, size: u64, mime: String) {
    let task_id = resolve_task(eng, &id);
    let draft = AttachmentDraft {
        file_name: file,
        size_bytes: size,
        mime_type: mime,
        uploaded_by: eng.actor().name,
        url,
    };
    report(eng.add_task_attachment(task_id, draft), |a| println!("Attached {}", short_id(&a)));
}

pub fn cmd_detach(eng: &mut Eng, id: String, attachment: String) {
    let task_id = resolve_task(eng, &id);
    let ids: Vec<Uuid> = eng.tasks().get(task_id).map(|t| t.attachments.iter().map(|a| a.id).collect()).unwrap_or_default();
    let attachment_id = resolve_prefix(&attachment, ids, "attachment");
    report(eng.remove_task_attachment(task_id, attachment_id), |a| println!("Removed {}", a.file_name));
}

pub fn cmd_subtask(eng: &mut Eng, action: SubtaskAction) {
    match action {
        SubtaskAction::Add { id, name } => {
            let task_id = resolve_task(eng, &id);
            report(eng.add_subtask(task_id, &name), |s| println!("Added subtask {}", short_id(&s)));
        }
        SubtaskAction::Toggle { id, subtask } => {
            let task_id = resolve_task(eng, &id);
            let ids: Vec<Uuid> = eng.tasks().get(task_id).map(|t| t.subtasks.iter().map(|s| s.id).collect()).unwrap_or_default();
            let subtask_id = resolve_prefix(&subtask, ids, "subtask");
            report(eng.toggle_subtask(task_id, subtask_id), |done| {
                println!("Subtask {}", if done { "done" } else { "reopened" })
            });
        }
    }
}

pub fn cmd_timer(eng: &mut Eng, action: TimerAction) {
    let me = eng.actor();
    match action {
        TimerAction::Start { id, desc } => {
            let task_id = resolve_task(eng, &id);
            let timer = eng.start_timer(task_id, &desc);
            println!("Started timer {}", short_id(&timer));
        }
        TimerAction::Stop { timer } => {
            let mine: Vec<Uuid> = eng.time().active_timers(&me.id).iter().map(|t| t.id).collect();
            let timer_id = match timer {
                Some(prefix) => resolve_prefix(&prefix, mine, "timer"),
                None if mine.len() == 1 => mine[0],
                None if mine.is_empty() => fail("No running timer"),
                None => fail("Several timers running, pass a timer id"),
            };
            report(eng.stop_timer(timer_id), |entry| {
                println!("Logged {} min ({})", entry.duration, short_id(&entry.id))
            });
        }
        TimerAction::List => {
            let now = eng.now();
            for t in eng.time().active_timers(&me.id) {
                let task = eng.tasks().get(t.task_id).map(|t| t.name.as_str()).unwrap_or("<deleted>");
                println!("{:<9} {} {} {}", short_id(&t.id), format_elapsed(t.elapsed(now)), task, t.description);
            }
        }
    }
}

pub fn cmd_log(
    eng: &mut Eng,
    id: String,
    minutes: i64,
    desc: String,
    on: Option<String>,
    non_billable: bool,
    rate: Option<f64>,
) {
    let task_id = resolve_task(eng, &id);
    let start_time = on.as_deref().map(parse_day_start).unwrap_or_else(|| eng.now());
    let entry = ManualEntry {
        task_id,
        start_time,
        end_time: end_after(start_time, minutes.max(0)),
        duration: minutes,
        description: desc,
        billable: !non_billable,
        hourly_rate: rate,
    };
    report(eng.add_manual_entry(entry), |e| println!("Logged {minutes} min ({})", short_id(&e)));
}

pub fn cmd_entries(eng: &Eng, task: Option<String>, user: Option<String>) {
    let task_id = task.map(|t| resolve_task(eng, &t));
    println!("{:<9} {:<16} {:>6} {:<9} {:<8} Task", "ID", "Start", "Min", "Status", "User");
    for e in eng.time().entries() {
        if task_id.is_some_and(|id| e.task_id != id) || user.as_deref().is_some_and(|u| e.user_id != u) {
            continue;
        }
        let task = eng.tasks().get(e.task_id).map(|t| t.name.as_str()).unwrap_or("<deleted>");
        let amount = e.billable_amount().map(|a| format!(" ${a:.2}")).unwrap_or_default();
        println!(
            "{:<9} {:<16} {:>6} {:<9} {:<8} {}{}",
            short_id(&e.id),
            e.start_time.format("%Y-%m-%d %H:%M"),
            e.duration,
            format_entry_status(e.status),
            truncate(&e.user_id, 8),
            task,
            amount
        );
    }
}

pub fn cmd_entry(eng: &mut Eng, action: EntryAction) {
    let ids: Vec<Uuid> = eng.time().entries().iter().map(|e| e.id).collect();
    match action {
        EntryAction::Set { entry, minutes, desc, billable, rate, status } => {
            let id = resolve_prefix(&entry, ids, "entry");
            let update = TimeEntryUpdate {
                duration: minutes,
                description: desc,
                billable,
                hourly_rate: rate,
                status,
                ..Default::default()
            };
            report(eng.update_time_entry(id, update), |()| println!("Updated entry {}", short_id(&id)));
        }
        EntryAction::Delete { entry } => {
            let id = resolve_prefix(&entry, ids, "entry");
            report(eng.delete_time_entry(id), |e| println!("Deleted entry of {} min", e.duration));
        }
    }
}

pub fn cmd_total(eng: &Eng, task: Option<String>, user: Option<String>, from: Option<String>, to: Option<String>) {
    if let Some(task) = task {
        let task_id = resolve_task(eng, &task);
        println!("{} min", eng.task_total_time(task_id));
        return;
    }
    let user = user.unwrap_or_else(|| eng.actor().id);
    let start = from.as_deref().map(parse_day_start);
    let end = to.as_deref().map(parse_due);
    println!("{} min", eng.user_total_time(&user, start, end));
}

pub fn cmd_recur(
    eng: &mut Eng,
    name: String,
    every: RecurrenceType,
    interval: u32,
    on: Vec<Weekday>,
    day_of_month: Option<u32>,
    until: Option<String>,
    count: Option<u32>,
    desc: Option<String>,
    assignee: Option<String>,
    assignee_name: Option<String>,
    project: String,
    project_name: Option<String>,
    priority: Priority,
    estimate: f64,
) {
    let template = TaskTemplate {
        name,
        description: desc,
        priority,
        assignee: assignee_for(eng, assignee, assignee_name),
        project: project_for(eng, project, project_name),
        estimated_hours: estimate,
    };
    let rule = RecurrenceRule {
        kind: every,
        interval,
        days_of_week: on,
        day_of_month,
        end_date: until.as_deref().map(parse_due),
        max_occurrences: count,
    };
    report(eng.create_recurring_tasks(&rule, &template), |batch| {
        println!("Generated {} occurrences, created {}:", batch.occurrences.len(), batch.created.len());
        for id in &batch.created {
            if let Some(t) = eng.tasks().get(*id) {
                println!("  {} {}", short_id(id), t.name);
            }
        }
        if batch.occurrences.len() > batch.created.len() {
            println!("  ... {} more not yet created", batch.occurrences.len() - batch.created.len());
        }
    });
}

fn print_workload(w: &UserWorkload) {
    println!(
        "{:<10} tasks {:>3}  done {:>3}  active {:>3}  overdue {:>3}  logged {:>6.1}h / est {:>6.1}h  completion {:>5.1}%  utilization {:>6.1}% ({})",
        truncate(&w.user_id, 10),
        w.total_tasks,
        w.completed_tasks,
        w.in_progress_tasks,
        w.overdue_tasks,
        w.logged_minutes as f64 / 60.0,
        w.estimated_hours,
        w.completion_rate,
        w.utilization,
        w.band().label()
    );
}

pub fn cmd_workload(eng: &Eng, user: Option<String>, team: bool) {
    if team {
        for w in eng.team_workload() {
            print_workload(&w);
        }
        return;
    }
    let user = user.unwrap_or_else(|| eng.actor().id);
    print_workload(&eng.user_workload(&user));
    println!("Next 7 days:");
    for day in eng.daily_load(&user, eng.now().date_naive(), 7) {
        println!("  {} {:<3} {}", day.date.format("%a %m-%d"), day.tasks, "#".repeat(day.tasks));
    }
}

pub fn cmd_goal(eng: &mut Eng, action: GoalAction) {
    let ids: Vec<Uuid> = eng.goals().goals().iter().map(|g| g.id).collect();
    match action {
        GoalAction::Add { title, target, progress, due, category, desc } => {
            let draft = GoalDraft {
                title,
                description: desc,
                progress,
                target,
                due_date: parse_due(&due),
                category,
                project: None,
            };
            report(eng.create_goal(draft), |id| println!("Added goal {}", short_id(&id)));
        }
        GoalAction::Update { goal, title, progress, target, status } => {
            let id = resolve_prefix(&goal, ids, "goal");
            let update = GoalUpdate { title, progress, target, status, ..Default::default() };
            report(eng.update_goal(id, update), |()| println!("Updated goal {}", short_id(&id)));
        }
        GoalAction::List => {
            for g in eng.goals().goals() {
                println!(
                    "{:<9} {:<10} {:>5.1}% {:<12} {}",
                    short_id(&g.id),
                    format_goal_status(g.status),
                    g.progress_percent(),
                    truncate(&g.category, 12),
                    g.title
                );
            }
        }
        GoalAction::Delete { goal } => {
            let id = resolve_prefix(&goal, ids, "goal");
            report(eng.delete_goal(id), |g| println!("Deleted goal {}", g.title));
        }
    }
}

pub fn cmd_projects(eng: &Eng) {
    for p in eng.tasks().projects() {
        let count = eng.tasks_by_project(&p.id).len();
        println!("{:<14} {:<24} {:>3} tasks {:>4}%", truncate(&p.id, 14), truncate(&p.name, 24), count, eng.project_completion(&p.id));
    }
}

pub fn cmd_inbox(eng: &mut Eng, all: bool, mark_read: bool) {
    let me = eng.actor().id;
    for n in eng.sink_mut().inbox.iter_mut().filter(|n| n.recipient_id == me && (all || !n.read)) {
        println!("[{}] {:<8} {}: {}", n.created_at.format("%m-%d %H:%M"), format!("{:?}", n.kind).to_lowercase(), n.title, n.message);
        if mark_read {
            n.read = true;
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tf", &mut io::stdout());
}

/// Where the database lives when --db is not given.
pub fn default_db_path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join("taskflow.json")
}
