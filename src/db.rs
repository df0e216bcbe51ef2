//! Database file and utility functions.
//!
//! This module provides the `Database` struct persisted as a JSON file, along with
//! the tag, date parsing, formatting and identifier-resolution helpers the CLI uses.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DbError, ResolveError};
use crate::fields::*;
use crate::goal::Goal;
use crate::notify::Notification;
use crate::store::status_label;
use crate::task::{Task, TaskId};
use crate::time_tracking::{TimeEntry, Timer};

/// Everything the engine owns, as stored on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub timers: Vec<Timer>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Database {
    /// Load database from a JSON file; a missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self, DbError> {
        if !path.exists() {
            debug!(path = %path.display(), "no database yet, starting empty");
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path).map_err(|source| DbError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&buf).map_err(|source| DbError::Parse { path: path.to_path_buf(), source })
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), DbError> {
        let data = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let write = |source| DbError::Write { path: path.to_path_buf(), source };
        let mut f = File::create(&tmp).map_err(write)?;
        f.write_all(data.as_bytes()).map_err(write)?;
        f.flush().map_err(write)?;
        fs::rename(&tmp, path).map_err(write)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "database saved");
        Ok(())
    }
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "monday", "next friday", ...
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => return Some(start_end_of_week(today).1),
        "end of month" | "eom" => {
            let first = today.with_day(1)?;
            return Some(first.checked_add_months(Months::new(1))? - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return today.checked_add_signed(Duration::try_days(n)?);
        }
        if let Some(n) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return today.checked_add_signed(Duration::try_weeks(n)?);
        }
        if let Some(n) = rest.strip_suffix('m').and_then(|n| n.trim().parse::<u32>().ok()) {
            return today.checked_add_months(Months::new(n));
        }
    }

    let (next, day) = match s.strip_prefix("next ") {
        Some(day) => (true, day),
        None => (false, s.strip_prefix("this ").unwrap_or(s.as_str())),
    };
    if let Ok(weekday) = day.parse::<chrono::Weekday>() {
        let ahead = (7 + weekday.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64) % 7;
        let ahead = if next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// The last second of `date`, in UTC. Dates typed by hand are due by the end of the day.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    Utc.from_utc_datetime(&date.and_time(last_second))
}

/// Start and end dates of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: DateTime<Utc>, today: NaiveDate) -> String {
    let days = (due.date_naive() - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

pub fn format_entry_status(s: EntryStatus) -> &'static str {
    match s {
        EntryStatus::Running => "running",
        EntryStatus::Stopped => "stopped",
        EntryStatus::Approved => "approved",
        EntryStatus::Rejected => "rejected",
    }
}

pub fn format_goal_status(s: GoalStatus) -> &'static str {
    match s {
        GoalStatus::Active => "Active",
        GoalStatus::Completed => "Completed",
        GoalStatus::Paused => "Paused",
    }
}

/// First eight characters of an id, enough to type back in.
pub fn short_id(id: &impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<9} {:<12} {:<7} {:<9} {:<6} {:<14} Name [tags]",
        "ID", "Status", "Pri", "Due", "Who", "Project"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() { String::new() } else { format!(" [{}]", t.tags.join(",")) };
        println!(
            "{:<9} {:<12} {:<7} {:<9} {:<6} {:<14} {}{}",
            short_id(&t.id),
            status_label(t.status),
            format_priority(t.priority),
            format_due_relative(t.due_date, today),
            truncate(&t.assignee.initials, 6),
            truncate(&t.project.name, 14),
            t.name,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Resolve a task identifier: a full id, a unique id prefix, or a unique
/// case-insensitive name.
pub fn resolve_task_identifier(identifier: &str, tasks: &[Task]) -> Result<TaskId, ResolveError> {
    let needle = identifier.trim().to_lowercase();
    if let Ok(id) = needle.parse::<TaskId>() {
        return tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.id)
            .ok_or_else(|| ResolveError::NoMatch(identifier.to_string()));
    }

    let mut matches: Vec<&Task> = tasks.iter().filter(|t| t.name.to_lowercase() == needle).collect();
    if matches.is_empty() && !needle.is_empty() {
        matches = tasks.iter().filter(|t| t.id.to_string().starts_with(&needle)).collect();
    }

    match matches.as_slice() {
        [] => Err(ResolveError::NoMatch(identifier.to_string())),
        [one] => Ok(one.id),
        many => Err(ResolveError::Ambiguous {
            input: identifier.to_string(),
            candidates: many
                .iter()
                .map(|t| format!("  {}: {} [{}]", short_id(&t.id), t.name, t.project.name))
                .collect::<Vec<_>>()
                .join("\n"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::task::fixtures::{draft, t0};

    #[test]
    fn test_split_and_normalise_tags() {
        let tags = split_and_normalise_tags(&["Front End, api".into(), " API ".into(), ",".into()]);
        assert_eq!(tags, vec!["api", "front-end"]);
    }

    #[test]
    fn test_parse_due_input() {
        // a Friday
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_due_input("today", today), Some(today));
        assert_eq!(parse_due_input("in 3d", today), NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(parse_due_input("in 2w", today), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_due_input("in 1m", today), NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(parse_due_input("eom", today), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(parse_due_input("eow", today), NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(parse_due_input("monday", today), NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(parse_due_input("friday", today), Some(today));
        assert_eq!(parse_due_input("next fri", today), NaiveDate::from_ymd_opt(2024, 3, 8));
        assert_eq!(parse_due_input("2024-12-24", today), NaiveDate::from_ymd_opt(2024, 12, 24));
        assert_eq!(parse_due_input("someday", today), None);
        assert_eq!(parse_due_input("in 300000000d", today), None);
        assert_eq!(parse_due_input("in 9223372036854775807w", today), None);
        assert_eq!(parse_due_input("in -2d", today), NaiveDate::from_ymd_opt(2024, 2, 28));
    }

    #[test]
    fn test_end_of_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(end_of_day(d).to_rfc3339(), "2024-03-01T23:59:59+00:00");
    }

    #[test]
    fn test_format_due_relative() {
        let today = t0().date_naive();
        assert_eq!(format_due_relative(t0(), today), "today");
        assert_eq!(format_due_relative(t0() + Duration::days(3), today), "in 3d");
        assert_eq!(format_due_relative(t0() - Duration::days(2), today), "2d late");
    }

    #[test]
    fn test_resolve_task_identifier() {
        let a = Task::from_draft(Uuid::new_v4(), draft("Write docs", "u1", "p1"), t0());
        let b = Task::from_draft(Uuid::new_v4(), draft("Review", "u1", "p1"), t0());
        let c = Task::from_draft(Uuid::new_v4(), draft("Review", "u2", "p2"), t0());
        let tasks = vec![a.clone(), b, c];

        assert_eq!(resolve_task_identifier(&a.id.to_string(), &tasks), Ok(a.id));
        assert_eq!(resolve_task_identifier(&short_id(&a.id), &tasks), Ok(a.id));
        assert_eq!(resolve_task_identifier("write DOCS", &tasks), Ok(a.id));
        assert!(matches!(resolve_task_identifier("review", &tasks), Err(ResolveError::Ambiguous { .. })));
        assert!(matches!(resolve_task_identifier("nope", &tasks), Err(ResolveError::NoMatch(_))));
        let ghost = Uuid::new_v4().to_string();
        assert!(matches!(resolve_task_identifier(&ghost, &tasks), Err(ResolveError::NoMatch(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskflow.json");
        assert!(Database::load(&path).unwrap().tasks.is_empty());

        let db = Database {
            tasks: vec![Task::from_draft(Uuid::new_v4(), draft("A", "u1", "p1"), t0())],
            ..Default::default()
        };
        db.save(&path).unwrap();
        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks, db.tasks);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
