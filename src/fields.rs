//! Enumerations and field types shared by the task, time and goal records.
//!
//! Every enum serialises in kebab-case and accepts the display spelling as an
//! alias, so JSON written by older front-ends ("In progress", "Complete") still loads.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status of a task. Any status may move to any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "In progress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Complete")]
    Complete,
    #[serde(alias = "Blocked")]
    Blocked,
}

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Lifecycle of a committed time entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Running,
    Stopped,
    Approved,
    Rejected,
}

/// Goal lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Paused")]
    Paused,
}

/// Unit a recurrence rule advances by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Kind of record a notification points back at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    Task,
    Attachment,
    Subtask,
    Timer,
    TimeEntry,
    Goal,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    Name,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityType::Task => "task",
            EntityType::Attachment => "attachment",
            EntityType::Subtask => "subtask",
            EntityType::Timer => "timer",
            EntityType::TimeEntry => "time entry",
            EntityType::Goal => "goal",
        })
    }
}
