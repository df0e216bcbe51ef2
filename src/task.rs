//! Task data structures.
//!
//! This module defines the `Task` record together with everything nested under it
//! (comments, attachments, subtasks), the draft used to create one, the partial update
//! used to mutate one and the template recurring tasks are stamped from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::split_and_normalise_tags;
use crate::fields::*;

pub type TaskId = Uuid;

/// The person a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: String,
    pub name: String,
    pub initials: String,
}

/// Non-owning reference to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

/// A comment on a task. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: Uuid,
    pub author: String,
    pub author_initials: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub author: String,
    pub author_initials: String,
    pub content: String,
}

/// File metadata attached to a task. `url` is the locator handed back by the upload service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAttachment {
    pub id: Uuid,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDraft {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_by: String,
    pub url: String,
}

/// A unit of work owned by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub assignee: Assignee,
    pub due_date: DateTime<Utc>,
    pub project: ProjectRef,
    #[serde(default)]
    pub tags: Vec<String>,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
    #[serde(default)]
    pub attachments: Vec<TaskAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to create a task; the store supplies id, timestamps and actual hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub assignee: Assignee,
    pub due_date: DateTime<Utc>,
    pub project: ProjectRef,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
    #[serde(default)]
    pub attachments: Vec<TaskAttachment>,
}

impl Task {
    /// Build a stored task from a draft: fresh timestamps, zero actual hours,
    /// normalised tags and a non-negative estimate.
    pub fn from_draft(id: TaskId, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Task {
            id,
            name: draft.name,
            description: draft.description.filter(|d| !d.trim().is_empty()),
            status: draft.status,
            priority: draft.priority,
            assignee: draft.assignee,
            due_date: draft.due_date,
            project: draft.project,
            tags: split_and_normalise_tags(&draft.tags),
            estimated_hours: draft.estimated_hours.max(0.0),
            actual_hours: 0.0,
            dependencies: draft.dependencies,
            subtasks: draft.subtasks,
            comments: draft.comments,
            attachments: draft.attachments,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != Status::Complete && self.due_date < now
    }
}

/// A partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee: Option<Assignee>,
    pub due_date: Option<DateTime<Utc>>,
    pub project: Option<ProjectRef>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub dependencies: Option<Vec<TaskId>>,
    pub subtasks: Option<Vec<Subtask>>,
}

/// Field transitions detected while merging an update, used to derive notifications.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub status: Option<(Status, Status)>,
    pub assignee: Option<(Assignee, Assignee)>,
}

impl TaskUpdate {
    pub fn status(status: Status) -> Self {
        TaskUpdate { status: Some(status), ..Default::default() }
    }

    /// Merge this update over `task`, reporting status and assignee transitions.
    /// A field set to its current value is not a transition.
    pub fn apply(self, task: &mut Task) -> TaskChanges {
        let mut changes = TaskChanges::default();

        if let Some(status) = self.status {
            if status != task.status {
                changes.status = Some((task.status, status));
                task.status = status;
            }
        }
        if let Some(assignee) = self.assignee {
            if assignee.id != task.assignee.id {
                changes.assignee = Some((task.assignee.clone(), assignee.clone()));
            }
            task.assignee = assignee;
        }
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(desc) = self.description {
            task.description = Some(desc).filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(project) = self.project {
            task.project = project;
        }
        if let Some(tags) = self.tags {
            task.tags = split_and_normalise_tags(&tags);
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = hours.max(0.0);
        }
        if let Some(hours) = self.actual_hours {
            task.actual_hours = hours.max(0.0);
        }
        if let Some(deps) = self.dependencies {
            task.dependencies = deps;
        }
        if let Some(subtasks) = self.subtasks {
            task.subtasks = subtasks;
        }
        changes
    }
}

/// The fields a recurring task copies into every occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee: Assignee,
    pub project: ProjectRef,
    #[serde(default)]
    pub estimated_hours: f64,
}
