//! The task store: single source of truth for tasks.
//!
//! Every mutation goes through here so notification side effects stay consistent
//! with the data. Mutations return a [`Mutation`] carrying the notifications they
//! produced; nothing is sent from inside the store.
//!
//! The collection is copy-on-write. [`TaskStore::snapshot`] hands out a shared
//! `Arc`, and a later mutation clones the vector instead of touching what a reader holds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::actor::Actor;
use crate::fields::*;
use crate::notify::Notification;
use crate::outcome::{Mutation, Skip};
use crate::task::*;

#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Arc<Vec<Task>>,
    owner_recipient: String,
}

impl TaskStore {
    /// `owner_recipient` receives the secondary notifications when someone other
    /// than the assignee acts on a task.
    pub fn new(owner_recipient: impl Into<String>) -> Self {
        Self::with_tasks(Vec::new(), owner_recipient)
    }

    pub fn with_tasks(tasks: Vec<Task>, owner_recipient: impl Into<String>) -> Self {
        TaskStore { tasks: Arc::new(tasks), owner_recipient: owner_recipient.into() }
    }

    /// A consistent view of the collection that later writes will not disturb.
    pub fn snapshot(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn task_mut(&mut self, idx: usize) -> &mut Task {
        &mut Arc::make_mut(&mut self.tasks)[idx]
    }

    /// Create a task from a draft. Notifies the assignee, and the owner recipient
    /// too when the actor is creating the task for somebody else.
    pub fn create_task(&mut self, actor: &Actor, draft: TaskDraft, now: DateTime<Utc>) -> Mutation<TaskId> {
        let mut id = Uuid::new_v4();
        while self.get(id).is_some() {
            id = Uuid::new_v4();
        }
        let task = Task::from_draft(id, draft, now);

        let mut notes = vec![Notification::new(
            NotificationKind::Info,
            "New Task Assigned",
            format!("You have been assigned to \"{}\" in {}", task.name, task.project.name),
            task.assignee.id.clone(),
            now,
        )
        .about(EntityType::Task, id, task.name.clone())];

        if task.assignee.id != actor.id {
            notes.push(
                Notification::new(
                    NotificationKind::Info,
                    "Task Created",
                    format!("{} created \"{}\" for {}", actor.name, task.name, task.assignee.name),
                    self.owner_recipient.clone(),
                    now,
                )
                .about(EntityType::Task, id, task.name.clone()),
            );
        }

        debug!(task_id = %id, name = %task.name, assignee = %task.assignee.id, "task created");
        Arc::make_mut(&mut self.tasks).push(task);
        Mutation::applied(id, notes)
    }

    /// Merge a partial update into a task and notify on status and assignee transitions.
    pub fn update_task(
        &mut self,
        actor: &Actor,
        id: TaskId,
        update: TaskUpdate,
        now: DateTime<Utc>,
    ) -> Mutation<()> {
        let Some(idx) = self.position(id) else {
            debug!(task_id = %id, "update skipped, unknown task");
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let task = self.task_mut(idx);
        let changes = update.apply(task);
        task.updated_at = now;
        let task = task.clone();

        let mut notes = Vec::new();
        if let Some((old, new)) = changes.status {
            let kind = if new == Status::Complete { NotificationKind::Success } else { NotificationKind::Info };
            notes.push(
                Notification::new(
                    kind,
                    "Task Status Updated",
                    format!("\"{}\" moved from {} to {}", task.name, status_label(old), status_label(new)),
                    task.assignee.id.clone(),
                    now,
                )
                .about(EntityType::Task, id, task.name.clone()),
            );
            if task.assignee.id != actor.id {
                notes.push(
                    Notification::new(
                        NotificationKind::Info,
                        "Task Progress Update",
                        format!("{} set \"{}\" to {}", actor.name, task.name, status_label(new)),
                        self.owner_recipient.clone(),
                        now,
                    )
                    .about(EntityType::Task, id, task.name.clone()),
                );
            }
            debug!(task_id = %id, from = ?old, to = ?new, "status changed");
        }
        if let Some((old, new)) = changes.assignee {
            notes.push(
                Notification::new(
                    NotificationKind::Info,
                    "Task Reassigned",
                    format!("{} reassigned \"{}\" from {} to you", actor.name, task.name, old.name),
                    new.id.clone(),
                    now,
                )
                .about(EntityType::Task, id, task.name.clone()),
            );
            debug!(task_id = %id, from = %old.id, to = %new.id, "task reassigned");
        }
        Mutation::applied((), notes)
    }

    /// Hard-remove a task and warn its assignee.
    pub fn delete_task(&mut self, actor: &Actor, id: TaskId, now: DateTime<Utc>) -> Mutation<Task> {
        let Some(idx) = self.position(id) else {
            debug!(task_id = %id, "delete skipped, unknown task");
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let task = Arc::make_mut(&mut self.tasks).remove(idx);
        let note = Notification::new(
            NotificationKind::Warning,
            "Task Deleted",
            format!("{} deleted \"{}\"", actor.name, task.name),
            task.assignee.id.clone(),
            now,
        )
        .about(EntityType::Task, id, task.name.clone());
        debug!(task_id = %id, "task deleted");
        Mutation::applied(task, vec![note])
    }

    /// Append a comment. Empty or whitespace-only content is skipped.
    pub fn add_comment(&mut self, id: TaskId, draft: CommentDraft, now: DateTime<Utc>) -> Mutation<Uuid> {
        if draft.content.trim().is_empty() {
            return Mutation::skipped(Skip::EmptyComment);
        }
        let Some(idx) = self.position(id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let comment = TaskComment {
            id: Uuid::new_v4(),
            author: draft.author,
            author_initials: draft.author_initials,
            content: draft.content.trim().to_string(),
            created_at: now,
        };
        let comment_id = comment.id;
        let task = self.task_mut(idx);
        let note = Notification::new(
            NotificationKind::Info,
            "New Comment",
            format!("{} commented on \"{}\"", comment.author, task.name),
            task.assignee.id.clone(),
            now,
        )
        .about(EntityType::Task, id, task.name.clone());
        task.comments.push(comment);
        task.updated_at = now;
        Mutation::applied(comment_id, vec![note])
    }

    pub fn add_attachment(&mut self, id: TaskId, draft: AttachmentDraft, now: DateTime<Utc>) -> Mutation<Uuid> {
        let Some(idx) = self.position(id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let attachment = TaskAttachment {
            id: Uuid::new_v4(),
            file_name: draft.file_name,
            size_bytes: draft.size_bytes,
            mime_type: draft.mime_type,
            uploaded_by: draft.uploaded_by,
            uploaded_at: now,
            url: draft.url,
        };
        let attachment_id = attachment.id;
        let task = self.task_mut(idx);
        let note = Notification::new(
            NotificationKind::Info,
            "New Attachment",
            format!("{} attached {} to \"{}\"", attachment.uploaded_by, attachment.file_name, task.name),
            task.assignee.id.clone(),
            now,
        )
        .about(EntityType::Task, id, task.name.clone());
        task.attachments.push(attachment);
        task.updated_at = now;
        Mutation::applied(attachment_id, vec![note])
    }

    /// Remove one attachment. Does not notify.
    pub fn remove_attachment(&mut self, id: TaskId, attachment_id: Uuid, now: DateTime<Utc>) -> Mutation<TaskAttachment> {
        let Some(idx) = self.position(id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let Some(pos) = self.tasks[idx].attachments.iter().position(|a| a.id == attachment_id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Attachment, attachment_id));
        };
        let task = self.task_mut(idx);
        let removed = task.attachments.remove(pos);
        task.updated_at = now;
        Mutation::applied(removed, Vec::new())
    }

    pub fn add_subtask(&mut self, id: TaskId, name: &str, now: DateTime<Utc>) -> Mutation<Uuid> {
        let Some(idx) = self.position(id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let subtask = Subtask { id: Uuid::new_v4(), name: name.trim().to_string(), completed: false };
        let subtask_id = subtask.id;
        let task = self.task_mut(idx);
        task.subtasks.push(subtask);
        task.updated_at = now;
        Mutation::applied(subtask_id, Vec::new())
    }

    /// Flip a subtask's completed flag and return the new value.
    pub fn toggle_subtask(&mut self, id: TaskId, subtask_id: Uuid, now: DateTime<Utc>) -> Mutation<bool> {
        let Some(idx) = self.position(id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Task, id));
        };
        let Some(pos) = self.tasks[idx].subtasks.iter().position(|s| s.id == subtask_id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Subtask, subtask_id));
        };
        let task = self.task_mut(idx);
        let subtask = &mut task.subtasks[pos];
        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        task.updated_at = now;
        Mutation::applied(completed, Vec::new())
    }

    pub fn by_project(&self, project_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.project.id == project_id).collect()
    }

    pub fn by_assignee(&self, user_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.assignee.id == user_id).collect()
    }

    /// Tasks that are not complete and whose due date has passed.
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_overdue(now)).collect()
    }

    /// Percentage of a project's tasks that are complete, rounded; 0 for an empty project.
    pub fn project_completion(&self, project_id: &str) -> u32 {
        let tasks = self.by_project(project_id);
        if tasks.is_empty() {
            return 0;
        }
        let done = tasks.iter().filter(|t| t.status == Status::Complete).count();
        (done as f64 / tasks.len() as f64 * 100.0).round() as u32
    }

    /// Distinct projects in first-seen order.
    pub fn projects(&self) -> Vec<ProjectRef> {
        let mut out: Vec<ProjectRef> = Vec::new();
        for t in self.tasks.iter() {
            if !out.iter().any(|p| p.id == t.project.id) {
                out.push(t.project.clone());
            }
        }
        out
    }

    pub fn into_tasks(self) -> Vec<Task> {
        Arc::try_unwrap(self.tasks).unwrap_or_else(|shared| (*shared).clone())
    }
}

/// Human label for a status, as shown in notifications and tables.
pub fn status_label(s: Status) -> &'static str {
    match s {
        Status::Pending => "Pending",
        Status::InProgress => "In progress",
        Status::Complete => "Complete",
        Status::Blocked => "Blocked",
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::task::fixtures::*;

    fn actor(id: &str) -> Actor {
        Actor::new(id, format!("User {}", id.to_uppercase()))
    }

    fn store_with(names: &[(&str, &str, &str)]) -> (TaskStore, Vec<TaskId>) {
        let mut store = TaskStore::new("owner");
        let ids = names
            .iter()
            .map(|(n, a, p)| store.create_task(&actor(a), draft(n, a, p), t0()).outcome.applied().unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn test_create_assigns_unique_ids_and_zero_hours() {
        let (store, ids) = store_with(&[("A", "u1", "p1"), ("B", "u1", "p1"), ("C", "u2", "p2")]);
        assert_eq!(store.tasks().len(), 3);
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
        assert!(store.tasks().iter().all(|t| t.actual_hours == 0.0 && t.created_at == t0()));
    }

    #[test]
    fn test_create_notifies_owner_only_for_others() {
        let mut store = TaskStore::new("owner");
        let self_assigned = store.create_task(&actor("u1"), draft("A", "u1", "p1"), t0());
        assert_eq!(self_assigned.notifications.len(), 1);
        assert_eq!(self_assigned.notifications[0].recipient_id, "u1");

        let for_other = store.create_task(&actor("u2"), draft("B", "u1", "p1"), t0());
        let recipients: Vec<_> = for_other.notifications.iter().map(|n| n.recipient_id.as_str()).collect();
        assert_eq!(recipients, vec!["u1", "owner"]);
    }

    #[test]
    fn test_status_change_notifications() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let later = t0() + Duration::hours(1);

        let m = store.update_task(&actor("u1"), ids[0], TaskUpdate::status(Status::Complete), later);
        assert!(m.outcome.is_applied());
        assert_eq!(m.notifications.len(), 1);
        assert_eq!(m.notifications[0].kind, NotificationKind::Success);
        assert_eq!(store.get(ids[0]).unwrap().updated_at, later);

        let m = store.update_task(&actor("u9"), ids[0], TaskUpdate::status(Status::Blocked), later);
        assert_eq!(m.notifications.len(), 2);
        assert_eq!(m.notifications[0].kind, NotificationKind::Info);
        assert_eq!(m.notifications[0].recipient_id, "u1");
        assert_eq!(m.notifications[1].recipient_id, "owner");
    }

    #[test]
    fn test_unchanged_status_is_silent_but_refreshes_timestamp() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let later = t0() + Duration::minutes(5);
        let m = store.update_task(&actor("u2"), ids[0], TaskUpdate::status(Status::Pending), later);
        assert!(m.outcome.is_applied());
        assert!(m.notifications.is_empty());
        assert_eq!(store.get(ids[0]).unwrap().updated_at, later);
    }

    #[test]
    fn test_reassignment_and_status_in_one_call() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let update = TaskUpdate {
            status: Some(Status::InProgress),
            assignee: Some(person("u2")),
            ..Default::default()
        };
        let m = store.update_task(&actor("u2"), ids[0], update, t0());
        let titles: Vec<_> = m.notifications.iter().map(|n| (n.title.as_str(), n.recipient_id.as_str())).collect();
        assert_eq!(titles, vec![("Task Status Updated", "u2"), ("Task Reassigned", "u2")]);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let (mut store, _) = store_with(&[("A", "u1", "p1")]);
        let ghost = Uuid::new_v4();
        let m = store.update_task(&actor("u1"), ghost, TaskUpdate::status(Status::Complete), t0());
        assert_eq!(m.outcome.skip(), Some(&Skip::not_found(EntityType::Task, ghost)));
        assert!(m.notifications.is_empty());

        let m = store.delete_task(&actor("u1"), ghost, t0());
        assert!(!m.outcome.is_applied());
        assert!(m.notifications.is_empty());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_delete_warns_assignee() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1"), ("B", "u2", "p1")]);
        let m = store.delete_task(&actor("u2"), ids[0], t0());
        assert_eq!(m.notifications.len(), 1);
        assert_eq!(m.notifications[0].kind, NotificationKind::Warning);
        assert_eq!(m.notifications[0].recipient_id, "u1");
        assert!(store.get(ids[0]).is_none());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_comments() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let comment = |content: &str| CommentDraft {
            author: "Bob".into(),
            author_initials: "B".into(),
            content: content.into(),
        };

        let later = t0() + Duration::hours(1);
        assert_eq!(store.add_comment(ids[0], comment("  \n "), later).outcome.skip(), Some(&Skip::EmptyComment));
        assert_eq!(store.get(ids[0]).unwrap().updated_at, t0());

        let m = store.add_comment(ids[0], comment("Looks good"), later);
        assert!(m.outcome.is_applied());
        assert!(m.notifications[0].message.contains("Bob"));
        assert_eq!(m.notifications[0].recipient_id, "u1");
        let task = store.get(ids[0]).unwrap();
        assert_eq!(task.comments.len(), 1);
        assert_eq!(task.comments[0].created_at, later);
        assert_eq!(task.updated_at, later);

        assert!(!store.add_comment(Uuid::new_v4(), comment("hi"), t0()).outcome.is_applied());
    }

    #[test]
    fn test_attachments() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let draft = AttachmentDraft {
            file_name: "spec.pdf".into(),
            size_bytes: 2048,
            mime_type: "application/pdf".into(),
            uploaded_by: "Bob".into(),
            url: "https://files.example/spec.pdf".into(),
        };
        let attached_at = t0() + Duration::hours(1);
        let m = store.add_attachment(ids[0], draft, attached_at);
        assert_eq!(m.notifications.len(), 1);
        let attachment_id = m.outcome.applied().unwrap();
        assert_eq!(store.get(ids[0]).unwrap().updated_at, attached_at);
        assert_eq!(store.get(ids[0]).unwrap().attachments[0].uploaded_at, attached_at);

        let removed_at = t0() + Duration::hours(2);
        let m = store.remove_attachment(ids[0], attachment_id, removed_at);
        assert!(m.notifications.is_empty());
        assert_eq!(m.outcome.applied().unwrap().file_name, "spec.pdf");
        assert!(store.get(ids[0]).unwrap().attachments.is_empty());
        assert_eq!(store.get(ids[0]).unwrap().updated_at, removed_at);

        let m = store.remove_attachment(ids[0], attachment_id, t0() + Duration::hours(3));
        assert_eq!(m.outcome.skip(), Some(&Skip::not_found(EntityType::Attachment, attachment_id)));
        assert_eq!(store.get(ids[0]).unwrap().updated_at, removed_at);
    }

    #[test]
    fn test_subtasks() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let sub = store.add_subtask(ids[0], " Draft ", t0() + Duration::minutes(5)).outcome.applied().unwrap();
        assert_eq!(store.get(ids[0]).unwrap().updated_at, t0() + Duration::minutes(5));

        assert_eq!(store.toggle_subtask(ids[0], sub, t0() + Duration::minutes(10)).outcome.applied(), Some(true));
        assert_eq!(store.get(ids[0]).unwrap().updated_at, t0() + Duration::minutes(10));
        assert_eq!(store.toggle_subtask(ids[0], sub, t0() + Duration::minutes(15)).outcome.applied(), Some(false));
        assert_eq!(store.get(ids[0]).unwrap().updated_at, t0() + Duration::minutes(15));
        assert_eq!(store.get(ids[0]).unwrap().subtasks[0].name, "Draft");

        let missing = store.toggle_subtask(ids[0], Uuid::new_v4(), t0() + Duration::minutes(20));
        assert!(!missing.outcome.is_applied());
        assert_eq!(store.get(ids[0]).unwrap().updated_at, t0() + Duration::minutes(15));
    }

    #[test]
    fn test_reads() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1"), ("B", "u1", "p1"), ("C", "u2", "p2")]);
        assert_eq!(store.by_project("p1").len(), 2);
        assert_eq!(store.by_assignee("u2").len(), 1);
        assert_eq!(store.project_completion("p1"), 0);
        assert_eq!(store.project_completion("nope"), 0);

        let _ = store.update_task(&actor("u1"), ids[0], TaskUpdate::status(Status::Complete), t0());
        assert_eq!(store.project_completion("p1"), 50);

        let after_due = t0() + Duration::days(8);
        let overdue: Vec<_> = store.overdue(after_due).iter().map(|t| t.name.clone()).collect();
        assert_eq!(overdue, vec!["B", "C"]);
        assert!(store.overdue(t0()).is_empty());
        assert_eq!(store.projects().len(), 2);
    }

    #[test]
    fn test_completion_rounds() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1"), ("B", "u1", "p1"), ("C", "u1", "p1")]);
        let _ = store.update_task(&actor("u1"), ids[0], TaskUpdate::status(Status::Complete), t0());
        assert_eq!(store.project_completion("p1"), 33);
        let _ = store.update_task(&actor("u1"), ids[1], TaskUpdate::status(Status::Complete), t0());
        assert_eq!(store.project_completion("p1"), 67);
    }

    #[test]
    fn test_snapshot_is_not_disturbed_by_writes() {
        let (mut store, ids) = store_with(&[("A", "u1", "p1")]);
        let before = store.snapshot();
        let _ = store.update_task(&actor("u1"), ids[0], TaskUpdate::status(Status::Blocked), t0());
        let _ = store.create_task(&actor("u1"), draft("B", "u1", "p1"), t0());
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].status, Status::Pending);
        assert_eq!(store.tasks().len(), 2);
    }
}
