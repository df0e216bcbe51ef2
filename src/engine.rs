//! The engine ties the stores to an actor context, a clock and a notification sink.
//!
//! Each call resolves the actor and the current time once, runs the store operation,
//! then dispatches the notifications it returned. Callers get the plain [`Outcome`].

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::actor::{Actor, ActorContext};
use crate::clock::Clock;
use crate::config::Config;
use crate::db::Database;
use crate::fields::EntityType;
use crate::goal::{Goal, GoalDraft, GoalStore, GoalUpdate};
use crate::notify::{Dispatcher, NotificationSink};
use crate::outcome::{Mutation, Outcome, Skip};
use crate::recurrence::{create_recurring_tasks, RecurrenceLimits, RecurrenceRule, RecurringBatch};
use crate::store::TaskStore;
use crate::task::*;
use crate::time_tracking::{ManualEntry, TimeEntry, TimeEntryUpdate, TimeTracker};
use crate::workload::{daily_load, team_workload, user_workload, DayLoad, UserWorkload};

pub struct Engine<S: NotificationSink> {
    tasks: TaskStore,
    time: TimeTracker,
    goals: GoalStore,
    actors: Box<dyn ActorContext>,
    clock: Box<dyn Clock>,
    sink: S,
    limits: RecurrenceLimits,
}

impl<S: NotificationSink> Engine<S> {
    pub fn new(config: &Config, actors: Box<dyn ActorContext>, clock: Box<dyn Clock>, sink: S) -> Self {
        Self::from_database(Database::default(), config, actors, clock, sink)
    }

    /// Build an engine over previously stored records. The database's notification
    /// inbox is not read; it belongs to the sink.
    pub fn from_database(
        db: Database,
        config: &Config,
        actors: Box<dyn ActorContext>,
        clock: Box<dyn Clock>,
        sink: S,
    ) -> Self {
        Engine {
            tasks: TaskStore::with_tasks(db.tasks, config.owner_recipient.clone()),
            time: TimeTracker::new(db.timers, db.time_entries),
            goals: GoalStore::new(db.goals),
            actors,
            clock,
            sink,
            limits: RecurrenceLimits {
                default_max_occurrences: config.default_max_occurrences,
                commit_limit: config.recurrence_commit_limit,
            },
        }
    }

    /// Hand the records back for storage, along with the sink.
    pub fn into_database(self) -> (Database, S) {
        let (timers, time_entries) = self.time.into_parts();
        let db = Database {
            tasks: self.tasks.into_tasks(),
            timers,
            time_entries,
            goals: self.goals.into_goals(),
            notifications: Vec::new(),
        };
        (db, self.sink)
    }

    pub fn actor(&self) -> Actor {
        self.actors.current()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn time(&self) -> &TimeTracker {
        &self.time
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    fn commit<T>(&mut self, op: &str, m: Mutation<T>) -> Outcome<T> {
        if let Outcome::Skipped(skip) = &m.outcome {
            debug!(op, reason = %skip, "operation skipped");
        }
        Dispatcher::dispatch(&mut self.sink, m.notifications);
        m.outcome
    }

    pub fn create_task(&mut self, draft: TaskDraft) -> Outcome<TaskId> {
        let (actor, now) = (self.actor(), self.now());
        let m = self.tasks.create_task(&actor, draft, now);
        self.commit("create_task", m)
    }

    pub fn update_task(&mut self, id: TaskId, update: TaskUpdate) -> Outcome<()> {
        let (actor, now) = (self.actor(), self.now());
        let m = self.tasks.update_task(&actor, id, update, now);
        self.commit("update_task", m)
    }

    /// Delete a task if the actor context allows it.
    pub fn delete_task(&mut self, id: TaskId) -> Outcome<Task> {
        let (actor, now) = (self.actor(), self.now());
        if let Some(task) = self.tasks.get(id) {
            if !self.actors.can_delete(&actor, task) {
                let skip = Skip::PermissionDenied { actor: actor.id, entity: EntityType::Task, id: id.to_string() };
                return self.commit("delete_task", Mutation::skipped(skip));
            }
        }
        let m = self.tasks.delete_task(&actor, id, now);
        self.commit("delete_task", m)
    }

    pub fn add_task_comment(&mut self, id: TaskId, draft: CommentDraft) -> Outcome<Uuid> {
        let now = self.now();
        let m = self.tasks.add_comment(id, draft, now);
        self.commit("add_task_comment", m)
    }

    /// Comment as the current actor.
    pub fn comment(&mut self, id: TaskId, content: &str) -> Outcome<Uuid> {
        let actor = self.actor();
        let draft = CommentDraft { author: actor.name, author_initials: actor.initials, content: content.to_string() };
        self.add_task_comment(id, draft)
    }

    pub fn add_task_attachment(&mut self, id: TaskId, draft: AttachmentDraft) -> Outcome<Uuid> {
        let now = self.now();
        let m = self.tasks.add_attachment(id, draft, now);
        self.commit("add_task_attachment", m)
    }

    pub fn remove_task_attachment(&mut self, id: TaskId, attachment_id: Uuid) -> Outcome<TaskAttachment> {
        let now = self.now();
        let m = self.tasks.remove_attachment(id, attachment_id, now);
        self.commit("remove_task_attachment", m)
    }

    pub fn add_subtask(&mut self, id: TaskId, name: &str) -> Outcome<Uuid> {
        let now = self.now();
        let m = self.tasks.add_subtask(id, name, now);
        self.commit("add_subtask", m)
    }

    pub fn toggle_subtask(&mut self, id: TaskId, subtask_id: Uuid) -> Outcome<bool> {
        let now = self.now();
        let m = self.tasks.toggle_subtask(id, subtask_id, now);
        self.commit("toggle_subtask", m)
    }

    pub fn tasks_by_project(&self, project_id: &str) -> Vec<&Task> {
        self.tasks.by_project(project_id)
    }

    pub fn tasks_by_assignee(&self, user_id: &str) -> Vec<&Task> {
        self.tasks.by_assignee(user_id)
    }

    pub fn overdue_tasks(&self) -> Vec<&Task> {
        self.tasks.overdue(self.now())
    }

    pub fn project_completion(&self, project_id: &str) -> u32 {
        self.tasks.project_completion(project_id)
    }

    pub fn create_recurring_tasks(&mut self, rule: &RecurrenceRule, template: &TaskTemplate) -> Outcome<RecurringBatch> {
        let (actor, now) = (self.actor(), self.now());
        let m = create_recurring_tasks(&mut self.tasks, &actor, rule, template, now, self.limits);
        self.commit("create_recurring_tasks", m)
    }

    pub fn start_timer(&mut self, task_id: TaskId, description: &str) -> Uuid {
        let (actor, now) = (self.actor(), self.now());
        self.time.start_timer(&actor, task_id, description, now)
    }

    pub fn stop_timer(&mut self, timer_id: Uuid) -> Outcome<TimeEntry> {
        let now = self.now();
        self.time.stop_timer(timer_id, now)
    }

    pub fn add_manual_entry(&mut self, entry: ManualEntry) -> Outcome<Uuid> {
        let (actor, now) = (self.actor(), self.now());
        self.time.add_manual_entry(&actor, entry, now)
    }

    pub fn update_time_entry(&mut self, id: Uuid, update: TimeEntryUpdate) -> Outcome<()> {
        self.time.update_time_entry(id, update)
    }

    pub fn delete_time_entry(&mut self, id: Uuid) -> Outcome<TimeEntry> {
        self.time.delete_time_entry(id)
    }

    pub fn task_total_time(&self, task_id: TaskId) -> u64 {
        self.time.task_total_time(task_id)
    }

    pub fn user_total_time(&self, user_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> u64 {
        self.time.user_total_time(user_id, start, end)
    }

    pub fn user_workload(&self, user_id: &str) -> UserWorkload {
        user_workload(self.tasks.tasks(), &self.time, user_id, self.now())
    }

    pub fn team_workload(&self) -> Vec<UserWorkload> {
        team_workload(self.tasks.tasks(), &self.time, self.now())
    }

    pub fn daily_load(&self, user_id: &str, start: NaiveDate, days: u32) -> Vec<DayLoad> {
        daily_load(self.tasks.tasks(), user_id, start, days)
    }

    pub fn create_goal(&mut self, draft: GoalDraft) -> Outcome<Uuid> {
        let now = self.now();
        let m = self.goals.create_goal(draft, now);
        self.commit("create_goal", m)
    }

    pub fn update_goal(&mut self, id: Uuid, update: GoalUpdate) -> Outcome<()> {
        let (actor, now) = (self.actor(), self.now());
        let m = self.goals.update_goal(&actor, id, update, now);
        self.commit("update_goal", m)
    }

    pub fn delete_goal(&mut self, id: Uuid) -> Outcome<Goal> {
        let m = self.goals.delete_goal(id);
        self.commit("delete_goal", m)
    }
}
