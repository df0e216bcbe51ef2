//! Timers and committed time entries.
//!
//! A running [`Timer`] becomes an immutable [`TimeEntry`] when stopped. Entries can
//! also be logged by hand. Durations are whole minutes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::actor::Actor;
use crate::fields::{EntityType, EntryStatus};
use crate::outcome::{Outcome, Skip};
use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: Uuid,
    pub task_id: TaskId,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub description: String,
    pub is_running: bool,
}

impl Timer {
    /// Time since the timer started; never negative.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).max(Duration::zero())
    }
}

/// Render a duration as `HH:MM:SS` for a running-timer display.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Whole minutes between two instants, rounded half up, floored at zero.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let ms = (end - start).num_milliseconds().max(0);
    (ms as f64 / 60_000.0).round() as u64
}

/// `start` plus `minutes`, or `None` when that leaves the representable range.
pub fn end_after(start: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::try_minutes(minutes)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: TaskId,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Minutes.
    pub duration: u64,
    pub description: String,
    pub billable: bool,
    pub hourly_rate: Option<f64>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Amount owed for this entry, if it is billable and has a rate.
    pub fn billable_amount(&self) -> Option<f64> {
        match (self.billable, self.hourly_rate) {
            (true, Some(rate)) => Some(self.duration as f64 / 60.0 * rate),
            _ => None,
        }
    }
}

/// A hand-logged entry. The duration is trusted as given, not derived from the times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: i64,
    pub description: String,
    pub billable: bool,
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<u64>,
    pub description: Option<String>,
    pub billable: Option<bool>,
    pub hourly_rate: Option<f64>,
    pub status: Option<EntryStatus>,
}

/// Owns active timers and committed entries. Both collections are copy-on-write.
#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    timers: Arc<Vec<Timer>>,
    entries: Arc<Vec<TimeEntry>>,
}

impl TimeTracker {
    pub fn new(timers: Vec<Timer>, entries: Vec<TimeEntry>) -> Self {
        TimeTracker { timers: Arc::new(timers), entries: Arc::new(entries) }
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn active_timers(&self, user_id: &str) -> Vec<&Timer> {
        self.timers.iter().filter(|t| t.user_id == user_id).collect()
    }

    /// Start a timer for the actor. A timer already running on the same task for the
    /// same user is left alone and a second one is started alongside it.
    pub fn start_timer(&mut self, actor: &Actor, task_id: TaskId, description: &str, now: DateTime<Utc>) -> Uuid {
        if self.timers.iter().any(|t| t.task_id == task_id && t.user_id == actor.id) {
            warn!(task_id = %task_id, user = %actor.id, "starting a second concurrent timer");
        }
        let timer = Timer {
            id: Uuid::new_v4(),
            task_id,
            user_id: actor.id.clone(),
            start_time: now,
            description: description.to_string(),
            is_running: true,
        };
        let id = timer.id;
        debug!(timer_id = %id, task_id = %task_id, "timer started");
        Arc::make_mut(&mut self.timers).push(timer);
        id
    }

    /// Stop a timer, committing it as a billable entry with the elapsed minutes.
    pub fn stop_timer(&mut self, timer_id: Uuid, now: DateTime<Utc>) -> Outcome<TimeEntry> {
        let Some(idx) = self.timers.iter().position(|t| t.id == timer_id) else {
            debug!(timer_id = %timer_id, "stop skipped, unknown timer");
            return Outcome::Skipped(Skip::not_found(EntityType::Timer, timer_id));
        };
        let timer = Arc::make_mut(&mut self.timers).remove(idx);
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            task_id: timer.task_id,
            user_id: timer.user_id,
            start_time: timer.start_time,
            end_time: Some(now),
            duration: minutes_between(timer.start_time, now),
            description: timer.description,
            billable: true,
            hourly_rate: None,
            status: EntryStatus::Stopped,
            created_at: now,
        };
        debug!(entry_id = %entry.id, minutes = entry.duration, "timer stopped");
        Arc::make_mut(&mut self.entries).push(entry.clone());
        Outcome::Applied(entry)
    }

    /// Log time without a timer. Non-positive durations are skipped.
    pub fn add_manual_entry(&mut self, actor: &Actor, entry: ManualEntry, now: DateTime<Utc>) -> Outcome<Uuid> {
        if entry.duration <= 0 {
            return Outcome::Skipped(Skip::NonPositiveDuration(entry.duration));
        }
        let committed = TimeEntry {
            id: Uuid::new_v4(),
            task_id: entry.task_id,
            user_id: actor.id.clone(),
            start_time: entry.start_time,
            end_time: entry.end_time,
            duration: entry.duration as u64,
            description: entry.description,
            billable: entry.billable,
            hourly_rate: entry.hourly_rate,
            status: EntryStatus::Stopped,
            created_at: now,
        };
        let id = committed.id;
        Arc::make_mut(&mut self.entries).push(committed);
        Outcome::Applied(id)
    }

    pub fn update_time_entry(&mut self, id: Uuid, update: TimeEntryUpdate) -> Outcome<()> {
        let Some(idx) = self.entries.iter().position(|e| e.id == id) else {
            return Outcome::Skipped(Skip::not_found(EntityType::TimeEntry, id));
        };
        let entry = &mut Arc::make_mut(&mut self.entries)[idx];
        if let Some(v) = update.start_time {
            entry.start_time = v;
        }
        if let Some(v) = update.end_time {
            entry.end_time = Some(v);
        }
        if let Some(v) = update.duration {
            entry.duration = v;
        }
        if let Some(v) = update.description {
            entry.description = v;
        }
        if let Some(v) = update.billable {
            entry.billable = v;
        }
        if let Some(v) = update.hourly_rate {
            entry.hourly_rate = Some(v);
        }
        if let Some(v) = update.status {
            entry.status = v;
        }
        Outcome::Applied(())
    }

    pub fn delete_time_entry(&mut self, id: Uuid) -> Outcome<TimeEntry> {
        match self.entries.iter().position(|e| e.id == id) {
            Some(idx) => Outcome::Applied(Arc::make_mut(&mut self.entries).remove(idx)),
            None => Outcome::Skipped(Skip::not_found(EntityType::TimeEntry, id)),
        }
    }

    /// Minutes logged against a task. Saturates at `u64::MAX`.
    pub fn task_total_time(&self, task_id: TaskId) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.task_id == task_id)
            .fold(0u64, |acc, e| acc.saturating_add(e.duration))
    }

    /// Minutes logged by a user whose entries start within the inclusive bounds.
    pub fn user_total_time(&self, user_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| start.map_or(true, |s| e.start_time >= s))
            .filter(|e| end.map_or(true, |end| e.start_time <= end))
            .fold(0u64, |acc, e| acc.saturating_add(e.duration))
    }

    pub fn into_parts(self) -> (Vec<Timer>, Vec<TimeEntry>) {
        let timers = Arc::try_unwrap(self.timers).unwrap_or_else(|shared| (*shared).clone());
        let entries = Arc::try_unwrap(self.entries).unwrap_or_else(|shared| (*shared).clone());
        (timers, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::fixtures::t0;

    fn me() -> Actor {
        Actor::new("u1", "Ada Lovelace")
    }

    fn manual(task_id: TaskId, start: DateTime<Utc>, minutes: i64) -> ManualEntry {
        ManualEntry {
            task_id,
            start_time: start,
            end_time: Some(start + Duration::minutes(minutes)),
            duration: minutes,
            description: "review".into(),
            billable: false,
            hourly_rate: None,
        }
    }

    #[test]
    fn test_stop_commits_entry_and_removes_timer() {
        let mut tracker = TimeTracker::default();
        let task = Uuid::new_v4();
        let timer = tracker.start_timer(&me(), task, "coding", t0());
        assert_eq!(tracker.active_timers("u1").len(), 1);

        let entry = tracker.stop_timer(timer, t0() + Duration::minutes(90)).applied().unwrap();
        assert_eq!(entry.duration, 90);
        assert_eq!(entry.status, EntryStatus::Stopped);
        assert!(entry.billable);
        assert_eq!(entry.user_id, "u1");
        assert!(tracker.timers().is_empty());
        assert_eq!(tracker.entries().len(), 1);

        assert!(!tracker.stop_timer(timer, t0()).is_applied());
        assert_eq!(tracker.entries().len(), 1);
    }

    #[test]
    fn test_duration_rounding() {
        assert_eq!(minutes_between(t0(), t0()), 0);
        assert_eq!(minutes_between(t0(), t0() + Duration::seconds(29)), 0);
        assert_eq!(minutes_between(t0(), t0() + Duration::seconds(30)), 1);
        assert_eq!(minutes_between(t0(), t0() + Duration::seconds(150)), 3);
        assert_eq!(minutes_between(t0(), t0() - Duration::minutes(5)), 0);
    }

    #[test]
    fn test_end_after() {
        assert_eq!(end_after(t0(), 90), Some(t0() + Duration::minutes(90)));
        assert_eq!(end_after(t0(), 1_000_000_000_000), None);
        assert_eq!(end_after(t0(), i64::MAX), None);
    }

    #[test]
    fn test_second_timer_on_same_task_is_allowed() {
        let mut tracker = TimeTracker::default();
        let task = Uuid::new_v4();
        let a = tracker.start_timer(&me(), task, "", t0());
        let b = tracker.start_timer(&me(), task, "", t0());
        assert_ne!(a, b);
        assert_eq!(tracker.timers().len(), 2);
    }

    #[test]
    fn test_manual_entries() {
        let mut tracker = TimeTracker::default();
        let task = Uuid::new_v4();
        let skipped = tracker.add_manual_entry(&me(), manual(task, t0(), 0), t0());
        assert_eq!(skipped.skip(), Some(&Skip::NonPositiveDuration(0)));
        assert!(!tracker.add_manual_entry(&me(), manual(task, t0(), -15), t0()).is_applied());

        let mut odd = manual(task, t0(), 45);
        odd.end_time = Some(t0() + Duration::minutes(10));
        assert!(tracker.add_manual_entry(&me(), odd, t0()).is_applied());
        assert_eq!(tracker.task_total_time(task), 45);
    }

    #[test]
    fn test_totals() {
        let mut tracker = TimeTracker::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let _ = tracker.add_manual_entry(&me(), manual(a, t0(), 30), t0());
        let _ = tracker.add_manual_entry(&me(), manual(a, t0() + Duration::days(1), 20), t0());
        let _ = tracker.add_manual_entry(&me(), manual(b, t0() + Duration::days(2), 10), t0());
        let _ = tracker.add_manual_entry(&Actor::new("u2", "Bob"), manual(a, t0(), 100), t0());

        assert_eq!(tracker.task_total_time(a), 150);
        assert_eq!(tracker.task_total_time(a), 150);
        assert_eq!(tracker.task_total_time(Uuid::new_v4()), 0);

        assert_eq!(tracker.user_total_time("u1", None, None), 60);
        assert_eq!(tracker.user_total_time("u1", Some(t0() + Duration::days(1)), None), 30);
        assert_eq!(tracker.user_total_time("u1", None, Some(t0() + Duration::days(1))), 50);
        assert_eq!(tracker.user_total_time("u1", Some(t0()), Some(t0())), 30);
        assert_eq!(tracker.user_total_time("nobody", None, None), 0);
    }

    #[test]
    fn test_totals_saturate_on_huge_entries() {
        let mut tracker = TimeTracker::default();
        let task = Uuid::new_v4();
        for _ in 0..3 {
            let mut huge = manual(task, t0(), 1);
            huge.duration = i64::MAX;
            assert!(tracker.add_manual_entry(&me(), huge, t0()).is_applied());
        }
        assert_eq!(tracker.task_total_time(task), u64::MAX);
        assert_eq!(tracker.user_total_time("u1", None, None), u64::MAX);

        let id = tracker.entries()[0].id;
        let update = TimeEntryUpdate { duration: Some(u64::MAX), ..Default::default() };
        assert!(tracker.update_time_entry(id, update).is_applied());
        assert_eq!(tracker.task_total_time(task), u64::MAX);
    }

    #[test]
    fn test_update_and_delete_entry() {
        let mut tracker = TimeTracker::default();
        let id = tracker.add_manual_entry(&me(), manual(Uuid::new_v4(), t0(), 60), t0()).applied().unwrap();

        let update = TimeEntryUpdate {
            status: Some(EntryStatus::Approved),
            billable: Some(true),
            hourly_rate: Some(80.0),
            ..Default::default()
        };
        assert!(tracker.update_time_entry(id, update).is_applied());
        let entry = &tracker.entries()[0];
        assert_eq!(entry.status, EntryStatus::Approved);
        assert_eq!(entry.billable_amount(), Some(80.0));

        assert!(tracker.delete_time_entry(id).is_applied());
        assert!(!tracker.delete_time_entry(id).is_applied());
        assert!(!tracker.update_time_entry(id, TimeEntryUpdate::default()).is_applied());
    }

    #[test]
    fn test_elapsed_display() {
        let mut tracker = TimeTracker::default();
        let id = tracker.start_timer(&me(), Uuid::new_v4(), "", t0());
        let timer = tracker.timers().iter().find(|t| t.id == id).unwrap();
        let shown = format_elapsed(timer.elapsed(t0() + Duration::seconds(3725)));
        assert_eq!(shown, "01:02:05");
        assert_eq!(format_elapsed(timer.elapsed(t0() - Duration::seconds(5))), "00:00:00");
    }
}
