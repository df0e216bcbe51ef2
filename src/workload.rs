//! Per-person workload statistics, recomputed from the stores on every call.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::fields::Status;
use crate::task::Task;
use crate::time_tracking::TimeTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UtilizationBand {
    Light,
    Optimal,
    High,
    Overloaded,
}

impl UtilizationBand {
    pub fn from_utilization(pct: f64) -> Self {
        if pct > 100.0 {
            UtilizationBand::Overloaded
        } else if pct > 80.0 {
            UtilizationBand::High
        } else if pct > 60.0 {
            UtilizationBand::Optimal
        } else {
            UtilizationBand::Light
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UtilizationBand::Light => "Light",
            UtilizationBand::Optimal => "Optimal",
            UtilizationBand::High => "High",
            UtilizationBand::Overloaded => "Overloaded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWorkload {
    pub user_id: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
    /// Minutes of logged time across all of the user's entries.
    pub logged_minutes: u64,
    pub estimated_hours: f64,
    /// Percentage of the user's tasks that are complete.
    pub completion_rate: f64,
    /// Logged hours as a percentage of estimated hours.
    pub utilization: f64,
}

impl UserWorkload {
    pub fn band(&self) -> UtilizationBand {
        UtilizationBand::from_utilization(self.utilization)
    }
}

pub fn user_workload(tasks: &[Task], tracker: &TimeTracker, user_id: &str, now: DateTime<Utc>) -> UserWorkload {
    let mine: Vec<&Task> = tasks.iter().filter(|t| t.assignee.id == user_id).collect();
    let total_tasks = mine.len();
    let completed_tasks = mine.iter().filter(|t| t.status == Status::Complete).count();
    let in_progress_tasks = mine.iter().filter(|t| t.status == Status::InProgress).count();
    let overdue_tasks = mine.iter().filter(|t| t.is_overdue(now)).count();
    let logged_minutes = tracker.user_total_time(user_id, None, None);
    let estimated_hours: f64 = mine.iter().map(|t| t.estimated_hours).sum();

    let completion_rate = if total_tasks == 0 {
        0.0
    } else {
        completed_tasks as f64 * 100.0 / total_tasks as f64
    };
    let utilization = if estimated_hours == 0.0 {
        0.0
    } else {
        logged_minutes as f64 / 60.0 * 100.0 / estimated_hours
    };

    UserWorkload {
        user_id: user_id.to_string(),
        total_tasks,
        completed_tasks,
        in_progress_tasks,
        overdue_tasks,
        logged_minutes,
        estimated_hours,
        completion_rate,
        utilization,
    }
}

/// Workload for every assignee, busiest first.
pub fn team_workload(tasks: &[Task], tracker: &TimeTracker, now: DateTime<Utc>) -> Vec<UserWorkload> {
    let mut users: Vec<&str> = tasks.iter().map(|t| t.assignee.id.as_str()).collect();
    users.sort_unstable();
    users.dedup();
    let mut out: Vec<UserWorkload> = users.into_iter().map(|u| user_workload(tasks, tracker, u, now)).collect();
    out.sort_by(|a, b| b.utilization.total_cmp(&a.utilization).then_with(|| a.user_id.cmp(&b.user_id)));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayLoad {
    pub date: NaiveDate,
    pub tasks: usize,
}

/// Number of the user's tasks due on each of `days` calendar days starting at `start`.
pub fn daily_load(tasks: &[Task], user_id: &str, start: NaiveDate, days: u32) -> Vec<DayLoad> {
    (0..i64::from(days))
        .map(|offset| {
            let date = start + Duration::days(offset);
            let count = tasks
                .iter()
                .filter(|t| t.assignee.id == user_id && t.due_date.date_naive() == date)
                .count();
            DayLoad { date, tasks: count }
        })
        .collect()
}
