//! Goals: progress toward a numeric target, independent of tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::actor::Actor;
use crate::fields::{EntityType, GoalStatus, NotificationKind};
use crate::notify::Notification;
use crate::outcome::{Mutation, Skip};
use crate::task::ProjectRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub progress: f64,
    pub target: f64,
    pub due_date: DateTime<Utc>,
    pub status: GoalStatus,
    pub category: String,
    pub project: Option<ProjectRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Progress as a percentage of target, clamped to 0..=100; 0 without a target.
    pub fn progress_percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.progress / self.target * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub progress: f64,
    pub target: f64,
    pub due_date: DateTime<Utc>,
    pub category: String,
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub progress: Option<f64>,
    pub target: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<GoalStatus>,
    pub category: Option<String>,
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalStore {
    goals: Arc<Vec<Goal>>,
}

impl GoalStore {
    pub fn new(goals: Vec<Goal>) -> Self {
        GoalStore { goals: Arc::new(goals) }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn create_goal(&mut self, draft: GoalDraft, now: DateTime<Utc>) -> Mutation<Uuid> {
        let goal = Goal {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            progress: draft.progress.max(0.0),
            target: draft.target.max(0.0),
            due_date: draft.due_date,
            status: GoalStatus::Active,
            category: draft.category,
            project: draft.project,
            created_at: now,
            updated_at: now,
        };
        let id = goal.id;
        Arc::make_mut(&mut self.goals).push(goal);
        Mutation::applied(id, Vec::new())
    }

    /// Merge an update. Moving into `Completed` from any other status congratulates the actor once.
    pub fn update_goal(&mut self, actor: &Actor, id: Uuid, update: GoalUpdate, now: DateTime<Utc>) -> Mutation<()> {
        let Some(idx) = self.goals.iter().position(|g| g.id == id) else {
            return Mutation::skipped(Skip::not_found(EntityType::Goal, id));
        };
        let goal = &mut Arc::make_mut(&mut self.goals)[idx];
        let old_status = goal.status;

        if let Some(v) = update.title {
            goal.title = v;
        }
        if let Some(v) = update.description {
            goal.description = Some(v);
        }
        if let Some(v) = update.progress {
            goal.progress = v.max(0.0);
        }
        if let Some(v) = update.target {
            goal.target = v.max(0.0);
        }
        if let Some(v) = update.due_date {
            goal.due_date = v;
        }
        if let Some(v) = update.status {
            goal.status = v;
        }
        if let Some(v) = update.category {
            goal.category = v;
        }
        if let Some(v) = update.project {
            goal.project = Some(v);
        }
        goal.updated_at = now;

        let mut notes = Vec::new();
        if goal.status == GoalStatus::Completed && old_status != GoalStatus::Completed {
            debug!(goal_id = %id, "goal completed");
            notes.push(
                Notification::new(
                    NotificationKind::Success,
                    "Goal Achieved",
                    format!("Congratulations! You completed \"{}\"", goal.title),
                    actor.id.clone(),
                    now,
                )
                .about(EntityType::Goal, id, goal.title.clone()),
            );
        }
        Mutation::applied((), notes)
    }

    pub fn delete_goal(&mut self, id: Uuid) -> Mutation<Goal> {
        match self.goals.iter().position(|g| g.id == id) {
            Some(idx) => Mutation::applied(Arc::make_mut(&mut self.goals).remove(idx), Vec::new()),
            None => Mutation::skipped(Skip::not_found(EntityType::Goal, id)),
        }
    }

    pub fn into_goals(self) -> Vec<Goal> {
        Arc::try_unwrap(self.goals).unwrap_or_else(|shared| (*shared).clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::task::fixtures::t0;

    fn draft(title: &str, target: f64) -> GoalDraft {
        GoalDraft {
            title: title.into(),
            description: None,
            progress: 0.0,
            target,
            due_date: t0() + Duration::days(30),
            category: "growth".into(),
            project: None,
        }
    }

    #[test]
    fn test_completion_notifies_once() {
        let mut store = GoalStore::default();
        let actor = Actor::new("u1", "Ada");
        let id = store.create_goal(draft("Ship v1", 10.0), t0()).outcome.applied().unwrap();

        let done = GoalUpdate { status: Some(GoalStatus::Completed), ..Default::default() };
        let m = store.update_goal(&actor, id, done.clone(), t0());
        assert_eq!(m.notifications.len(), 1);
        assert_eq!(m.notifications[0].kind, NotificationKind::Success);
        assert_eq!(m.notifications[0].recipient_id, "u1");

        let m = store.update_goal(&actor, id, done, t0());
        assert!(m.notifications.is_empty());

        let progress = GoalUpdate { progress: Some(4.0), ..Default::default() };
        assert!(store.update_goal(&actor, id, progress, t0()).notifications.is_empty());
    }

    #[test]
    fn test_progress_percent() {
        let mut store = GoalStore::default();
        let actor = Actor::new("u1", "Ada");
        let id = store.create_goal(draft("Read", 20.0), t0()).outcome.applied().unwrap();
        let _ = store.update_goal(&actor, id, GoalUpdate { progress: Some(5.0), ..Default::default() }, t0());
        assert_eq!(store.get(id).unwrap().progress_percent(), 25.0);
        let _ = store.update_goal(&actor, id, GoalUpdate { progress: Some(50.0), ..Default::default() }, t0());
        assert_eq!(store.get(id).unwrap().progress_percent(), 100.0);

        let zero = store.create_goal(draft("Nothing", 0.0), t0()).outcome.applied().unwrap();
        assert_eq!(store.get(zero).unwrap().progress_percent(), 0.0);
    }

    #[test]
    fn test_unknown_goal() {
        let mut store = GoalStore::default();
        let ghost = Uuid::new_v4();
        let m = store.update_goal(&Actor::new("u1", "Ada"), ghost, GoalUpdate::default(), t0());
        assert_eq!(m.outcome.skip(), Some(&Skip::not_found(EntityType::Goal, ghost)));
        assert!(!store.delete_goal(ghost).outcome.is_applied());
    }
}
