//! Recurring tasks.
//!
//! [`expand`] turns a rule and a template into dated task drafts, starting at the
//! generation moment. [`create_recurring_tasks`] creates only the leading occurrences
//! (the commit limit) and reports the full count in one summary notification.
//!
//! Day-of-week and day-of-month refinements are carried on the rule but do not
//! affect how dates advance.

use chrono::{DateTime, Duration, Months, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::Actor;
use crate::fields::{EntityType, NotificationKind, RecurrenceType, Status};
use crate::notify::Notification;
use crate::outcome::{Mutation, Outcome, Skip};
use crate::store::TaskStore;
use crate::task::{TaskDraft, TaskId, TaskTemplate};

pub const RECURRING_TAG: &str = "recurring";

/// Hard upper bound on occurrences per expansion, whatever the rule asks for.
pub const OCCURRENCE_CEILING: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    /// Every N units; must be at least 1.
    pub interval: u32,
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    pub day_of_month: Option<u32>,
    /// Inclusive upper bound on occurrence dates.
    pub end_date: Option<DateTime<Utc>>,
    pub max_occurrences: Option<u32>,
}

impl RecurrenceRule {
    pub fn every(kind: RecurrenceType, interval: u32) -> Self {
        RecurrenceRule {
            kind,
            interval,
            days_of_week: Vec::new(),
            day_of_month: None,
            end_date: None,
            max_occurrences: None,
        }
    }
}

/// Occurrence cap and commit limit, normally taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceLimits {
    pub default_max_occurrences: u32,
    pub commit_limit: usize,
}

impl Default for RecurrenceLimits {
    fn default() -> Self {
        RecurrenceLimits { default_max_occurrences: 52, commit_limit: 5 }
    }
}

/// The next occurrence after `from`. Month arithmetic clamps to the last day of a
/// shorter month. `None` if the date leaves chrono's range.
pub fn advance(from: DateTime<Utc>, kind: RecurrenceType, interval: u32) -> Option<DateTime<Utc>> {
    match kind {
        RecurrenceType::Daily => from.checked_add_signed(Duration::days(i64::from(interval))),
        RecurrenceType::Weekly => from.checked_add_signed(Duration::days(i64::from(interval) * 7)),
        RecurrenceType::Monthly => from.checked_add_months(Months::new(interval)),
        RecurrenceType::Yearly => from.checked_add_months(Months::new(interval.checked_mul(12)?)),
    }
}

/// `"<template name> (M/D/YYYY)"`.
pub fn occurrence_name(template_name: &str, at: DateTime<Utc>) -> String {
    format!("{} ({})", template_name, at.format("%-m/%-d/%Y"))
}

fn occurrence(template: &TaskTemplate, at: DateTime<Utc>) -> TaskDraft {
    TaskDraft {
        name: occurrence_name(&template.name, at),
        description: template.description.clone(),
        status: Status::Pending,
        priority: template.priority,
        assignee: template.assignee.clone(),
        due_date: at,
        project: template.project.clone(),
        tags: vec![RECURRING_TAG.to_string()],
        estimated_hours: template.estimated_hours,
        dependencies: Vec::new(),
        subtasks: Vec::new(),
        comments: Vec::new(),
        attachments: Vec::new(),
    }
}

/// Expand a rule into task drafts due on successive occurrence dates, the first one at `now`.
/// Stops at the occurrence cap (never more than [`OCCURRENCE_CEILING`]) or once the date
/// passes the rule's end date.
pub fn expand(
    rule: &RecurrenceRule,
    template: &TaskTemplate,
    now: DateTime<Utc>,
    default_max_occurrences: u32,
) -> Result<Vec<TaskDraft>, Skip> {
    if rule.interval == 0 {
        return Err(Skip::InvalidInterval);
    }
    let max = rule.max_occurrences.unwrap_or(default_max_occurrences).min(OCCURRENCE_CEILING) as usize;
    let mut out = Vec::new();
    let mut current = now;
    while out.len() < max {
        if rule.end_date.is_some_and(|end| current > end) {
            break;
        }
        out.push(occurrence(template, current));
        match advance(current, rule.kind, rule.interval) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(out)
}

/// What a recurring batch generated and what it actually created.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringBatch {
    pub occurrences: Vec<TaskDraft>,
    pub created: Vec<TaskId>,
}

/// Expand the rule, create the first `commit_limit` occurrences through the task
/// store, and add one summary notification reporting the full expanded count.
/// Occurrences past the limit are returned but not created.
pub fn create_recurring_tasks(
    store: &mut TaskStore,
    actor: &Actor,
    rule: &RecurrenceRule,
    template: &TaskTemplate,
    now: DateTime<Utc>,
    limits: RecurrenceLimits,
) -> Mutation<RecurringBatch> {
    let occurrences = match expand(rule, template, now, limits.default_max_occurrences) {
        Ok(o) => o,
        Err(skip) => return Mutation::skipped(skip),
    };

    let mut notes = Vec::new();
    let mut created = Vec::new();
    for draft in occurrences.iter().take(limits.commit_limit) {
        let m = store.create_task(actor, draft.clone(), now);
        notes.extend(m.notifications);
        if let Outcome::Applied(id) = m.outcome {
            created.push(id);
        }
    }

    if !occurrences.is_empty() {
        let mut summary = Notification::new(
            NotificationKind::Success,
            "Recurring Tasks Created",
            format!(
                "Scheduled {} occurrences of \"{}\", created the first {}",
                occurrences.len(),
                template.name,
                created.len()
            ),
            actor.id.clone(),
            now,
        );
        if let Some(first) = created.first() {
            summary = summary.about(EntityType::Task, first, template.name.clone());
        }
        notes.push(summary);
    }
    debug!(
        template = %template.name,
        generated = occurrences.len(),
        created = created.len(),
        "recurring batch committed"
    );
    Mutation::applied(RecurringBatch { occurrences, created }, notes)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::task::fixtures::*;

    fn template() -> TaskTemplate {
        TaskTemplate {
            name: "Standup notes".into(),
            description: Some("Write them up".into()),
            priority: crate::fields::Priority::Low,
            assignee: person("u1"),
            project: project("p1"),
            estimated_hours: 0.5,
        }
    }

    #[test]
    fn test_weekly_every_two_weeks() {
        let mut rule = RecurrenceRule::every(RecurrenceType::Weekly, 2);
        rule.max_occurrences = Some(5);
        let drafts = expand(&rule, &template(), t0(), 52).unwrap();
        assert_eq!(drafts.len(), 5);
        assert_eq!(drafts[0].due_date, t0());
        for pair in drafts.windows(2) {
            assert_eq!(pair[1].due_date - pair[0].due_date, Duration::days(14));
        }
        assert_eq!(drafts[0].name, "Standup notes (3/1/2024)");
        assert_eq!(drafts[0].tags, vec!["recurring"]);
        assert_eq!(drafts[0].status, Status::Pending);
        assert_eq!(drafts[0].estimated_hours, 0.5);
    }

    #[test]
    fn test_default_cap() {
        let drafts = expand(&RecurrenceRule::every(RecurrenceType::Daily, 1), &template(), t0(), 52).unwrap();
        assert_eq!(drafts.len(), 52);
    }

    #[test]
    fn test_requested_cap_is_bounded() {
        let mut rule = RecurrenceRule::every(RecurrenceType::Daily, 1);
        rule.max_occurrences = Some(4_000_000_000);
        let drafts = expand(&rule, &template(), t0(), 52).unwrap();
        assert_eq!(drafts.len(), OCCURRENCE_CEILING as usize);

        let drafts = expand(&RecurrenceRule::every(RecurrenceType::Daily, 1), &template(), t0(), u32::MAX).unwrap();
        assert_eq!(drafts.len(), OCCURRENCE_CEILING as usize);
    }

    #[test]
    fn test_end_date_before_second_occurrence() {
        let mut rule = RecurrenceRule::every(RecurrenceType::Weekly, 1);
        rule.end_date = Some(t0() + Duration::days(3));
        assert_eq!(expand(&rule, &template(), t0(), 52).unwrap().len(), 1);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let mut rule = RecurrenceRule::every(RecurrenceType::Daily, 1);
        rule.end_date = Some(t0() + Duration::days(2));
        assert_eq!(expand(&rule, &template(), t0(), 52).unwrap().len(), 3);
    }

    #[test]
    fn test_end_date_in_the_past_yields_nothing() {
        let mut rule = RecurrenceRule::every(RecurrenceType::Daily, 1);
        rule.end_date = Some(t0() - Duration::days(1));
        assert!(expand(&rule, &template(), t0(), 52).unwrap().is_empty());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let rule = RecurrenceRule::every(RecurrenceType::Daily, 0);
        assert_eq!(expand(&rule, &template(), t0(), 52), Err(Skip::InvalidInterval));
    }

    #[test]
    fn test_monthly_and_yearly_advance() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let feb = advance(jan31, RecurrenceType::Monthly, 1).unwrap();
        assert_eq!(feb, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        let next_year = advance(jan31, RecurrenceType::Yearly, 1).unwrap();
        assert_eq!(next_year, Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_refinements_do_not_change_dates() {
        let mut plain = RecurrenceRule::every(RecurrenceType::Weekly, 1);
        plain.max_occurrences = Some(3);
        let mut refined = plain.clone();
        refined.days_of_week = vec![Weekday::Mon, Weekday::Thu];
        refined.day_of_month = Some(15);
        let a: Vec<_> = expand(&plain, &template(), t0(), 52).unwrap().into_iter().map(|d| d.due_date).collect();
        let b: Vec<_> = expand(&refined, &template(), t0(), 52).unwrap().into_iter().map(|d| d.due_date).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_commit_creates_only_the_prefix() {
        let mut store = TaskStore::new("owner");
        let actor = Actor::new("u1", "User U1");
        let mut rule = RecurrenceRule::every(RecurrenceType::Weekly, 2);
        rule.max_occurrences = Some(5);

        let m = create_recurring_tasks(&mut store, &actor, &rule, &template(), t0(), RecurrenceLimits::default());
        let summary = m.notifications.last().unwrap().clone();
        let batch = m.outcome.applied().unwrap();
        assert_eq!(batch.created.len(), 5);
        assert_eq!(store.tasks().len(), 5);
        assert!(summary.message.contains("Scheduled 5 occurrences"));

        let m = create_recurring_tasks(
            &mut store,
            &actor,
            &RecurrenceRule::every(RecurrenceType::Daily, 1),
            &template(),
            t0(),
            RecurrenceLimits::default(),
        );
        // five self-assigned creations plus the summary
        assert_eq!(m.notifications.len(), 6);
        assert!(m.notifications[5].message.contains("Scheduled 52 occurrences"));
        let batch = m.outcome.applied().unwrap();
        assert_eq!(batch.occurrences.len(), 52);
        assert_eq!(batch.created.len(), 5);
        assert_eq!(store.tasks().len(), 10);
        let summary = &m.notifications[5];
        let first = batch.created[0].to_string();
        assert_eq!(summary.related_entity.as_ref().map(|e| e.id.as_str()), Some(first.as_str()));
        assert_eq!(summary.action_url, Some(format!("/tasks/{first}")));
    }

    #[test]
    fn test_summary_without_created_tasks_has_no_link() {
        let mut store = TaskStore::new("owner");
        let limits = RecurrenceLimits { commit_limit: 0, ..RecurrenceLimits::default() };
        let mut rule = RecurrenceRule::every(RecurrenceType::Weekly, 1);
        rule.max_occurrences = Some(3);
        let m = create_recurring_tasks(&mut store, &Actor::new("u1", "User U1"), &rule, &template(), t0(), limits);

        assert_eq!(m.notifications.len(), 1);
        let summary = &m.notifications[0];
        assert!(summary.message.contains("Scheduled 3 occurrences"));
        assert!(summary.related_entity.is_none());
        assert!(summary.action_url.is_none());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_commit_with_nothing_generated() {
        let mut store = TaskStore::new("owner");
        let mut rule = RecurrenceRule::every(RecurrenceType::Daily, 1);
        rule.max_occurrences = Some(0);
        let m = create_recurring_tasks(
            &mut store,
            &Actor::new("u1", "User U1"),
            &rule,
            &template(),
            t0(),
            RecurrenceLimits::default(),
        );
        assert!(m.notifications.is_empty());
        assert!(store.tasks().is_empty());
    }
}
