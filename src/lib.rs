//! # taskflow
//!
//! The task and time engine behind a team project-management application.
//!
//! ## What lives here
//!
//! - **Task store** ([`store`]): create, update, delete, comment on and attach files to
//!   tasks. Status changes, reassignments, deletions, comments and attachments produce
//!   notifications for the people involved.
//! - **Time tracking** ([`time_tracking`]): start/stop timers that commit whole-minute
//!   time entries, manual entries, and per-task / per-user totals.
//! - **Recurrence** ([`recurrence`]): expand a daily/weekly/monthly/yearly rule into dated
//!   task occurrences and create the leading batch.
//! - **Workload** ([`workload`]): per-person completion and utilisation statistics.
//! - **Goals** ([`goal`]): numeric targets with a one-time congratulation on completion.
//!
//! Mutations never call a notification sink themselves. They return the notifications
//! alongside the result, and [`engine::Engine`] dispatches them after resolving the
//! acting user and the current time.
//!
//! ## Example
//!
//! ```no_run
//! use taskflow::prelude::*;
//!
//! let config = Config::default();
//! let actor = StaticActor::new(Actor::new("u1", "Ada Lovelace"), &config.owner_recipient);
//! let mut engine = Engine::new(&config, Box::new(actor), Box::new(SystemClock), MemorySink::default());
//! let overdue = engine.overdue_tasks();
//! println!("{} overdue", overdue.len());
//! ```

pub mod actor;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod fields;
pub mod goal;
pub mod notify;
pub mod outcome;
pub mod recurrence;
pub mod store;
pub mod task;
pub mod time_tracking;
pub mod workload;

pub mod prelude {
    pub use crate::actor::{Actor, ActorContext, StaticActor};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::db::Database;
    pub use crate::engine::Engine;
    pub use crate::fields::*;
    pub use crate::goal::{Goal, GoalDraft, GoalUpdate};
    pub use crate::notify::{LogSink, MemorySink, Notification, NotificationSink};
    pub use crate::outcome::{Outcome, Skip};
    pub use crate::recurrence::{RecurrenceRule, RecurringBatch};
    pub use crate::task::*;
    pub use crate::time_tracking::{ManualEntry, TimeEntry, TimeEntryUpdate, Timer};
    pub use crate::workload::{UserWorkload, UtilizationBand};
}
