//! Results of store operations.
//!
//! Operations on unknown ids or invalid input are not errors; they are skipped
//! and the caller is told why.

use thiserror::Error;

use crate::fields::EntityType;
use crate::notify::Notification;

/// Why an operation was not performed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityType, id: String },
    #[error("comment is empty")]
    EmptyComment,
    #[error("duration must be positive, got {0} minutes")]
    NonPositiveDuration(i64),
    #[error("{actor} is not allowed to delete {entity} {id}")]
    PermissionDenied { actor: String, entity: EntityType, id: String },
    #[error("recurrence interval must be at least 1")]
    InvalidInterval,
}

impl Skip {
    pub fn not_found(entity: EntityType, id: impl ToString) -> Self {
        Skip::NotFound { entity, id: id.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    Applied(T),
    Skipped(Skip),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn skip(&self) -> Option<&Skip> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Skipped(s) => Some(s),
        }
    }
}

/// An outcome plus the notifications the mutation produced.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Mutation<T> {
    pub outcome: Outcome<T>,
    pub notifications: Vec<Notification>,
}

impl<T> Mutation<T> {
    pub fn applied(value: T, notifications: Vec<Notification>) -> Self {
        Mutation { outcome: Outcome::Applied(value), notifications }
    }

    pub fn skipped(skip: Skip) -> Self {
        Mutation { outcome: Outcome::Skipped(skip), notifications: Vec::new() }
    }
}
