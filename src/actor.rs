//! Who is performing an operation, and what they are allowed to do.

use serde::{Deserialize, Serialize};

use crate::task::{Assignee, Task};

/// The identity on whose behalf a store operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub initials: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let initials = initials_of(&name);
        Actor { id: id.into(), name, initials }
    }

    /// The actor as a task assignee.
    pub fn as_assignee(&self) -> Assignee {
        Assignee { id: self.id.clone(), name: self.name.clone(), initials: self.initials.clone() }
    }
}

/// Upper-cased first letter of each word, at most three.
pub fn initials_of(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .take(3)
        .collect()
}

/// Resolves the acting user for each call and answers permission checks.
pub trait ActorContext {
    fn current(&self) -> Actor;

    fn can_delete(&self, _actor: &Actor, _task: &Task) -> bool {
        true
    }
}

/// A fixed actor, optionally restricting deletion to the owner and the task's assignee.
#[derive(Debug, Clone)]
pub struct StaticActor {
    pub actor: Actor,
    pub owner_id: String,
    pub delete_requires_owner: bool,
}

impl StaticActor {
    pub fn new(actor: Actor, owner_id: impl Into<String>) -> Self {
        StaticActor { actor, owner_id: owner_id.into(), delete_requires_owner: false }
    }
}

impl ActorContext for StaticActor {
    fn current(&self) -> Actor {
        self.actor.clone()
    }

    fn can_delete(&self, actor: &Actor, task: &Task) -> bool {
        !self.delete_requires_owner || actor.id == self.owner_id || actor.id == task.assignee.id
    }
}
