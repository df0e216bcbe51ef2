//! Engine configuration, stored as `config.json` next to the database.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::Actor;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recipient of the secondary "someone else touched this task" notifications.
    pub owner_recipient: String,
    /// How many generated occurrences a recurring batch actually creates.
    pub recurrence_commit_limit: usize,
    /// Occurrence cap when a rule does not set one.
    pub default_max_occurrences: u32,
    /// Acting user when none is given on the command line.
    pub actor: Actor,
    /// Only the owner recipient or the assignee may delete a task.
    pub delete_requires_owner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner_recipient: "admin".to_string(),
            recurrence_commit_limit: 5,
            default_max_occurrences: 52,
            actor: Actor::new("admin", "Admin"),
            delete_requires_owner: false,
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let buf = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&buf)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }
}
