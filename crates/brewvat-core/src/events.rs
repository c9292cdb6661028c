use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PartialPurgeFailure;

/// Every committed lifecycle transition produces a BrewEvent.
/// The CLI prints them; callers use them to refresh their view of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BrewEvent {
    BrewStarted {
        recipe_id: String,
        at: DateTime<Utc>,
    },
    BrewPaused {
        recipe_id: String,
        at: DateTime<Utc>,
    },
    BrewResumed {
        recipe_id: String,
        at: DateTime<Utc>,
    },
    BrewCompleted {
        recipe_id: String,
        at: DateTime<Utc>,
    },
    /// A completed recipe went live again; its completion date is cleared.
    RebrewStarted {
        recipe_id: String,
        at: DateTime<Utc>,
    },
    /// Recipe reset to draft; sample history purged best-effort.
    BackToDraft {
        recipe_id: String,
        purged: usize,
        /// Present when some sample records could not be deleted. The
        /// transition applied regardless.
        purge_failure: Option<PartialPurgeFailure>,
        at: DateTime<Utc>,
    },
}

impl BrewEvent {
    pub fn recipe_id(&self) -> &str {
        match self {
            BrewEvent::BrewStarted { recipe_id, .. }
            | BrewEvent::BrewPaused { recipe_id, .. }
            | BrewEvent::BrewResumed { recipe_id, .. }
            | BrewEvent::BrewCompleted { recipe_id, .. }
            | BrewEvent::RebrewStarted { recipe_id, .. }
            | BrewEvent::BackToDraft { recipe_id, .. } => recipe_id,
        }
    }
}
