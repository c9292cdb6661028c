//! Recipe model and brew status.
//!
//! A recipe's `status` field is owned by the lifecycle controller and is
//! only ever mutated through validated transitions (see [`crate::lifecycle`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a recipe sits in the brewing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrewStatus {
    Draft,
    Brewing,
    Paused,
    Completed,
}

impl BrewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrewStatus::Draft => "draft",
            BrewStatus::Brewing => "brewing",
            BrewStatus::Paused => "paused",
            BrewStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BrewStatus::Draft),
            "brewing" => Some(BrewStatus::Brewing),
            "paused" => Some(BrewStatus::Paused),
            "completed" => Some(BrewStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BrewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fermentation recipe.
///
/// Ingredient fields are deliberately absent -- ingredient CRUD lives with
/// the editing surface, not with the session controller. Only the fields
/// the lifecycle reads or writes are modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub status: BrewStatus,
    pub created_at: DateTime<Utc>,
    /// Set when brewing starts, cleared by a reset to draft.
    pub brewing_started_at: Option<DateTime<Utc>>,
    /// Set on completion, cleared by rebrew and by a reset to draft.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// A fresh draft recipe with a generated id.
    pub fn draft(owner_id: &str, name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            status: BrewStatus::Draft,
            created_at: Utc::now(),
            brewing_started_at: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BrewStatus::Draft,
            BrewStatus::Brewing,
            BrewStatus::Paused,
            BrewStatus::Completed,
        ] {
            assert_eq!(BrewStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BrewStatus::parse("fermenting"), None);
    }

    #[test]
    fn draft_starts_with_no_dates() {
        let recipe = Recipe::draft("owner-1", "Ginger Booch");
        assert_eq!(recipe.status, BrewStatus::Draft);
        assert!(recipe.brewing_started_at.is_none());
        assert!(recipe.completed_at.is_none());
    }
}
