//! The shared sensor lock.
//!
//! One physical temperature probe serves every recipe in the system, so at
//! most one recipe may be "live" on it at a time. The lock is a singleton
//! record in the backing store; this module defines its snapshot types.
//! The mutation itself happens inside the store as a single atomic
//! compare-and-swap statement (see [`crate::storage::Store`]) -- the
//! invariant is only as strong as that atomicity.

use serde::{Deserialize, Serialize};

/// Identity of the recipe currently authorized to treat live sensor data
/// as its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub recipe_id: String,
    pub owner_id: String,
}

impl std::fmt::Display for LockHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "recipe {} (owner {})", self.recipe_id, self.owner_id)
    }
}

/// Result of a lock acquisition attempt.
///
/// Acquisition is idempotent for the recipe that already holds the lock:
/// `resume` and `rebrew` re-acquire a lock they logically still own after
/// a pause, and must not be rejected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// Somebody else is live on the sensor. Carries the holder so callers
    /// can tell the user who to wait for.
    Held(LockHolder),
}
