//! Brew lifecycle state machine.
//!
//! Validates status transitions and coordinates each one with the shared
//! sensor lock. The ordering contract for every transition:
//!
//! 1. resolve the lock action first,
//! 2. only on lock success, commit the new status and timestamp fields,
//! 3. on lock contention, leave status and lock untouched and surface
//!    [`LifecycleError::LockHeldByOther`].
//!
//! ```text
//! Draft ──start──► Brewing ──pause──► Paused ──resume──► Brewing
//!                  Brewing ──complete──► Completed ──rebrew──► Brewing
//!                  Brewing | Paused ──back_to_draft──► Draft
//! ```
//!
//! Contention is rejected, never retried automatically: the system refuses
//! false concurrency rather than silently letting two recipes read one
//! probe.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LifecycleError, PartialPurgeFailure};
use crate::events::BrewEvent;
use crate::lock::AcquireOutcome;
use crate::recipe::{BrewStatus, Recipe};
use crate::storage::{BrewStore, PurgeOutcome};

/// A lifecycle command a caller can issue against a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrewCommand {
    Start,
    Pause,
    Resume,
    Complete,
    Rebrew,
    BackToDraft,
}

impl BrewCommand {
    pub const ALL: [BrewCommand; 6] = [
        BrewCommand::Start,
        BrewCommand::Pause,
        BrewCommand::Resume,
        BrewCommand::Complete,
        BrewCommand::Rebrew,
        BrewCommand::BackToDraft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrewCommand::Start => "start",
            BrewCommand::Pause => "pause",
            BrewCommand::Resume => "resume",
            BrewCommand::Complete => "complete",
            BrewCommand::Rebrew => "rebrew",
            BrewCommand::BackToDraft => "back-to-draft",
        }
    }
}

impl std::fmt::Display for BrewCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives recipes through the brewing lifecycle against a shared store.
pub struct BrewController<S: BrewStore> {
    store: Arc<S>,
}

impl<S: BrewStore> BrewController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Draft -> Brewing. Acquires the sensor lock; stamps
    /// `brewing_started_at`.
    pub fn start_brewing(
        &self,
        recipe_id: &str,
        owner_id: &str,
    ) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(&recipe, &[BrewStatus::Draft], BrewCommand::Start)?;
        self.acquire(recipe_id, owner_id)?;

        let now = Utc::now();
        self.commit_or_release(recipe_id, BrewStatus::Brewing, Some(now), None)?;
        debug!(recipe_id, "brew started");
        Ok(BrewEvent::BrewStarted {
            recipe_id: recipe_id.to_string(),
            at: now,
        })
    }

    /// Brewing -> Paused. Releases the lock; keeps the start timestamp so a
    /// resume continues the same brewing run.
    pub fn pause_brewing(&self, recipe_id: &str) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(&recipe, &[BrewStatus::Brewing], BrewCommand::Pause)?;

        self.store.lock_release(recipe_id)?;
        let now = Utc::now();
        self.store
            .save_status(recipe_id, BrewStatus::Paused, recipe.brewing_started_at, None)?;
        debug!(recipe_id, "brew paused");
        Ok(BrewEvent::BrewPaused {
            recipe_id: recipe_id.to_string(),
            at: now,
        })
    }

    /// Paused -> Brewing. Re-acquires the lock. The resuming caller's owner
    /// id becomes the holder: a paused recipe retains no logical ownership.
    pub fn resume_brewing(
        &self,
        recipe_id: &str,
        owner_id: &str,
    ) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(&recipe, &[BrewStatus::Paused], BrewCommand::Resume)?;
        self.acquire(recipe_id, owner_id)?;

        let now = Utc::now();
        self.commit_or_release(
            recipe_id,
            BrewStatus::Brewing,
            recipe.brewing_started_at,
            None,
        )?;
        debug!(recipe_id, "brew resumed");
        Ok(BrewEvent::BrewResumed {
            recipe_id: recipe_id.to_string(),
            at: now,
        })
    }

    /// Brewing -> Completed. Releases the lock; stamps `completed_at`.
    pub fn complete_brewing(&self, recipe_id: &str) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(&recipe, &[BrewStatus::Brewing], BrewCommand::Complete)?;

        self.store.lock_release(recipe_id)?;
        let now = Utc::now();
        self.store.save_status(
            recipe_id,
            BrewStatus::Completed,
            recipe.brewing_started_at,
            Some(now),
        )?;
        debug!(recipe_id, "brew completed");
        Ok(BrewEvent::BrewCompleted {
            recipe_id: recipe_id.to_string(),
            at: now,
        })
    }

    /// Completed -> Brewing. Re-acquires the lock, clears the completion
    /// date and stamps a fresh start.
    pub fn rebrew(&self, recipe_id: &str, owner_id: &str) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(&recipe, &[BrewStatus::Completed], BrewCommand::Rebrew)?;
        self.acquire(recipe_id, owner_id)?;

        let now = Utc::now();
        self.commit_or_release(recipe_id, BrewStatus::Brewing, Some(now), None)?;
        debug!(recipe_id, "rebrew started");
        Ok(BrewEvent::RebrewStarted {
            recipe_id: recipe_id.to_string(),
            at: now,
        })
    }

    /// Brewing | Paused -> Draft. Releases the lock (idempotent), purges the
    /// recipe's sample history best-effort, then clears status and dates.
    ///
    /// The purge runs before the status write, so the lifecycle never sees a
    /// draft recipe that still drags its brewing data behind it. A partial
    /// purge is reported in the event but does not block the transition --
    /// releasing the hardware lock is the correctness-critical half here.
    pub fn back_to_draft(&self, recipe_id: &str) -> Result<BrewEvent, LifecycleError> {
        let recipe = self.load(recipe_id)?;
        self.check(
            &recipe,
            &[BrewStatus::Brewing, BrewStatus::Paused],
            BrewCommand::BackToDraft,
        )?;

        self.store.lock_release(recipe_id)?;

        let outcome = match self.store.purge_samples(recipe_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(recipe_id, error = %e, "sample purge failed entirely");
                PurgeOutcome {
                    deleted: 0,
                    failed: self.store.sample_count(recipe_id).unwrap_or(0),
                }
            }
        };
        let purge_failure = (outcome.failed > 0).then_some(PartialPurgeFailure {
            deleted: outcome.deleted,
            failed: outcome.failed,
        });
        if let Some(failure) = &purge_failure {
            warn!(recipe_id, %failure, "continuing transition despite purge failure");
        }

        let now = Utc::now();
        self.store
            .save_status(recipe_id, BrewStatus::Draft, None, None)?;
        debug!(recipe_id, purged = outcome.deleted, "recipe reset to draft");
        Ok(BrewEvent::BackToDraft {
            recipe_id: recipe_id.to_string(),
            purged: outcome.deleted,
            purge_failure,
            at: now,
        })
    }

    fn load(&self, recipe_id: &str) -> Result<Recipe, LifecycleError> {
        self.store
            .recipe(recipe_id)?
            .ok_or_else(|| LifecycleError::RecipeNotFound(recipe_id.to_string()))
    }

    fn check(
        &self,
        recipe: &Recipe,
        allowed: &[BrewStatus],
        command: BrewCommand,
    ) -> Result<(), LifecycleError> {
        if allowed.contains(&recipe.status) {
            Ok(())
        } else {
            Err(LifecycleError::IllegalTransition {
                status: recipe.status,
                command,
            })
        }
    }

    fn acquire(&self, recipe_id: &str, owner_id: &str) -> Result<(), LifecycleError> {
        match self.store.lock_try_acquire(recipe_id, owner_id)? {
            AcquireOutcome::Acquired => Ok(()),
            AcquireOutcome::Held(holder) => Err(LifecycleError::LockHeldByOther { holder }),
        }
    }

    /// Commit the status write that follows a fresh acquisition. If the
    /// write fails, give the lock back so the pair stays consistent.
    fn commit_or_release(
        &self,
        recipe_id: &str,
        status: BrewStatus,
        brewing_started_at: Option<chrono::DateTime<Utc>>,
        completed_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<(), LifecycleError> {
        if let Err(e) = self
            .store
            .save_status(recipe_id, status, brewing_started_at, completed_at)
        {
            if let Err(release_err) = self.store.lock_release(recipe_id) {
                warn!(recipe_id, error = %release_err, "failed to roll back lock after status write failure");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::lock::LockHolder;
    use crate::sample::TemperatureSample;
    use crate::storage::Store;
    use chrono::{DateTime, Utc};

    fn controller() -> (BrewController<Store>, Arc<Store>) {
        let store = Arc::new(Store::open_memory().unwrap());
        (BrewController::new(store.clone()), store)
    }

    fn seeded(store: &Store, name: &str, owner: &str) -> String {
        let recipe = Recipe::draft(owner, name);
        store.insert_recipe(&recipe).unwrap();
        recipe.id
    }

    fn status_of(store: &Store, id: &str) -> BrewStatus {
        store.recipe(id).unwrap().unwrap().status
    }

    #[test]
    fn full_happy_path() {
        let (controller, store) = controller();
        let id = seeded(&store, "Hibiscus", "owner-1");

        controller.start_brewing(&id, "owner-1").unwrap();
        assert_eq!(status_of(&store, &id), BrewStatus::Brewing);
        assert_eq!(store.lock_holder().unwrap().unwrap().recipe_id, id);
        assert!(store
            .recipe(&id)
            .unwrap()
            .unwrap()
            .brewing_started_at
            .is_some());

        controller.pause_brewing(&id).unwrap();
        assert_eq!(status_of(&store, &id), BrewStatus::Paused);
        assert!(store.lock_holder().unwrap().is_none());
        // Pause keeps the original start timestamp.
        assert!(store
            .recipe(&id)
            .unwrap()
            .unwrap()
            .brewing_started_at
            .is_some());

        controller.resume_brewing(&id, "owner-1").unwrap();
        assert_eq!(status_of(&store, &id), BrewStatus::Brewing);

        controller.complete_brewing(&id).unwrap();
        assert_eq!(status_of(&store, &id), BrewStatus::Completed);
        assert!(store.lock_holder().unwrap().is_none());
        assert!(store.recipe(&id).unwrap().unwrap().completed_at.is_some());
    }

    #[test]
    fn rebrew_clears_completion_date() {
        let (controller, store) = controller();
        let id = seeded(&store, "Chai", "owner-1");

        controller.start_brewing(&id, "owner-1").unwrap();
        controller.complete_brewing(&id).unwrap();
        controller.rebrew(&id, "owner-1").unwrap();

        let recipe = store.recipe(&id).unwrap().unwrap();
        assert_eq!(recipe.status, BrewStatus::Brewing);
        assert!(recipe.completed_at.is_none());
        assert!(recipe.brewing_started_at.is_some());
        assert_eq!(store.lock_holder().unwrap().unwrap().recipe_id, id);
    }

    #[test]
    fn contention_is_rejected_and_leaves_everything_untouched() {
        let (controller, store) = controller();
        let a = seeded(&store, "A", "owner-a");
        let b = seeded(&store, "B", "owner-b");

        controller.start_brewing(&a, "owner-a").unwrap();

        let err = controller.start_brewing(&b, "owner-b").unwrap_err();
        match err {
            LifecycleError::LockHeldByOther { holder } => {
                assert_eq!(holder.recipe_id, a);
            }
            other => panic!("expected LockHeldByOther, got {other:?}"),
        }
        assert_eq!(status_of(&store, &b), BrewStatus::Draft);
        assert!(store.recipe(&b).unwrap().unwrap().brewing_started_at.is_none());
        assert_eq!(store.lock_holder().unwrap().unwrap().recipe_id, a);
    }

    #[test]
    fn resume_is_open_to_any_owner_once_lock_is_free() {
        let (controller, store) = controller();
        let id = seeded(&store, "Shared", "owner-1");

        controller.start_brewing(&id, "owner-1").unwrap();
        controller.pause_brewing(&id).unwrap();

        // Paused retains no logical ownership.
        controller.resume_brewing(&id, "owner-2").unwrap();
        assert_eq!(store.lock_holder().unwrap().unwrap().owner_id, "owner-2");
    }

    #[test]
    fn transition_table_is_closed() {
        // Every (status, command) pair outside the table must reject with
        // IllegalTransition and leave the status unchanged.
        let legal: &[(BrewStatus, BrewCommand)] = &[
            (BrewStatus::Draft, BrewCommand::Start),
            (BrewStatus::Brewing, BrewCommand::Pause),
            (BrewStatus::Paused, BrewCommand::Resume),
            (BrewStatus::Brewing, BrewCommand::Complete),
            (BrewStatus::Completed, BrewCommand::Rebrew),
            (BrewStatus::Brewing, BrewCommand::BackToDraft),
            (BrewStatus::Paused, BrewCommand::BackToDraft),
        ];

        for status in [
            BrewStatus::Draft,
            BrewStatus::Brewing,
            BrewStatus::Paused,
            BrewStatus::Completed,
        ] {
            for command in BrewCommand::ALL {
                if legal.contains(&(status, command)) {
                    continue;
                }

                let (controller, store) = controller();
                let id = seeded(&store, "grid", "owner-1");
                store.save_status(&id, status, None, None).unwrap();

                let result = match command {
                    BrewCommand::Start => controller.start_brewing(&id, "owner-1"),
                    BrewCommand::Pause => controller.pause_brewing(&id),
                    BrewCommand::Resume => controller.resume_brewing(&id, "owner-1"),
                    BrewCommand::Complete => controller.complete_brewing(&id),
                    BrewCommand::Rebrew => controller.rebrew(&id, "owner-1"),
                    BrewCommand::BackToDraft => controller.back_to_draft(&id),
                };

                match result {
                    Err(LifecycleError::IllegalTransition {
                        status: reported, ..
                    }) => assert_eq!(reported, status),
                    other => panic!("{command} from {status} should be illegal, got {other:?}"),
                }
                assert_eq!(status_of(&store, &id), status);
            }
        }
    }

    #[test]
    fn concurrent_starts_admit_exactly_one_winner() {
        let store = Arc::new(Store::open_memory().unwrap());
        let mut ids = Vec::new();
        for i in 0..8 {
            ids.push(seeded(&store, &format!("recipe-{i}"), &format!("owner-{i}")));
        }

        let mut handles = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let store = store.clone();
            let id = id.clone();
            let owner = format!("owner-{i}");
            handles.push(std::thread::spawn(move || {
                let controller = BrewController::new(store);
                controller.start_brewing(&id, &owner).is_ok()
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);

        let holder = store.lock_holder().unwrap().unwrap();
        let brewing: Vec<_> = ids
            .iter()
            .filter(|id| status_of(&store, id) == BrewStatus::Brewing)
            .collect();
        assert_eq!(brewing.len(), 1);
        assert_eq!(*brewing[0], holder.recipe_id);
    }

    #[test]
    fn back_to_draft_purges_history_and_clears_lock() {
        let (controller, store) = controller();
        let id = seeded(&store, "Reset Me", "owner-1");
        controller.start_brewing(&id, "owner-1").unwrap();
        for i in 0..5 {
            store
                .insert_sample(&TemperatureSample::new(&id, 72.0 + i as f64, Utc::now()))
                .unwrap();
        }

        let event = controller.back_to_draft(&id).unwrap();
        match event {
            BrewEvent::BackToDraft {
                purged,
                purge_failure,
                ..
            } => {
                assert_eq!(purged, 5);
                assert!(purge_failure.is_none());
            }
            other => panic!("expected BackToDraft, got {other:?}"),
        }

        let recipe = store.recipe(&id).unwrap().unwrap();
        assert_eq!(recipe.status, BrewStatus::Draft);
        assert!(recipe.brewing_started_at.is_none());
        assert!(recipe.completed_at.is_none());
        assert_eq!(store.sample_count(&id).unwrap(), 0);
        assert!(store.lock_holder().unwrap().is_none());
    }

    /// Store double whose purge leaves one row behind, like a backing store
    /// that fails a single record delete.
    struct LeakyPurgeStore {
        inner: Store,
    }

    impl BrewStore for LeakyPurgeStore {
        fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError> {
            self.inner.insert_recipe(recipe)
        }
        fn recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
            self.inner.recipe(id)
        }
        fn recipes(&self) -> Result<Vec<Recipe>, StoreError> {
            self.inner.recipes()
        }
        fn save_status(
            &self,
            id: &str,
            status: BrewStatus,
            brewing_started_at: Option<DateTime<Utc>>,
            completed_at: Option<DateTime<Utc>>,
        ) -> Result<(), StoreError> {
            self.inner
                .save_status(id, status, brewing_started_at, completed_at)
        }
        fn lock_try_acquire(
            &self,
            recipe_id: &str,
            owner_id: &str,
        ) -> Result<AcquireOutcome, StoreError> {
            self.inner.lock_try_acquire(recipe_id, owner_id)
        }
        fn lock_release(&self, recipe_id: &str) -> Result<(), StoreError> {
            self.inner.lock_release(recipe_id)
        }
        fn lock_holder(&self) -> Result<Option<LockHolder>, StoreError> {
            self.inner.lock_holder()
        }
        fn insert_sample(&self, sample: &TemperatureSample) -> Result<(), StoreError> {
            self.inner.insert_sample(sample)
        }
        fn latest_sample(&self, recipe_id: &str) -> Result<Option<TemperatureSample>, StoreError> {
            self.inner.latest_sample(recipe_id)
        }
        fn sample_count(&self, recipe_id: &str) -> Result<usize, StoreError> {
            self.inner.sample_count(recipe_id)
        }
        fn purge_samples(&self, recipe_id: &str) -> Result<PurgeOutcome, StoreError> {
            let total = self.inner.sample_count(recipe_id)?;
            if total == 0 {
                return Ok(PurgeOutcome::default());
            }
            let outcome = self.inner.purge_samples(recipe_id)?;
            // One row "failed": resurrect it so the history really is partial.
            self.inner
                .insert_sample(&TemperatureSample::new(recipe_id, 72.0, Utc::now()))?;
            Ok(PurgeOutcome {
                deleted: outcome.deleted - 1,
                failed: 1,
            })
        }
    }

    #[test]
    fn partial_purge_is_reported_but_does_not_block_the_transition() {
        let store = Arc::new(LeakyPurgeStore {
            inner: Store::open_memory().unwrap(),
        });
        let controller = BrewController::new(store.clone());
        let recipe = Recipe::draft("owner-1", "Flaky");
        store.insert_recipe(&recipe).unwrap();
        controller.start_brewing(&recipe.id, "owner-1").unwrap();
        for _ in 0..3 {
            store
                .insert_sample(&TemperatureSample::new(&recipe.id, 75.0, Utc::now()))
                .unwrap();
        }

        let event = controller.back_to_draft(&recipe.id).unwrap();
        match event {
            BrewEvent::BackToDraft {
                purged,
                purge_failure,
                ..
            } => {
                assert_eq!(purged, 2);
                assert_eq!(
                    purge_failure,
                    Some(PartialPurgeFailure {
                        deleted: 2,
                        failed: 1
                    })
                );
            }
            other => panic!("expected BackToDraft, got {other:?}"),
        }

        // Transition applied anyway: draft status, lock free.
        let loaded = store.recipe(&recipe.id).unwrap().unwrap();
        assert_eq!(loaded.status, BrewStatus::Draft);
        assert!(store.lock_holder().unwrap().is_none());
    }

    #[test]
    fn unknown_recipe_is_reported_as_not_found() {
        let (controller, _store) = controller();
        match controller.start_brewing("nope", "owner-1") {
            Err(LifecycleError::RecipeNotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected RecipeNotFound, got {other:?}"),
        }
    }
}
