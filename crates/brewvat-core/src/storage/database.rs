//! SQLite-backed shared store.
//!
//! Persists recipes, the sensor-lock singleton, and per-recipe temperature
//! samples. Every client process in the fleet talks to the same backing
//! store, so the lock mutation here is written as a single guarded UPDATE:
//! the read-test and the write happen in one statement, never as separate
//! steps a competing client could slip between.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::lock::{AcquireOutcome, LockHolder};
use crate::recipe::{BrewStatus, Recipe};
use crate::sample::TemperatureSample;

use super::data_dir;

/// Outcome of a best-effort bulk purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub deleted: usize,
    pub failed: usize,
}

/// Persistence operations the session controller needs.
///
/// The lifecycle controller and the observing session are written against
/// this trait; [`Store`] is the SQLite implementation, tests substitute
/// doubles where they need to inject faults.
pub trait BrewStore: Send + Sync {
    fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError>;
    fn recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError>;
    fn recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Commit a validated status change together with its timestamp fields.
    fn save_status(
        &self,
        id: &str,
        status: BrewStatus,
        brewing_started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Atomic test-and-set on the lock singleton. Succeeds iff the lock is
    /// free or already held by `recipe_id`.
    fn lock_try_acquire(&self, recipe_id: &str, owner_id: &str)
        -> Result<AcquireOutcome, StoreError>;

    /// Clear the lock iff `recipe_id` is the current holder. Releasing a
    /// lock you don't hold is a no-op, not an error.
    fn lock_release(&self, recipe_id: &str) -> Result<(), StoreError>;

    fn lock_holder(&self) -> Result<Option<LockHolder>, StoreError>;

    fn insert_sample(&self, sample: &TemperatureSample) -> Result<(), StoreError>;
    fn latest_sample(&self, recipe_id: &str) -> Result<Option<TemperatureSample>, StoreError>;
    fn sample_count(&self, recipe_id: &str) -> Result<usize, StoreError>;

    /// Delete every sample for a recipe, row by row, tolerating individual
    /// failures. The caller decides what a partial result means.
    fn purge_samples(&self, recipe_id: &str) -> Result<PurgeOutcome, StoreError>;
}

/// SQLite store shared by every component in the process.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open the store at `~/.config/brewvat/brewvat.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .join("brewvat.db");
        Self::open_at(path)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, StoreError> {
        let conn = Connection::open(&path)
            .map_err(|source| StoreError::OpenFailed { path, source })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS recipes (
                id                 TEXT PRIMARY KEY,
                owner_id           TEXT NOT NULL,
                name               TEXT NOT NULL DEFAULT '',
                status             TEXT NOT NULL DEFAULT 'draft',
                created_at         TEXT NOT NULL,
                brewing_started_at TEXT,
                completed_at       TEXT
            );

            -- Singleton: the one physical probe shared by the whole fleet.
            -- Cleared on release, never deleted.
            CREATE TABLE IF NOT EXISTS brew_lock (
                id               INTEGER PRIMARY KEY CHECK (id = 1),
                holder_recipe_id TEXT,
                holder_owner_id  TEXT
            );

            CREATE TABLE IF NOT EXISTS samples (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id   TEXT NOT NULL,
                sensor_id   TEXT,
                value_f     REAL NOT NULL,
                observed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_samples_recipe_observed
                ON samples(recipe_id, observed_at);",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::QueryFailed("store mutex poisoned".to_string()))
    }
}

impl BrewStore for Store {
    fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO recipes (id, owner_id, name, status, created_at, brewing_started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                recipe.id,
                recipe.owner_id,
                recipe.name,
                recipe.status.as_str(),
                recipe.created_at.to_rfc3339(),
                recipe.brewing_started_at.map(|t| t.to_rfc3339()),
                recipe.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                "SELECT id, owner_id, name, status, created_at, brewing_started_at, completed_at
                 FROM recipes WHERE id = ?1",
                params![id],
                row_to_tuple,
            )
            .optional()?;
        row.map(tuple_to_recipe).transpose()
    }

    fn recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, status, created_at, brewing_started_at, completed_at
             FROM recipes ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], row_to_tuple)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(tuple_to_recipe).collect()
    }

    fn save_status(
        &self,
        id: &str,
        status: BrewStatus,
        brewing_started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let changed = self.conn()?.execute(
            "UPDATE recipes SET status = ?2, brewing_started_at = ?3, completed_at = ?4
             WHERE id = ?1",
            params![
                id,
                status.as_str(),
                brewing_started_at.map(|t| t.to_rfc3339()),
                completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::QueryFailed(format!(
                "no recipe with id {id}"
            )));
        }
        Ok(())
    }

    fn lock_try_acquire(
        &self,
        recipe_id: &str,
        owner_id: &str,
    ) -> Result<AcquireOutcome, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO brew_lock (id, holder_recipe_id, holder_owner_id)
             VALUES (1, NULL, NULL)",
            [],
        )?;

        // The compare and the swap are one statement: the guard in the
        // WHERE clause is evaluated under SQLite's write serialization, so
        // two racing acquirers can never both see the lock as free.
        let changed = conn.execute(
            "UPDATE brew_lock SET holder_recipe_id = ?1, holder_owner_id = ?2
             WHERE id = 1 AND (holder_recipe_id IS NULL OR holder_recipe_id = ?1)",
            params![recipe_id, owner_id],
        )?;

        if changed == 1 {
            return Ok(AcquireOutcome::Acquired);
        }

        let holder = conn
            .query_row(
                "SELECT holder_recipe_id, holder_owner_id FROM brew_lock WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        match holder {
            Some((Some(recipe_id), owner_id)) => Ok(AcquireOutcome::Held(LockHolder {
                recipe_id,
                owner_id: owner_id.unwrap_or_default(),
            })),
            // Lost the race to an acquirer that released in between; the
            // caller treats this as contention and retries manually.
            _ => Err(StoreError::QueryFailed(
                "lock state changed during acquire".to_string(),
            )),
        }
    }

    fn lock_release(&self, recipe_id: &str) -> Result<(), StoreError> {
        // Guarded the same way as acquire: a stale release from a previous
        // session can never evict a legitimate new holder.
        self.conn()?.execute(
            "UPDATE brew_lock SET holder_recipe_id = NULL, holder_owner_id = NULL
             WHERE id = 1 AND holder_recipe_id = ?1",
            params![recipe_id],
        )?;
        Ok(())
    }

    fn lock_holder(&self) -> Result<Option<LockHolder>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                "SELECT holder_recipe_id, holder_owner_id FROM brew_lock WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(match row {
            Some((Some(recipe_id), owner_id)) => Some(LockHolder {
                recipe_id,
                owner_id: owner_id.unwrap_or_default(),
            }),
            _ => None,
        })
    }

    fn insert_sample(&self, sample: &TemperatureSample) -> Result<(), StoreError> {
        self.conn()?.execute(
            "INSERT INTO samples (recipe_id, sensor_id, value_f, observed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.recipe_id,
                sample.sensor_id,
                sample.value_f,
                sample.observed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn latest_sample(&self, recipe_id: &str) -> Result<Option<TemperatureSample>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                "SELECT recipe_id, sensor_id, value_f, observed_at FROM samples
                 WHERE recipe_id = ?1 ORDER BY observed_at DESC LIMIT 1",
                params![recipe_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(recipe_id, sensor_id, value_f, observed_at)| {
            Ok(TemperatureSample {
                recipe_id,
                sensor_id,
                value_f,
                observed_at: parse_ts(&observed_at)?,
            })
        })
        .transpose()
    }

    fn sample_count(&self, recipe_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM samples WHERE recipe_id = ?1",
            params![recipe_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn purge_samples(&self, recipe_id: &str) -> Result<PurgeOutcome, StoreError> {
        let conn = self.conn()?;
        let ids: Vec<i64> = {
            let mut stmt = conn.prepare("SELECT id FROM samples WHERE recipe_id = ?1")?;
            let ids = stmt
                .query_map(params![recipe_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        // Row-by-row, matching the one-record-at-a-time delete the shared
        // backing store exposes. A failed row is counted, not fatal.
        let mut outcome = PurgeOutcome::default();
        for id in ids {
            match conn.execute("DELETE FROM samples WHERE id = ?1", params![id]) {
                Ok(n) => outcome.deleted += n,
                Err(e) => {
                    tracing::warn!(sample_id = id, error = %e, "failed to delete sample");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }
}

fn row_to_tuple(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<(
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn tuple_to_recipe(
    (id, owner_id, name, status, created_at, brewing_started_at, completed_at): (
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        Option<String>,
    ),
) -> Result<Recipe, StoreError> {
    let status = BrewStatus::parse(&status)
        .ok_or_else(|| StoreError::QueryFailed(format!("unknown status '{status}'")))?;
    Ok(Recipe {
        id,
        owner_id,
        name,
        status,
        created_at: parse_ts(&created_at)?,
        brewing_started_at: brewing_started_at.as_deref().map(parse_ts).transpose()?,
        completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
    })
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_at(recipe_id: &str, secs: i64) -> TemperatureSample {
        TemperatureSample::new(
            recipe_id,
            72.0,
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        )
    }

    #[test]
    fn recipe_round_trip() {
        let store = Store::open_memory().unwrap();
        let recipe = Recipe::draft("owner-1", "Jasmine Green");
        store.insert_recipe(&recipe).unwrap();

        let loaded = store.recipe(&recipe.id).unwrap().unwrap();
        assert_eq!(loaded.id, recipe.id);
        assert_eq!(loaded.name, "Jasmine Green");
        assert_eq!(loaded.status, BrewStatus::Draft);
        assert!(store.recipe("missing").unwrap().is_none());
    }

    #[test]
    fn save_status_updates_timestamps() {
        let store = Store::open_memory().unwrap();
        let recipe = Recipe::draft("owner-1", "Oolong");
        store.insert_recipe(&recipe).unwrap();

        let started = Utc::now();
        store
            .save_status(&recipe.id, BrewStatus::Brewing, Some(started), None)
            .unwrap();

        let loaded = store.recipe(&recipe.id).unwrap().unwrap();
        assert_eq!(loaded.status, BrewStatus::Brewing);
        assert_eq!(
            loaded.brewing_started_at.unwrap().timestamp(),
            started.timestamp()
        );
        assert!(loaded.completed_at.is_none());
    }

    #[test]
    fn lock_starts_free_and_acquires() {
        let store = Store::open_memory().unwrap();
        assert!(store.lock_holder().unwrap().is_none());

        let outcome = store.lock_try_acquire("recipe-a", "owner-1").unwrap();
        assert_eq!(outcome, AcquireOutcome::Acquired);

        let holder = store.lock_holder().unwrap().unwrap();
        assert_eq!(holder.recipe_id, "recipe-a");
        assert_eq!(holder.owner_id, "owner-1");
    }

    #[test]
    fn reacquire_by_holder_is_idempotent() {
        let store = Store::open_memory().unwrap();
        assert_eq!(
            store.lock_try_acquire("recipe-a", "owner-1").unwrap(),
            AcquireOutcome::Acquired
        );
        assert_eq!(
            store.lock_try_acquire("recipe-a", "owner-1").unwrap(),
            AcquireOutcome::Acquired
        );
        assert_eq!(
            store.lock_holder().unwrap().unwrap().recipe_id,
            "recipe-a"
        );
    }

    #[test]
    fn contended_acquire_reports_holder() {
        let store = Store::open_memory().unwrap();
        store.lock_try_acquire("recipe-a", "owner-1").unwrap();

        match store.lock_try_acquire("recipe-b", "owner-2").unwrap() {
            AcquireOutcome::Held(holder) => assert_eq!(holder.recipe_id, "recipe-a"),
            other => panic!("expected Held, got {other:?}"),
        }
    }

    #[test]
    fn release_by_non_holder_is_a_noop() {
        let store = Store::open_memory().unwrap();
        store.lock_try_acquire("recipe-a", "owner-1").unwrap();

        store.lock_release("recipe-b").unwrap();
        assert_eq!(
            store.lock_holder().unwrap().unwrap().recipe_id,
            "recipe-a"
        );

        store.lock_release("recipe-a").unwrap();
        assert!(store.lock_holder().unwrap().is_none());
    }

    #[test]
    fn release_on_free_lock_is_a_noop() {
        let store = Store::open_memory().unwrap();
        store.lock_release("recipe-a").unwrap();
        assert!(store.lock_holder().unwrap().is_none());
    }

    #[test]
    fn latest_sample_wins() {
        let store = Store::open_memory().unwrap();
        store.insert_sample(&sample_at("r1", 0)).unwrap();
        store.insert_sample(&sample_at("r1", 60)).unwrap();
        store.insert_sample(&sample_at("r1", 30)).unwrap();

        let latest = store.latest_sample("r1").unwrap().unwrap();
        assert_eq!(
            latest.observed_at,
            Utc.timestamp_opt(1_700_000_060, 0).unwrap()
        );
    }

    #[test]
    fn on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brewvat.db");

        let recipe = Recipe::draft("owner-1", "Persisted");
        {
            let store = Store::open_at(path.clone()).unwrap();
            store.insert_recipe(&recipe).unwrap();
            store.lock_try_acquire(&recipe.id, "owner-1").unwrap();
        }

        let store = Store::open_at(path).unwrap();
        assert_eq!(store.recipe(&recipe.id).unwrap().unwrap().name, "Persisted");
        assert_eq!(
            store.lock_holder().unwrap().unwrap().recipe_id,
            recipe.id
        );
    }

    #[test]
    fn purge_deletes_only_the_target_recipe() {
        let store = Store::open_memory().unwrap();
        for i in 0..4 {
            store.insert_sample(&sample_at("r1", i)).unwrap();
        }
        store.insert_sample(&sample_at("r2", 0)).unwrap();

        let outcome = store.purge_samples("r1").unwrap();
        assert_eq!(outcome, PurgeOutcome { deleted: 4, failed: 0 });
        assert_eq!(store.sample_count("r1").unwrap(), 0);
        assert_eq!(store.sample_count("r2").unwrap(), 1);
    }
}
