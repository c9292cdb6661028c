//! Observing sessions: the live pipeline from sensor feed to alert actions.
//!
//! `observe` wires one recipe's feed through classification, debouncing and
//! push dispatch, and hands the caller a stream of [`AlertAction`]s to
//! render. All debounce state is owned by the session task: two sessions,
//! or two recipes, never share a cooldown timer.
//!
//! Closing the stream aborts the task, which discards the state and stops
//! delivery; there is deliberately no final flush.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::alerts::{AlertAction, AlertDebouncer};
use crate::error::NotifyError;
use crate::feed::SensorHub;
use crate::notify::Notifier;
use crate::severity::evaluate;
use crate::storage::Config;

/// Handle to a running observing session.
///
/// Dropping the stream cancels the session.
pub struct AlertStream {
    rx: mpsc::Receiver<AlertAction>,
    task: JoinHandle<()>,
}

impl AlertStream {
    /// Next alert action, or `None` once the session has ended.
    pub async fn next(&mut self) -> Option<AlertAction> {
        self.rx.recv().await
    }

    /// Stop observing. Equivalent to dropping the stream.
    pub fn stop(self) {}
}

impl Drop for AlertStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start observing a recipe's live feed.
///
/// Samples arrive latest-wins from the hub and are evaluated in
/// non-decreasing `observed_at` order; a reading older than one already
/// evaluated is dropped. Cooldown decisions use the sample's own
/// timestamp, so replayed feeds debounce identically to live ones.
pub fn observe(
    hub: &SensorHub,
    recipe_id: &str,
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> AlertStream {
    let mut feed = hub.subscribe(recipe_id);
    let (tx, rx) = mpsc::channel(32);

    let thresholds = config.thresholds;
    let mut debouncer = AlertDebouncer::new(
        Duration::seconds(config.alerts.physical_cooldown_secs),
        Duration::seconds(config.alerts.push_cooldown_secs),
    );
    let recipe_id = recipe_id.to_string();

    let task = tokio::spawn(async move {
        let mut last_seen: Option<DateTime<Utc>> = None;
        loop {
            let sample = feed.borrow_and_update().clone();
            if let Some(sample) = sample {
                // In-flight readings that lost the race to a newer one are
                // dropped, never evaluated out of order.
                let stale = last_seen.is_some_and(|t| sample.observed_at < t);
                if !stale {
                    last_seen = Some(sample.observed_at);
                    let reading = evaluate(sample.value_f, &thresholds);
                    for action in debouncer.observe(&reading, sample.observed_at) {
                        if matches!(action, AlertAction::PushSent) {
                            dispatch_push(
                                notifier.clone(),
                                recipe_id.clone(),
                                reading.title,
                                reading.message,
                                sample.value_f,
                            );
                        }
                        if tx.send(action).await.is_err() {
                            return; // Observer went away.
                        }
                    }
                }
            }
            if feed.changed().await.is_err() {
                break; // Hub dropped; feed is gone.
            }
        }
    });

    AlertStream { rx, task }
}

/// Fire-and-forget push delivery. Channel unavailability is a silent
/// no-op; real delivery failures are logged and swallowed.
fn dispatch_push(
    notifier: Arc<dyn Notifier>,
    recipe_id: String,
    title: &'static str,
    message: &'static str,
    value_f: f64,
) {
    tokio::task::spawn_blocking(move || {
        match notifier.send(&recipe_id, title, message, value_f) {
            Ok(()) => debug!(recipe_id, title, "push notification sent"),
            Err(NotifyError::Unavailable) => {
                debug!(recipe_id, "push channel unavailable, skipping")
            }
            Err(e) => warn!(recipe_id, error = %e, "push delivery failed"),
        }
    });
}
