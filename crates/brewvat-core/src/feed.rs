//! Live sensor feed with latest-sample-wins delivery.
//!
//! The probe bridge publishes readings into a [`SensorHub`]; observing
//! sessions subscribe per recipe. Delivery uses `tokio::sync::watch`, which
//! keeps exactly the newest value per channel: a slow observer skips
//! straight to the most recent reading instead of draining a backlog, which
//! is precisely the "only the latest sample matters" contract.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::sample::TemperatureSample;

type Channel = watch::Sender<Option<TemperatureSample>>;

/// Fan-out point between the probe bridge and observing sessions.
#[derive(Default)]
pub struct SensorHub {
    channels: Mutex<HashMap<String, Channel>>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the newest reading for a recipe. Overwrites any reading a
    /// subscriber hasn't picked up yet.
    pub fn publish(&self, sample: TemperatureSample) {
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let tx = channels
            .entry(sample.recipe_id.clone())
            .or_insert_with(|| watch::channel(None).0);
        tx.send_replace(Some(sample));
    }

    /// Subscribe to a recipe's feed. Dropping the receiver unsubscribes;
    /// nothing is delivered after that point.
    pub fn subscribe(&self, recipe_id: &str) -> watch::Receiver<Option<TemperatureSample>> {
        let mut channels = match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(recipe_id.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}
