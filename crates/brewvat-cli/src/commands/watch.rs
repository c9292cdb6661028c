use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use brewvat_core::storage::{Config, Store};
use brewvat_core::{observe, BrewStore, SensorHub, WebhookNotifier};

/// Tail a recipe's feed: poll the store for new readings, run them through
/// the alert pipeline and print each resulting action as a JSON line.
///
/// Runs until interrupted.
pub fn run(recipe_id: &str, interval_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load()?;
    let notifier = Arc::new(WebhookNotifier::from_config(&config.notifications));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let hub = SensorHub::new();
        let mut stream = observe(&hub, recipe_id, &config, notifier);
        let mut poller = tokio::time::interval(Duration::from_secs(interval_secs));
        let mut published: Option<DateTime<Utc>> = None;

        loop {
            tokio::select! {
                _ = poller.tick() => {
                    let sample = store.latest_sample(recipe_id)?;
                    if let Some(sample) = sample {
                        // Re-polling the same reading must not re-trigger.
                        if published != Some(sample.observed_at) {
                            published = Some(sample.observed_at);
                            hub.publish(sample);
                        }
                    }
                }
                action = stream.next() => {
                    match action {
                        Some(action) => println!("{}", serde_json::to_string(&action)?),
                        None => break,
                    }
                }
            }
        }
        Ok(())
    })
}
