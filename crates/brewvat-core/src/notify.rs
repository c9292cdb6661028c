//! Push notification dispatch.
//!
//! Delivery is fire-and-forget: the alert pipeline decides *whether* a push
//! is due, this module only carries it out. An unavailable channel
//! (disabled in config, no webhook configured) is a silent no-op by design,
//! never an error surfaced to the triggering flow.

use serde_json::json;

use crate::error::NotifyError;
use crate::storage::NotificationsConfig;

/// A push-notification sink.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        recipient_id: &str,
        title: &str,
        body: &str,
        value_f: f64,
    ) -> Result<(), NotifyError>;
}

/// Notifier with no channel behind it. Every send reports `Unavailable`.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, _: &str, _: &str, _: &str, _: f64) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable)
    }
}

/// Posts alerts to a configured webhook endpoint.
pub struct WebhookNotifier {
    webhook_url: Option<String>,
    enabled: bool,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            webhook_url: config.webhook_url.clone(),
            enabled: config.enabled,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Notifier for WebhookNotifier {
    fn send(
        &self,
        recipient_id: &str,
        title: &str,
        body: &str,
        value_f: f64,
    ) -> Result<(), NotifyError> {
        if !self.enabled {
            return Err(NotifyError::Unavailable);
        }
        let Some(url) = self.webhook_url.as_deref() else {
            return Err(NotifyError::Unavailable);
        };

        let payload = json!({
            "recipient": recipient_id,
            "title": title,
            "body": format!("{body}  •  Current: {value_f:.1}°F"),
            "temperature_f": value_f,
        });

        let resp = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .map_err(|e| NotifyError::Failed(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Failed(format!(
                "webhook returned HTTP {}",
                resp.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_notifier_is_unavailable() {
        let result = NullNotifier.send("r1", "t", "b", 90.0);
        assert!(matches!(result, Err(NotifyError::Unavailable)));
    }

    #[test]
    fn disabled_config_means_unavailable() {
        let notifier = WebhookNotifier::from_config(&NotificationsConfig {
            enabled: false,
            webhook_url: Some("https://example.test/hook".to_string()),
        });
        assert!(matches!(
            notifier.send("r1", "t", "b", 90.0),
            Err(NotifyError::Unavailable)
        ));
    }

    #[test]
    fn missing_webhook_means_unavailable() {
        let notifier = WebhookNotifier::from_config(&NotificationsConfig {
            enabled: true,
            webhook_url: None,
        });
        assert!(matches!(
            notifier.send("r1", "t", "b", 90.0),
            Err(NotifyError::Unavailable)
        ));
    }
}
