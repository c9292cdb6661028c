//! Temperature samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading from the shared probe, attributed to a recipe.
///
/// Immutable once produced; the pipeline consumes each sample at most once
/// and only ever needs the newest one per observing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub recipe_id: String,
    /// Hardware identifier of the probe that produced the reading, when
    /// the bridge reports one.
    pub sensor_id: Option<String>,
    /// Temperature in Fahrenheit.
    pub value_f: f64,
    pub observed_at: DateTime<Utc>,
}

impl TemperatureSample {
    pub fn new(recipe_id: &str, value_f: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            sensor_id: None,
            value_f,
            observed_at,
        }
    }
}
