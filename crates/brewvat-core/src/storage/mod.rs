mod config;
pub mod database;

pub use config::{AlertsConfig, Config, NotificationsConfig};
pub use database::{BrewStore, PurgeOutcome, Store};

use std::path::PathBuf;

/// Returns `~/.config/brewvat[-dev]/` based on BREWVAT_ENV.
///
/// Set BREWVAT_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREWVAT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("brewvat-dev")
    } else {
        base_dir.join("brewvat")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
