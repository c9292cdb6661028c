use clap::Subcommand;

use brewvat_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "thresholds.lethal_above_f", "notifications.webhook_url")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

fn get(config: &Config, key: &str) -> Option<String> {
    let value = match key {
        "thresholds.lethal_above_f" => config.thresholds.lethal_above_f.to_string(),
        "thresholds.critical_above_f" => config.thresholds.critical_above_f.to_string(),
        "thresholds.warning_above_f" => config.thresholds.warning_above_f.to_string(),
        "thresholds.warning_below_f" => config.thresholds.warning_below_f.to_string(),
        "thresholds.critical_below_f" => config.thresholds.critical_below_f.to_string(),
        "alerts.physical_cooldown_secs" => config.alerts.physical_cooldown_secs.to_string(),
        "alerts.push_cooldown_secs" => config.alerts.push_cooldown_secs.to_string(),
        "notifications.enabled" => config.notifications.enabled.to_string(),
        "notifications.webhook_url" => config
            .notifications
            .webhook_url
            .clone()
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

fn set(config: &mut Config, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    match key {
        "thresholds.lethal_above_f" => config.thresholds.lethal_above_f = value.parse()?,
        "thresholds.critical_above_f" => config.thresholds.critical_above_f = value.parse()?,
        "thresholds.warning_above_f" => config.thresholds.warning_above_f = value.parse()?,
        "thresholds.warning_below_f" => config.thresholds.warning_below_f = value.parse()?,
        "thresholds.critical_below_f" => config.thresholds.critical_below_f = value.parse()?,
        "alerts.physical_cooldown_secs" => config.alerts.physical_cooldown_secs = value.parse()?,
        "alerts.push_cooldown_secs" => config.alerts.push_cooldown_secs = value.parse()?,
        "notifications.enabled" => config.notifications.enabled = value.parse()?,
        "notifications.webhook_url" => {
            config.notifications.webhook_url = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        _ => return Err(format!("unknown key: {key}").into()),
    }
    Ok(())
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match get(&config, &key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            set(&mut config, &key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
