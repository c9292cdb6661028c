use chrono::Utc;
use clap::Subcommand;

use brewvat_core::storage::{Config, Store};
use brewvat_core::{evaluate, BrewStore, TemperatureSample};

#[derive(Subcommand)]
pub enum SampleAction {
    /// Record a temperature reading for a recipe
    Add {
        /// Recipe ID
        recipe_id: String,
        /// Temperature in Fahrenheit
        value: f64,
        /// Probe identifier
        #[arg(long)]
        sensor: Option<String>,
    },
    /// Show the newest reading for a recipe
    Latest {
        /// Recipe ID
        recipe_id: String,
    },
    /// Classify a temperature without storing it
    Classify {
        /// Temperature in Fahrenheit
        value: f64,
    },
}

pub fn run(action: SampleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SampleAction::Add {
            recipe_id,
            value,
            sensor,
        } => {
            let store = Store::open()?;
            let mut sample = TemperatureSample::new(&recipe_id, value, Utc::now());
            sample.sensor_id = sensor;
            store.insert_sample(&sample)?;

            let config = Config::load()?;
            let reading = evaluate(value, &config.thresholds);
            println!("{}: {}", reading.level, reading.title);
        }
        SampleAction::Latest { recipe_id } => {
            let store = Store::open()?;
            match store.latest_sample(&recipe_id)? {
                Some(sample) => println!("{}", serde_json::to_string_pretty(&sample)?),
                None => println!("no samples for {recipe_id}"),
            }
        }
        SampleAction::Classify { value } => {
            let config = Config::load()?;
            let reading = evaluate(value, &config.thresholds);
            println!("{}: {} -- {}", reading.level, reading.title, reading.message);
        }
    }
    Ok(())
}
