use std::sync::Arc;

use clap::Subcommand;

use brewvat_core::storage::Store;
use brewvat_core::{BrewController, BrewStore};

#[derive(Subcommand)]
pub enum BrewAction {
    /// Start brewing a draft recipe (acquires the sensor)
    Start {
        /// Recipe ID
        id: String,
        /// Owner user ID
        #[arg(long, default_value = "local")]
        owner: String,
    },
    /// Pause a live brew (frees the sensor)
    Pause {
        /// Recipe ID
        id: String,
    },
    /// Resume a paused brew (re-acquires the sensor)
    Resume {
        /// Recipe ID
        id: String,
        /// Owner user ID
        #[arg(long, default_value = "local")]
        owner: String,
    },
    /// Complete a live brew
    Complete {
        /// Recipe ID
        id: String,
    },
    /// Brew a completed recipe again
    Rebrew {
        /// Recipe ID
        id: String,
        /// Owner user ID
        #[arg(long, default_value = "local")]
        owner: String,
    },
    /// Reset a live or paused brew to draft, purging its sample history
    Reset {
        /// Recipe ID
        id: String,
    },
    /// Show who currently holds the sensor
    Status,
}

pub fn run(action: BrewAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open()?);
    let controller = BrewController::new(store.clone());

    let event = match action {
        BrewAction::Start { id, owner } => controller.start_brewing(&id, &owner)?,
        BrewAction::Pause { id } => controller.pause_brewing(&id)?,
        BrewAction::Resume { id, owner } => controller.resume_brewing(&id, &owner)?,
        BrewAction::Complete { id } => controller.complete_brewing(&id)?,
        BrewAction::Rebrew { id, owner } => controller.rebrew(&id, &owner)?,
        BrewAction::Reset { id } => controller.back_to_draft(&id)?,
        BrewAction::Status => {
            match store.lock_holder()? {
                Some(holder) => println!("sensor held by {holder}"),
                None => println!("sensor free"),
            }
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
