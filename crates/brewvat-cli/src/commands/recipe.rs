use clap::Subcommand;

use brewvat_core::storage::Store;
use brewvat_core::{BrewStore, Recipe};

#[derive(Subcommand)]
pub enum RecipeAction {
    /// Create a new draft recipe
    Create {
        /// Recipe name
        name: String,
        /// Owner user ID
        #[arg(long, default_value = "local")]
        owner: String,
    },
    /// List all recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe as JSON
    Show {
        /// Recipe ID
        id: String,
    },
}

pub fn run(action: RecipeAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;

    match action {
        RecipeAction::Create { name, owner } => {
            let recipe = Recipe::draft(&owner, &name);
            store.insert_recipe(&recipe)?;
            println!("Recipe created: {}", recipe.id);
        }
        RecipeAction::List { json } => {
            let recipes = store.recipes()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&recipes)?);
            } else {
                for recipe in recipes {
                    println!("{}  [{}]  {}", recipe.id, recipe.status, recipe.name);
                }
            }
        }
        RecipeAction::Show { id } => match store.recipe(&id)? {
            Some(recipe) => println!("{}", serde_json::to_string_pretty(&recipe)?),
            None => {
                eprintln!("recipe not found: {id}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
