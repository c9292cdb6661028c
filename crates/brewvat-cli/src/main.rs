use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "brewvat-cli", version, about = "Brewvat CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recipe management
    Recipe {
        #[command(subcommand)]
        action: commands::recipe::RecipeAction,
    },
    /// Brew lifecycle control
    Brew {
        #[command(subcommand)]
        action: commands::brew::BrewAction,
    },
    /// Temperature sample management
    Sample {
        #[command(subcommand)]
        action: commands::sample::SampleAction,
    },
    /// Watch a recipe's live feed and print alert actions
    Watch {
        /// Recipe ID to observe
        recipe_id: String,
        /// Poll interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Recipe { action } => commands::recipe::run(action),
        Commands::Brew { action } => commands::brew::run(action),
        Commands::Sample { action } => commands::sample::run(action),
        Commands::Watch {
            recipe_id,
            interval,
        } => commands::watch::run(&recipe_id, interval),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
