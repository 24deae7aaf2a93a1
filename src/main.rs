use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod error;
mod models;
mod services;

use commands::{ConfigCommand, ItemCommand, PlanCommand};
use config::Config;
use db::{init_db, DietItemRepository, PlanRepository};
use services::{DietPlanItemService, PlanCompositionService};

#[derive(Parser)]
#[command(name = "nutriplan")]
#[command(version)]
#[command(about = "Patient diet-plan management CLI", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage structured meal plans (plan -> day -> item)
    Plan(PlanCommand),

    /// Manage flat diet-plan items
    Item(ItemCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutriplan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Plan(cmd)) => {
            let pool = init_db(Some(config.database_path.clone())).await?;
            let service = PlanCompositionService::new(PlanRepository::new(pool));
            cmd.run(&service).await?;
        }
        Some(Commands::Item(cmd)) => {
            let pool = init_db(Some(config.database_path.clone())).await?;
            let service = DietPlanItemService::new(DietItemRepository::new(pool));
            cmd.run(&service).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
