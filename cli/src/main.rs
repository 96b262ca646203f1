mod scan;
mod suggest;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use larder_core::{classify, ExpirationPredictor};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Scan receipts and get recipe ideas from your pantry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract grocery items from a receipt photo (needs LARDER_GENERATE_URL)
    Scan {
        /// Path to a JPEG, PNG, GIF or WebP photo
        image: PathBuf,
        /// Predict expiration for pantry rather than fridge storage
        #[arg(long)]
        pantry: bool,
    },
    /// Suggest recipes from pantry item names (needs LARDER_GENERATE_URL)
    Suggest {
        /// Pantry item names
        #[arg(required = true)]
        items: Vec<String>,
        /// Dietary requirements, e.g. "vegetarian"
        #[arg(long)]
        dietary: Option<String>,
        /// Preferred cuisine
        #[arg(long)]
        cuisine: Option<String>,
        /// Difficulty level, e.g. "easy"
        #[arg(long)]
        difficulty: Option<String>,
        /// Fail if any suggested recipe is malformed
        #[arg(long, conflicts_with = "filter_invalid")]
        strict: bool,
        /// Drop malformed recipes instead of repairing them
        #[arg(long)]
        filter_invalid: bool,
    },
    /// Show the category an item name falls into
    Classify {
        name: String,
    },
    /// Predict when an item expires
    Expires {
        name: String,
        /// Assume pantry rather than fridge storage
        #[arg(long)]
        pantry: bool,
        /// Date of purchase (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ExpiresOutput<'a> {
    name: &'a str,
    category: larder_core::Category,
    refrigerated: bool,
    predicted_expiration_date: NaiveDate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { image, pantry } => {
            scan::scan(&image, !pantry).await?;
        }
        Commands::Suggest {
            items,
            dietary,
            cuisine,
            difficulty,
            strict,
            filter_invalid,
        } => {
            let preferences = larder_core::Preferences {
                dietary,
                cuisine,
                difficulty,
            };
            let validation = if strict {
                larder_core::RecipeValidation::Strict
            } else if filter_invalid {
                larder_core::RecipeValidation::FilterInvalid
            } else {
                larder_core::RecipeValidation::Lenient
            };
            suggest::suggest(&items, preferences, validation).await?;
        }
        Commands::Classify { name } => {
            print_json(&serde_json::json!({
                "name": name,
                "category": classify(&name),
            }))?;
        }
        Commands::Expires {
            name,
            pantry,
            today,
        } => {
            let predictor = match today {
                Some(date) => ExpirationPredictor::fixed(date),
                None => ExpirationPredictor::default(),
            };
            print_json(&ExpiresOutput {
                name: &name,
                category: classify(&name),
                refrigerated: !pantry,
                predicted_expiration_date: predictor.predict(&name, !pantry),
            })?;
        }
    }

    Ok(())
}
