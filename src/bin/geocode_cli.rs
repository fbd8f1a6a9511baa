use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;

use geocoder::configure;
use geocoder::logger::setup_logger;
use geocoder::{Coordinate, GeocodeResult, GeocodeService, ProviderKind};

#[derive(Parser)]
#[command(name = "geocode_cli")]
#[command(about = "Forward and reverse geocoding with provider fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    /// Primary provider: platform, google or here
    #[arg(long, default_value = "google")]
    service: ProviderKind,
    /// Provider tried once if the primary fails
    #[arg(long)]
    fallback: Option<ProviderKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Address text to coordinates
    Forward {
        address: String,
        #[command(flatten)]
        providers: ProviderArgs,
    },
    /// Coordinates to address
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[command(flatten)]
        providers: ProviderArgs,
    },
}

fn print_result(result: GeocodeResult) -> Result<()> {
    match result {
        Ok(records) => {
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Err(e) => Err(anyhow!("{} ({})", e, e.error_code())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let config = configure::load_config().context("Failed to load geocoder configuration")?;

    // Setup logger
    if let Err(e) = setup_logger(&config) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let service = GeocodeService::from_config(&config).context("Failed to build geocode service")?;

    let outcome = match cli.command {
        Commands::Forward { address, providers } => {
            service
                .geocode_async(&address, providers.service, providers.fallback)
                .await
        }
        Commands::Reverse { lat, lng, providers } => {
            service
                .reverse_geocode_async(Coordinate::new(lat, lng), providers.service, providers.fallback)
                .await
        }
    };

    match outcome {
        Some(result) => print_result(result),
        None => Err(anyhow!("request was cancelled")),
    }
}
