//! Main entry point for the ecb-forex CLI

use clap::Parser;
use ecb_forex::cache::CacheKey;
use ecb_forex::cli::{Cli, Commands, ExportFeed};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ecb_forex=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Export(cmd) => match &cmd.feed {
            ExportFeed::Latest(args) => args.execute(CacheKey::LatestRates).await,
            ExportFeed::NinetyDays(args) => args.execute(CacheKey::LastNinetyDaysRates).await,
            ExportFeed::Historic(args) => args.execute(CacheKey::HistoricRates).await,
        },
    };

    match result {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}
