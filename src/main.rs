mod config;
mod loader;
mod logging;
mod models;
mod schedule;
mod scrapers;

use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use config::Config;
use loader::{BigQueryLoader, JsonCapture, ListingLoader};
use scrapers::ScraperRegistry;
use tracing::{error, info};

/// Real estate rental listings collector
#[derive(Debug, Parser)]
#[command(name = "rental-scout", version, about)]
struct Cli {
    /// Scraping mode: initial (one-time), update (one-time), or schedule (continuous)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Specific city to scrape
    #[arg(long)]
    city: Option<String>,

    /// Also save each batch as JSON under <DATA_DIR>/raw
    #[arg(long)]
    save_raw: bool,

    /// Scrape without loading into BigQuery
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Initial,
    Update,
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(mode) = cli.mode else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::from_env()?;
    let _log_guard = logging::init(&config.log_dir)?;

    info!("🏠 Rental Scout");

    match mode {
        Mode::Initial => {
            info!("Running initial scraping");
            run_scraping_job(&config, &cli).await;
        }
        Mode::Update => {
            info!("Running update scraping");
            run_scraping_job(&config, &cli).await;
        }
        Mode::Schedule => {
            info!("Starting scheduled scraping");
            let (config, cli) = (&config, &cli);
            schedule::run_forever(move || run_scraping_job(config, cli)).await;
        }
    }

    Ok(())
}

/// Scrape every source, then hand the batch to each loader.
///
/// Loader failures are logged; the batch is not retried.
async fn run_scraping_job(config: &Config, cli: &Cli) {
    info!("Starting scraping job");

    let registry = ScraperRegistry::standard(config);
    let city = cli.city.as_deref();
    // Browser automation is blocking; keep it off the async workers.
    let listings = tokio::task::block_in_place(|| registry.run_all(city));

    for loader in loaders(config, cli) {
        match loader.load(&listings).await {
            Ok(()) => info!(loader = loader.name(), count = listings.len(), "Batch loaded"),
            Err(e) => error!(loader = loader.name(), "Error loading listings: {}", e),
        }
    }

    info!("Scraping job completed");
}

fn loaders(config: &Config, cli: &Cli) -> Vec<Box<dyn ListingLoader>> {
    let mut loaders: Vec<Box<dyn ListingLoader>> = Vec::new();

    if cli.save_raw {
        let capture = JsonCapture::new(config.raw_data_dir(), "listings");
        info!(dir = %capture.dir().display(), "Capturing raw batch");
        loaders.push(Box::new(capture));
    }

    if cli.dry_run {
        info!("Dry run, skipping BigQuery");
    } else {
        match BigQueryLoader::new(config.bigquery.clone()) {
            Ok(loader) => loaders.push(Box::new(loader)),
            Err(e) => error!("Error updating database: {}", e),
        }
    }

    loaders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_update_with_city() {
        let cli = Cli::try_parse_from(["rental-scout", "--mode", "update", "--city", "paris"]).unwrap();

        assert!(matches!(cli.mode, Some(Mode::Update)));
        assert_eq!(cli.city.as_deref(), Some("paris"));
        assert!(!cli.save_raw);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["rental-scout", "--mode", "weekly"]).is_err());
    }

    #[test]
    fn test_dry_run_has_no_warehouse_loader() {
        let config = Config::from_env().unwrap();
        let cli = Cli::try_parse_from(["rental-scout", "--mode", "initial", "--dry-run", "--save-raw"])
            .unwrap();

        let names: Vec<_> = loaders(&config, &cli).iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["json-capture"]);
    }
}
