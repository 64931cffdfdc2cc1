use crate::loader::bigquery::{BigQuerySettings, DEFAULT_ENDPOINT};
use crate::scrapers::{BrowserSettings, CrawlSettings};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bigquery: BigQuerySettings,
    pub crawl: CrawlSettings,
    pub browser: BrowserSettings,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a valid number, got '{}'", key, value)),
                None => Ok(default),
            }
        };

        let max_pages = number("MAX_PAGES", 50)?;
        let max_pages = match max_pages {
            0 => None,
            n => Some(u32::try_from(n).context("MAX_PAGES is too large")?),
        };

        let defaults = BrowserSettings::default();

        Ok(Self {
            bigquery: BigQuerySettings {
                project_id: var("BQ_PROJECT_ID", "your-project-id"),
                dataset: var("BQ_DATASET", "real_estate"),
                table: var("BQ_TABLE", "property_listings"),
                access_token: lookup("BQ_ACCESS_TOKEN").filter(|token| !token.is_empty()),
                endpoint: var("BQ_ENDPOINT", DEFAULT_ENDPOINT),
            },
            crawl: CrawlSettings {
                page_delay: Duration::from_secs(number("SCRAPING_DELAY_SECS", 2)?),
                max_pages,
            },
            browser: BrowserSettings {
                user_agent: var("USER_AGENT", &defaults.user_agent),
                page_timeout: Duration::from_secs(number("PAGE_TIMEOUT_SECS", 30)?),
                headless: defaults.headless,
            },
            data_dir: PathBuf::from(var("DATA_DIR", "data")),
            log_dir: PathBuf::from(var("LOG_DIR", "logs")),
        })
    }

    /// Where per-run JSON captures are written
    pub fn raw_data_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }
}
