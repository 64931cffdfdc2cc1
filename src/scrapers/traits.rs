use crate::models::{Listing, Source};
use anyhow::Result;

/// Common trait for all listing crawlers
/// New sites (Oqoro, LeBonCoin, ...) plug in by implementing it
pub trait Scraper {
    /// Site this crawler collects from
    fn source(&self) -> Source;

    /// Crawl the site, optionally restricted to one city.
    /// Every call fetches the pages again.
    fn scrape_listings(&mut self, city: Option<&str>) -> Result<Vec<Listing>>;

    /// Release the browser behind the crawler
    fn close(&mut self);
}
