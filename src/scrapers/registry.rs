use crate::config::Config;
use crate::models::{Listing, Source};
use crate::scrapers::pap::PapScraper;
use crate::scrapers::traits::Scraper;
use anyhow::{anyhow, Context, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info};

/// Builds a crawler together with the browser it owns
pub type ScraperFactory = Box<dyn Fn() -> Result<Box<dyn Scraper>>>;

/// Ordered set of crawlers run by one scraping job
pub struct ScraperRegistry {
    entries: Vec<(Source, ScraperFactory)>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with every site that has a crawler
    pub fn standard(config: &Config) -> Self {
        let mut registry = Self::new();

        let browser = config.browser.clone();
        let crawl = config.crawl.clone();
        registry.register(Source::Pap, move || {
            let scraper = PapScraper::launch(&browser, crawl.clone())?;
            Ok(Box::new(scraper) as Box<dyn Scraper>)
        });

        for source in Source::ALL {
            if !registry.sources().contains(&source) {
                debug!(%source, "No crawler for {} yet", source.display_name());
            }
        }

        registry
    }

    pub fn register<F>(&mut self, source: Source, factory: F)
    where
        F: Fn() -> Result<Box<dyn Scraper>> + 'static,
    {
        self.entries.push((source, Box::new(factory)));
    }

    pub fn sources(&self) -> Vec<Source> {
        self.entries.iter().map(|(source, _)| *source).collect()
    }

    /// Run every crawler in turn and concatenate their listings.
    ///
    /// A crawler that fails to start, errors or panics is logged and
    /// contributes nothing; the others still run and listings already
    /// collected are kept. Each crawler is closed exactly once.
    pub fn run_all(&self, city: Option<&str>) -> Vec<Listing> {
        let mut all_listings = Vec::new();

        for (source, factory) in &self.entries {
            info!(%source, "Scraping {}", source.display_name());

            match run_one(factory, city) {
                Ok(mut listings) => {
                    info!(%source, count = listings.len(), "Scraped {} listings", listings.len());
                    all_listings.append(&mut listings);
                }
                Err(e) => error!(%source, "Error scraping {}: {:#}", source, e),
            }
        }

        info!(count = all_listings.len(), "Collected batch");
        all_listings
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the wrapped crawler when dropped, including during unwinding
struct CloseOnDrop(Box<dyn Scraper>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn run_one(factory: &ScraperFactory, city: Option<&str>) -> Result<Vec<Listing>> {
    let mut scraper = CloseOnDrop(factory().context("Failed to start scraper")?);
    debug!(source = %scraper.0.source(), "Scraper ready");

    match panic::catch_unwind(AssertUnwindSafe(|| scraper.0.scrape_listings(city))) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("scraper panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture_time;
    use anyhow::bail;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Panic,
    }

    struct FakeScraper {
        source: Source,
        titles: Vec<&'static str>,
        behaviour: Behaviour,
        closes: Rc<Cell<u32>>,
    }

    impl Scraper for FakeScraper {
        fn source(&self) -> Source {
            self.source
        }

        fn scrape_listings(&mut self, city: Option<&str>) -> Result<Vec<Listing>> {
            match self.behaviour {
                Behaviour::Succeed => Ok(self
                    .titles
                    .iter()
                    .map(|title| Listing {
                        source: self.source,
                        title: title.to_string(),
                        price: 800,
                        size: 30,
                        location: city.unwrap_or("Paris").to_string(),
                        link: format!("{}/{}", self.source.base_url(), title),
                        timestamp: capture_time(),
                    })
                    .collect()),
                Behaviour::Fail => bail!("navigation failed"),
                Behaviour::Panic => panic!("selector exploded"),
            }
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn register(
        registry: &mut ScraperRegistry,
        source: Source,
        titles: Vec<&'static str>,
        behaviour: Behaviour,
    ) -> Rc<Cell<u32>> {
        let closes = Rc::new(Cell::new(0));
        let counter = closes.clone();
        registry.register(source, move || {
            Ok(Box::new(FakeScraper {
                source,
                titles: titles.clone(),
                behaviour,
                closes: counter.clone(),
            }) as Box<dyn Scraper>)
        });
        closes
    }

    fn titles(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.title.as_str()).collect()
    }

    #[test]
    fn test_failing_crawler_is_isolated() {
        let mut registry = ScraperRegistry::new();
        let first = register(&mut registry, Source::Pap, vec!["a", "b"], Behaviour::Succeed);
        let second = register(&mut registry, Source::Oqoro, vec!["x"], Behaviour::Fail);
        let third = register(&mut registry, Source::LeBonCoin, vec!["c"], Behaviour::Succeed);

        let listings = registry.run_all(None);

        assert_eq!(titles(&listings), vec!["a", "b", "c"]);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
        assert_eq!(third.get(), 1);
    }

    #[test]
    fn test_panicking_crawler_is_isolated_and_closed() {
        let mut registry = ScraperRegistry::new();
        let first = register(&mut registry, Source::Pap, vec!["a"], Behaviour::Panic);
        let second = register(&mut registry, Source::Oqoro, vec!["b"], Behaviour::Succeed);

        let listings = registry.run_all(None);

        assert_eq!(titles(&listings), vec!["b"]);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_factory_failure_skips_source() {
        let mut registry = ScraperRegistry::new();
        registry.register(Source::Pap, || Err(anyhow!("chrome not installed")));
        let second = register(&mut registry, Source::Oqoro, vec!["b"], Behaviour::Succeed);

        let listings = registry.run_all(None);

        assert_eq!(titles(&listings), vec!["b"]);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_city_is_passed_to_every_crawler() {
        let mut registry = ScraperRegistry::new();
        register(&mut registry, Source::Pap, vec!["a"], Behaviour::Succeed);
        register(&mut registry, Source::Oqoro, vec!["b"], Behaviour::Succeed);

        let locations: Vec<_> = registry
            .run_all(Some("Lille"))
            .into_iter()
            .map(|listing| listing.location)
            .collect();

        assert_eq!(locations, vec!["Lille", "Lille"]);
    }

    #[test]
    fn test_runs_are_independent() {
        let mut registry = ScraperRegistry::new();
        let closes = register(&mut registry, Source::Pap, vec!["a"], Behaviour::Succeed);

        let first = registry.run_all(None);
        let second = registry.run_all(None);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(closes.get(), 2);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
