//! Shared page loop used by every site crawler.
//!
//! A site only describes how to build page URLs, find cards and parse one
//! card; fetching, pacing and stopping live here.

use crate::models::{Listing, Source};
use crate::scrapers::parser::ParseOutcome;
use crate::scrapers::types::CrawlSettings;
use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Browser automation capability: navigate and hand back rendered markup.
pub trait PageRenderer {
    fn render(&mut self, url: &str) -> Result<String>;

    /// Release the underlying browser. Safe to call more than once.
    fn close(&mut self);
}

/// Source-specific knowledge of a results site
pub trait ListingSite {
    fn source(&self) -> Source;

    /// Results page `page` (1-based), filtered on `city` when given
    fn page_url(&self, page: u32, city: Option<&str>) -> String;

    /// Listing cards in document order; empty when the page has none
    fn cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    fn parse_card(&self, card: ElementRef<'_>) -> ParseOutcome;
}

/// Per-call crawl state, dropped when the crawl returns
#[derive(Debug)]
struct CrawlSession {
    page: u32,
    listings: Vec<Listing>,
    finished: bool,
}

impl CrawlSession {
    fn new() -> Self {
        Self {
            page: 1,
            listings: Vec::new(),
            finished: false,
        }
    }
}

/// Walk result pages from 1 until a page has no cards or `max_pages` is passed.
///
/// Skipped cards are counted and logged, never fatal. A page that fails to
/// render aborts the crawl with an error; nothing is retried.
pub fn crawl<S, R>(
    site: &S,
    renderer: &mut R,
    settings: &CrawlSettings,
    city: Option<&str>,
) -> Result<Vec<Listing>>
where
    S: ListingSite + ?Sized,
    R: PageRenderer + ?Sized,
{
    crawl_paced(site, renderer, settings, city, thread::sleep)
}

/// Same loop as [`crawl`], with `pause` called for the delay between two fetches.
fn crawl_paced<S, R, P>(
    site: &S,
    renderer: &mut R,
    settings: &CrawlSettings,
    city: Option<&str>,
    mut pause: P,
) -> Result<Vec<Listing>>
where
    S: ListingSite + ?Sized,
    R: PageRenderer + ?Sized,
    P: FnMut(Duration),
{
    let mut session = CrawlSession::new();

    while !session.finished {
        if let Some(max_pages) = settings.max_pages {
            if session.page > max_pages {
                info!(max_pages, "Reached page limit, stopping");
                session.finished = true;
                continue;
            }
        }

        if session.page > 1 && !settings.page_delay.is_zero() {
            pause(settings.page_delay);
        }

        let url = site.page_url(session.page, city);
        info!(page = session.page, %url, "Scraping page");

        let html = renderer
            .render(&url)
            .with_context(|| format!("Failed to render page {} ({})", session.page, url))?;
        let document = Html::parse_document(&html);
        let cards = site.cards(&document);

        if cards.is_empty() {
            info!(page = session.page, "No listing cards found, stopping");
            session.finished = true;
            continue;
        }

        let found = cards.len();
        let mut skipped = 0;
        for card in cards {
            match site.parse_card(card) {
                ParseOutcome::Parsed(listing) => session.listings.push(listing),
                ParseOutcome::Skip(_) => skipped += 1,
            }
        }
        debug!(page = session.page, found, skipped, "Parsed page");

        session.page += 1;
    }

    info!(
        source = %site.source(),
        pages = session.page - 1,
        count = session.listings.len(),
        "Crawl finished"
    );
    Ok(session.listings)
}
