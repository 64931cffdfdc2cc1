use crate::models::{Listing, Source};
use crate::scrapers::browser::BrowserSession;
use crate::scrapers::crawl::{crawl, ListingSite, PageRenderer};
use crate::scrapers::parser::{parse_card, CardSelectors, ParseOutcome};
use crate::scrapers::traits::Scraper;
use crate::scrapers::types::{BrowserSettings, CrawlSettings};
use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use tracing::{info, info_span, Span};
use url::Url;

/// PAP.fr rental search results
pub struct PapSite {
    selectors: CardSelectors,
    listing_url: Url,
    base_url: Url,
}

impl PapSite {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selectors: CardSelectors::pap()?,
            listing_url: Url::parse(Source::Pap.listing_url())
                .context("Invalid PAP listing URL")?,
            base_url: Url::parse(Source::Pap.base_url()).context("Invalid PAP base URL")?,
        })
    }
}

impl ListingSite for PapSite {
    fn source(&self) -> Source {
        Source::Pap
    }

    fn page_url(&self, page: u32, city: Option<&str>) -> String {
        let mut url = self.listing_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            if let Some(city) = city {
                query.append_pair("ville", city);
            }
        }
        url.into()
    }

    fn cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selectors.card).collect()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> ParseOutcome {
        parse_card(card, &self.selectors, Source::Pap, &self.base_url)
    }
}

/// Crawler for PAP.fr driving a page renderer (headless Chrome in production)
pub struct PapScraper<R: PageRenderer = BrowserSession> {
    site: PapSite,
    renderer: R,
    settings: CrawlSettings,
    span: Span,
}

impl PapScraper<BrowserSession> {
    /// Launch a dedicated browser and build the scraper around it
    pub fn launch(browser: &BrowserSettings, settings: CrawlSettings) -> Result<Self> {
        let renderer = BrowserSession::launch(browser)?;
        Self::with_renderer(renderer, settings)
    }
}

impl<R: PageRenderer> PapScraper<R> {
    pub fn with_renderer(renderer: R, settings: CrawlSettings) -> Result<Self> {
        Ok(Self {
            site: PapSite::new()?,
            renderer,
            settings,
            span: info_span!("scraper", source = %Source::Pap),
        })
    }
}

impl<R: PageRenderer> Scraper for PapScraper<R> {
    fn source(&self) -> Source {
        Source::Pap
    }

    fn scrape_listings(&mut self, city: Option<&str>) -> Result<Vec<Listing>> {
        let _entered = self.span.enter();
        info!(city = city.unwrap_or("all"), "Starting PAP.fr scrape");

        let listings = crawl(&self.site, &mut self.renderer, &self.settings, city)?;

        info!("Scraped {} listings from {}", listings.len(), Source::Pap.display_name());
        Ok(listings)
    }

    fn close(&mut self) {
        let _entered = self.span.enter();
        self.renderer.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::{card, page, ScriptedRenderer};
    use std::time::Duration;

    fn scraper(pages: Vec<String>) -> PapScraper<ScriptedRenderer> {
        let settings = CrawlSettings {
            page_delay: Duration::ZERO,
            max_pages: None,
        };
        PapScraper::with_renderer(ScriptedRenderer::new(pages), settings).unwrap()
    }

    #[test]
    fn test_page_url() {
        let site = PapSite::new().unwrap();

        assert_eq!(
            site.page_url(1, None),
            "https://www.pap.fr/annonce/location-appartement-maison?page=1"
        );
        assert_eq!(
            site.page_url(3, Some("paris")),
            "https://www.pap.fr/annonce/location-appartement-maison?page=3&ville=paris"
        );
    }

    #[test]
    fn test_city_is_forwarded_unvalidated() {
        let site = PapSite::new().unwrap();
        let url = site.page_url(1, Some("Saint-Étienne 42"));

        let parsed = Url::parse(&url).unwrap();
        let ville = parsed
            .query_pairs()
            .find(|(k, _)| k == "ville")
            .map(|(_, v)| v.into_owned());
        assert_eq!(ville.as_deref(), Some("Saint-Étienne 42"));
    }

    #[test]
    fn test_links_resolve_against_pap_origin() {
        let mut scraper = scraper(vec![page(&[card(7, "1 020 €", "Bordeaux")])]);

        let listings = scraper.scrape_listings(None).unwrap();

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.source, Source::Pap);
        assert_eq!(listing.link, "https://www.pap.fr/annonces/appartement-r7");
        assert_eq!(listing.price, 1020);
        assert_eq!(listing.size, 40);
        assert_eq!(listing.location, "Bordeaux");
    }

    #[test]
    fn test_close_releases_renderer() {
        let mut scraper = scraper(vec![]);
        scraper.close();
        assert_eq!(scraper.renderer.closed, 1);
    }

    #[test]
    fn test_parse_results_page_fixture() {
        let html = r#"
            <html><body>
              <div class="search-list-item">
                <div class="item-body">
                  <h2 class="item-title">
                    <a href="/annonces/appartement-paris-11e-r412345678">
                      <span class="h1">Location appartement 2 pièces 42 m²</span>
                    </a>
                  </h2>
                  <span class="item-price">1.390&nbsp;€</span>
                  <div class="item-location">Paris 11e (75011)</div>
                  <div class="item-criteria">
                    <ul><li>2 pièces</li><li>1 chambre</li><li>42 m²</li></ul>
                  </div>
                </div>
              </div>
              <div class="search-list-item search-list-item-ad">Publicité</div>
            </body></html>
        "#;
        let mut scraper = scraper(vec![html.to_string()]);

        let listings = scraper.scrape_listings(Some("paris")).unwrap();

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.title, "Location appartement 2 pièces 42 m²");
        assert_eq!(listing.price, 1390);
        assert_eq!(listing.size, 42);
        assert_eq!(
            listing.link,
            "https://www.pap.fr/annonces/appartement-paris-11e-r412345678"
        );
    }
}
